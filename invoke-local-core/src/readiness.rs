//! Readiness polling
//!
//! A successful TCP connect is the only signal that the function runtime has
//! its RPC server up. The connection is closed right away.

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

use crate::config::ReadinessPolicy;
use crate::error::HarnessError;
use crate::launcher::FunctionProcess;

/// Poll `addr` until it accepts a connection or `policy.timeout` runs out.
pub async fn wait_until_port_open(
    addr: SocketAddr,
    policy: &ReadinessPolicy,
) -> Result<(), HarnessError> {
    poll(addr, policy, || Ok(())).await
}

/// Like [`wait_until_port_open`], but gives up early when the function
/// process exits before it ever listens. That case fails with
/// [`HarnessError::ChildExited`] without waiting for `policy.timeout`; only a
/// child that stays alive and silent gets [`HarnessError::ReadinessTimeout`].
pub async fn wait_for_function(
    process: &mut FunctionProcess,
    addr: SocketAddr,
    policy: &ReadinessPolicy,
) -> Result<(), HarnessError> {
    let port = addr.port();
    poll(addr, policy, || match process.try_exit_status() {
        Some(status) => Err(HarnessError::ChildExited {
            port,
            status: status.to_string(),
        }),
        None => Ok(()),
    })
    .await
}

async fn poll<F>(
    addr: SocketAddr,
    policy: &ReadinessPolicy,
    mut still_alive: F,
) -> Result<(), HarnessError>
where
    F: FnMut() -> Result<(), HarnessError>,
{
    let started = Instant::now();

    let probe = async {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match timeout(policy.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    drop(stream);
                    return Ok(attempts);
                }
                Ok(Err(e)) => debug!("Port {} not ready: {}", addr.port(), e),
                Err(_) => debug!("Connect to port {} timed out", addr.port()),
            }

            if let Err(e) = still_alive() {
                return Err(e);
            }
            sleep(policy.poll_interval).await;
        }
    };

    let outcome = timeout(policy.timeout, probe).await;
    match outcome {
        Ok(result) => {
            let attempts = result?;
            info!(
                "Function RPC server is up on port {} after {} attempt(s)",
                addr.port(),
                attempts
            );
            Ok(())
        }
        Err(_) => Err(HarnessError::ReadinessTimeout {
            port: addr.port(),
            waited: started.elapsed(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn fast_policy(total: Duration) -> ReadinessPolicy {
        ReadinessPolicy {
            timeout: total,
            poll_interval: Duration::from_millis(25),
            connect_timeout: Duration::from_millis(100),
        }
    }

    async fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test]
    async fn test_open_port_is_ready_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        wait_until_port_open(addr, &fast_policy(Duration::from_secs(2)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_port_times_out_after_deadline() {
        let addr = free_addr().await;
        let deadline = Duration::from_millis(300);

        let started = std::time::Instant::now();
        let err = wait_until_port_open(addr, &fast_policy(deadline))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, HarnessError::ReadinessTimeout { .. }));
        assert_eq!(err.exit_code(), 21);
        assert!(elapsed >= deadline);
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_port_opening_later_is_picked_up() {
        let addr = free_addr().await;

        let server = tokio::spawn(async move {
            sleep(Duration::from_millis(150)).await;
            let listener = TcpListener::bind(addr).await.unwrap();
            let _ = listener.accept().await;
        });

        wait_until_port_open(addr, &fast_policy(Duration::from_secs(5)))
            .await
            .unwrap();
        server.await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exited_child_fails_fast() {
        use crate::config::HarnessConfig;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("exit.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let addr = free_addr().await;
        let mut process = FunctionProcess::spawn(&script, &HarnessConfig::new(addr.port())).unwrap();

        let started = std::time::Instant::now();
        let err = wait_for_function(&mut process, addr, &fast_policy(Duration::from_secs(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::ChildExited { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
