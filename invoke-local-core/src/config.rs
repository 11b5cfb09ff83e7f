//! Harness configuration
//!
//! Everything the port guard, launcher, readiness poller and RPC client need
//! to agree on lives here and is passed down explicitly.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

/// Port the function runtime is told to listen on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 8001;

/// Environment variable the function runtime reads its RPC port from.
pub const PORT_ENV_VAR: &str = "_LAMBDA_SERVER_PORT";

/// How long and how often to probe the function's RPC port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Overall deadline for the port to become connectable
    pub timeout: Duration,
    /// Pause between failed connection attempts
    pub poll_interval: Duration,
    /// Timeout of a single connection attempt
    pub connect_timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub port: u16,
    pub readiness: ReadinessPolicy,
    /// Deadline handed to the function with every invocation
    pub invoke_deadline: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            readiness: ReadinessPolicy::default(),
            invoke_deadline: Duration::from_secs(300),
        }
    }
}

impl HarnessConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.readiness.poll_interval = interval;
        self
    }

    pub fn with_invoke_deadline(mut self, deadline: Duration) -> Self {
        self.invoke_deadline = deadline;
        self
    }

    /// Address the port guard binds: every interface.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Address the poller and the RPC client dial.
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.port, 8001);
        assert_eq!(config.readiness.timeout, Duration::from_secs(120));
        assert_eq!(config.readiness.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_builders_and_addrs() {
        let config = HarnessConfig::new(9100)
            .with_readiness_timeout(Duration::from_millis(500))
            .with_poll_interval(Duration::from_millis(50));

        assert_eq!(config.readiness.timeout, Duration::from_millis(500));
        assert_eq!(config.readiness.poll_interval, Duration::from_millis(50));
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:9100");
        assert_eq!(config.local_addr().to_string(), "127.0.0.1:9100");
    }
}
