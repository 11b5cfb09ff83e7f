//! Pre-flight check for the function's RPC port
//!
//! The port is released again before the child starts, so another process can
//! still grab it in between. This only catches the common case of a stale
//! function or a second harness already holding the port.

use std::net::{SocketAddr, TcpListener};

use tracing::debug;

use crate::error::HarnessError;

/// Bind `addr` once and release it. Fails if something already listens there.
pub fn ensure_port_available(addr: SocketAddr) -> Result<(), HarnessError> {
    let listener = TcpListener::bind(addr).map_err(|source| HarnessError::PortUnavailable {
        port: addr.port(),
        source,
    })?;
    drop(listener);

    debug!("Port {} is free", addr.port());
    Ok(())
}
