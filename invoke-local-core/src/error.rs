//! Harness error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal failures. Each one ends the run with its own exit code.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Can't listen on port {port}: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("executable not found: {path:?} ({reason})")]
    ExecutableNotFound { path: PathBuf, reason: String },

    #[error("failed to start {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timeout waiting for function RPC server on port {port} after {waited:?}")]
    ReadinessTimeout { port: u16, waited: Duration },

    /// The child quit before its port ever opened. Reported as soon as the
    /// exit is seen rather than after the readiness deadline, but shares the
    /// timeout's exit code.
    #[error("function process exited before opening port {port}: {status}")]
    ChildExited { port: u16, status: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn not_found(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HarnessError::ExecutableNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            HarnessError::PortUnavailable { .. } => 10,
            HarnessError::ExecutableNotFound { .. } | HarnessError::Spawn { .. } => 20,
            HarnessError::ReadinessTimeout { .. } | HarnessError::ChildExited { .. } => 21,
            HarnessError::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_stage() {
        let port = HarnessError::PortUnavailable {
            port: 8001,
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        let spawn = HarnessError::not_found("/nope", "no such file");
        let timeout = HarnessError::ReadinessTimeout {
            port: 8001,
            waited: Duration::from_secs(120),
        };

        assert_eq!(port.exit_code(), 10);
        assert_eq!(spawn.exit_code(), 20);
        assert_eq!(timeout.exit_code(), 21);
    }

    #[test]
    fn test_child_exit_is_not_reported_as_timeout() {
        let err = HarnessError::ChildExited {
            port: 8001,
            status: "exit status: 3".to_string(),
        };
        assert_eq!(err.exit_code(), 21);
        let message = err.to_string();
        assert!(message.contains("exited before opening port 8001"));
        assert!(!message.contains("timeout"));
    }

    #[test]
    fn test_port_message() {
        let err = HarnessError::PortUnavailable {
            port: 8001,
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("Can't listen on port 8001"));
    }
}
