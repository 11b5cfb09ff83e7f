//! Function process launcher
//!
//! Resolves the function binary, starts it with the RPC port in its
//! environment and keeps the child alive only as long as the returned
//! [`FunctionProcess`] guard.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::config::{HarnessConfig, PORT_ENV_VAR};
use crate::error::HarnessError;

/// Resolve `path` to an executable file.
///
/// Anything containing a path separator is taken as-is, a bare name is
/// looked up on `PATH`.
pub fn resolve_executable(path: &Path) -> Result<PathBuf, HarnessError> {
    if path.as_os_str().is_empty() {
        return Err(HarnessError::not_found(path, "empty path"));
    }

    if path.components().count() > 1 || path.is_absolute() {
        return check_executable(path).map(|()| path.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")
        .ok_or_else(|| HarnessError::not_found(path, "PATH is not set"))?;

    for dir in std::env::split_paths(&search_path) {
        let candidate = dir.join(path);
        if check_executable(&candidate).is_ok() {
            return Ok(candidate);
        }
    }

    Err(HarnessError::not_found(path, "not found in PATH"))
}

fn check_executable(path: &Path) -> Result<(), HarnessError> {
    let metadata =
        std::fs::metadata(path).map_err(|e| HarnessError::not_found(path, e.to_string()))?;

    if !metadata.is_file() {
        return Err(HarnessError::not_found(path, "not a regular file"));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(HarnessError::not_found(path, "permission denied"));
        }
    }

    Ok(())
}

/// Running function binary. Dropping it kills and reaps the child.
#[derive(Debug)]
pub struct FunctionProcess {
    path: PathBuf,
    child: Option<Child>,
}

impl FunctionProcess {
    /// Start the binary at `path` with the RPC port from `config`.
    ///
    /// The child gets the full environment plus the port variable. Its stdin
    /// is closed and its stdout discarded since both belong to the relay;
    /// stderr is shared so function logs stay visible.
    pub fn spawn(path: &Path, config: &HarnessConfig) -> Result<Self, HarnessError> {
        let binary = resolve_executable(path)?;

        let child = Command::new(&binary)
            .env(PORT_ENV_VAR, config.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                path: binary.clone(),
                source,
            })?;

        info!(
            "Started {} (pid {}) with {}={}",
            binary.display(),
            child.id(),
            PORT_ENV_VAR,
            config.port
        );

        Ok(Self {
            path: binary,
            child: Some(child),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Exit status if the child has already terminated, without blocking.
    pub fn try_exit_status(&mut self) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to poll function process: {}", e);
                None
            }
        }
    }

    /// Kill the child and wait for it. Safe to call more than once.
    ///
    /// The handle is only released once the child has been reaped, so a
    /// failed attempt leaves it in place for the next call (or `Drop`).
    pub fn kill(&mut self) -> std::io::Result<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        debug!("Stopping function process {}", child.id());
        // An already exited child reports InvalidInput.
        if let Err(e) = child.kill() {
            if e.kind() != std::io::ErrorKind::InvalidInput {
                return Err(e);
            }
        }
        child.wait()?;

        self.child = None;
        Ok(())
    }
}

impl Drop for FunctionProcess {
    fn drop(&mut self) {
        if let Err(e) = self.kill() {
            warn!("Failed to stop function process {}: {}", self.path.display(), e);
        }
    }
}
