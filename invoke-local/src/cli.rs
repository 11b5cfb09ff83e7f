//! Command line arguments for invoke-local

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use invoke_local_core::config::DEFAULT_PORT;
use invoke_local_core::HarnessConfig;

#[derive(Parser, Debug)]
#[command(
    name = "invoke-local",
    version,
    about = "Run a function binary locally and relay stdin invocations to it",
    long_about = "Starts the function binary with its RPC port in the environment,\n\
                  waits for the port to open, then sends every stdin line\n\
                  ({\"event\": ..., \"context\": ...}) to the function and prints the response."
)]
pub struct Args {
    /// Function binary to run (a path, or a name looked up on PATH)
    pub binary: PathBuf,

    /// Port the function is told to serve RPC on
    #[arg(long, env = "INVOKE_LOCAL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seconds to wait for the function's port to open
    #[arg(long, env = "INVOKE_LOCAL_READINESS_TIMEOUT", default_value_t = 120)]
    pub readiness_timeout: u64,

    /// Milliseconds between readiness probes
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Invocation deadline passed to the function, in seconds
    #[arg(long, default_value_t = 300)]
    pub invoke_deadline: u64,
}

impl Args {
    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new(self.port)
            .with_readiness_timeout(Duration::from_secs(self.readiness_timeout))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_invoke_deadline(Duration::from_secs(self.invoke_deadline))
    }
}
