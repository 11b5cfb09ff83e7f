//! invoke-local
//!
//! Runs a function binary as a child process and relays invocations from
//! stdin to its RPC port. stdout carries the relay output, logs go to stderr.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use invoke_local_core::{
    port, readiness, run_relay, FunctionClient, FunctionProcess, HarnessError, RelaySummary,
};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    match run(&args).await {
        Ok(summary) => {
            info!(
                "Input closed: {} processed, {} parse errors, {} failed invocations",
                summary.processed, summary.parse_errors, summary.invoke_errors
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// The function process is owned by this scope, so it is stopped before
/// `main` turns the result into an exit code.
async fn run(args: &cli::Args) -> Result<RelaySummary, HarnessError> {
    let config = args.harness_config();

    port::ensure_port_available(config.bind_addr())?;

    let mut function = FunctionProcess::spawn(&args.binary, &config)?;
    readiness::wait_for_function(&mut function, config.local_addr(), &config.readiness).await?;

    let client = FunctionClient::new(config.local_addr(), config.invoke_deadline);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    let summary = run_relay(stdin, &mut stdout, &client).await?;
    Ok(summary)
}
