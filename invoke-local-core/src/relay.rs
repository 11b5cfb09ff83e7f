//! Invocation relay
//!
//! Reads newline-delimited invocation requests, calls the function once per
//! line and writes the raw response. Bad lines and failed calls are logged
//! and skipped; only I/O errors on the relay streams end the loop early.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::protocol::InvocationRequest;
use crate::rpc::Invoke;

pub const INPUT_LABEL: &str = "Input: ";
pub const RESPONSE_LABEL: &str = "Received Response: ";

/// Counters for one relay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    /// Lines that produced a response
    pub processed: usize,
    pub parse_errors: usize,
    pub invoke_errors: usize,
}

/// Relay every line of `input` to `invoker` until end of input.
pub async fn run_relay<R, W, I>(
    input: R,
    output: &mut W,
    invoker: &I,
) -> std::io::Result<RelaySummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    I: Invoke + ?Sized,
{
    let mut summary = RelaySummary::default();
    let mut input = input;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = trim_line_ending(&buf);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        write_labeled(output, INPUT_LABEL, line).await?;

        let request = match InvocationRequest::parse(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse input: {}", e);
                summary.parse_errors += 1;
                continue;
            }
        };

        let (payload, client_context) = match request.split() {
            Ok(parts) => parts,
            Err(e) => {
                error!("Failed to encode invocation: {}", e);
                summary.parse_errors += 1;
                continue;
            }
        };

        debug!("Invoking with {} byte payload", payload.len());
        match invoker.invoke(&payload, &client_context).await {
            Ok(response) => {
                write_labeled(output, RESPONSE_LABEL, &response).await?;
                summary.processed += 1;
            }
            Err(e) => {
                error!("Invocation failed: {}", e);
                summary.invoke_errors += 1;
            }
        }
    }

    Ok(summary)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

async fn write_labeled<W>(output: &mut W, label: &str, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(label.as_bytes()).await?;
    output.write_all(body).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
