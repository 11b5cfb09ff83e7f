//! echo-function
//!
//! Minimal function runtime for exercising invoke-local. Serves
//! `Function.Invoke` on the port from `_LAMBDA_SERVER_PORT` and answers with
//! the event and client context it received. An event of the form
//! `{"fail": "<message>"}` produces a function error instead.

use std::time::Duration;

use anyhow::{Context, Result};
use invoke_local_core::config::PORT_ENV_VAR;
use invoke_local_core::rpc::messages::{
    FunctionError, InvokeRequest, InvokeResponse, RpcRequest, RpcResponse, INVOKE_METHOD,
    PING_METHOD,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Optional startup delay, for testing slow function cold starts
const STARTUP_DELAY_ENV_VAR: &str = "ECHO_FUNCTION_STARTUP_DELAY_MS";

/// Optional file to record our pid in, so tests can check we were stopped
const PID_FILE_ENV_VAR: &str = "ECHO_FUNCTION_PID_FILE";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let port = std::env::var(PORT_ENV_VAR)
        .with_context(|| format!("{} is not set", PORT_ENV_VAR))?
        .parse::<u16>()
        .with_context(|| format!("{} is not a port number", PORT_ENV_VAR))?;

    if let Some(pid_file) = std::env::var_os(PID_FILE_ENV_VAR) {
        std::fs::write(&pid_file, std::process::id().to_string())
            .context("failed to write pid file")?;
    }

    if let Ok(delay) = std::env::var(STARTUP_DELAY_ENV_VAR) {
        let millis: u64 = delay.parse().context("invalid startup delay")?;
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Failed to listen on port {}", port))?;
    info!("echo-function listening on port {}", port);

    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("Connection from {}", peer);
        tokio::spawn(async move {
            if let Err(e) = serve(stream).await {
                warn!("Connection error: {:#}", e);
            }
        });
    }
}

async fn serve(stream: TcpStream) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let request: RpcRequest<Value> =
            serde_json::from_str(&line).context("malformed RPC request")?;

        let mut response = match handle(&request) {
            Ok(result) => serde_json::to_string(&RpcResponse::ok(request.id, result))?,
            Err(message) => {
                serde_json::to_string(&RpcResponse::<Value>::error(request.id, message))?
            }
        };
        response.push('\n');
        writer.write_all(response.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

fn handle(request: &RpcRequest<Value>) -> Result<Value, String> {
    match request.method.as_str() {
        INVOKE_METHOD => {
            let params = request
                .params
                .first()
                .cloned()
                .ok_or_else(|| "missing invoke request".to_string())?;
            let invoke: InvokeRequest =
                serde_json::from_value(params).map_err(|e| format!("bad invoke request: {}", e))?;
            serde_json::to_value(invoke_response(&invoke)).map_err(|e| e.to_string())
        }
        PING_METHOD => Ok(json!({})),
        other => Err(format!("rpc: can't find method {}", other)),
    }
}

fn invoke_response(request: &InvokeRequest) -> InvokeResponse {
    let event = decode_json(&request.payload);
    let context = decode_json(&request.client_context);

    if let Some(message) = event.get("fail").and_then(Value::as_str) {
        return InvokeResponse {
            payload: Vec::new(),
            error: Some(FunctionError {
                message: message.to_string(),
                error_type: "errorString".to_string(),
                stack_trace: Vec::new(),
            }),
        };
    }

    let body = json!({ "event": event, "context": context });
    InvokeResponse {
        payload: body.to_string().into_bytes(),
        error: None,
    }
}

fn decode_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
