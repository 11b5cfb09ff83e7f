//! `Function.Invoke` client over newline-delimited JSON-RPC
//!
//! Dials the function's port for every call, sends one JSON-RPC request line
//! and reads one response line. Runtimes that serve the gob codec (the Go
//! default) are not compatible; see [`super::messages`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use super::messages::{
    InvokeRequest, InvokeResponse, RpcRequest, RpcResponse, Timestamp, INVOKE_METHOD,
    PING_METHOD,
};
use super::{Invoke, RpcError};

pub struct FunctionClient {
    addr: SocketAddr,
    invoke_deadline: Duration,
    request_id: AtomicU64,
}

impl FunctionClient {
    pub fn new(addr: SocketAddr, invoke_deadline: Duration) -> Self {
        Self {
            addr,
            invoke_deadline,
            request_id: AtomicU64::new(1),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check that the runtime answers RPC calls at all.
    pub async fn ping(&self) -> Result<(), RpcError> {
        let _: serde_json::Value = self.call(PING_METHOD, serde_json::json!({})).await?;
        Ok(())
    }

    fn deadline(&self) -> Timestamp {
        let at = SystemTime::now()
            .checked_add(self.invoke_deadline)
            .unwrap_or_else(SystemTime::now);
        let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
        Timestamp {
            seconds: since_epoch.as_secs() as i64,
            nanos: i64::from(since_epoch.subsec_nanos()),
        }
    }

    /// Send a JSON-RPC request and wait for its response
    async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest::new(id, method, params);

        let mut content = serde_json::to_vec(&request).map_err(RpcError::Encode)?;
        content.push(b'\n');

        let stream = TcpStream::connect(self.addr).await?;
        let (reader, mut writer) = stream.into_split();

        debug!("Sending {} (id {}) to {}", method, id, self.addr);
        writer.write_all(&content).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(RpcError::ConnectionClosed);
        }

        let response: RpcResponse<R> = serde_json::from_str(&line).map_err(RpcError::Decode)?;
        if response.id != id {
            return Err(RpcError::IdMismatch {
                expected: id,
                got: response.id,
            });
        }
        if let Some(message) = response.error {
            return Err(RpcError::Remote(message));
        }
        response.result.ok_or(RpcError::EmptyResult)
    }
}

#[async_trait]
impl Invoke for FunctionClient {
    async fn invoke(&self, payload: &[u8], client_context: &[u8]) -> Result<Vec<u8>, RpcError> {
        let request = InvokeRequest {
            payload: payload.to_vec(),
            request_id: "0".to_string(),
            deadline: self.deadline(),
            client_context: client_context.to_vec(),
            ..Default::default()
        };

        let response: InvokeResponse = self.call(INVOKE_METHOD, request).await?;

        if let Some(error) = response.error {
            return Err(RpcError::Function {
                message: error.message,
                error_type: error.error_type,
            });
        }

        Ok(response.payload)
    }
}
