//! RPC module
//!
//! Client side of the function runtime's `Function.Invoke` call.

mod client;
pub mod messages;

use async_trait::async_trait;
use thiserror::Error;

pub use client::FunctionClient;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid response from function: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: u64 },

    #[error("RPC error: {0}")]
    Remote(String),

    #[error("empty RPC response")]
    EmptyResult,

    #[error("function error ({error_type}): {message}")]
    Function { message: String, error_type: String },
}

/// Something that can run one invocation of the function.
///
/// `payload` and `client_context` are already JSON-encoded. The raw response
/// payload is returned as-is.
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke(&self, payload: &[u8], client_context: &[u8]) -> Result<Vec<u8>, RpcError>;
}
