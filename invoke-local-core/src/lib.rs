//! invoke-local Core Library
//!
//! Building blocks for running a function binary locally:
//! - port pre-flight check and child process launch
//! - readiness polling of the function's RPC port
//! - the `Function.Invoke` RPC client
//! - the stdin relay loop

pub mod config;
pub mod error;
pub mod launcher;
pub mod port;
pub mod protocol;
pub mod readiness;
pub mod relay;
pub mod rpc;

pub use config::{HarnessConfig, ReadinessPolicy};
pub use error::HarnessError;
pub use launcher::FunctionProcess;
pub use protocol::{ClientApplication, ClientContext, InvocationRequest};
pub use relay::{run_relay, RelaySummary};
pub use rpc::{FunctionClient, Invoke, RpcError};
