//! Wire types for `Function.Invoke` over newline-delimited JSON-RPC 1.0
//!
//! The message shapes mirror the function runtime's invoke request and
//! response. The framing does not: Go runtimes serve this call over the
//! `net/rpc` gob codec, which this module does not speak. Only servers using
//! the JSON codec (such as the bundled `echo-function`) can be reached.
//! Byte fields are base64 strings.

use serde::{Deserialize, Serialize};

pub const INVOKE_METHOD: &str = "Function.Invoke";
pub const PING_METHOD: &str = "Function.Ping";

/// JSON-RPC request envelope. `params` always holds exactly one argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest<T> {
    pub method: String,
    pub params: Vec<T>,
    pub id: u64,
}

impl<T> RpcRequest<T> {
    pub fn new(id: u64, method: impl Into<String>, params: T) -> Self {
        Self {
            method: method.into(),
            params: vec![params],
            id,
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    pub id: u64,
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> RpcResponse<T> {
    pub fn ok(id: u64, result: T) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InvokeRequest {
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    pub request_id: String,
    pub x_amzn_trace_id: String,
    pub deadline: Timestamp,
    pub invoked_function_arn: String,
    pub cognito_identity_id: String,
    pub cognito_identity_pool_id: String,
    #[serde(with = "base64_bytes")]
    pub client_context: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InvokeResponse {
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    pub error: Option<FunctionError>,
}

/// Error returned by the function handler itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionError {
    #[serde(rename = "errorMessage")]
    pub message: String,
    #[serde(rename = "errorType")]
    pub error_type: String,
    #[serde(rename = "stackTrace", skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<StackFrame>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackFrame {
    pub path: String,
    pub line: i32,
    pub label: String,
}

/// Base64 encoding for byte fields. `null` decodes as empty.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoke_request_wire_names() {
        let req = RpcRequest::new(
            7,
            INVOKE_METHOD,
            InvokeRequest {
                payload: br#"{"a":1}"#.to_vec(),
                request_id: "0".to_string(),
                client_context: b"null".to_vec(),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["method"], "Function.Invoke");
        assert_eq!(value["id"], 7);
        let params = &value["params"][0];
        assert_eq!(params["Payload"], "eyJhIjoxfQ==");
        assert_eq!(params["ClientContext"], "bnVsbA==");
        assert_eq!(params["RequestId"], "0");
        assert!(params.get("XAmznTraceId").is_some());
        assert_eq!(params["Deadline"], json!({"Seconds": 0, "Nanos": 0}));
    }

    #[test]
    fn test_invoke_response_with_function_error() {
        let raw = json!({
            "id": 3,
            "result": {
                "Payload": null,
                "Error": {"errorMessage": "boom", "errorType": "errorString"}
            },
            "error": null
        });

        let resp: RpcResponse<InvokeResponse> = serde_json::from_value(raw).unwrap();
        let result = resp.result.unwrap();
        assert!(result.payload.is_empty());
        let error = result.error.unwrap();
        assert_eq!(error.message, "boom");
        assert_eq!(error.error_type, "errorString");
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let raw = json!({"Payload": "%%%"});
        assert!(serde_json::from_value::<InvokeResponse>(raw).is_err());
    }
}
