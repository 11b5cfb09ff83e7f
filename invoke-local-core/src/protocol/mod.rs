//! Relay input definitions
//!
//! One line of standard input is one [`InvocationRequest`]:
//! `{"event": <any JSON>, "context": <ClientContext or null>}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata about the calling client application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientApplication {
    pub installation_id: String,
    pub app_title: String,
    pub app_version_code: String,
    pub app_package_name: String,
}

/// Client context handed to the function next to the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientContext {
    #[serde(rename = "Client", alias = "client")]
    pub client: ClientApplication,
    pub env: BTreeMap<String, String>,
    pub custom: BTreeMap<String, String>,
}

/// A single invocation read from standard input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(default)]
    pub event: Value,
    #[serde(default)]
    pub context: Option<ClientContext>,
}

impl InvocationRequest {
    /// Parse one raw input line. Invalid UTF-8 is reported as a parse error.
    pub fn parse(line: impl AsRef<[u8]>) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line.as_ref())
    }

    /// Encode event and client context separately, the way the function
    /// runtime expects them on the wire. A missing context encodes as `null`.
    pub fn split(&self) -> Result<(Vec<u8>, Vec<u8>), serde_json::Error> {
        let payload = serde_json::to_vec(&self.event)?;
        let client_context = serde_json::to_vec(&self.context)?;
        Ok((payload, client_context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_null_context() {
        let req = InvocationRequest::parse(r#"{"event":{"a":1},"context":null}"#).unwrap();
        assert_eq!(req.event, json!({"a": 1}));
        assert!(req.context.is_none());

        let (payload, context) = req.split().unwrap();
        assert_eq!(payload, br#"{"a":1}"#);
        assert_eq!(context, b"null");
    }

    #[test]
    fn test_missing_fields_default() {
        let req = InvocationRequest::parse("{}").unwrap();
        assert_eq!(req.event, Value::Null);
        assert!(req.context.is_none());
    }

    #[test]
    fn test_parse_client_context() {
        let line = r#"{
            "event": "hi",
            "context": {
                "client": {"installation_id": "abc", "app_title": "demo"},
                "env": {"platform": "linux"},
                "custom": {"k": "v"}
            }
        }"#;
        let req = InvocationRequest::parse(line).unwrap();
        let ctx = req.context.clone().unwrap();
        assert_eq!(ctx.client.installation_id, "abc");
        assert_eq!(ctx.client.app_title, "demo");
        assert_eq!(ctx.client.app_version_code, "");
        assert_eq!(ctx.env.get("platform").map(String::as_str), Some("linux"));

        let (_, context) = req.split().unwrap();
        let encoded: Value = serde_json::from_slice(&context).unwrap();
        assert_eq!(encoded["Client"]["installation_id"], "abc");
        assert_eq!(encoded["custom"]["k"], "v");
    }

    #[test]
    fn test_malformed_line() {
        assert!(InvocationRequest::parse("{not json").is_err());
        assert!(InvocationRequest::parse(r#"{"event":1,"context":"nope"}"#).is_err());
        assert!(InvocationRequest::parse(b"{\"event\":\"\xff\"}").is_err());
    }
}
