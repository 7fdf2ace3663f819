//! Uniform response envelope returned by every tool.
//!
//! Every tool call produces exactly one [`Envelope`], serialized as pretty JSON:
//!
//! ```json
//! {
//!   "status": "success" | "error" | "pending",
//!   "message": "...",
//!   "data": { ... },
//!   "timestamp": "2025-01-01T00:00:00.000Z"
//! }
//! ```
//!
//! Some failure paths carry `error` (and hints such as `help` or `note`) at the
//! top level instead of inside `data`; clients are expected to accept both.
//! Every error constructor takes the error text, so an `error` status always
//! carries an `error` field somewhere.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
    Pending,
}

/// Tagged tool response.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Extra top-level keys (`error`, `help`, `note`, `task_id`, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub timestamp: String,
}

impl Envelope {
    fn new(status: EnvelopeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
            fields: Map::new(),
            timestamp: now_iso8601(),
        }
    }

    /// Successful result carrying `data`.
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self::new(EnvelopeStatus::Success, message).with_data(data)
    }

    /// Work still in progress; not a failure.
    pub fn pending(message: impl Into<String>, data: Value) -> Self {
        Self::new(EnvelopeStatus::Pending, message).with_data(data)
    }

    /// Failure with the error text at the top level.
    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(EnvelopeStatus::Error, message).with_field("error", error.into())
    }

    /// Failure with the error text inside `data`.
    ///
    /// `data` must be a JSON object; any other value is wrapped under `value`.
    pub fn error_in_data(message: impl Into<String>, error: impl Into<String>, data: Value) -> Self {
        let mut map = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        map.insert("error".to_string(), Value::String(error.into()));
        Self::new(EnvelopeStatus::Error, message).with_data(Value::Object(map))
    }

    /// Attach or replace the `data` payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a top-level key.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == EnvelopeStatus::Error
    }

    /// Whether an `error` key is present at the top level or in `data`.
    pub fn has_error_field(&self) -> bool {
        self.fields.contains_key("error")
            || self
                .data
                .as_ref()
                .and_then(|d| d.get("error"))
                .is_some()
    }

    /// Look up a key in `data`.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// Pretty-printed JSON body.
    pub fn to_json_pretty(&self) -> String {
        // Serializing a struct of strings and JSON values cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(
                "{{\"status\":\"error\",\"message\":\"serialization failed\",\"error\":\"{}\"}}",
                e
            )
        })
    }
}

/// Current UTC time as ISO-8601 with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let env = Envelope::success("done", json!({ "task_id": "42" }));
        let value: Value = serde_json::from_str(&env.to_json_pretty()).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "done");
        assert_eq!(value["data"]["task_id"], "42");
        assert!(value.get("error").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_error_has_top_level_error() {
        let env = Envelope::error("API key not configured", "missing keys").with_field("help", "set env");
        assert!(env.is_error());
        assert!(env.has_error_field());

        let value: Value = serde_json::from_str(&env.to_json_pretty()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "missing keys");
        assert_eq!(value["help"], "set env");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_error_in_data() {
        let env = Envelope::error_in_data("task failed", "bad prompt", json!({ "task_id": "7" }));
        assert!(env.has_error_field());
        assert_eq!(env.data_field("error"), Some(&json!("bad prompt")));
        assert_eq!(env.data_field("task_id"), Some(&json!("7")));
        assert!(!env.fields.contains_key("error"));
    }

    #[test]
    fn test_pending_is_not_error() {
        let env = Envelope::pending("still running", json!({ "status": "in_queue" }));
        assert!(!env.is_error());
        assert!(!env.is_success());
        let value: Value = serde_json::from_str(&env.to_json_pretty()).unwrap();
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn test_pretty_printed() {
        let env = Envelope::success("ok", json!({}));
        assert!(env.to_json_pretty().contains("\n  \"status\": \"success\""));
    }
}
