//! Sample payloads posted to the message API.
//!
//! The API only looks at `type` and `message`; everything else rides along
//! untouched, so the optional fields are free-form and skipped when absent.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Message {
    pub fn new(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: None,
            data: None,
            code: None,
        }
    }

    pub fn with_timestamp(mut self, at: DateTime<Local>) -> Self {
        self.timestamp = Some(format_timestamp(at));
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Local wall-clock time without offset, microsecond precision.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// The fixed info / warning / error trio, in send order.
pub fn sample_messages(now: DateTime<Local>) -> Vec<Message> {
    let mut data = Map::new();
    data.insert("value".into(), Value::from(42));
    data.insert("status".into(), Value::from("active"));

    vec![
        Message::new(MessageKind::Info, "Hello from Python!").with_timestamp(now),
        Message::new(MessageKind::Warning, "This is a test warning").with_data(data),
        Message::new(MessageKind::Error, "Test error message").with_code("E001"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 1)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn samples_are_info_warning_error_in_order() {
        let kinds: Vec<_> = sample_messages(fixed_now())
            .into_iter()
            .map(|m| m.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![MessageKind::Info, MessageKind::Warning, MessageKind::Error]
        );
    }

    #[test]
    fn warning_sample_carries_nested_data() {
        let messages = sample_messages(fixed_now());
        let body = serde_json::to_string(&messages[1]).expect("serialize");
        let parsed: Value = serde_json::from_str(&body).expect("valid json");
        assert_eq!(parsed["type"], "warning");
        assert_eq!(parsed["data"]["value"], 42);
        assert_eq!(parsed["data"]["status"], "active");
        assert!(parsed.get("timestamp").is_none());
        assert!(parsed.get("code").is_none());
    }

    #[test]
    fn info_sample_has_iso_timestamp() {
        let messages = sample_messages(fixed_now());
        assert_eq!(
            messages[0].timestamp.as_deref(),
            Some("2024-03-05T09:07:01.000000")
        );
    }

    #[test]
    fn error_sample_serializes_without_optional_nulls() {
        let messages = sample_messages(fixed_now());
        let value = serde_json::to_value(&messages[2]).expect("serialize");
        assert_eq!(
            value,
            json!({"type": "error", "message": "Test error message", "code": "E001"})
        );
    }

    #[test]
    fn warning_sample_keeps_literal_field_order() {
        let messages = sample_messages(fixed_now());
        let body = serde_json::to_string(&messages[1]).expect("serialize");
        assert_eq!(
            body,
            r#"{"type":"warning","message":"This is a test warning","data":{"value":42,"status":"active"}}"#
        );
    }
}
