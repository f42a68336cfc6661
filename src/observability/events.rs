//! Structured request lifecycle events.
//!
//! One event type per lifecycle point, each with a fixed field set. Sinks
//! serialize them uniformly through [`LogRecord`], which adds the `level`
//! and `event` tags to the variant's fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Best-effort decoded body, captured only for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Body parsed as JSON.
    Json(serde_json::Value),
    /// Body that is not JSON, as text.
    Text(String),
}

/// Severity attached to every serialized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Error,
}

/// Emitted before the request is handed to the wrapped service.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEvent {
    pub transaction_id: Uuid,
    pub method: String,
    pub path: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub remote_addr: Option<String>,
    pub hostname: String,
    pub timestamp: DateTime<Utc>,
    pub query_params: BTreeMap<String, String>,
    pub request_body: Option<Payload>,
}

/// Emitted after the wrapped service produced a response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEvent {
    pub transaction_id: Uuid,
    pub method: String,
    pub path: String,
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub status: u16,
    pub response_body: Option<Payload>,
}

/// Emitted when the wrapped service errored, panicked or was cancelled.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub transaction_id: Uuid,
    pub method: String,
    pub path: String,
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub exception: String,
    pub stack_trace: String,
    pub request_body: Option<Payload>,
}

/// A request lifecycle event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum LogEvent {
    #[serde(rename = "Request")]
    Request(RequestEvent),
    #[serde(rename = "Response")]
    Response(ResponseEvent),
    #[serde(rename = "Unhandled Exception")]
    UnhandledException(ErrorEvent),
}

impl LogEvent {
    /// Name carried in the `event` field.
    pub fn name(&self) -> &'static str {
        match self {
            LogEvent::Request(_) => "Request",
            LogEvent::Response(_) => "Response",
            LogEvent::UnhandledException(_) => "Unhandled Exception",
        }
    }

    pub fn level(&self) -> Level {
        match self {
            LogEvent::UnhandledException(_) => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn transaction_id(&self) -> Uuid {
        match self {
            LogEvent::Request(e) => e.transaction_id,
            LogEvent::Response(e) => e.transaction_id,
            LogEvent::UnhandledException(e) => e.transaction_id,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            LogEvent::Request(e) => &e.method,
            LogEvent::Response(e) => &e.method,
            LogEvent::UnhandledException(e) => &e.method,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            LogEvent::Request(e) => &e.path,
            LogEvent::Response(e) => &e.path,
            LogEvent::UnhandledException(e) => &e.path,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            LogEvent::Request(e) => e.endpoint.as_deref(),
            LogEvent::Response(e) => e.endpoint.as_deref(),
            LogEvent::UnhandledException(e) => e.endpoint.as_deref(),
        }
    }

    /// Wrap for serialization with the level tag.
    pub fn record(&self) -> LogRecord<'_> {
        LogRecord {
            level: self.level(),
            event: self,
        }
    }
}

/// Serialized shape of an event: `{"level": .., "event": .., <fields>}`.
#[derive(Debug, Serialize)]
pub struct LogRecord<'a> {
    pub level: Level,
    #[serde(flatten)]
    pub event: &'a LogEvent,
}

impl LogRecord<'_> {
    pub fn to_json(&self) -> serde_json::Value {
        // All fields are plain data; serialization only fails for non-string map keys.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_event() -> LogEvent {
        LogEvent::UnhandledException(ErrorEvent {
            transaction_id: Uuid::nil(),
            method: "POST".into(),
            path: "/api/v1/orders".into(),
            service: Some("orders".into()),
            endpoint: Some("orders".into()),
            timestamp: Utc::now(),
            exception: "boom".into(),
            stack_trace: "frame".into(),
            request_body: Some(Payload::Json(json!({"qty": 2}))),
        })
    }

    #[test]
    fn test_record_is_flat_and_tagged() {
        let event = error_event();
        let value = event.record().to_json();

        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["event"], "Unhandled Exception");
        assert_eq!(value["exception"], "boom");
        assert_eq!(value["transaction_id"], Uuid::nil().to_string());
        assert_eq!(value["request_body"], json!({"qty": 2}));
    }

    #[test]
    fn test_text_payload_serializes_as_string() {
        let value = serde_json::to_value(Payload::Text("not json".into())).unwrap();
        assert_eq!(value, json!("not json"));
    }

    #[test]
    fn test_accessors() {
        let event = error_event();
        assert_eq!(event.name(), "Unhandled Exception");
        assert_eq!(event.level(), Level::Error);
        assert_eq!(event.method(), "POST");
        assert_eq!(event.endpoint(), Some("orders"));
    }
}
