//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the starter service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Application identity used for routes and `/info`.
    pub app: AppConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings (logging and request middleware).
    pub observability: ObservabilityConfig,

    /// Settings for the `/sample` demo endpoint.
    pub sample: SampleConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
        }
    }
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, used as the service segment of every route.
    pub name: String,

    /// Deployment environment (dev, test, prod, ...).
    pub env: String,

    /// Free-text description reported by `/info`.
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "service".to_string(),
            env: "dev".to_string(),
            description: "Starter web service".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Output format of the process-wide tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which path segment names the service.
///
/// Route templates disagree on this, so it is an explicit choice rather
/// than something inferred from the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServicePosition {
    /// `/api/{version}/{service}/...`
    #[default]
    AfterVersion,
    /// `/api/{service}/{version}/...`
    BeforeVersion,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format of diagnostic logs. Access records are always JSON lines.
    pub log_format: LogFormat,

    /// Enable the request observability middleware.
    pub request_logging: bool,

    /// Leading path segment that marks a classified API route.
    pub api_prefix: String,

    /// Position of the service segment relative to the version segment.
    pub service_position: ServicePosition,

    /// Response header carrying the transaction id.
    pub correlation_header: String,

    /// Upper bound on body bytes buffered for logging.
    pub max_captured_body_bytes: usize,

    /// Hostname reported in request events; resolved from the OS when unset.
    pub hostname: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            request_logging: true,
            api_prefix: "api".to_string(),
            service_position: ServicePosition::default(),
            correlation_header: "transactionId".to_string(),
            max_captured_body_bytes: 1024 * 1024,
            hostname: None,
        }
    }
}

/// `/sample` endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Upstream returning a random joke as JSON with a `value` field.
    pub joke_api_url: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,

    /// Number of recent jokes kept and returned.
    pub recent_limit: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            joke_api_url: "https://api.chucknorris.io/jokes/random".to_string(),
            timeout_secs: 10,
            recent_limit: 10,
        }
    }
}
