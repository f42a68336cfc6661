//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check that names used in routes and headers are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("{field} must be a non-empty path segment without '/', got `{value}`")]
    PathSegment { field: &'static str, value: String },
    #[error("observability.correlation_header `{0}` is not a valid header name")]
    HeaderName(String),
    #[error("sample.joke_api_url `{0}` is not a valid URL")]
    Url(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (field, value) in [
        ("app.name", &config.app.name),
        ("observability.api_prefix", &config.observability.api_prefix),
    ] {
        if value.is_empty() || value.contains('/') {
            errors.push(ValidationError::PathSegment { field, value: value.clone() });
        }
    }

    if HeaderName::try_from(config.observability.correlation_header.as_str()).is_err() {
        errors.push(ValidationError::HeaderName(
            config.observability.correlation_header.clone(),
        ));
    }

    if url::Url::parse(&config.sample.joke_api_url).is_err() {
        errors.push(ValidationError::Url(config.sample.joke_api_url.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.observability.max_captured_body_bytes == 0 {
        errors.push(ValidationError::Zero("observability.max_captured_body_bytes"));
    }
    if config.sample.timeout_secs == 0 {
        errors.push(ValidationError::Zero("sample.timeout_secs"));
    }
    if config.sample.recent_limit == 0 {
        errors.push(ValidationError::Zero("sample.recent_limit"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
