//! Starter web service with request observability middleware.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod sample;

pub use config::schema::ServiceConfig;
pub use http::{HttpServer, ObservabilityLayer, TransactionId};
pub use lifecycle::Shutdown;
