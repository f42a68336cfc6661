//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → middleware/ (transaction id, structured request/response events)
//!     → handlers/ (health, info, sample)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use middleware::{ObservabilityLayer, TransactionId};
pub use server::{AppState, HttpServer, ServerError};
