//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http::middleware (per request)
//!     → events.rs (Request / Response / Unhandled Exception)
//!     → sink.rs (tracing access target, or memory)
//!     → logging.rs access layer (one JSON object per line)
//!
//! Process start:
//!     → logging.rs (global tracing subscriber)
//!     → panic.rs (backtrace-recording panic hook)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Transaction ID flows through all records of a request
//! - The sink is injected into the middleware, never looked up globally

pub mod events;
pub mod logging;
pub mod panic;
pub mod sink;

pub use events::{ErrorEvent, Level, LogEvent, Payload, RequestEvent, ResponseEvent};
pub use sink::{EventSink, MemorySink, TracingSink, ACCESS_TARGET};
