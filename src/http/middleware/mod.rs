//! HTTP middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → observe.rs (transaction id, Request event)
//!         → path.rs (service / version / endpoint labels)
//!         → body.rs (capture + replay request body)
//!     → wrapped router
//!     → observe.rs (Response or Unhandled Exception event, correlation header)
//!         → body.rs (capture + replay response body)
//! ```

pub mod body;
pub mod observe;
pub mod path;

pub use observe::{ObservabilityLayer, ObservabilityService, TransactionId, TRANSACTION_ID_HEADER};
pub use path::{PathClassifier, PathLabels};
