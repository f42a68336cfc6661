//! Event sinks.
//!
//! # Responsibilities
//! - Receive finished [`LogEvent`]s from the request middleware
//! - Serialize them uniformly at the boundary
//!
//! # Design Decisions
//! - The middleware holds an `Arc<dyn EventSink>` built at startup
//! - Sinks must tolerate concurrent `emit` calls from many requests
//! - One `emit` call writes one whole record

use std::sync::Mutex;

use crate::observability::events::LogEvent;

/// Target used by [`TracingSink`] for every record.
pub const ACCESS_TARGET: &str = "starter_service::access";

/// Field of an access event that carries the serialized record.
pub const RECORD_FIELD: &str = "record";

/// Destination for request lifecycle events.
pub trait EventSink: Send + Sync + std::fmt::Debug {
    fn emit(&self, event: &LogEvent);
}

/// Emits events through the process tracing subscriber.
///
/// The serialized record travels as a string field, which
/// [`access_layer`](crate::observability::logging::access_layer) writes out
/// as the whole line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LogEvent) {
        let record = event.record().to_json().to_string();
        let transaction_id = event.transaction_id();
        let endpoint = event.endpoint().unwrap_or("-");

        match event {
            LogEvent::UnhandledException(_) => tracing::error!(
                target: ACCESS_TARGET,
                event = event.name(),
                transaction_id = %transaction_id,
                method = event.method(),
                path = event.path(),
                endpoint,
                record = record.as_str(),
                "{}", event.name()
            ),
            _ => tracing::info!(
                target: ACCESS_TARGET,
                event = event.name(),
                transaction_id = %transaction_id,
                method = event.method(),
                path = event.path(),
                endpoint,
                record = record.as_str(),
                "{}", event.name()
            ),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event emitted so far, in emission order.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        // A panic elsewhere while holding the lock must not drop later records.
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}
