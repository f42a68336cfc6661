//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide tracing subscriber once at startup
//! - Select JSON or pretty output for diagnostic logs
//! - Write access records (target [`ACCESS_TARGET`]) as one JSON object per line
//! - Resolve the log level from the environment, then config
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level so operators can override
//! - `try_init` so a second initialization (tests) is reported, not fatal
//! - Access records bypass the fmt field encoder: the serialized record is
//!   the whole line, whatever `log_format` says

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::observability::sink::{ACCESS_TARGET, RECORD_FIELD};

/// Install the global subscriber.
///
/// Returns an error if a global subscriber is already set.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "starter_service={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(access_layer(std::io::stdout));
    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_filter(filter_fn(|meta| !is_access(meta))),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_filter(filter_fn(|meta| !is_access(meta))))
            .try_init(),
    }
}

/// Layer writing each access event's serialized record as a line to `make_writer`.
///
/// Events on other targets are ignored.
pub fn access_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(AccessRecord)
        .with_writer(make_writer)
        .with_filter(filter_fn(is_access))
}

fn is_access(meta: &Metadata<'_>) -> bool {
    meta.target() == ACCESS_TARGET
}

struct AccessRecord;

impl<S, N> FormatEvent<S, N> for AccessRecord
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        match visitor.record {
            Some(record) => writeln!(writer, "{record}"),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct RecordVisitor {
    record: Option<String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == RECORD_FIELD {
            self.record = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_access_layer_writes_record_verbatim() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::registry().with(access_layer(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: ACCESS_TARGET, record = r#"{"event":"Request"}"#, "Request");
            tracing::info!(record = "ignored", "not an access event");
        });

        let out = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "{\"event\":\"Request\"}\n");
    }
}
