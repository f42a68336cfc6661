//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::connect_info::MockConnectInfo;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::fmt::MakeWriter;

use starter_service::config::ServicePosition;
use starter_service::http::middleware::PathClassifier;
use starter_service::observability::{ErrorEvent, LogEvent, MemorySink, RequestEvent, ResponseEvent};
use starter_service::ObservabilityLayer;

/// Peer address injected by [`observed`].
pub const PEER: ([u8; 4], u16) = ([10, 0, 0, 1], 4242);

pub fn peer() -> SocketAddr {
    SocketAddr::from(PEER)
}

/// Layer for tests: `api` prefix, service after version, fixed hostname.
pub fn layer(sink: &Arc<MemorySink>) -> ObservabilityLayer {
    ObservabilityLayer::new(
        sink.clone(),
        PathClassifier::new("api", ServicePosition::AfterVersion),
    )
    .with_hostname("test-host")
}

/// Wrap `router` with the observability layer and a fake peer address.
pub fn observed(router: Router, sink: &Arc<MemorySink>) -> Router {
    router
        .layer(layer(sink))
        .layer(MockConnectInfo(peer()))
}

pub fn as_request(event: &LogEvent) -> &RequestEvent {
    match event {
        LogEvent::Request(e) => e,
        other => panic!("expected Request event, got {}", other.name()),
    }
}

pub fn as_response(event: &LogEvent) -> &ResponseEvent {
    match event {
        LogEvent::Response(e) => e,
        other => panic!("expected Response event, got {}", other.name()),
    }
}

pub fn as_error(event: &LogEvent) -> &ErrorEvent {
    match event {
        LogEvent::UnhandledException(e) => e,
        other => panic!("expected Unhandled Exception event, got {}", other.name()),
    }
}

/// In-memory writer for rendered subscriber output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Rendered output split into lines.
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Start a joke API on an ephemeral port returning `joke 0`, `joke 1`, ...
///
/// Returns the full URL of its random-joke endpoint.
pub async fn start_mock_joke_api() -> String {
    let counter = Arc::new(AtomicU32::new(0));
    let app = Router::new().route(
        "/jokes/random",
        get(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "id": format!("j{n}"),
                    "value": format!("joke {n}"),
                    "categories": [],
                }))
            }
        }),
    );
    serve(app).await
}

/// Start an upstream that always fails with `status`.
pub async fn start_failing_joke_api(status: StatusCode) -> String {
    let app = Router::new().route("/jokes/random", get(move || async move { status }));
    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/jokes/random")
}
