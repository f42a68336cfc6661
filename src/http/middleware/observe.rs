//! Request observability layer.
//!
//! # Responsibilities
//! - Assign a transaction id to every request and echo it in a response header
//! - Classify the path into service / version / endpoint labels
//! - Emit one Request event before delegating and exactly one Response or
//!   Unhandled Exception event after
//! - Capture request and response bodies for logging without altering them
//! - Treat a panic while reading either body like a panic in the service
//!
//! # Design Decisions
//! - Pure observer on the failure path: errors are returned as-is and panics
//!   are resumed with the original payload
//! - A dropped (cancelled) request still gets its terminal event, from a
//!   drop guard
//! - All per-request state lives in the request future; the layer only
//!   shares immutable settings and the sink

use std::any::Any;
use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::connect_info::{ConnectInfo, MockConnectInfo};
use axum::http::header::InvalidHeaderName;
use axum::http::{HeaderName, HeaderValue, Method, Request, Response};
use axum::BoxError;
use bytes::Bytes;
use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::http::middleware::body;
use crate::http::middleware::path::PathClassifier;
use crate::observability::panic::{payload_message, take_trace};
use crate::observability::{ErrorEvent, EventSink, LogEvent, Payload, RequestEvent, ResponseEvent};

/// Correlation header used when none is configured.
pub const TRANSACTION_ID_HEADER: HeaderName = HeaderName::from_static("transactionid");

/// Exception text recorded when a request future is dropped before completing.
pub const CANCELLED: &str = "request cancelled before completion";

/// Per-request correlation id, also available to handlers as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub Uuid);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
struct Settings {
    sink: Arc<dyn EventSink>,
    classifier: PathClassifier,
    header: HeaderName,
    hostname: String,
    body_limit: usize,
}

/// Layer that wraps services with [`ObservabilityService`].
#[derive(Debug, Clone)]
pub struct ObservabilityLayer {
    settings: Arc<Settings>,
}

impl ObservabilityLayer {
    pub fn new(sink: Arc<dyn EventSink>, classifier: PathClassifier) -> Self {
        Self {
            settings: Arc::new(Settings {
                sink,
                classifier,
                header: TRANSACTION_ID_HEADER,
                hostname: local_hostname(),
                body_limit: 1024 * 1024,
            }),
        }
    }

    /// Build a layer from the observability section of the config.
    pub fn from_config(
        config: &ObservabilityConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, InvalidHeaderName> {
        let header = HeaderName::try_from(config.correlation_header.as_str())?;
        let classifier = PathClassifier::new(config.api_prefix.clone(), config.service_position);
        let mut layer = Self::new(sink, classifier)
            .with_header(header)
            .with_body_limit(config.max_captured_body_bytes);
        if let Some(hostname) = &config.hostname {
            layer = layer.with_hostname(hostname.clone());
        }
        Ok(layer)
    }

    pub fn with_header(mut self, header: HeaderName) -> Self {
        Arc::make_mut(&mut self.settings).header = header;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.settings).hostname = hostname.into();
        self
    }

    /// Maximum body bytes buffered for a single logged payload.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        Arc::make_mut(&mut self.settings).body_limit = limit;
        self
    }
}

impl<S> Layer<S> for ObservabilityLayer {
    type Service = ObservabilityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObservabilityService {
            inner,
            settings: self.settings.clone(),
        }
    }
}

/// Service produced by [`ObservabilityLayer`].
#[derive(Debug, Clone)]
pub struct ObservabilityService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S, B> Service<Request<Body>> for ObservabilityService<S>
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        let transaction_id = TransactionId(Uuid::new_v4());
        let span = tracing::info_span!(
            "request",
            transaction_id = %transaction_id,
            method = %request.method(),
            path = %request.uri().path(),
        );

        Box::pin(observe(self.settings.clone(), inner, request, transaction_id).instrument(span))
    }
}

async fn observe<S, B>(
    settings: Arc<Settings>,
    mut inner: S,
    request: Request<Body>,
    transaction_id: TransactionId,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<Body>, Response = Response<B>>,
    S::Error: fmt::Display,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let labels = settings.classifier.classify(&path);

    let mut exchange = Exchange::new(
        settings.clone(),
        RequestEvent {
            transaction_id: transaction_id.0,
            method: method.to_string(),
            path,
            service: labels.service,
            version: labels.version,
            endpoint: labels.endpoint,
            remote_addr: remote_addr(&request),
            hostname: settings.hostname.clone(),
            timestamp: Utc::now(),
            query_params: request.uri().query().map(parse_query).unwrap_or_default(),
            request_body: None,
        },
    );

    let (mut parts, body) = request.into_parts();
    let body = if carries_body(&method) {
        match AssertUnwindSafe(body::capture(body, settings.body_limit))
            .catch_unwind()
            .await
        {
            Ok(captured) => {
                exchange.announce(captured.capture.payload());
                captured.body
            }
            Err(panic) => exchange.panicked(panic),
        }
    } else {
        exchange.announce(None);
        body
    };
    parts.extensions.insert(transaction_id);
    let request = Request::from_parts(parts, body);

    let limit = settings.body_limit;
    let outcome = AssertUnwindSafe(async move {
        let response = inner.call(request).await?;
        let (parts, body) = response.into_parts();
        let captured = body::capture(Body::new(body), limit).await;
        Ok::<_, S::Error>((parts, captured))
    })
    .catch_unwind()
    .await;

    match outcome {
        Ok(Ok((mut parts, captured))) => {
            if let Ok(value) = HeaderValue::from_str(&transaction_id.to_string()) {
                parts.headers.insert(settings.header.clone(), value);
            }
            exchange.respond(parts.status.as_u16(), captured.capture.payload());
            Ok(Response::from_parts(parts, captured.body))
        }
        Ok(Err(error)) => {
            exchange.fail(error.to_string(), Backtrace::force_capture().to_string());
            Err(error)
        }
        Err(panic) => exchange.panicked(panic),
    }
}

/// Event bookkeeping for one request.
///
/// The Request event is held until the request body has been read and is
/// always emitted before the terminal event. Dropping the exchange
/// unfinished means the request future was cancelled.
struct Exchange {
    settings: Arc<Settings>,
    transaction_id: Uuid,
    method: String,
    path: String,
    service: Option<String>,
    endpoint: Option<String>,
    pending: Option<RequestEvent>,
    request_body: Option<Payload>,
    start: Instant,
    finished: bool,
}

impl Exchange {
    fn new(settings: Arc<Settings>, request: RequestEvent) -> Self {
        Self {
            settings,
            transaction_id: request.transaction_id,
            method: request.method.clone(),
            path: request.path.clone(),
            service: request.service.clone(),
            endpoint: request.endpoint.clone(),
            pending: Some(request),
            request_body: None,
            start: Instant::now(),
            finished: false,
        }
    }

    /// Emit the Request event, once.
    fn announce(&mut self, request_body: Option<Payload>) {
        if let Some(mut request) = self.pending.take() {
            request.request_body = request_body.clone();
            self.request_body = request_body;
            self.settings.sink.emit(&LogEvent::Request(request));
        }
    }

    fn respond(&mut self, status: u16, response_body: Option<Payload>) {
        self.finished = true;
        let duration_seconds = round4(self.start.elapsed().as_secs_f64());
        self.settings.sink.emit(&LogEvent::Response(ResponseEvent {
            transaction_id: self.transaction_id,
            method: self.method.clone(),
            path: self.path.clone(),
            service: self.service.clone(),
            endpoint: self.endpoint.clone(),
            timestamp: Utc::now(),
            duration_seconds,
            status,
            response_body,
        }));
    }

    fn fail(&mut self, exception: String, stack_trace: String) {
        self.finished = true;
        self.announce(None);
        self.settings.sink.emit(&LogEvent::UnhandledException(ErrorEvent {
            transaction_id: self.transaction_id,
            method: self.method.clone(),
            path: self.path.clone(),
            service: self.service.clone(),
            endpoint: self.endpoint.clone(),
            timestamp: Utc::now(),
            exception,
            stack_trace,
            request_body: self.request_body.take(),
        }));
    }

    /// Record a caught panic and resume it with the original payload.
    fn panicked(&mut self, panic: Box<dyn Any + Send>) -> ! {
        let trace = take_trace().unwrap_or_else(|| Backtrace::force_capture().to_string());
        self.fail(payload_message(panic.as_ref()), trace);
        std::panic::resume_unwind(panic)
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        if !self.finished {
            self.fail(CANCELLED.to_string(), Backtrace::force_capture().to_string());
        }
    }
}

fn remote_addr(request: &Request<Body>) -> Option<String> {
    let extensions = request.extensions();
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr)
        .or_else(|| {
            extensions
                .get::<MockConnectInfo<SocketAddr>>()
                .map(|MockConnectInfo(addr)| addr)
        })
        .map(ToString::to_string)
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn round4(secs: f64) -> f64 {
    (secs * 10_000.0).round() / 10_000.0
}

pub(crate) fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
