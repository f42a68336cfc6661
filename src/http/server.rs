//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (panic translation, observability, timeout)
//! - Bind server to listener with peer address info
//! - Stop on the shared shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::config::{ServiceConfig, ServicePosition};
use crate::http::handlers::{health, info, sample};
use crate::http::middleware::observe::local_hostname;
use crate::http::middleware::ObservabilityLayer;
use crate::lifecycle::Shutdown;
use crate::observability::EventSink;
use crate::sample::{JokeClient, RecentJokes, SampleError};

/// Error type for server setup and operation.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(std::io::Error),
    #[error("server error: {0}")]
    Serve(std::io::Error),
    #[error("invalid correlation header: {0}")]
    Header(#[from] axum::http::header::InvalidHeaderName),
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub hostname: Arc<str>,
    pub jokes: JokeClient,
    pub recent: Arc<RecentJokes>,
}

/// HTTP server for the starter service.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and event sink.
    pub fn new(config: ServiceConfig, sink: Arc<dyn EventSink>) -> Result<Self, ServerError> {
        let config = Arc::new(config);
        let hostname: Arc<str> = config
            .observability
            .hostname
            .clone()
            .unwrap_or_else(local_hostname)
            .into();

        let state = AppState {
            config: config.clone(),
            hostname,
            jokes: JokeClient::new(&config.sample)?,
            recent: Arc::new(RecentJokes::new(config.sample.recent_limit)),
        };

        let router = Self::build_router(&config, state, sink)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layer order, outermost first: panic translation, observability, timeout.
    #[allow(deprecated)]
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        sink: Arc<dyn EventSink>,
    ) -> Result<Router, ServerError> {
        let base = route_base(config);
        let mut router = Router::new()
            .route(&format!("{base}/health"), get(health::health))
            .route(&format!("{base}/info"), get(info::info))
            .route(&format!("{base}/sample"), get(sample::sample))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        if config.observability.request_logging {
            router = router.layer(ObservabilityLayer::from_config(&config.observability, sink)?);
        } else {
            tracing::info!("Request observability middleware disabled");
        }

        Ok(router.layer(CatchPanicLayer::new()))
    }

    /// Run the server on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr().map_err(ServerError::Bind)?;
        tracing::info!(
            address = %addr,
            app = %self.config.app.name,
            base = %route_base(&self.config),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Path prefix shared by all routes, laid out per the configured service position.
pub fn route_base(config: &ServiceConfig) -> String {
    let prefix = &config.observability.api_prefix;
    let name = &config.app.name;
    match config.observability.service_position {
        ServicePosition::AfterVersion => format!("/{prefix}/v1/{name}"),
        ServicePosition::BeforeVersion => format!("/{prefix}/{name}/v1"),
    }
}
