//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (correlation, tracing, timeout, panic catcher)
//! - Bind server to listener
//! - Stop on the shutdown broadcast
//!
//! Middleware order, outermost first:
//! 1. `Correlation` -- resolves the ID and opens the request's log context
//! 2. `Tracing` -- tower-http request spans, already tagged with the ID
//! 3. `Timeout` -- 408 after `timeouts.request_secs`
//! 4. `CatchPanic` -- logs the panic and answers a generic 500
//!
//! Keeping the correlation layer outermost means timeout and panic
//! responses still carry `X-Correlation-Id`.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::HeaderName;
use axum::http::{Response, StatusCode};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::http::correlation::{CorrelationLayer, X_CORRELATION_ID};
use crate::http::routes;
use crate::observability::LogService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<dyn LogService>,
}

/// A handler panicked; reported through the log service.
#[derive(Debug, Error)]
#[error("handler panicked: {0}")]
pub struct HandlerPanic(String);

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig, log: Arc<dyn LogService>) -> Self {
        Self::with_routes(config, log, Router::new())
    }

    /// Like [`HttpServer::new`], with `extra` controllers merged next to the
    /// built-in API routes and behind the same middleware.
    pub fn with_routes(
        config: ServiceConfig,
        log: Arc<dyn LogService>,
        extra: Router<AppState>,
    ) -> Self {
        let router = Self::build_router(&config, log, extra);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &ServiceConfig,
        log: Arc<dyn LogService>,
        extra: Router<AppState>,
    ) -> Router {
        let header = HeaderName::try_from(config.correlation.header_name.as_str())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %config.correlation.header_name,
                    "Invalid correlation header name, using default"
                );
                HeaderName::from_static(X_CORRELATION_ID)
            });

        let panic_log = Arc::clone(&log);
        let on_panic = move |payload: Box<dyn Any + Send + 'static>| {
            let detail = payload
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown panic payload".to_string());
            panic_log.error(
                &HandlerPanic(detail),
                "Unhandled failure while serving request",
                &[],
            );

            let mut response = Response::new("Internal Server Error".to_string());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        };

        let state = AppState {
            log: Arc::clone(&log),
        };

        Router::new()
            .merge(routes::api_router())
            .merge(extra)
            .with_state(state)
            .layer(CatchPanicLayer::custom(on_panic))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(TraceLayer::new_for_http())
            .layer(CorrelationLayer::new(log).with_header(header))
    }

    /// The fully layered router, for in-process callers.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            correlation_header = %self.config.correlation.header_name,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                // A closed channel also means shut down.
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
