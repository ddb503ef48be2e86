//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → correlation.rs (resolve ID, open log context, log the request)
//!     → routes.rs (versioned controllers)
//!     → correlation.rs (echo X-Correlation-Id, release log context)
//!     → Send to client
//! ```

pub mod correlation;
pub mod routes;
pub mod server;

pub use correlation::{CorrelationId, CorrelationLayer, CorrelationService, X_CORRELATION_ID};
pub use server::{AppState, HttpServer};
