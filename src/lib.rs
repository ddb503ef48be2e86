//! Correlation-tracking web API scaffold.
//!
//! Two reusable pieces sit under a thin Axum host:
//! - a correlation pipeline that tags every log record of a request with
//!   its `X-Correlation-Id` ([`http::correlation`], [`observability`])
//! - an immutable result/error model ([`domain`])

pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use domain::{Error, ErrorCode, InvalidArgument, OperationResult};
pub use http::{CorrelationId, CorrelationLayer, HttpServer};
pub use lifecycle::Shutdown;
pub use observability::{LogContext, LogService, TracingLogService};
