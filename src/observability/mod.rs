//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Call sites produce:
//!     → log_service.rs (LogService façade, templates via template.rs)
//!     → tracing events
//!
//! Per request:
//!     → context.rs (ambient property stack, CorrelationId pushed by the
//!       correlation middleware)
//!
//! Before a record leaves the process:
//!     → logging.rs (RecordLayer: span fields + context + event fields)
//!     → filter.rs (PropertyFilter strips framework-internal fields)
//!     → record.rs (JSON or text line) → stdout
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Correlation ID flows through every record of a request
//! - Context entries are released by drop guards, never by hand

pub mod context;
pub mod filter;
pub mod log_service;
pub mod logging;
pub mod record;
pub mod template;

pub use context::{ContextStats, LogContext, PropertyGuard};
pub use filter::PropertyFilter;
pub use log_service::{LogService, TracingLogService, CORRELATION_ID_PROPERTY};
pub use logging::RecordLayer;
pub use record::{LogFormat, LogRecord};
