//! Logging façade.
//!
//! Components depend on [`LogService`] rather than on a concrete backend so
//! the backend can be swapped, and tests can substitute a recording fake.

use std::error::Error as StdError;
use std::fmt::Display;

use crate::observability::context::{LogContext, PropertyGuard};
use crate::observability::template;

/// `tracing` target used by [`TracingLogService`].
pub const LOG_TARGET: &str = "correlation_api::log";

/// Property name carrying the request's correlation id.
pub const CORRELATION_ID_PROPERTY: &str = "CorrelationId";

/// Minimal set of logging verbs used by the service.
///
/// Templates use `{Name}` holes bound positionally to `args`. No method
/// returns a value or fails; sink problems stay inside the backend.
pub trait LogService: Send + Sync {
    fn information(&self, template: &str, args: &[&dyn Display]);

    fn warning(&self, template: &str, args: &[&dyn Display]);

    fn debug(&self, template: &str, args: &[&dyn Display]);

    fn error(&self, error: &(dyn StdError + 'static), template: &str, args: &[&dyn Display]);

    /// Record an inbound request. `correlation_id` is attached to the
    /// record for the duration of this call only.
    fn request(&self, method: &str, path: &str, correlation_id: &str);
}

/// [`LogService`] backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogService;

impl TracingLogService {
    pub fn new() -> Self {
        Self
    }

    fn write(&self, verb: Verb, template: &str, args: &[&dyn Display]) {
        let template::RenderedMessage { text, properties } = template::render(template, args);

        LogContext::ensure_sync(|| {
            let _guards: Vec<PropertyGuard> = properties
                .into_iter()
                .map(|(name, value)| LogContext::push_property(name, value))
                .collect();

            match verb {
                Verb::Information => {
                    tracing::info!(target: LOG_TARGET, MessageTemplate = template, "{}", text)
                }
                Verb::Warning => {
                    tracing::warn!(target: LOG_TARGET, MessageTemplate = template, "{}", text)
                }
                Verb::Debug => {
                    tracing::debug!(target: LOG_TARGET, MessageTemplate = template, "{}", text)
                }
                Verb::Error(exception) => tracing::error!(
                    target: LOG_TARGET,
                    MessageTemplate = template,
                    Exception = %exception,
                    "{}",
                    text
                ),
            }
        });
    }
}

enum Verb {
    Information,
    Warning,
    Debug,
    Error(String),
}

impl LogService for TracingLogService {
    fn information(&self, template: &str, args: &[&dyn Display]) {
        self.write(Verb::Information, template, args);
    }

    fn warning(&self, template: &str, args: &[&dyn Display]) {
        self.write(Verb::Warning, template, args);
    }

    fn debug(&self, template: &str, args: &[&dyn Display]) {
        self.write(Verb::Debug, template, args);
    }

    fn error(&self, error: &(dyn StdError + 'static), template: &str, args: &[&dyn Display]) {
        self.write(Verb::Error(error_chain(error)), template, args);
    }

    fn request(&self, method: &str, path: &str, correlation_id: &str) {
        LogContext::ensure_sync(|| {
            let _correlation = LogContext::push_property(CORRELATION_ID_PROPERTY, correlation_id);
            self.information("HTTP {Method} request to {Path}", &[&method, &path]);
        });
    }
}

/// `outer: cause: root cause`.
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
