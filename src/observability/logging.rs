//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem from configuration
//! - Turn `tracing` events into [`LogRecord`]s enriched with span fields
//!   and the ambient [`LogContext`]
//! - Run the [`PropertyFilter`] on every record before it is written
//!
//! # Design Decisions
//! - `tracing` is the backend; every call site logs through it or through
//!   the `LogService` façade
//! - JSON format for production, text format for development
//! - Log level configurable via config and `RUST_LOG`
//! - One `write_all` per record so concurrent writers never interleave
//!   inside a line

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use serde_json::Value;
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::observability::context::LogContext;
use crate::observability::filter::PropertyFilter;
use crate::observability::record::{LogFormat, LogRecord};

/// Error type for logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber: env filter plus a [`RecordLayer`] on stdout.
///
/// `RUST_LOG` takes precedence over `observability.log_level`.
pub fn init(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let layer = RecordLayer::new(
        std::io::stdout,
        config.log_format,
        PropertyFilter::with_extra(config.filtered_properties.iter().cloned()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}

/// Fields recorded on a span, kept in the span's extensions.
#[derive(Debug, Default, Clone)]
struct SpanFields(BTreeMap<String, Value>);

/// `tracing` layer that writes one [`LogRecord`] per event.
pub struct RecordLayer<W> {
    make_writer: W,
    format: LogFormat,
    filter: PropertyFilter,
}

impl<W> RecordLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    pub fn new(make_writer: W, format: LogFormat, filter: PropertyFilter) -> Self {
        Self {
            make_writer,
            format,
            filter,
        }
    }

    /// Assemble the record for `event`. Precedence, lowest first: span
    /// fields (outermost span first), ambient context, event fields.
    fn build_record<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> LogRecord
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let meta = event.metadata();
        let mut properties = BTreeMap::new();

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    properties.extend(fields.0.clone());
                }
            }
        }

        for (name, value) in LogContext::snapshot() {
            properties.insert(name, Value::String(value));
        }

        let mut event_fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut event_fields));
        let message = match event_fields.remove("message") {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        properties.extend(event_fields);

        let mut record = LogRecord::new(*meta.level(), meta.target(), message);
        record.properties = properties;
        self.filter.apply(&mut record);
        record
    }
}

impl<S, W> Layer<S> for RecordLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = SpanFields::default();
        attrs.record(&mut FieldVisitor(&mut fields.0));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor(&mut fields.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let record = self.build_record(event, &ctx);
        let line = record.render(self.format);
        let mut writer = self.make_writer.make_writer_for(event.metadata());
        // Sink failures are not surfaced to the code that logged.
        let _ = writer.write_all(line.as_bytes());
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, Value>);

impl Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0
            .insert(field.name().to_string(), Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.0.insert(field.name().to_string(), value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.0
            .insert(field.name().to_string(), Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::Registry;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn records(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn subscriber(buffer: &Buffer) -> impl Subscriber + Send + Sync {
        let writer = buffer.clone();
        Registry::default().with(RecordLayer::new(
            move || writer.clone(),
            LogFormat::Json,
            PropertyFilter::default(),
        ))
    }

    #[test]
    fn test_event_fields_and_message() {
        let buffer = Buffer::default();
        tracing::subscriber::with_default(subscriber(&buffer), || {
            tracing::info!(status = 200u64, ok = true, "request done");
        });
        let records = buffer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "request done");
        assert_eq!(records[0]["level"], "INFO");
        assert_eq!(records[0]["properties"]["status"], 200);
        assert_eq!(records[0]["properties"]["ok"], true);
    }

    #[test]
    fn test_span_fields_are_inherited() {
        let buffer = Buffer::default();
        tracing::subscriber::with_default(subscriber(&buffer), || {
            let span = tracing::info_span!("request", method = "GET");
            let _entered = span.enter();
            tracing::warn!("slow");
        });
        let records = buffer.records();
        assert_eq!(records[0]["properties"]["method"], "GET");
    }

    #[test]
    fn test_context_properties_are_attached() {
        let buffer = Buffer::default();
        tracing::subscriber::with_default(subscriber(&buffer), || {
            LogContext::sync_scope(|| {
                let _guard = LogContext::push_property("CorrelationId", "abc-123");
                tracing::info!("inside");
            });
            tracing::info!("outside");
        });
        let records = buffer.records();
        assert_eq!(records[0]["properties"]["CorrelationId"], "abc-123");
        assert!(records[1]["properties"].get("CorrelationId").is_none());
    }

    #[test]
    fn test_filtered_properties_never_written() {
        let buffer = Buffer::default();
        tracing::subscriber::with_default(subscriber(&buffer), || {
            LogContext::sync_scope(|| {
                let _guard = LogContext::push_property("ActionName", "Get");
                tracing::info!(RequestId = "r-1", EventId = 3u64, kept = "yes", "filtered");
            });
        });
        let props = &buffer.records()[0]["properties"];
        assert!(props.get("ActionName").is_none());
        assert!(props.get("RequestId").is_none());
        assert!(props.get("EventId").is_none());
        assert_eq!(props["kept"], "yes");
    }

    #[test]
    fn test_event_field_overrides_context() {
        let buffer = Buffer::default();
        tracing::subscriber::with_default(subscriber(&buffer), || {
            LogContext::sync_scope(|| {
                let _guard = LogContext::push_property("Path", "/from-context");
                tracing::info!(Path = "/from-event", "override");
            });
        });
        assert_eq!(buffer.records()[0]["properties"]["Path"], "/from-event");
    }
}
