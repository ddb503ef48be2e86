//! Log records as they leave the process.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Level;

/// Output encoding for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable single line.
    Text,
}

/// One structured log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_level")]
    pub level: Level,
    pub target: String,
    pub message: String,
    pub properties: BTreeMap<String, Value>,
}

fn serialize_level<S: serde::Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(level.as_str())
}

impl LogRecord {
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Render the record as one line, newline included.
    pub fn render(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Json => {
                // Serializing a map of JSON values cannot fail.
                let mut line = serde_json::to_string(self).unwrap_or_default();
                line.push('\n');
                line
            }
            LogFormat::Text => {
                let mut line = format!(
                    "{} {:>5} {}: {}",
                    self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                    self.level.as_str(),
                    self.target,
                    self.message
                );
                if !self.properties.is_empty() {
                    let props: Vec<String> = self
                        .properties
                        .iter()
                        .map(|(k, v)| match v {
                            Value::String(s) => format!("{}={}", k, s),
                            other => format!("{}={}", k, other),
                        })
                        .collect();
                    line.push_str(" {");
                    line.push_str(&props.join(", "));
                    line.push('}');
                }
                line.push('\n');
                line
            }
        }
    }
}
