//! A single failure with diagnostic metadata.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ErrorCode, InvalidArgument};

/// One failure: code, message and optional details.
///
/// Immutable after construction. Equality and hashing only look at
/// `(code, message, details)`; the timestamp and correlation id are
/// diagnostics and do not take part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<String>,
    correlation_id: Option<String>,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl Error {
    /// Create an error stamped with the current instant.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            correlation_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Start building an error whose message may not be known yet.
    pub fn builder(code: ErrorCode) -> ErrorBuilder {
        ErrorBuilder {
            code,
            message: None,
            details: None,
            correlation_id: None,
        }
    }

    /// Same error with `details` attached. The timestamp is preserved.
    pub fn with_details(self, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..self
        }
    }

    /// Same error tagged with a correlation id. The timestamp is preserved.
    pub fn with_correlation_id(self, correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
            ..self
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message && self.details == other.details
    }
}

impl Eq for Error {}

impl Hash for Error {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.message.hash(state);
        self.details.hash(state);
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
        match self.details.as_deref() {
            Some(details) if !details.is_empty() => write!(
                f,
                "[{}] Error {}: {} - Details: {}",
                ts, self.code, self.message, details
            ),
            _ => write!(f, "[{}] Error {}: {}", ts, self.code, self.message),
        }
    }
}

impl std::error::Error for Error {}

/// Builder for [`Error`] where every field is optional until [`build`].
///
/// [`build`]: ErrorBuilder::build
#[derive(Debug, Clone)]
pub struct ErrorBuilder {
    code: ErrorCode,
    message: Option<String>,
    details: Option<String>,
    correlation_id: Option<String>,
}

impl ErrorBuilder {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    pub fn correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Finish the error. Fails if no message was supplied.
    pub fn build(self) -> Result<Error, InvalidArgument> {
        let message = self.message.ok_or(InvalidArgument::MissingMessage)?;
        Ok(Error {
            code: self.code,
            message,
            details: self.details,
            correlation_id: self.correlation_id,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_keeps_message() {
        let err = Error::new(ErrorCode::NotFound, "user 7 not found");
        assert_eq!(err.message(), "user 7 not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.details().is_none());
        assert!(err.correlation_id().is_none());
    }

    #[test]
    fn test_builder_without_message_fails() {
        let result = Error::builder(ErrorCode::Validation).build();
        assert_eq!(result.unwrap_err(), InvalidArgument::MissingMessage);
    }

    #[test]
    fn test_builder_with_message_succeeds() {
        let err = Error::builder(ErrorCode::Validation)
            .message("")
            .details(Some("name".to_string()))
            .correlation_id(Some("abc".to_string()))
            .build()
            .unwrap();
        assert_eq!(err.message(), "");
        assert_eq!(err.details(), Some("name"));
        assert_eq!(err.correlation_id(), Some("abc"));
    }

    #[test]
    fn test_equality_ignores_diagnostics() {
        let a = Error::new(ErrorCode::Conflict, "taken").with_correlation_id("one");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = Error::new(ErrorCode::Conflict, "taken").with_correlation_id("two");
        assert_ne!(a.timestamp(), b.timestamp());
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_equality_respects_identity_fields() {
        let base = Error::new(ErrorCode::Conflict, "taken");
        assert_ne!(base, Error::new(ErrorCode::Internal, "taken"));
        assert_ne!(base, Error::new(ErrorCode::Conflict, "gone"));
        assert_ne!(base, base.clone().with_details("row 3"));
    }

    #[test]
    fn test_modifiers_preserve_timestamp() {
        let err = Error::new(ErrorCode::Internal, "boom");
        let ts = err.timestamp();
        let err = err.with_details("db").with_correlation_id("c-1");
        assert_eq!(err.timestamp(), ts);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorCode::NotFound, "missing");
        let text = err.to_string();
        assert!(text.starts_with('['));
        assert!(text.ends_with("] Error NOT_FOUND: missing"));

        let text = err.with_details("id=4").to_string();
        assert!(text.ends_with("Error NOT_FOUND: missing - Details: id=4"));
    }

    #[test]
    fn test_json_shape() {
        let err = Error::new(ErrorCode::Validation, "bad").with_correlation_id("c-9");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "VALIDATION");
        assert_eq!(value["message"], "bad");
        assert!(value["details"].is_null());
        assert_eq!(value["correlationId"], "c-9");
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_null_message_rejected_on_deserialize() {
        let json = r#"{"code":"INTERNAL","message":null,"details":null,"correlationId":null}"#;
        assert!(serde_json::from_str::<Error>(json).is_err());
    }
}
