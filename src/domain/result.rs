//! Success-or-errors outcome wrapper.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::domain::{Error, ErrorCode, InvalidArgument};

#[derive(Debug, Clone, PartialEq)]
enum Outcome<T> {
    Success(T),
    /// Never empty.
    Failure(Vec<Error>),
}

/// The outcome of an operation: a payload or a non-empty list of errors.
///
/// Which of the two holds is fixed by the factory used to build the value;
/// `is_success()` is always `!is_error()`.
#[derive(Debug, Clone)]
pub struct OperationResult<T> {
    outcome: Outcome<T>,
    timestamp: DateTime<Utc>,
}

impl<T> OperationResult<T> {
    fn from_outcome(outcome: Outcome<T>) -> Self {
        Self {
            outcome,
            timestamp: Utc::now(),
        }
    }

    pub fn success(value: T) -> Self {
        Self::from_outcome(Outcome::Success(value))
    }

    pub fn failure(error: Error) -> Self {
        Self::from_outcome(Outcome::Failure(vec![error]))
    }

    /// Failure carrying every error in `errors`, in order.
    ///
    /// An empty list is rejected: a failure without errors is not a valid
    /// state.
    pub fn failure_many<I>(errors: I) -> Result<Self, InvalidArgument>
    where
        I: IntoIterator<Item = Error>,
    {
        let errors: Vec<Error> = errors.into_iter().collect();
        if errors.is_empty() {
            return Err(InvalidArgument::EmptyErrors);
        }
        Ok(Self::from_outcome(Outcome::Failure(errors)))
    }

    /// Failure built from the parts of a single error.
    pub fn failure_with(
        code: ErrorCode,
        message: impl Into<String>,
        details: Option<String>,
        correlation_id: Option<String>,
    ) -> Self {
        let mut error = Error::new(code, message);
        if let Some(details) = details {
            error = error.with_details(details);
        }
        if let Some(correlation_id) = correlation_id {
            error = error.with_correlation_id(correlation_id);
        }
        Self::failure(error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// The payload, or `None` for a failure.
    pub fn data(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// The errors in insertion order; empty for a success.
    pub fn errors(&self) -> &[Error] {
        match &self.outcome {
            Outcome::Success(_) => &[],
            Outcome::Failure(errors) => errors,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// All error messages joined with `"; "`.
    pub fn error_message(&self) -> String {
        self.errors()
            .iter()
            .map(Error::message)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Message of the first error, or `""` for a success.
    pub fn first_error_message(&self) -> &str {
        self.errors().first().map(Error::message).unwrap_or_default()
    }

    /// Whether any contained error carries exactly `code`.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors().iter().any(|e| e.code() == code)
    }

    /// Transform the payload of a success; failures pass through with the
    /// original timestamp.
    pub fn map<U, F>(self, f: F) -> OperationResult<U>
    where
        F: FnOnce(T) -> U,
    {
        let outcome = match self.outcome {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(errors) => Outcome::Failure(errors),
        };
        OperationResult {
            outcome,
            timestamp: self.timestamp,
        }
    }

    pub fn into_result(self) -> Result<T, Vec<Error>> {
        match self.outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(errors) => Err(errors),
        }
    }
}

impl<T1, T2> OperationResult<(Vec<T1>, T2)> {
    /// Success carrying two co-equal values, typically a collection plus a
    /// count or other metadata.
    pub fn success_pair<I>(items: I, extra: T2) -> Self
    where
        I: IntoIterator<Item = T1>,
    {
        Self::success((items.into_iter().collect(), extra))
    }
}

impl<T> From<Error> for OperationResult<T> {
    fn from(error: Error) -> Self {
        Self::failure(error)
    }
}

impl<T: fmt::Debug> fmt::Display for OperationResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
        match &self.outcome {
            Outcome::Success(value) => write!(f, "[{}] Success: {:?}", ts, value),
            Outcome::Failure(_) => write!(f, "[{}] Error(s): {}", ts, self.error_message()),
        }
    }
}

impl<T: Serialize> Serialize for OperationResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OperationResult", 5)?;
        state.serialize_field("data", &self.data())?;
        state.serialize_field("isError", &self.is_error())?;
        state.serialize_field("isSuccess", &self.is_success())?;
        state.serialize_field("errors", self.errors())?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.end()
    }
}
