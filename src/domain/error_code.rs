//! Symbolic error categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a failure.
///
/// The set is `#[non_exhaustive]`: deployments add members without breaking
/// downstream `match` expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    /// Input failed validation.
    Validation,
    /// The requested entity does not exist.
    NotFound,
    /// The operation conflicts with current state.
    Conflict,
    /// The caller is not authenticated.
    Unauthorized,
    /// The caller may not perform the operation.
    Forbidden,
    /// Unexpected internal failure.
    Internal,
    /// A dependency is unavailable.
    Unavailable,
    /// The operation did not finish in time.
    Timeout,
}

impl ErrorCode {
    /// Wire name of the code, as used in JSON and log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
