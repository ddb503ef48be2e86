//! Result/error model shared by every layer.
//!
//! # Data Flow
//! ```text
//! handler / service code
//!     → error_code.rs (symbolic failure category)
//!     → error.rs (one immutable failure with metadata)
//!     → result.rs (value XOR non-empty list of errors)
//!     → returned normally to the caller, never raised
//! ```
//!
//! # Design Decisions
//! - Values are immutable once built; "modifiers" return new values
//! - Construction-time invariant violations return `InvalidArgument`
//! - Business failures travel as `OperationResult` failures

pub mod error;
pub mod error_code;
pub mod result;

pub use error::{Error, ErrorBuilder};
pub use error_code::ErrorCode;
pub use result::OperationResult;

use thiserror::Error as ThisError;

/// A constructor was called with arguments that break a model invariant.
///
/// These indicate a programming error at the call site and are reported
/// immediately rather than coerced into a valid value.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum InvalidArgument {
    /// An `Error` was built without a message.
    #[error("error message must not be null")]
    MissingMessage,

    /// A failure result was requested with zero errors.
    #[error("a failure result must carry at least one error")]
    EmptyErrors,
}
