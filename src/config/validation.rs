//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check header names and log filters before they reach the runtime
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::header::HeaderName;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("correlation.header_name '{0}' is not a valid header name")]
    HeaderName(String),

    #[error("observability.log_level '{0}' is not a valid level or filter")]
    LogLevel(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if HeaderName::try_from(config.correlation.header_name.as_str()).is_err() {
        errors.push(ValidationError::HeaderName(
            config.correlation.header_name.clone(),
        ));
    }

    if !is_valid_log_level(&config.observability.log_level) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A bare level (`debug`), or directives with explicit targets
/// (`correlation_api=debug,tower_http=info`).
fn is_valid_log_level(value: &str) -> bool {
    if value.parse::<LevelFilter>().is_ok() {
        return true;
    }
    value.contains('=') && EnvFilter::try_new(value).is_ok()
}
