//! Correlation ID middleware.
//!
//! # Responsibilities
//! - Resolve the correlation ID for each inbound request
//! - Hand it to handlers as a typed request extension
//! - Tag every log record of the request with it
//! - Echo it on the response header
//!
//! # Design Decisions
//! - A caller-supplied `X-Correlation-Id` is trusted as-is. Its shape and
//!   uniqueness are NOT validated, so callers can stitch traces across
//!   services; treat it as untrusted input anywhere it matters
//! - Only a missing or blank header yields a fresh UUID v4. Any other value
//!   is echoed byte for byte; bytes that are not UTF-8 are replaced with
//!   U+FFFD in the logged ID only
//! - Every request gets its own log-context stack, forked from whatever the
//!   host had open, so overlapping requests never see each other's ID
//! - The log-context entry is owned by a drop guard, so it is released on
//!   success, on `Err`, on panic and on cancellation alike
//! - Downstream errors are returned unchanged; this layer never translates

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use uuid::Uuid;

use crate::observability::{LogContext, LogService, CORRELATION_ID_PROPERTY};

/// Default header carrying the correlation ID.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Per-request correlation identifier.
///
/// Handlers receive it as an extractor:
///
/// ```ignore
/// async fn handler(correlation_id: CorrelationId) -> String {
///     correlation_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The caller's value from `header` when present and non-blank,
    /// otherwise a freshly generated one.
    pub fn from_headers(headers: &HeaderMap, header: &HeaderName) -> Self {
        supplied(headers, header)
            .map(|value| Self(String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .unwrap_or_else(Self::generate)
    }

    /// The ID of the request currently being logged, if any.
    pub fn current() -> Option<Self> {
        LogContext::property(CORRELATION_ID_PROPERTY).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The non-blank value of `header`, if the caller sent one.
fn supplied<'h>(headers: &'h HeaderMap, header: &HeaderName) -> Option<&'h HeaderValue> {
    headers
        .get(header)
        .filter(|value| !value.as_bytes().iter().all(u8::is_ascii_whitespace))
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CorrelationId>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "correlation middleware not installed",
        ))
    }
}

/// Layer that wraps services with [`CorrelationService`].
#[derive(Clone)]
pub struct CorrelationLayer {
    header: HeaderName,
    log: Arc<dyn LogService>,
}

impl CorrelationLayer {
    pub fn new(log: Arc<dyn LogService>) -> Self {
        Self {
            header: HeaderName::from_static(X_CORRELATION_ID),
            log,
        }
    }

    /// Read and write `header` instead of `x-correlation-id`.
    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            header: self.header.clone(),
            log: Arc::clone(&self.log),
        }
    }
}

/// Service produced by [`CorrelationLayer`].
#[derive(Clone)]
pub struct CorrelationService<S> {
    inner: S,
    header: HeaderName,
    log: Arc<dyn LogService>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let correlation_id = CorrelationId::from_headers(request.headers(), &self.header);
        let echoed = supplied(request.headers(), &self.header).cloned();
        request.extensions_mut().insert(correlation_id.clone());

        let header = self.header.clone();
        let log = Arc::clone(&self.log);
        // Drive the instance that was polled ready; leave the clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(LogContext::fork(async move {
            let _correlation =
                LogContext::push_property(CORRELATION_ID_PROPERTY, correlation_id.as_str());
            log.request(
                request.method().as_str(),
                request.uri().path(),
                correlation_id.as_str(),
            );

            let mut response = inner.call(request).await?;

            let value = match echoed {
                Some(value) => Ok(value),
                None => HeaderValue::from_str(correlation_id.as_str()),
            };
            match value {
                Ok(value) => {
                    response.headers_mut().insert(header, value);
                }
                Err(error) => {
                    tracing::error!(
                        %error,
                        correlation_id = %correlation_id,
                        "failed to encode correlation id header"
                    );
                }
            }
            Ok(response)
        }))
    }
}
