//! Versioned API routes.
//!
//! Routes live under `/api/v{version}/{controller}`. Every API response
//! reports the versions this build serves in `api-supported-versions`.

use axum::extract::State;
use axum::http::header::{HeaderName, HeaderValue};
use axum::routing::get;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::correlation::CorrelationId;
use crate::http::server::AppState;

/// Response header listing served API versions.
pub const API_SUPPORTED_VERSIONS: &str = "api-supported-versions";

/// API versions served by this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1, ApiVersion::V2];

    /// `1.0`, `2.0`, ...
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "1.0",
            ApiVersion::V2 => "2.0",
        }
    }

    /// URL segment, e.g. `v1`.
    pub const fn segment(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }

    /// `/api/{segment}/{controller}`.
    pub fn route(self, controller: &str) -> String {
        format!("/api/{}/{}", self.segment(), controller)
    }

    /// Value of the `api-supported-versions` header.
    pub fn supported() -> String {
        Self::ALL.map(ApiVersion::as_str).join(", ")
    }
}

/// Router for every versioned controller.
pub fn api_router() -> Router<AppState> {
    let supported = HeaderValue::from_str(&ApiVersion::supported())
        .unwrap_or_else(|_| HeaderValue::from_static("1.0"));

    Router::new()
        .route(&ApiVersion::V1.route("test"), get(test_v1))
        .route(&ApiVersion::V2.route("test"), get(test_v2))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(API_SUPPORTED_VERSIONS),
            supported,
        ))
}

async fn test_v1(State(state): State<AppState>, correlation_id: CorrelationId) -> &'static str {
    state.log.debug(
        "Test endpoint {Version} served for {CorrelationId}",
        &[&ApiVersion::V1.as_str(), &correlation_id],
    );
    "Test API V1 is working!"
}

async fn test_v2(State(state): State<AppState>, correlation_id: CorrelationId) -> &'static str {
    state.log.debug(
        "Test endpoint {Version} served for {CorrelationId}",
        &[&ApiVersion::V2.as_str(), &correlation_id],
    );
    "Test API V2 is working!"
}
