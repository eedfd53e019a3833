//! Request identification.
//!
//! # Responsibilities
//! - Name the request id header
//! - Build the per-request tracing span
//!
//! # Design Decisions
//! - Ids are UUID v4, generated by tower-http unless the caller sent one
//! - The same id is echoed on the response

use axum::{body::Body, http::Request};

/// Header carrying the request id in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Span wrapping every request; carries the id so all events logged while
/// handling the request can be correlated.
pub fn make_request_span(req: &Request<Body>) -> tracing::Span {
    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    )
}
