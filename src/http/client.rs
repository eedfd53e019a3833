//! Client-facing read routes.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::document::UiConfigDocument;
use crate::http::server::AppState;

/// Response header naming the served version.
pub const X_CONFIG_VERSION: &str = "x-config-version";

/// `GET /v1/config/{environment}`
pub async fn get_current_config(
    State(state): State<AppState>,
    Path(environment): Path<String>,
) -> impl IntoResponse {
    match state.service.get_current(&environment) {
        Ok(doc) => document_response(doc),
        Err(e) => {
            tracing::debug!(environment = %environment, error = %e, "Current config unavailable");
            e.into_response()
        }
    }
}

/// `GET /v1/preview/{code}`
pub async fn get_preview_config(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.service.get_preview(&code) {
        Ok(doc) => document_response(doc),
        Err(e) => e.into_response(),
    }
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

fn document_response(doc: UiConfigDocument) -> Response {
    let version = HeaderValue::from_str(&doc.version).ok();
    let mut response = (StatusCode::OK, Json(doc)).into_response();
    if let Some(version) = version {
        response.headers_mut().insert(X_CONFIG_VERSION, version);
    }
    response
}
