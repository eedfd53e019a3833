use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::document::{DocumentStatus, UiConfigDocument};
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::http::response::invalid_body;
use crate::http::server::AppState;
use crate::preview::PreviewSession;
use crate::serving::ConfigService;
use crate::validation::validate_document;

/// Run a mutating service call on the blocking pool. Every successful
/// mutation ends in a snapshot write, which must not stall the runtime.
async fn run_blocking<T, F>(service: &Arc<ConfigService>, call: F) -> ControlPlaneResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ConfigService) -> ControlPlaneResult<T> + Send + 'static,
{
    let service = service.clone();
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ControlPlaneError::Persistence(format!("mutation task failed: {e}")))?
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: DocumentStatus,
}

#[derive(Debug, Deserialize)]
pub struct ForkRequest {
    pub version: String,
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssuePreview {
    pub version: String,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub version: String,
    pub activated_by: String,
}

#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    pub target_version: Option<String>,
    pub activated_by: String,
}

/// Preview session plus the path a recipient opens.
#[derive(Debug, Serialize)]
pub struct IssuedPreview {
    #[serde(flatten)]
    pub session: PreviewSession,
    pub url: String,
}

impl From<PreviewSession> for IssuedPreview {
    fn from(session: PreviewSession) -> Self {
        let url = format!("/v1/preview/{}", session.code);
        Self { session, url }
    }
}

pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let settings = state.settings.load();
    Json(json!({
        "service": state.service.status(),
        "preview": {
            "default_ttl_secs": settings.preview.default_ttl_secs,
            "max_ttl_secs": settings.preview.max_ttl_secs,
        },
        "environments_allowed": settings.environments.allowed,
    }))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let filter = match query.status.as_deref().map(str::parse::<DocumentStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(message)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_status", "message": message })),
            )
                .into_response();
        }
    };
    Json(state.service.store().list(filter)).into_response()
}

pub async fn create_document(
    State(state): State<AppState>,
    body: Result<Json<UiConfigDocument>, JsonRejection>,
) -> impl IntoResponse {
    let Json(doc) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    match run_blocking(&state.service, move |service| service.create(doc)).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> impl IntoResponse {
    match state.service.store().get(&version) {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace a draft. The body's version must match the path.
pub async fn update_document(
    State(state): State<AppState>,
    Path(version): Path<String>,
    body: Result<Json<UiConfigDocument>, JsonRejection>,
) -> impl IntoResponse {
    let Json(doc) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    if doc.version != version {
        return ControlPlaneError::InvalidVersion(doc.version).into_response();
    }
    match run_blocking(&state.service, move |service| service.update_draft(doc)).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn purge_document(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> impl IntoResponse {
    match run_blocking(&state.service, move |service| service.purge(&version)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Draft, preview and archived targets only; prod is reached by publishing.
pub async fn change_status(
    State(state): State<AppState>,
    Path(version): Path<String>,
    body: Result<Json<StatusChange>, JsonRejection>,
) -> impl IntoResponse {
    let Json(change) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    if change.status == DocumentStatus::Prod {
        let from = match state.service.store().get(&version) {
            Ok(doc) => doc.status,
            Err(e) => return e.into_response(),
        };
        return ControlPlaneError::InvalidTransition {
            version,
            from,
            to: DocumentStatus::Prod,
        }
        .into_response();
    }
    let status = change.status;
    match run_blocking(&state.service, move |service| service.update_status(&version, status)).await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn fork_document(
    State(state): State<AppState>,
    Path(source): Path<String>,
    body: Result<Json<ForkRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    let forked = run_blocking(&state.service, move |service| {
        service.fork(&source, &request.version, request.author)
    });
    match forked.await {
        Ok(doc) => (StatusCode::CREATED, Json(doc)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Validate a stored version.
pub async fn validate_stored(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> impl IntoResponse {
    match state.service.store().get(&version) {
        Ok(doc) => Json(validate_document(&doc)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Validate a document that is not stored. The body is read raw so a
/// report can be produced for anything that is JSON at all.
pub async fn validate_body(body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<UiConfigDocument>(&body) {
        Ok(doc) => Json(validate_document(&doc)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "valid": false,
                "errors": [{ "path": "", "message": e.to_string() }],
            })),
        )
            .into_response(),
    }
}

pub async fn list_previews(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<IssuedPreview> = state
        .service
        .previews()
        .sessions()
        .into_iter()
        .map(IssuedPreview::from)
        .collect();
    Json(sessions)
}

pub async fn issue_preview(
    State(state): State<AppState>,
    body: Result<Json<IssuePreview>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    match state.service.issue_preview(&request.version, request.ttl_secs) {
        Ok(session) => (StatusCode::CREATED, Json(IssuedPreview::from(session))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn revoke_preview(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.service.previews().revoke(&code) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_environments(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.publisher().environments())
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(environment): Path<String>,
) -> impl IntoResponse {
    Json(state.service.publisher().history(&environment))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(environment): Path<String>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    let published = run_blocking(&state.service, move |service| {
        service.publish(&request.version, &environment, &request.activated_by)
    });
    match published.await {
        Ok(pointer) => Json(pointer).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn rollback(
    State(state): State<AppState>,
    Path(environment): Path<String>,
    body: Result<Json<RollbackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    let rolled_back = run_blocking(&state.service, move |service| {
        service.rollback(
            &environment,
            request.target_version.as_deref(),
            &request.activated_by,
        )
    });
    match rolled_back.await {
        Ok(pointer) => Json(pointer).into_response(),
        Err(e) => e.into_response(),
    }
}
