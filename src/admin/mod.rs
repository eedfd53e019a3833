//! Admin API used by editing surfaces and the operator CLI.
//!
//! # Data Flow
//! ```text
//! /admin/documents*     → ConfigService (store operations, snapshot write)
//! /admin/previews*      → PreviewSessionManager
//! /admin/environments*  → PublishManager (publish, rollback, history)
//! ```
//!
//! # Design Decisions
//! - No authentication layer; access control belongs to the deployment
//! - Errors share the client routes' JSON shape and status mapping

pub mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/documents", get(list_documents).post(create_document))
        .route(
            "/admin/documents/{version}",
            get(get_document).put(update_document).delete(purge_document),
        )
        .route("/admin/documents/{version}/status", post(change_status))
        .route("/admin/documents/{version}/fork", post(fork_document))
        .route("/admin/documents/{version}/validate", post(validate_stored))
        .route("/admin/validate", post(validate_body))
        .route("/admin/previews", get(list_previews).post(issue_preview))
        .route("/admin/previews/{code}", delete(revoke_preview))
        .route("/admin/environments", get(list_environments))
        .route("/admin/environments/{environment}/history", get(get_history))
        .route("/admin/environments/{environment}/publish", post(publish))
        .route("/admin/environments/{environment}/rollback", post(rollback))
        .with_state(state)
}
