//! Error responses.
//!
//! # Responsibilities
//! - Map `ControlPlaneError` to an HTTP status and a JSON body
//! - Give malformed request bodies the same JSON shape
//!
//! # Design Decisions
//! - `expired` (410) and `not_configured` (404) have their own codes so
//!   clients can tell them apart from a plain `not_found`
//! - Body shape: `{"error": code, "message": text}`, plus `errors` for
//!   validation failures

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ControlPlaneError;

impl ControlPlaneError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ControlPlaneError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ControlPlaneError::InvalidTransition { .. }
            | ControlPlaneError::Conflict { .. }
            | ControlPlaneError::NoPriorVersion { .. }
            | ControlPlaneError::AlreadyExists { .. }
            | ControlPlaneError::Immutable { .. }
            | ControlPlaneError::PurgeRefused { .. } => StatusCode::CONFLICT,
            ControlPlaneError::NotFound { .. }
            | ControlPlaneError::NotConfigured { .. }
            | ControlPlaneError::NotInHistory { .. } => StatusCode::NOT_FOUND,
            ControlPlaneError::Expired { .. } => StatusCode::GONE,
            ControlPlaneError::InvalidVersion(_)
            | ControlPlaneError::InvalidEnvironment(_)
            | ControlPlaneError::InvalidTtl { .. } => StatusCode::BAD_REQUEST,
            ControlPlaneError::PreviewCodesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ControlPlaneError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlPlaneError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });
        if let ControlPlaneError::Validation(report) = &self {
            body["errors"] = json!(report.errors);
        }
        (status, Json(body)).into_response()
    }
}

/// JSON error body for a request body that failed to parse.
pub fn invalid_body(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let body = json!({
        "error": "invalid_body",
        "message": rejection.body_text(),
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ValidationIssue, ValidationReport};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ControlPlaneError::Expired { code: "ABC234".into() },
                StatusCode::GONE,
            ),
            (
                ControlPlaneError::NotConfigured { environment: "prod".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                ControlPlaneError::Conflict { environment: "prod".into() },
                StatusCode::CONFLICT,
            ),
            (
                ControlPlaneError::NoPriorVersion { environment: "prod".into() },
                StatusCode::CONFLICT,
            ),
            (
                ControlPlaneError::InvalidTtl { requested: 0, max: 10 },
                StatusCode::BAD_REQUEST,
            ),
            (
                ControlPlaneError::Persistence("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_validation_response_lists_errors() {
        let report = ValidationReport {
            valid: false,
            errors: vec![ValidationIssue {
                path: "tokens".into(),
                message: "required key is missing".into(),
            }],
        };
        let response = ControlPlaneError::Validation(report).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
