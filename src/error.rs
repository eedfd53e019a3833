//! Error taxonomy for the configuration lifecycle engine.
//!
//! Every fallible operation in the store, preview, publish and serving
//! subsystems returns [`ControlPlaneError`]. Variants map one-to-one onto
//! stable machine codes (see [`ControlPlaneError::error_code`]) so editing
//! surfaces and client applications can branch on them without parsing
//! messages.

use std::fmt;

use thiserror::Error;

use crate::document::DocumentStatus;
use crate::validation::ValidationReport;

/// The kind of resource a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    PreviewSession,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Document => write!(f, "document"),
            ResourceKind::PreviewSession => write!(f, "preview session"),
        }
    }
}

/// Errors produced by the control plane core.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The document violates the schema. Recoverable: fix and resubmit.
    #[error("document failed validation with {} error(s)", .0.errors.len())]
    Validation(ValidationReport),

    /// A status change the state machine does not allow.
    #[error("invalid status transition for {version}: {from} -> {to}")]
    InvalidTransition {
        version: String,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// Another publish or rollback holds the environment. Retry.
    #[error("another publish or rollback is in progress for environment {environment}")]
    Conflict { environment: String },

    /// Unknown version or preview code.
    #[error("{kind} not found: {key}")]
    NotFound { kind: ResourceKind, key: String },

    /// Preview code exists but is past its expiry.
    #[error("preview code {code} has expired")]
    Expired { code: String },

    /// Nothing has ever been published to the environment.
    #[error("environment {environment} has no published configuration")]
    NotConfigured { environment: String },

    /// Rollback requested but there is no earlier publish to return to.
    #[error("environment {environment} has no earlier version to roll back to")]
    NoPriorVersion { environment: String },

    /// Rollback target was never published to the environment.
    #[error("version {version} was never published to environment {environment}")]
    NotInHistory { environment: String, version: String },

    #[error("version {version} already exists")]
    AlreadyExists { version: String },

    /// Content edit attempted on a document that has left draft.
    #[error("version {version} is {status}; create a new version instead of editing it")]
    Immutable {
        version: String,
        status: DocumentStatus,
    },

    /// Purge attempted on a document that is, or may become, authoritative.
    #[error("version {version} is {status} and cannot be purged")]
    PurgeRefused {
        version: String,
        status: DocumentStatus,
    },

    #[error("invalid version identifier {0:?}")]
    InvalidVersion(String),

    #[error("invalid environment name {0:?}")]
    InvalidEnvironment(String),

    #[error("preview ttl {requested}s is outside the allowed range 1..={max}s")]
    InvalidTtl { requested: u64, max: u64 },

    /// Could not find a free preview code within the attempt budget.
    #[error("no free preview code found after {attempts} attempts")]
    PreviewCodesExhausted { attempts: u32 },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ControlPlaneError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ControlPlaneError::Validation(_) => "validation_failed",
            ControlPlaneError::InvalidTransition { .. } => "invalid_transition",
            ControlPlaneError::Conflict { .. } => "conflict",
            ControlPlaneError::NotFound { .. } => "not_found",
            ControlPlaneError::Expired { .. } => "expired",
            ControlPlaneError::NotConfigured { .. } => "not_configured",
            ControlPlaneError::NoPriorVersion { .. } => "no_prior_version",
            ControlPlaneError::NotInHistory { .. } => "not_in_history",
            ControlPlaneError::AlreadyExists { .. } => "already_exists",
            ControlPlaneError::Immutable { .. } => "immutable",
            ControlPlaneError::PurgeRefused { .. } => "purge_refused",
            ControlPlaneError::InvalidVersion(_) => "invalid_version",
            ControlPlaneError::InvalidEnvironment(_) => "invalid_environment",
            ControlPlaneError::InvalidTtl { .. } => "invalid_ttl",
            ControlPlaneError::PreviewCodesExhausted { .. } => "preview_codes_exhausted",
            ControlPlaneError::Persistence(_) => "persistence",
        }
    }

    /// Whether the caller may simply retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ControlPlaneError::Conflict { .. } | ControlPlaneError::PreviewCodesExhausted { .. }
        )
    }

    pub(crate) fn document_not_found(version: &str) -> Self {
        ControlPlaneError::NotFound {
            kind: ResourceKind::Document,
            key: version.to_string(),
        }
    }

    pub(crate) fn session_not_found(code: &str) -> Self {
        ControlPlaneError::NotFound {
            kind: ResourceKind::PreviewSession,
            key: code.to_string(),
        }
    }
}

/// Result type for control plane operations.
pub type ControlPlaneResult<T> = Result<T, ControlPlaneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_keep_expired_and_not_configured_distinct() {
        let expired = ControlPlaneError::Expired { code: "ABC234".into() };
        let missing = ControlPlaneError::session_not_found("ABC234");
        let unconfigured = ControlPlaneError::NotConfigured {
            environment: "prod".into(),
        };

        assert_eq!(expired.error_code(), "expired");
        assert_eq!(missing.error_code(), "not_found");
        assert_eq!(unconfigured.error_code(), "not_configured");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ControlPlaneError::Conflict { environment: "prod".into() }.is_retryable());
        assert!(!ControlPlaneError::NoPriorVersion { environment: "prod".into() }.is_retryable());
        assert!(!ControlPlaneError::document_not_found("1.0.0").is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = ControlPlaneError::InvalidTransition {
            version: "1.0.0".into(),
            from: DocumentStatus::Archived,
            to: DocumentStatus::Draft,
        };
        assert_eq!(
            err.to_string(),
            "invalid status transition for 1.0.0: archived -> draft"
        );
        assert_eq!(
            ControlPlaneError::document_not_found("9.9.9").to_string(),
            "document not found: 9.9.9"
        );
    }
}
