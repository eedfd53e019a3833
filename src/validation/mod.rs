//! Document validation.
//!
//! # Responsibilities
//! - Check required top-level sections are present
//! - Reject keys the schema does not define (except inside `meta`)
//! - Check token values: colors, bounded spacing and radii, gradients,
//!   the type scale, motion curves and shadow levels
//! - Check interaction guards, effect limits and feature flag rollouts
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: `&UiConfigDocument → ValidationReport`, no I/O
//! - Saving a draft never requires a valid report; leaving draft does
//! - Leaves arrive as raw JSON, so a mistyped value is reported by path
//!   instead of failing to parse
//! - Token groups may be partial; entries that are present must be complete

pub mod validator;

pub use validator::{is_valid_color, validate_document, ValidationIssue, ValidationReport};
