//! UI configuration document model.
//!
//! # Data Flow
//! ```text
//! editor JSON
//!     → serde (types.rs, camelCase wire names)
//!     → UiConfigDocument (typed maps, unknown keys captured)
//!     → validation (schema rules)
//!     → store (versioned, status-tracked)
//! ```
//!
//! # Design Decisions
//! - Top-level sections are optional at the type level so an incomplete
//!   draft can still be saved; the validator reports what is missing
//! - Unknown keys are captured instead of rejected during parsing, again so
//!   the validator can name them
//! - `version` is the identity; it is checked at creation time, not by the
//!   validator alone

pub mod types;

pub use types::{
    Audience, DocumentStatus, FeatureFlag, InteractionGuards, LowEndDevicePolicy, Meta,
    MicroInteractions, Palette, RolloutDescriptor, Tokens, UiConfigDocument,
};

/// Maximum length of a version identifier.
pub const MAX_VERSION_LEN: usize = 64;

/// Check a version identifier.
///
/// Accepts semantic versions ("1.2.0", "2.0.0-rc1") and date-style release
/// tags ("2025.01.27-rc.2"): 1-64 characters from `[0-9A-Za-z.+-]`, starting
/// with an alphanumeric.
pub fn is_valid_version(version: &str) -> bool {
    let mut chars = version.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    version.len() <= MAX_VERSION_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
}
