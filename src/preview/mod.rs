//! Preview sharing subsystem.
//!
//! # Data Flow
//! ```text
//! issue(version, ttl)
//!     → version must exist (any status)
//!     → random 6-char code, claimed via insert-if-absent
//!     → PreviewSession { code, version, expires_at }
//!
//! resolve(code)
//!     → normalize (case-insensitive)
//!     → unknown → not found
//!     → now >= expires_at → expired (evicted after the retention window)
//!     → ConfigStore::get(version)
//!
//! sweeper.rs
//!     periodic timer → drop sessions past expiry + retention
//! ```
//!
//! # Design Decisions
//! - Sessions live in memory only and are not part of the snapshot
//! - Expired sessions are kept for a while so callers see "expired"
//!   rather than "not found"
//! - Issuing or resolving never changes a document's status

pub mod manager;
pub mod session;
pub mod sweeper;

pub use manager::PreviewSessionManager;
pub use session::{generate_code, normalize_code, PreviewSession, CODE_ALPHABET, CODE_LENGTH};
pub use sweeper::PreviewSweeper;
