//! Document storage subsystem.
//!
//! # Data Flow
//! ```text
//! create(doc)        → version table (status = draft)
//! update_draft(doc)  → replace content while still draft
//! update_status(v)   → state machine check → validation when leaving draft
//! activate/deactivate (publish subsystem only)
//!     → prod while any environment serves the version
//!     → archived once none does
//! export/restore     → snapshot.rs (JSON file)
//! ```
//!
//! # Design Decisions
//! - Content is never touched by status changes
//! - Per-version writes are serialized by the DashMap shard lock, so the
//!   check and the write happen under the same lock
//! - Which environments serve a version is tracked on the record itself

pub mod config_store;
pub mod snapshot;

pub use config_store::{transition_allowed, ActivationKind, ConfigStore, StoredDocument};
pub use snapshot::{Snapshot, SnapshotFile};
