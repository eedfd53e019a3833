//! Publish subsystem: environment pointers, history and rollback.
//!
//! # Data Flow
//! ```text
//! publish(version, env)
//!     → env name check (slug + allow-list)
//!     → per-env writer lock (busy → Conflict)
//!     → validate document
//!     → ConfigStore::activate (status → prod)
//!     → append history → swap pointer → archive superseded version
//!
//! rollback(env, target?)
//!     → same lock
//!     → follow the current entry's `previous` link in history
//!     → ConfigStore::activate (archived → prod allowed)
//!     → append rollback entry → swap pointer → archive superseded version
//!
//! reads: pointer table is an ArcSwap, loaded without locking
//! ```
//!
//! # Design Decisions
//! - The pointer is replaced whole, never patched field by field
//! - Rollback candidates are the versions this environment actually served
//! - History is append-only; rollbacks are recorded too

pub mod history;
pub mod manager;

pub use history::{is_valid_environment, EnvironmentPointer, PublishRecord, MAX_ENVIRONMENT_LEN};
pub use manager::PublishManager;
