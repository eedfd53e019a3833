//! Read and write entry points shared by the HTTP handlers.
//!
//! # Data Flow
//! ```text
//! get_current(env)  → PublishManager pointer (lock-free) → ConfigStore::get
//! get_preview(code) → PreviewSessionManager::resolve → status shown as preview
//! mutations         → component call → snapshot write on success
//! ```
//!
//! # Design Decisions
//! - Reads never take a writer lock
//! - "Never published" and "link expired" stay distinct errors
//! - Preview sessions are not persisted

pub mod service;

pub use service::{ConfigService, ServiceStatus};
