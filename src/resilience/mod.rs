//! Resilience helpers for callers of the admin API.
//!
//! # Data Flow
//! ```text
//! publish / rollback request
//!     → 409 conflict (another writer held the environment)
//!     → backoff.rs (exponential delay with jitter)
//!     → retry until success, a different error, or attempts run out
//! ```
//!
//! # Design Decisions
//! - Only `conflict` is retried; every other error is final
//! - Jitter keeps competing operators from retrying in lockstep

pub mod backoff;

pub use backoff::{calculate_backoff, RetryPolicy};
