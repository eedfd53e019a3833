//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the service from validated settings
//! - Restore persisted state before any request is served
//!
//! # Design Decisions
//! - Fail fast: an unreadable snapshot is fatal rather than silently
//!   starting empty
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use crate::clock::{system_clock, SharedClock};
use crate::config::ServiceConfig;
use crate::error::ControlPlaneResult;
use crate::serving::ConfigService;

/// Build the service on the system clock and load its snapshot.
pub fn bootstrap(config: &ServiceConfig) -> ControlPlaneResult<Arc<ConfigService>> {
    bootstrap_with_clock(config, system_clock())
}

pub fn bootstrap_with_clock(
    config: &ServiceConfig,
    clock: SharedClock,
) -> ControlPlaneResult<Arc<ConfigService>> {
    let service = ConfigService::new(config, clock);
    let restored = service.load_snapshot()?;

    let status = service.status();
    tracing::info!(
        restored,
        documents = status.documents,
        environments = status.environments,
        "Control plane ready"
    );
    Ok(Arc::new(service))
}
