//! Background removal of long-expired preview sessions.
//!
//! # Responsibilities
//! - Periodically sweep the session table
//! - Pick up reloaded sweep settings without a restart
//! - Stop on the shared shutdown signal

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Interval};

use crate::config::PreviewConfig;
use crate::preview::manager::PreviewSessionManager;

pub struct PreviewSweeper {
    previews: Arc<PreviewSessionManager>,
}

impl PreviewSweeper {
    pub fn new(previews: Arc<PreviewSessionManager>) -> Self {
        Self { previews }
    }

    /// Sweep on every tick until shutdown.
    ///
    /// While sweeping is disabled the loop keeps ticking without touching
    /// the table, so a reload can switch it back on.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let settings = self.previews.settings();
        tracing::info!(
            enabled = settings.sweep_enabled,
            interval = settings.sweep_interval_secs,
            retention = settings.expired_retention_secs,
            "Preview sweeper starting"
        );
        let mut ticker = ticker_for(&settings);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.previews.settings().sweep_enabled {
                        self.previews.sweep();
                    }
                }
                _ = self.previews.settings_reloaded() => {
                    let settings = self.previews.settings();
                    tracing::info!(
                        enabled = settings.sweep_enabled,
                        interval = settings.sweep_interval_secs,
                        "Preview sweeper settings reloaded"
                    );
                    ticker = ticker_for(&settings);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Preview sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// The first tick fires immediately.
fn ticker_for(settings: &PreviewConfig) -> Interval {
    let mut ticker = time::interval(Duration::from_secs(settings.sweep_interval_secs.max(1)));
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    ticker
}
