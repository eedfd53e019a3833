//! Preview session issuance and resolution.

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;

use crate::clock::SharedClock;
use crate::config::PreviewConfig;
use crate::document::UiConfigDocument;
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::observability::metrics;
use crate::preview::session::{generate_code, normalize_code, PreviewSession};
use crate::store::ConfigStore;

/// Issues and resolves preview codes.
///
/// Codes are unique among live sessions: insertion goes through the map
/// entry API, so two concurrent issuers can never both claim one code. An
/// expired session's code may be handed out again.
#[derive(Debug)]
pub struct PreviewSessionManager {
    sessions: DashMap<String, PreviewSession>,
    store: Arc<ConfigStore>,
    clock: SharedClock,
    settings: ArcSwap<PreviewConfig>,
    reloaded: Notify,
}

impl PreviewSessionManager {
    pub fn new(store: Arc<ConfigStore>, clock: SharedClock, settings: PreviewConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            store,
            clock,
            settings: ArcSwap::from_pointee(settings),
            reloaded: Notify::new(),
        }
    }

    /// Swap in new limits. Existing sessions keep their expiry.
    pub fn apply_settings(&self, settings: PreviewConfig) {
        tracing::info!(
            default_ttl_secs = settings.default_ttl_secs,
            max_ttl_secs = settings.max_ttl_secs,
            "Preview settings updated"
        );
        self.settings.store(Arc::new(settings));
        self.reloaded.notify_one();
    }

    pub fn settings(&self) -> Arc<PreviewConfig> {
        self.settings.load_full()
    }

    /// Resolves after the next [`PreviewSessionManager::apply_settings`].
    /// A reload that happened while nobody waited is not lost.
    pub async fn settings_reloaded(&self) {
        self.reloaded.notified().await;
    }

    /// Issue a code for `version`, valid for `ttl_secs` (or the default).
    pub fn issue(&self, version: &str, ttl_secs: Option<u64>) -> ControlPlaneResult<PreviewSession> {
        let settings = self.settings.load();
        let ttl = ttl_secs.unwrap_or(settings.default_ttl_secs);
        if ttl == 0 || ttl > settings.max_ttl_secs {
            return Err(ControlPlaneError::InvalidTtl {
                requested: ttl,
                max: settings.max_ttl_secs,
            });
        }

        // The version must exist; its status does not matter.
        self.store.get(version)?;

        let now = self.clock.now_secs();
        for attempt in 1..=settings.max_issue_attempts {
            let session = PreviewSession {
                code: generate_code(),
                version: version.to_string(),
                created_at: now,
                expires_at: now.saturating_add(ttl),
            };

            let claimed = match self.sessions.entry(session.code.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(session.clone());
                    true
                }
                Entry::Occupied(mut slot) if slot.get().is_expired_at(now) => {
                    slot.insert(session.clone());
                    true
                }
                Entry::Occupied(_) => false,
            };

            if claimed {
                tracing::info!(
                    code = %session.code,
                    version = %version,
                    ttl_secs = ttl,
                    attempt,
                    "Preview session issued"
                );
                metrics::record_preview_issued();
                metrics::record_active_previews(self.sessions.len());
                return Ok(session);
            }
            tracing::debug!(code = %session.code, attempt, "Preview code collision, regenerating");
        }

        tracing::warn!(version = %version, attempts = settings.max_issue_attempts, "Preview code space exhausted");
        Err(ControlPlaneError::PreviewCodesExhausted {
            attempts: settings.max_issue_attempts,
        })
    }

    /// The session behind `code`, if it is live.
    pub fn session(&self, code: &str) -> ControlPlaneResult<PreviewSession> {
        let code = normalize_code(code).ok_or_else(|| ControlPlaneError::session_not_found(code))?;
        let now = self.clock.now_secs();

        let session = self
            .sessions
            .get(&code)
            .map(|r| r.value().clone())
            .ok_or_else(|| ControlPlaneError::session_not_found(&code))?;

        if session.is_expired_at(now) {
            let retention = self.settings.load().expired_retention_secs;
            if now >= session.expires_at.saturating_add(retention) {
                self.evict_if_expired(&code, now);
            }
            return Err(ControlPlaneError::Expired { code });
        }
        Ok(session)
    }

    /// Resolve a code to the document it points at.
    pub fn resolve(&self, code: &str) -> ControlPlaneResult<UiConfigDocument> {
        let outcome = self
            .session(code)
            .and_then(|session| self.store.get(&session.version));

        metrics::record_preview_resolution(match &outcome {
            Ok(_) => "ok",
            Err(ControlPlaneError::Expired { .. }) => "expired",
            Err(_) => "not_found",
        });
        outcome
    }

    /// Invalidate a session immediately.
    pub fn revoke(&self, code: &str) -> ControlPlaneResult<PreviewSession> {
        let normalized =
            normalize_code(code).ok_or_else(|| ControlPlaneError::session_not_found(code))?;
        let (_, session) = self
            .sessions
            .remove(&normalized)
            .ok_or_else(|| ControlPlaneError::session_not_found(&normalized))?;

        tracing::info!(code = %normalized, version = %session.version, "Preview session revoked");
        metrics::record_active_previews(self.sessions.len());
        Ok(session)
    }

    /// Live sessions, newest first.
    pub fn sessions(&self) -> Vec<PreviewSession> {
        let now = self.clock.now_secs();
        let mut live: Vec<PreviewSession> = self
            .sessions
            .iter()
            .filter(|r| !r.value().is_expired_at(now))
            .map(|r| r.value().clone())
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.code.cmp(&b.code)));
        live
    }

    /// Physically drop sessions expired for longer than the retention
    /// window. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_secs();
        let retention = self.settings.load().expired_retention_secs;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now < s.expires_at.saturating_add(retention));
        let removed = before.saturating_sub(self.sessions.len());

        metrics::record_active_previews(self.sessions.len());
        if removed > 0 {
            tracing::info!(removed, "Swept expired preview sessions");
        }
        removed
    }

    /// Total tracked sessions, including expired ones not yet swept.
    pub fn tracked(&self) -> usize {
        self.sessions.len()
    }

    fn evict_if_expired(&self, code: &str, now: u64) {
        if self
            .sessions
            .remove_if(code, |_, s| s.is_expired_at(now))
            .is_some()
        {
            tracing::debug!(code = %code, "Evicted expired preview session");
        }
    }

    #[cfg(test)]
    fn insert_raw(&self, session: PreviewSession) {
        self.sessions.insert(session.code.clone(), session);
    }
}
