//! The control plane facade used by the HTTP layer.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::clock::SharedClock;
use crate::config::ServiceConfig;
use crate::document::{DocumentStatus, UiConfigDocument};
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::preview::{PreviewSession, PreviewSessionManager};
use crate::publish::{EnvironmentPointer, PublishManager};
use crate::store::{ConfigStore, Snapshot, SnapshotFile};

/// Counts reported by the admin status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub documents: usize,
    pub environments: usize,
    pub preview_sessions: usize,
    pub snapshot_path: Option<String>,
}

/// Composes the store, preview sessions and the publish authority.
///
/// Reads go straight to the components. Mutations that change persisted
/// state are followed by one snapshot write when a snapshot file is
/// configured.
#[derive(Debug)]
pub struct ConfigService {
    store: Arc<ConfigStore>,
    previews: Arc<PreviewSessionManager>,
    publisher: Arc<PublishManager>,
    snapshot: Option<SnapshotFile>,
    save_lock: Mutex<()>,
}

impl ConfigService {
    pub fn new(config: &ServiceConfig, clock: SharedClock) -> Self {
        let store = Arc::new(ConfigStore::new(clock.clone()));
        let previews = Arc::new(PreviewSessionManager::new(
            store.clone(),
            clock.clone(),
            config.preview.clone(),
        ));
        let publisher = Arc::new(PublishManager::new(
            store.clone(),
            clock,
            config.environments.clone(),
        ));
        let snapshot = config.storage.snapshot_path.as_ref().map(SnapshotFile::new);

        Self {
            store,
            previews,
            publisher,
            snapshot,
            save_lock: Mutex::new(()),
        }
    }

    /// Defaults, no snapshot file.
    pub fn in_memory(clock: SharedClock) -> Self {
        Self::new(&ServiceConfig::default(), clock)
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn previews(&self) -> &Arc<PreviewSessionManager> {
        &self.previews
    }

    pub fn publisher(&self) -> &Arc<PublishManager> {
        &self.publisher
    }

    /// Push hot-reloadable settings into the components.
    pub fn apply_config(&self, config: &ServiceConfig) {
        self.previews.apply_settings(config.preview.clone());
        self.publisher.apply_environments(config.environments.clone());
    }

    /// The document `environment` currently serves.
    pub fn get_current(&self, environment: &str) -> ControlPlaneResult<UiConfigDocument> {
        let pointer = self.publisher.current(environment)?;
        match self.store.get(&pointer.version) {
            // Superseded and purged between the two reads; the pointer has
            // moved on by now.
            Err(ControlPlaneError::NotFound { .. }) => {
                let latest = self.publisher.current(environment)?;
                self.store.get(&latest.version)
            }
            other => other,
        }
    }

    /// The document behind a preview code, reported with status `preview`.
    /// The stored document keeps its own status.
    pub fn get_preview(&self, code: &str) -> ControlPlaneResult<UiConfigDocument> {
        let doc = self.previews.resolve(code)?;
        Ok(doc.with_status(DocumentStatus::Preview))
    }

    pub fn create(&self, doc: UiConfigDocument) -> ControlPlaneResult<UiConfigDocument> {
        self.persist_after(self.store.create(doc))
    }

    pub fn update_draft(&self, doc: UiConfigDocument) -> ControlPlaneResult<UiConfigDocument> {
        self.persist_after(self.store.update_draft(doc))
    }

    pub fn update_status(
        &self,
        version: &str,
        to: DocumentStatus,
    ) -> ControlPlaneResult<UiConfigDocument> {
        self.persist_after(self.store.update_status(version, to))
    }

    pub fn fork(
        &self,
        source: &str,
        new_version: &str,
        author: Option<String>,
    ) -> ControlPlaneResult<UiConfigDocument> {
        self.persist_after(self.store.fork(source, new_version, author))
    }

    pub fn purge(&self, version: &str) -> ControlPlaneResult<UiConfigDocument> {
        self.persist_after(self.store.purge(version))
    }

    pub fn issue_preview(
        &self,
        version: &str,
        ttl_secs: Option<u64>,
    ) -> ControlPlaneResult<PreviewSession> {
        self.previews.issue(version, ttl_secs)
    }

    pub fn publish(
        &self,
        version: &str,
        environment: &str,
        activated_by: &str,
    ) -> ControlPlaneResult<EnvironmentPointer> {
        self.persist_after(self.publisher.publish(version, environment, activated_by))
    }

    pub fn rollback(
        &self,
        environment: &str,
        target: Option<&str>,
        activated_by: &str,
    ) -> ControlPlaneResult<EnvironmentPointer> {
        self.persist_after(self.publisher.rollback(environment, target, activated_by))
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
            documents: self.store.len(),
            environments: self.publisher.environments().len(),
            preview_sessions: self.previews.sessions().len(),
            snapshot_path: self
                .snapshot
                .as_ref()
                .map(|s| s.path().display().to_string()),
        }
    }

    /// Current state as one serializable value.
    pub fn snapshot(&self) -> Snapshot {
        let (pointers, history) = self.publisher.export();
        Snapshot {
            documents: self.store.export(),
            pointers,
            history,
        }
    }

    /// Replace all documents, pointers and history.
    pub fn restore(&self, snapshot: Snapshot) {
        self.store.restore(snapshot.documents);
        self.publisher.restore(snapshot.pointers, snapshot.history);
    }

    /// Load the configured snapshot file, if any. Returns whether state was
    /// restored.
    pub fn load_snapshot(&self) -> ControlPlaneResult<bool> {
        let Some(file) = &self.snapshot else {
            return Ok(false);
        };
        match file.load()? {
            Some(snapshot) => {
                self.restore(snapshot);
                Ok(true)
            }
            None => {
                tracing::info!(path = %file.path().display(), "No snapshot yet, starting empty");
                Ok(false)
            }
        }
    }

    /// Write the snapshot file. A no-op without one configured.
    pub fn persist(&self) -> ControlPlaneResult<()> {
        let Some(file) = &self.snapshot else {
            return Ok(());
        };
        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.save(&self.snapshot())
    }

    fn persist_after<T>(&self, result: ControlPlaneResult<T>) -> ControlPlaneResult<T> {
        if result.is_ok() {
            // The in-memory change is committed either way; a failed write
            // is retried by the next mutation or at shutdown.
            if let Err(e) = self.persist() {
                tracing::error!(error = %e, "Failed to write snapshot");
            }
        }
        result
    }
}
