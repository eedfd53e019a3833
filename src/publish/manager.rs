//! Publish and rollback authority.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::config::EnvironmentsConfig;
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::observability::metrics;
use crate::publish::history::{is_valid_environment, EnvironmentPointer, PublishRecord};
use crate::store::{ActivationKind, ConfigStore};
use crate::validation::validate_document;

type PointerTable = HashMap<String, Arc<EnvironmentPointer>>;

/// Owns every environment pointer and the publish log.
///
/// Writers for one environment are mutually exclusive: a writer that finds
/// the environment busy fails fast with `Conflict` instead of queueing.
/// Readers load the pointer table lock-free and always see a complete
/// pointer.
#[derive(Debug)]
pub struct PublishManager {
    store: Arc<ConfigStore>,
    clock: SharedClock,
    pointers: ArcSwap<PointerTable>,
    history: DashMap<String, Vec<PublishRecord>>,
    writers: DashMap<String, Arc<Mutex<()>>>,
    environments: ArcSwap<EnvironmentsConfig>,
}

impl PublishManager {
    pub fn new(store: Arc<ConfigStore>, clock: SharedClock, environments: EnvironmentsConfig) -> Self {
        Self {
            store,
            clock,
            pointers: ArcSwap::from_pointee(HashMap::new()),
            history: DashMap::new(),
            writers: DashMap::new(),
            environments: ArcSwap::from_pointee(environments),
        }
    }

    pub fn apply_environments(&self, environments: EnvironmentsConfig) {
        tracing::info!(allowed = ?environments.allowed, "Environment allow-list updated");
        self.environments.store(Arc::new(environments));
    }

    /// Make `version` the current version of `environment`.
    ///
    /// The document must pass validation whatever its status. Archived
    /// versions only come back through [`PublishManager::rollback`]. The
    /// version being replaced is archived once no environment serves it.
    pub fn publish(
        &self,
        version: &str,
        environment: &str,
        activated_by: &str,
    ) -> ControlPlaneResult<EnvironmentPointer> {
        let result = self.publish_exclusive(version, environment, activated_by);
        metrics::record_publish(environment, outcome(&result));
        result
    }

    fn publish_exclusive(
        &self,
        version: &str,
        environment: &str,
        activated_by: &str,
    ) -> ControlPlaneResult<EnvironmentPointer> {
        self.check_environment(environment)?;
        let lock = self.writer_lock(environment);
        let _guard = acquire(&lock, environment)?;

        let report = validate_document(&self.store.get(version)?);
        if !report.valid {
            return Err(ControlPlaneError::Validation(report));
        }

        let previous = self.pointer(environment);
        self.store.activate(version, environment, ActivationKind::Publish)?;

        let record = PublishRecord {
            id: Uuid::new_v4(),
            environment: environment.to_string(),
            version: version.to_string(),
            activated_at: self.clock.now_secs(),
            activated_by: activated_by.to_string(),
            kind: ActivationKind::Publish,
            rolled_back_from: None,
            previous: previous.as_ref().map(|p| p.lineage),
        };
        let lineage = self.append(record.clone());
        let pointer = self.swap_pointer(&record, lineage);

        if let Some(previous) = previous.filter(|p| p.version != version) {
            self.retire(&previous.version, environment);
        }

        tracing::info!(
            environment = %environment,
            version = %version,
            activated_by = %activated_by,
            record_id = %record.id,
            "Version published"
        );
        Ok(pointer)
    }

    /// Return `environment` to an earlier published version.
    ///
    /// Without a target, returns to the version the pointer held before the
    /// current entry, whether a publish or a rollback put it there. Entries
    /// naming the current version are skipped, and repeated rollbacks keep
    /// walking backwards. With a target, the version must have been active
    /// in this environment before.
    pub fn rollback(
        &self,
        environment: &str,
        target: Option<&str>,
        activated_by: &str,
    ) -> ControlPlaneResult<EnvironmentPointer> {
        let result = self.rollback_exclusive(environment, target, activated_by);
        metrics::record_rollback(environment, outcome(&result));
        result
    }

    fn rollback_exclusive(
        &self,
        environment: &str,
        target: Option<&str>,
        activated_by: &str,
    ) -> ControlPlaneResult<EnvironmentPointer> {
        self.check_environment(environment)?;
        let lock = self.writer_lock(environment);
        let _guard = acquire(&lock, environment)?;

        let no_prior = || ControlPlaneError::NoPriorVersion {
            environment: environment.to_string(),
        };
        let current = self.pointer(environment).ok_or_else(no_prior)?;

        if target == Some(current.version.as_str()) {
            tracing::info!(environment = %environment, version = %current.version, "Rollback target already current");
            return Ok(current.as_ref().clone());
        }

        let (version, previous) = {
            let entries = self.history.get(environment).ok_or_else(no_prior)?;
            let log = entries.value();
            let index = match target {
                None => {
                    let mut cursor = log.get(current.lineage).and_then(|r| r.previous);
                    // Links only point backwards, so the walk is bounded by the log.
                    for _ in 0..log.len() {
                        match cursor.and_then(|i| log.get(i)) {
                            Some(entry) if entry.version == current.version => cursor = entry.previous,
                            _ => break,
                        }
                    }
                    cursor
                        .filter(|i| log.get(*i).is_some_and(|r| r.version != current.version))
                        .ok_or_else(no_prior)?
                }
                Some(target) => log
                    .iter()
                    .rposition(|r| r.version == target)
                    .ok_or_else(|| ControlPlaneError::NotInHistory {
                        environment: environment.to_string(),
                        version: target.to_string(),
                    })?,
            };
            (log[index].version.clone(), log[index].previous)
        };

        // No re-validation: it was valid when first published.
        self.store.activate(&version, environment, ActivationKind::Rollback)?;

        let record = PublishRecord {
            id: Uuid::new_v4(),
            environment: environment.to_string(),
            version: version.clone(),
            activated_at: self.clock.now_secs(),
            activated_by: activated_by.to_string(),
            kind: ActivationKind::Rollback,
            rolled_back_from: Some(current.version.clone()),
            previous,
        };
        let lineage = self.append(record.clone());
        let pointer = self.swap_pointer(&record, lineage);
        self.retire(&current.version, environment);

        tracing::warn!(
            environment = %environment,
            from = %current.version,
            to = %version,
            activated_by = %activated_by,
            "Environment rolled back"
        );
        Ok(pointer)
    }

    /// Current pointer, or `NotConfigured` if nothing was ever published.
    pub fn current(&self, environment: &str) -> ControlPlaneResult<Arc<EnvironmentPointer>> {
        self.pointer(environment)
            .ok_or_else(|| ControlPlaneError::NotConfigured {
                environment: environment.to_string(),
            })
    }

    pub fn pointer(&self, environment: &str) -> Option<Arc<EnvironmentPointer>> {
        self.pointers.load().get(environment).cloned()
    }

    /// Publish log of one environment, oldest first.
    pub fn history(&self, environment: &str) -> Vec<PublishRecord> {
        self.history
            .get(environment)
            .map(|log| log.value().clone())
            .unwrap_or_default()
    }

    /// Every configured environment, sorted by name.
    pub fn environments(&self) -> Vec<EnvironmentPointer> {
        let mut all: Vec<EnvironmentPointer> = self
            .pointers
            .load()
            .values()
            .map(|p| p.as_ref().clone())
            .collect();
        all.sort_by(|a, b| a.environment.cmp(&b.environment));
        all
    }

    /// Pointers and the flattened history, for snapshots.
    pub fn export(&self) -> (Vec<EnvironmentPointer>, Vec<PublishRecord>) {
        let pointers = self.environments();
        let mut names: Vec<String> = self.history.iter().map(|r| r.key().clone()).collect();
        names.sort();
        let history = names.iter().flat_map(|env| self.history(env)).collect();
        (pointers, history)
    }

    /// Replace pointers and history. Per-environment order is preserved.
    pub fn restore(&self, pointers: Vec<EnvironmentPointer>, history: Vec<PublishRecord>) {
        self.history.clear();
        for record in history {
            self.history
                .entry(record.environment.clone())
                .or_default()
                .push(record);
        }
        let table: PointerTable = pointers
            .into_iter()
            .map(|p| (p.environment.clone(), Arc::new(p)))
            .collect();
        tracing::info!(environments = table.len(), "Environment pointers restored");
        self.pointers.store(Arc::new(table));
    }

    fn check_environment(&self, environment: &str) -> ControlPlaneResult<()> {
        if is_valid_environment(environment) && self.environments.load().permits(environment) {
            Ok(())
        } else {
            Err(ControlPlaneError::InvalidEnvironment(environment.to_string()))
        }
    }

    fn writer_lock(&self, environment: &str) -> Arc<Mutex<()>> {
        self.writers
            .entry(environment.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Append to the environment's log and return the new entry's index.
    fn append(&self, record: PublishRecord) -> usize {
        let mut log = self.history.entry(record.environment.clone()).or_default();
        log.push(record);
        log.len() - 1
    }

    fn swap_pointer(&self, record: &PublishRecord, lineage: usize) -> EnvironmentPointer {
        let pointer = EnvironmentPointer {
            environment: record.environment.clone(),
            version: record.version.clone(),
            activated_at: record.activated_at,
            activated_by: record.activated_by.clone(),
            lineage,
            record_id: record.id,
        };
        let shared = Arc::new(pointer.clone());
        self.pointers.rcu(|table| {
            let mut next = PointerTable::clone(table);
            next.insert(record.environment.clone(), shared.clone());
            next
        });
        pointer
    }

    fn retire(&self, version: &str, environment: &str) {
        if let Err(e) = self.store.deactivate(version, environment) {
            tracing::warn!(version = %version, environment = %environment, error = %e, "Failed to release superseded version");
        }
    }
}

fn acquire<'a>(lock: &'a Mutex<()>, environment: &str) -> ControlPlaneResult<MutexGuard<'a, ()>> {
    match lock.try_lock() {
        Ok(guard) => Ok(guard),
        // The guarded state is the pointer table, which is swapped whole.
        Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => {
            tracing::debug!(environment = %environment, "Environment busy");
            Err(ControlPlaneError::Conflict {
                environment: environment.to_string(),
            })
        }
    }
}

fn outcome<T>(result: &ControlPlaneResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.error_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::document::{DocumentStatus, UiConfigDocument};
    use serde_json::json;
    use std::sync::Barrier;

    fn valid_doc(version: &str) -> UiConfigDocument {
        serde_json::from_value(json!({
            "version": version,
            "tokens": {
                "colors": { "primary": "#FF6B6B" },
                "spacing": { "md": 16 },
                "radii": { "md": 12 },
                "typography": {},
                "motion": {},
                "shadow": {},
                "palette": { "gradients": {} }
            },
            "microInteractions": {
                "guards": { "respectReducedMotion": true, "lowEndDevicePolicy": "simplify" }
            },
            "components": { "button": { "variant": "primary" } },
            "screens": {},
            "featureFlags": { "stories": true },
            "meta": { "author": "ops" }
        }))
        .unwrap()
    }

    fn setup(versions: &[&str]) -> (Arc<ConfigStore>, PublishManager) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let store = Arc::new(ConfigStore::new(clock.clone()));
        for v in versions {
            store.create(valid_doc(v)).unwrap();
        }
        let manager = PublishManager::new(store.clone(), clock, EnvironmentsConfig::default());
        (store, manager)
    }

    fn current(manager: &PublishManager, env: &str) -> String {
        manager.current(env).unwrap().version.clone()
    }

    #[test]
    fn test_publish_then_rollback_scenario() {
        let (store, manager) = setup(&["1.2.0", "1.3.0"]);

        manager.publish("1.2.0", "prod", "ops").unwrap();
        assert_eq!(current(&manager, "prod"), "1.2.0");
        assert_eq!(store.get("1.2.0").unwrap().status, DocumentStatus::Prod);

        manager.publish("1.3.0", "prod", "ops").unwrap();
        assert_eq!(store.get("1.2.0").unwrap().status, DocumentStatus::Archived);

        let pointer = manager.rollback("prod", None, "ops").unwrap();
        assert_eq!(pointer.version, "1.2.0");
        assert_eq!(current(&manager, "prod"), "1.2.0");
        assert_eq!(store.get("1.2.0").unwrap().status, DocumentStatus::Prod);
        assert_eq!(store.get("1.3.0").unwrap().status, DocumentStatus::Archived);

        let history = manager.history("prod");
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].kind, ActivationKind::Rollback);
        assert_eq!(history[2].rolled_back_from.as_deref(), Some("1.3.0"));
    }

    #[test]
    fn test_rollback_without_history_leaves_pointer_alone() {
        let (_, manager) = setup(&["1.0.0"]);
        assert!(matches!(
            manager.rollback("prod", None, "ops"),
            Err(ControlPlaneError::NoPriorVersion { .. })
        ));
        assert!(manager.pointer("prod").is_none());

        manager.publish("1.0.0", "prod", "ops").unwrap();
        assert!(matches!(
            manager.rollback("prod", None, "ops"),
            Err(ControlPlaneError::NoPriorVersion { .. })
        ));
        assert_eq!(current(&manager, "prod"), "1.0.0");
        assert_eq!(manager.history("prod").len(), 1);
    }

    #[test]
    fn test_repeated_rollbacks_walk_backwards() {
        let (_, manager) = setup(&["1.0.0", "1.1.0", "1.2.0"]);
        for v in ["1.0.0", "1.1.0", "1.2.0"] {
            manager.publish(v, "prod", "ops").unwrap();
        }

        assert_eq!(manager.rollback("prod", None, "ops").unwrap().version, "1.1.0");
        assert_eq!(manager.rollback("prod", None, "ops").unwrap().version, "1.0.0");
        assert!(matches!(
            manager.rollback("prod", None, "ops"),
            Err(ControlPlaneError::NoPriorVersion { .. })
        ));
        assert_eq!(current(&manager, "prod"), "1.0.0");
    }

    #[test]
    fn test_rollback_returns_to_version_restored_by_earlier_rollback() {
        let (store, manager) = setup(&["1.0.0", "1.1.0", "1.2.0"]);
        manager.publish("1.0.0", "prod", "ops").unwrap();
        manager.publish("1.1.0", "prod", "ops").unwrap();
        assert_eq!(manager.rollback("prod", None, "ops").unwrap().version, "1.0.0");
        manager.publish("1.2.0", "prod", "ops").unwrap();

        assert_eq!(manager.rollback("prod", None, "ops").unwrap().version, "1.0.0");
        assert_eq!(store.get("1.2.0").unwrap().status, DocumentStatus::Archived);
        assert_eq!(store.get("1.1.0").unwrap().status, DocumentStatus::Archived);

        // 1.0.0 was first published with nothing before it.
        assert!(matches!(
            manager.rollback("prod", None, "ops"),
            Err(ControlPlaneError::NoPriorVersion { .. })
        ));
    }

    #[test]
    fn test_rollback_after_explicit_target_keeps_walking_back() {
        let (_, manager) = setup(&["1.0.0", "1.1.0", "1.2.0", "1.3.0"]);
        for v in ["1.0.0", "1.1.0", "1.2.0", "1.3.0"] {
            manager.publish(v, "prod", "ops").unwrap();
        }
        manager.rollback("prod", Some("1.1.0"), "ops").unwrap();
        assert_eq!(manager.rollback("prod", None, "ops").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_rollback_skips_republished_current_version() {
        let (_, manager) = setup(&["1.0.0", "1.1.0"]);
        for v in ["1.0.0", "1.1.0", "1.1.0"] {
            manager.publish(v, "prod", "ops").unwrap();
        }
        assert_eq!(manager.rollback("prod", None, "ops").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_rollback_to_explicit_target() {
        let (_, manager) = setup(&["1.0.0", "1.1.0", "1.2.0", "9.9.9"]);
        for v in ["1.0.0", "1.1.0", "1.2.0"] {
            manager.publish(v, "prod", "ops").unwrap();
        }

        assert_eq!(manager.rollback("prod", Some("1.0.0"), "ops").unwrap().version, "1.0.0");
        // Already current: no new history entry.
        manager.rollback("prod", Some("1.0.0"), "ops").unwrap();
        assert_eq!(manager.history("prod").len(), 4);

        assert!(matches!(
            manager.rollback("prod", Some("9.9.9"), "ops"),
            Err(ControlPlaneError::NotInHistory { .. })
        ));
    }

    #[test]
    fn test_rollback_to_purged_version_is_not_found() {
        let (store, manager) = setup(&["1.0.0", "1.1.0"]);
        manager.publish("1.0.0", "prod", "ops").unwrap();
        manager.publish("1.1.0", "prod", "ops").unwrap();
        store.purge("1.0.0").unwrap();

        assert!(matches!(
            manager.rollback("prod", None, "ops"),
            Err(ControlPlaneError::NotFound { .. })
        ));
        assert_eq!(current(&manager, "prod"), "1.1.0");
        assert_eq!(manager.history("prod").len(), 2);
    }

    #[test]
    fn test_invalid_document_is_never_published() {
        let (store, manager) = setup(&[]);
        store.create(UiConfigDocument::new("0.1.0")).unwrap();

        assert!(matches!(
            manager.publish("0.1.0", "prod", "ops"),
            Err(ControlPlaneError::Validation(_))
        ));
        assert!(manager.pointer("prod").is_none());
        assert!(manager.history("prod").is_empty());
        assert_eq!(store.get("0.1.0").unwrap().status, DocumentStatus::Draft);
    }

    #[test]
    fn test_environment_names_and_allow_list() {
        let (_, manager) = setup(&["1.0.0"]);
        assert!(matches!(
            manager.publish("1.0.0", "Prod Env", "ops"),
            Err(ControlPlaneError::InvalidEnvironment(_))
        ));

        manager.apply_environments(EnvironmentsConfig {
            allowed: vec!["prod".into()],
        });
        assert!(matches!(
            manager.publish("1.0.0", "staging", "ops"),
            Err(ControlPlaneError::InvalidEnvironment(_))
        ));
        assert!(manager.publish("1.0.0", "prod", "ops").is_ok());
    }

    #[test]
    fn test_environments_are_independent() {
        let (store, manager) = setup(&["1.0.0", "1.1.0"]);
        manager.publish("1.0.0", "prod", "ops").unwrap();
        manager.publish("1.0.0", "staging", "ops").unwrap();
        manager.publish("1.1.0", "staging", "ops").unwrap();

        // Still served by prod, so not archived.
        assert_eq!(store.get("1.0.0").unwrap().status, DocumentStatus::Prod);
        assert_eq!(current(&manager, "prod"), "1.0.0");
        assert_eq!(current(&manager, "staging"), "1.1.0");
        assert!(matches!(
            manager.current("dev"),
            Err(ControlPlaneError::NotConfigured { .. })
        ));

        let envs: Vec<String> = manager.environments().into_iter().map(|p| p.environment).collect();
        assert_eq!(envs, vec!["prod", "staging"]);
    }

    #[test]
    fn test_busy_environment_conflicts() {
        let (_, manager) = setup(&["1.0.0"]);
        let lock = manager.writer_lock("prod");
        let held = lock.lock().unwrap();

        assert!(matches!(
            manager.publish("1.0.0", "prod", "ops"),
            Err(ControlPlaneError::Conflict { .. })
        ));
        assert!(manager.publish("1.0.0", "staging", "ops").is_ok());

        drop(held);
        assert!(manager.publish("1.0.0", "prod", "ops").is_ok());
    }

    #[test]
    fn test_concurrent_publishes_settle_on_one_winner() {
        for _ in 0..20 {
            let (_, manager) = setup(&["1.0.0", "2.0.0"]);
            let manager = Arc::new(manager);
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = ["1.0.0", "2.0.0"]
                .into_iter()
                .map(|v| {
                    let manager = manager.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        manager.publish(v, "prod", "ops").map(|p| p.version)
                    })
                })
                .collect();

            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let winners: Vec<&String> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            for r in &results {
                if let Err(e) = r {
                    assert!(matches!(e, ControlPlaneError::Conflict { .. }));
                }
            }

            assert!(!winners.is_empty());
            let pointer = current(&manager, "prod");
            assert!(winners.contains(&&pointer));
            assert_eq!(manager.history("prod").len(), winners.len());
        }
    }

    #[test]
    fn test_parallel_environments_never_conflict() {
        let (_, manager) = setup(&["1.0.0"]);
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                std::thread::spawn(move || manager.publish("1.0.0", &format!("env-{i}"), "ops"))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(manager.environments().len(), 8);
    }

    #[test]
    fn test_export_restore() {
        let (store, manager) = setup(&["1.0.0", "1.1.0"]);
        manager.publish("1.0.0", "prod", "ops").unwrap();
        manager.publish("1.0.0", "staging", "ops").unwrap();
        manager.publish("1.1.0", "prod", "ops").unwrap();
        let (pointers, history) = manager.export();
        assert_eq!(pointers.len(), 2);
        assert_eq!(history.len(), 3);

        let restored = PublishManager::new(store, Arc::new(ManualClock::new(0)), EnvironmentsConfig::default());
        restored.restore(pointers, history);
        assert_eq!(current(&restored, "prod"), "1.1.0");
        assert_eq!(restored.history("prod").len(), 2);
        assert_eq!(restored.rollback("prod", None, "ops").unwrap().version, "1.0.0");
    }
}
