//! Versioned document table with the status state machine.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::document::{is_valid_version, DocumentStatus, Meta, UiConfigDocument};
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::observability::metrics;
use crate::validation::validate_document;

/// Why an environment is activating a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Publish,
    Rollback,
}

/// A document plus the bookkeeping the store keeps about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub document: UiConfigDocument,
    /// Insertion order; newest has the highest value.
    pub sequence: u64,
    pub created_at: u64,
    pub updated_at: u64,
    /// Environments whose pointer currently references this version.
    #[serde(default)]
    pub active_in: BTreeSet<String>,
}

/// Whether the state machine allows `from → to`.
///
/// draft → {preview, prod, archived}; preview → {prod, draft, archived};
/// prod → {archived}; archived is terminal. Reactivating an archived
/// version is a rollback concern and goes through [`ConfigStore::activate`].
pub fn transition_allowed(from: DocumentStatus, to: DocumentStatus) -> bool {
    use DocumentStatus::*;
    matches!(
        (from, to),
        (Draft, Preview)
            | (Draft, Prod)
            | (Draft, Archived)
            | (Preview, Prod)
            | (Preview, Draft)
            | (Preview, Archived)
            | (Prod, Archived)
    )
}

/// In-memory document store keyed by version.
#[derive(Debug)]
pub struct ConfigStore {
    documents: DashMap<String, StoredDocument>,
    sequence: AtomicU64,
    clock: SharedClock,
}

impl ConfigStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            documents: DashMap::new(),
            sequence: AtomicU64::new(0),
            clock,
        }
    }

    /// Insert a new draft. The incoming status is ignored.
    pub fn create(&self, mut doc: UiConfigDocument) -> ControlPlaneResult<UiConfigDocument> {
        if !is_valid_version(&doc.version) {
            return Err(ControlPlaneError::InvalidVersion(doc.version));
        }
        doc.status = DocumentStatus::Draft;

        let now = self.clock.now_secs();
        match self.documents.entry(doc.version.clone()) {
            Entry::Occupied(_) => Err(ControlPlaneError::AlreadyExists {
                version: doc.version,
            }),
            Entry::Vacant(slot) => {
                let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(StoredDocument {
                    document: doc.clone(),
                    sequence,
                    created_at: now,
                    updated_at: now,
                    active_in: BTreeSet::new(),
                });
                tracing::info!(version = %doc.version, author = ?doc.author(), "Draft created");
                metrics::record_documents(self.documents.len());
                Ok(doc)
            }
        }
    }

    pub fn get(&self, version: &str) -> ControlPlaneResult<UiConfigDocument> {
        self.documents
            .get(version)
            .map(|r| r.value().document.clone())
            .ok_or_else(|| ControlPlaneError::document_not_found(version))
    }

    /// The document together with its bookkeeping.
    pub fn record(&self, version: &str) -> ControlPlaneResult<StoredDocument> {
        self.documents
            .get(version)
            .map(|r| r.value().clone())
            .ok_or_else(|| ControlPlaneError::document_not_found(version))
    }

    /// Documents newest-first, optionally filtered by status.
    pub fn list(&self, status: Option<DocumentStatus>) -> Vec<UiConfigDocument> {
        let mut records: Vec<(u64, UiConfigDocument)> = self
            .documents
            .iter()
            .filter(|r| status.map_or(true, |s| r.value().document.status == s))
            .map(|r| (r.value().sequence, r.value().document.clone()))
            .collect();
        records.sort_by(|a, b| b.0.cmp(&a.0));
        records.into_iter().map(|(_, doc)| doc).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Replace the content of an existing draft.
    pub fn update_draft(&self, mut doc: UiConfigDocument) -> ControlPlaneResult<UiConfigDocument> {
        let mut record = self
            .documents
            .get_mut(&doc.version)
            .ok_or_else(|| ControlPlaneError::document_not_found(&doc.version))?;

        let status = record.document.status;
        if status != DocumentStatus::Draft {
            return Err(ControlPlaneError::Immutable {
                version: doc.version,
                status,
            });
        }

        doc.status = DocumentStatus::Draft;
        record.document = doc.clone();
        record.updated_at = self.clock.now_secs();
        tracing::debug!(version = %doc.version, "Draft updated");
        Ok(doc)
    }

    /// Move a document through the status state machine.
    ///
    /// Leaving draft for preview or prod requires a valid document. Archiving
    /// a version still active in some environment is refused; a later publish
    /// or rollback archives it once no environment serves it.
    pub fn update_status(
        &self,
        version: &str,
        to: DocumentStatus,
    ) -> ControlPlaneResult<UiConfigDocument> {
        let mut record = self
            .documents
            .get_mut(version)
            .ok_or_else(|| ControlPlaneError::document_not_found(version))?;

        let from = record.document.status;
        let active = !record.active_in.is_empty();
        if !transition_allowed(from, to) || (to == DocumentStatus::Archived && active) {
            return Err(ControlPlaneError::InvalidTransition {
                version: version.to_string(),
                from,
                to,
            });
        }

        if from == DocumentStatus::Draft && to != DocumentStatus::Archived {
            let report = validate_document(&record.document);
            if !report.valid {
                return Err(ControlPlaneError::Validation(report));
            }
        }

        record.document.status = to;
        record.updated_at = self.clock.now_secs();
        tracing::info!(version = %version, from = %from, to = %to, "Status changed");
        Ok(record.document.clone())
    }

    /// Mark `version` as served by `environment` and set it to prod.
    ///
    /// Publishing accepts draft, preview or prod documents; rollback accepts
    /// prod or archived ones. Checks run before anything is written.
    pub fn activate(
        &self,
        version: &str,
        environment: &str,
        kind: ActivationKind,
    ) -> ControlPlaneResult<UiConfigDocument> {
        let mut record = self
            .documents
            .get_mut(version)
            .ok_or_else(|| ControlPlaneError::document_not_found(version))?;

        let from = record.document.status;
        let allowed = match kind {
            ActivationKind::Publish => {
                from == DocumentStatus::Prod || transition_allowed(from, DocumentStatus::Prod)
            }
            ActivationKind::Rollback => {
                matches!(from, DocumentStatus::Prod | DocumentStatus::Archived)
            }
        };
        if !allowed {
            return Err(ControlPlaneError::InvalidTransition {
                version: version.to_string(),
                from,
                to: DocumentStatus::Prod,
            });
        }

        if from == DocumentStatus::Draft {
            let report = validate_document(&record.document);
            if !report.valid {
                return Err(ControlPlaneError::Validation(report));
            }
        }

        record.document.status = DocumentStatus::Prod;
        record.active_in.insert(environment.to_string());
        record.updated_at = self.clock.now_secs();
        if from != DocumentStatus::Prod {
            tracing::info!(version = %version, from = %from, kind = ?kind, "Status changed to prod");
        }
        Ok(record.document.clone())
    }

    /// Record that `environment` no longer serves `version`.
    ///
    /// A prod document served nowhere becomes archived.
    pub fn deactivate(&self, version: &str, environment: &str) -> ControlPlaneResult<DocumentStatus> {
        let mut record = self
            .documents
            .get_mut(version)
            .ok_or_else(|| ControlPlaneError::document_not_found(version))?;

        record.active_in.remove(environment);
        if record.active_in.is_empty() && record.document.status == DocumentStatus::Prod {
            record.document.status = DocumentStatus::Archived;
            record.updated_at = self.clock.now_secs();
            tracing::info!(version = %version, environment = %environment, "Superseded version archived");
        }
        Ok(record.document.status)
    }

    /// Copy the content of `source` into a new draft named `new_version`.
    pub fn fork(
        &self,
        source: &str,
        new_version: &str,
        author: Option<String>,
    ) -> ControlPlaneResult<UiConfigDocument> {
        let mut doc = self.get(source)?;
        doc.version = new_version.to_string();
        if let Some(author) = author {
            let mut meta = doc.meta.take().unwrap_or_default();
            meta.author = Some(author);
            doc.meta = Some(meta);
        } else if doc.meta.is_none() {
            doc.meta = Some(Meta::default());
        }
        tracing::info!(source = %source, version = %new_version, "Forking version");
        self.create(doc)
    }

    /// Remove a draft or archived document that no environment serves.
    pub fn purge(&self, version: &str) -> ControlPlaneResult<UiConfigDocument> {
        let removed = self.documents.remove_if(version, |_, record| {
            record.active_in.is_empty()
                && matches!(
                    record.document.status,
                    DocumentStatus::Draft | DocumentStatus::Archived
                )
        });

        match removed {
            Some((_, record)) => {
                tracing::info!(version = %version, "Document purged");
                metrics::record_documents(self.documents.len());
                Ok(record.document)
            }
            None => {
                let status = self.get(version)?.status;
                Err(ControlPlaneError::PurgeRefused {
                    version: version.to_string(),
                    status,
                })
            }
        }
    }

    /// Copy of every record, for snapshots.
    pub fn export(&self) -> Vec<StoredDocument> {
        let mut records: Vec<StoredDocument> =
            self.documents.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.sequence);
        records
    }

    /// Replace the table with `records`.
    pub fn restore(&self, records: Vec<StoredDocument>) {
        self.documents.clear();
        let mut max_sequence = 0;
        for record in records {
            max_sequence = max_sequence.max(record.sequence);
            self.documents.insert(record.document.version.clone(), record);
        }
        self.sequence.store(max_sequence, Ordering::SeqCst);
        metrics::record_documents(self.documents.len());
    }
}
