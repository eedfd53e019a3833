//! JSON snapshot persistence.
//!
//! The whole control plane state (documents, environment pointers and
//! publish history) is written as one JSON file. Writes go to a sibling
//! temp file that is renamed into place, so a crash mid-write leaves the
//! previous snapshot intact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::publish::{EnvironmentPointer, PublishRecord};
use crate::store::StoredDocument;

/// Serialized control plane state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub documents: Vec<StoredDocument>,
    pub pointers: Vec<EnvironmentPointer>,
    pub history: Vec<PublishRecord>,
}

/// Location of the snapshot on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if the file does not exist yet.
    pub fn load(&self) -> ControlPlaneResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(persistence_error)?;
        let snapshot: Snapshot =
            serde_json::from_reader(BufReader::new(file)).map_err(persistence_error)?;
        tracing::info!(
            path = %self.path.display(),
            documents = snapshot.documents.len(),
            environments = snapshot.pointers.len(),
            "Loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &Snapshot) -> ControlPlaneResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(persistence_error)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp).map_err(persistence_error)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, snapshot).map_err(persistence_error)?;
            writer.flush().map_err(persistence_error)?;
        }
        fs::rename(&tmp, &self.path).map_err(persistence_error)?;

        tracing::debug!(
            path = %self.path.display(),
            documents = snapshot.documents.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}

fn persistence_error(e: impl std::fmt::Display) -> ControlPlaneError {
    ControlPlaneError::Persistence(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("absent.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("state/uicp.json"));

        file.save(&Snapshot::default()).unwrap();
        let loaded = file.load().unwrap().unwrap();
        assert!(loaded.documents.is_empty());
        assert!(!dir.path().join("state/uicp.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = SnapshotFile::new(path).load().unwrap_err();
        assert!(matches!(err, ControlPlaneError::Persistence(_)));
    }
}
