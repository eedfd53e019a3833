//! Environment pointers and the publish log.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::ActivationKind;

pub const MAX_ENVIRONMENT_LEN: usize = 64;

/// Environment names are lowercase slugs: `[a-z0-9][a-z0-9_-]*`, at most
/// 64 characters.
pub fn is_valid_environment(name: &str) -> bool {
    let mut bytes = name.bytes();
    let first_ok = matches!(bytes.next(), Some(b) if b.is_ascii_lowercase() || b.is_ascii_digit());
    first_ok
        && name.len() <= MAX_ENVIRONMENT_LEN
        && bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// The version an environment currently serves.
///
/// Replaced as a whole on every publish or rollback; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPointer {
    pub environment: String,
    pub version: String,
    pub activated_at: u64,
    pub activated_by: String,
    /// Index into the environment's history of the entry that produced
    /// this pointer. Rollbacks start from that entry's `previous` link.
    pub lineage: usize,
    /// Id of the history record that produced this pointer.
    pub record_id: Uuid,
}

/// One append-only history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub id: Uuid,
    pub environment: String,
    pub version: String,
    pub activated_at: u64,
    pub activated_by: String,
    pub kind: ActivationKind,
    /// Version that was current when a rollback ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolled_back_from: Option<String>,
    /// Index of the entry a rollback from here returns to. A publish links
    /// to the entry that was current before it; a rollback inherits the
    /// link of the entry it restored, so repeated rollbacks keep stepping
    /// back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<usize>,
}
