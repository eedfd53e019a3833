//! Preview sessions and share codes.

use serde::{Deserialize, Serialize};

/// Code alphabet: uppercase letters and digits minus the look-alikes
/// `0 O 1 I L`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

/// A short-lived share link bound to one document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSession {
    pub code: String,
    pub version: String,
    /// Unix seconds.
    pub created_at: u64,
    /// Unix seconds; the session is expired from this instant on.
    pub expires_at: u64,
}

impl PreviewSession {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Seconds left before expiry.
    pub fn remaining_secs(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}

/// Generate a random code.
pub fn generate_code() -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[fastrand::usize(..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of user-supplied code text.
///
/// Codes are case-insensitive and surrounding whitespace is ignored.
/// Returns `None` when the text cannot be a code at all.
pub fn normalize_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    let well_formed = code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b));
    well_formed.then_some(code)
}
