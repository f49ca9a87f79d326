//! Snapshot blob checksums.

use sha2::{Digest, Sha256};

/// SHA-256 of `content`, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `content` still hashes to `expected` (case-insensitive hex).
pub fn verify_checksum(content: &str, expected: &str) -> bool {
    calculate_checksum(content).eq_ignore_ascii_case(expected.trim())
}
