use sha2::{Digest, Sha256};

use crate::normalize::{normalize_text, normalize_title};

/// Content hash used for exact-duplicate detection.
///
/// Lowercase hex SHA-256 over `normalize_title(title) + "::" +
/// normalize_text(content)`. Source and URL never take part, so the same
/// story syndicated to two feeds hashes identically.
pub fn fingerprint(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_title(title).as_bytes());
    hasher.update(b"::");
    hasher.update(normalize_text(content).as_bytes());
    format!("{:x}", hasher.finalize())
}
