//! Stable hashing for document identification in logs

use sha2::{Digest, Sha256};

/// Short SHA-256 digest of a document, used to tell reloads apart in logs.
pub fn document_digest(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
