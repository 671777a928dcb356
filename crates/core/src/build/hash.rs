//! Content hashes for fingerprinted asset names.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
pub const HASH_LEN: usize = 8;

/// Full SHA-256 of `bytes` as lowercase hex.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Short content hash used in fingerprinted file names.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut digest = content_digest(bytes);
    digest.truncate(HASH_LEN);
    digest
}

/// Insert `hash` before the last extension: `style.css` becomes `style.<hash>.css`.
pub fn hashed_file_name(file_name: &str, hash: &str) -> String {
    let path = Path::new(file_name);
    match (path.file_stem().and_then(|s| s.to_str()), path.extension().and_then(|e| e.to_str())) {
        (Some(stem), Some(ext)) => format!("{stem}.{hash}.{ext}"),
        _ => format!("{file_name}.{hash}"),
    }
}
