//! Entity tag generation.
//!
//! Buffers get a strong tag derived from their contents, resources a weak
//! tag derived from size and modification time. Both are deterministic.

use std::time::UNIX_EPOCH;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::file::ResourceMetadata;

const DIGEST_CHARS: usize = 27;

/// Strong tag `"<len hex>-<digest>"` for an in-memory body.
pub fn from_content(content: &[u8]) -> String {
    let digest = STANDARD_NO_PAD.encode(Sha256::digest(content));
    format!("\"{:x}-{}\"", content.len(), &digest[..DIGEST_CHARS])
}

/// Weak tag `W/"<size hex>-<mtime millis hex>"` for a resource.
pub fn from_metadata(metadata: &ResourceMetadata) -> String {
    let mtime = metadata
        .modified
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |since| since.as_millis());
    format!("W/\"{:x}-{:x}\"", metadata.size.unwrap_or(0), mtime)
}

/// Whether `tag` equals the current entity tag, allowing either side to
/// carry the weak `W/` prefix.
pub fn weak_eq(tag: &str, current: &str) -> bool {
    tag == current
        || tag.strip_prefix("W/") == Some(current)
        || current.strip_prefix("W/") == Some(tag)
}
