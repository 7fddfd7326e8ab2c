use serde::Deserialize;

/// Bytes served for an open-ended range when the total length is unknown.
pub const DEFAULT_UNKNOWN_LENGTH_WINDOW: u64 = 16 * 1024;

/// Slice size used when streaming an in-memory buffer.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Tunables for range negotiation.
///
/// Deserializable so a host can embed it in its own configuration; every
/// field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RangeOptions {
    /// Merge overlapping and adjacent ranges before picking the one to serve.
    pub combine_overlapping: bool,
    /// Window served for `bytes=N-` when the representation length is
    /// unknown.
    pub unknown_length_window: u64,
    /// Chunk size for buffer bodies.
    pub chunk_size: usize,
}

impl Default for RangeOptions {
    fn default() -> Self {
        RangeOptions {
            combine_overlapping: false,
            unknown_length_window: DEFAULT_UNKNOWN_LENGTH_WINDOW,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
