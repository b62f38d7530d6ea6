use crate::{BlobError, BlobResult};

/// Bytes per chunk when nothing else is configured (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Configuration for a blob store.
///
/// The chunk size is fixed for the lifetime of the store. Blobs record the
/// chunk size they were written with, so changing it for a new store over an
/// existing backend never rechunks what is already there.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Bytes per persisted chunk, and the default window served per range
    /// request when the client gives no end offset
    pub chunk_size: u64,

    /// Absolute max size allowed for a single blob (safety guard)
    pub max_blob_bytes: u64,

    /// When true, an explicit `bytes=a-b` request is also capped to one
    /// chunk window. When false the client's end offset is honored.
    pub cap_explicit_end: bool,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_blob_bytes: 5 * 1024 * 1024 * 1024, // 5GB
            cap_explicit_end: false,
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Cap explicit range ends to one chunk window
    pub fn cap_explicit_end(mut self, cap: bool) -> Self {
        self.cap_explicit_end = cap;
        self
    }

    pub fn validate(&self) -> BlobResult<()> {
        if self.chunk_size == 0 {
            return Err(BlobError::invalid("chunk size must be greater than zero"));
        }
        if usize::try_from(self.chunk_size).is_err() {
            return Err(BlobError::invalid(format!(
                "chunk size {} does not fit in memory on this platform",
                self.chunk_size
            )));
        }
        Ok(())
    }
}
