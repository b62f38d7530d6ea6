use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlobId, BlobResult};

/// Persistence primitives a blob store is built on. Must be implemented by
/// every storage backend.
///
/// Backends are dumb: they keep whatever records and chunks they are handed
/// and never interpret them. Visibility rules (in-progress blobs are hidden,
/// finalized blobs are immutable) live in [`crate::BlobStore`].
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert or replace the metadata record of a blob
    async fn put_record(&self, record: &BlobRecord) -> BlobResult<()>;

    /// Fetch the metadata record of a blob, `None` if there is none
    async fn get_record(&self, id: &BlobId) -> BlobResult<Option<BlobRecord>>;

    /// Remove the metadata record; removing a missing record is not an error
    async fn delete_record(&self, id: &BlobId) -> BlobResult<()>;

    /// Persist one chunk under `(id, index)`
    async fn put_chunk(&self, id: &BlobId, index: u64, data: Bytes) -> BlobResult<()>;

    /// Fetch one chunk, `None` if it was never written
    async fn get_chunk(&self, id: &BlobId, index: u64) -> BlobResult<Option<Bytes>>;

    /// Remove every chunk of a blob
    async fn delete_chunks(&self, id: &BlobId) -> BlobResult<()>;
}

/// Lifecycle state of a blob record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobState {
    /// An upload session is still writing chunks
    InProgress,
    /// Fully written and immutable
    Finalized,
}

/// Metadata row persisted for every blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub id: BlobId,
    pub state: BlobState,
    pub content_type: String,
    pub filename: Option<String>,
    pub chunk_size: u64,
    pub size_bytes: u64,
    pub chunk_count: u64,
    pub created_at: DateTime<Utc>,
}

impl BlobRecord {
    /// Fresh record for a blob whose upload just started
    pub fn in_progress(
        id: BlobId,
        content_type: String,
        filename: Option<String>,
        chunk_size: u64,
    ) -> Self {
        Self {
            id,
            state: BlobState::InProgress,
            content_type,
            filename,
            chunk_size,
            size_bytes: 0,
            chunk_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.state == BlobState::Finalized
    }
}

/// Remove a blob as a unit: the record goes first so readers see `NotFound`
/// rather than a blob with missing chunks.
pub(crate) async fn remove_blob(store: &dyn ChunkStore, id: &BlobId) -> BlobResult<()> {
    store.delete_record(id).await?;
    store.delete_chunks(id).await
}
