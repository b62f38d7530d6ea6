use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::store::remove_blob;
use crate::{BlobId, ChunkStore};

/// Status of an upload session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Active,
    /// A chunk could not be persisted; the session can only be aborted
    Failed { reason: String },
}

/// An in-progress upload.
///
/// Created by [`crate::BlobStore::begin_upload`] and owned by the single task
/// writing the blob. `write` takes it by `&mut`, while `finalize` and `abort`
/// consume it, so a session can neither be shared between writers nor used
/// after it was sealed.
///
/// Dropping a session that was neither finalized nor aborted (for example
/// because the request future was cancelled) discards its chunks in a
/// background task.
pub struct UploadSession {
    blob_id: BlobId,
    chunk_size: u64,
    buffer: BytesMut,
    next_index: u64,
    received_bytes: u64,
    status: UploadStatus,
    store: Arc<dyn ChunkStore>,
    closed: bool,
}

impl std::fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("blob_id", &self.blob_id)
            .field("chunk_size", &self.chunk_size)
            .field("buffered", &self.buffer.len())
            .field("next_index", &self.next_index)
            .field("received_bytes", &self.received_bytes)
            .field("status", &self.status)
            .finish()
    }
}

impl UploadSession {
    pub(crate) fn new(blob_id: BlobId, chunk_size: u64, store: Arc<dyn ChunkStore>) -> Self {
        Self {
            blob_id,
            chunk_size,
            buffer: BytesMut::new(),
            next_index: 0,
            received_bytes: 0,
            status: UploadStatus::Active,
            store,
            closed: false,
        }
    }

    /// Identifier the blob will have once finalized
    pub fn blob_id(&self) -> BlobId {
        self.blob_id
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Bytes accepted so far, flushed or still buffered
    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    /// Bytes waiting for a full chunk
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Chunks handed to the store so far
    pub fn chunks_flushed(&self) -> u64 {
        self.next_index
    }

    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    pub(crate) fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.received_bytes += data.len() as u64;
    }

    /// Split a full chunk off the front of the buffer, if one is available.
    pub(crate) fn next_full_chunk(&mut self) -> Option<(u64, Bytes)> {
        if (self.buffer.len() as u64) < self.chunk_size {
            return None;
        }
        let chunk = self.buffer.split_to(self.chunk_size as usize).freeze();
        Some(self.claim_index(chunk))
    }

    /// Whatever is left in the buffer, as the final short chunk.
    pub(crate) fn take_tail(&mut self) -> Option<(u64, Bytes)> {
        if self.buffer.is_empty() {
            return None;
        }
        let chunk = self.buffer.split().freeze();
        Some(self.claim_index(chunk))
    }

    fn claim_index(&mut self, chunk: Bytes) -> (u64, Bytes) {
        let index = self.next_index;
        self.next_index += 1;
        (index, chunk)
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.status = UploadStatus::Failed {
            reason: reason.into(),
        };
    }

    /// Mark the session as sealed; dropping it no longer triggers cleanup.
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.buffer.clear();
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                blob_id = %self.blob_id,
                "upload session dropped outside a runtime; chunks left behind"
            );
            return;
        };
        tracing::warn!(
            blob_id = %self.blob_id,
            received_bytes = self.received_bytes,
            "upload session dropped before finalize or abort, discarding"
        );
        let store = Arc::clone(&self.store);
        let id = self.blob_id;
        handle.spawn(async move {
            if let Err(err) = remove_blob(store.as_ref(), &id).await {
                tracing::error!(blob_id = %id, error = %err, "failed to discard abandoned upload");
            }
        });
    }
}
