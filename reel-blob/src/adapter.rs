use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::store::remove_blob;
use crate::{
    BlobConfig, BlobError, BlobId, BlobMeta, BlobPut, BlobRecord, BlobResult, BlobState,
    ChunkStore, MemoryChunkStore, UploadSession, UploadStatus, DEFAULT_CONTENT_TYPE,
};

/// The blob store: chunked writes through upload sessions, chunk reads of
/// finalized blobs.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct BlobStore {
    chunks: Arc<dyn ChunkStore>,
    config: BlobConfig,
}

impl BlobStore {
    /// Create a store over a backend
    pub fn new<S: ChunkStore + 'static>(store: S, config: BlobConfig) -> BlobResult<Self> {
        Self::from_arc(Arc::new(store), config)
    }

    /// Create a store over a shared backend
    pub fn from_arc(chunks: Arc<dyn ChunkStore>, config: BlobConfig) -> BlobResult<Self> {
        config.validate()?;
        Ok(Self { chunks, config })
    }

    /// Create a store backed by memory
    pub fn memory(config: BlobConfig) -> BlobResult<Self> {
        Self::new(MemoryChunkStore::new(), config)
    }

    /// Get configuration
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Begin an upload with only a content type
    pub async fn begin_upload<S: Into<String>>(
        &self,
        content_type: S,
    ) -> BlobResult<UploadSession> {
        self.begin_upload_with(BlobPut::new().with_content_type(content_type))
            .await
    }

    /// Begin an upload. The new blob is recorded as in progress and stays
    /// invisible to `stat` and `read_chunk` until finalized.
    pub async fn begin_upload_with(&self, put: BlobPut) -> BlobResult<UploadSession> {
        // Validate size if known
        if let Some(size) = put.size_hint {
            if size > self.config.max_blob_bytes {
                return Err(BlobError::TooLarge {
                    limit: self.config.max_blob_bytes,
                });
            }
        }

        let id = BlobId::new();
        let content_type = put
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let record =
            BlobRecord::in_progress(id, content_type, put.filename, self.config.chunk_size);
        self.chunks.put_record(&record).await?;

        debug!(blob_id = %id, chunk_size = self.config.chunk_size, "upload started");
        Ok(UploadSession::new(
            id,
            self.config.chunk_size,
            Arc::clone(&self.chunks),
        ))
    }

    /// Append bytes to an upload, persisting every chunk that fills up.
    ///
    /// A failure to persist a chunk leaves the session failed: any further
    /// `write` or `finalize` reports `IncompleteUpload`.
    pub async fn write(&self, session: &mut UploadSession, data: &[u8]) -> BlobResult<()> {
        let id = session.blob_id();
        if let UploadStatus::Failed { reason } = session.status() {
            return Err(BlobError::incomplete(id, reason.clone()));
        }

        let limit = self.config.max_blob_bytes;
        if session.received_bytes() + data.len() as u64 > limit {
            session.fail(format!("exceeded {limit} bytes"));
            return Err(BlobError::TooLarge { limit });
        }

        session.push(data);
        while let Some((index, chunk)) = session.next_full_chunk() {
            self.persist_chunk(session, index, chunk).await?;
        }
        Ok(())
    }

    async fn persist_chunk(
        &self,
        session: &mut UploadSession,
        index: u64,
        chunk: Bytes,
    ) -> BlobResult<()> {
        let id = session.blob_id();
        let len = chunk.len();
        match self.chunks.put_chunk(&id, index, chunk).await {
            Ok(()) => {
                debug!(blob_id = %id, index, len, "chunk persisted");
                Ok(())
            }
            Err(err) => {
                session.fail(format!("chunk {index}: {err}"));
                Err(err)
            }
        }
    }

    /// Flush the tail chunk and seal the blob.
    ///
    /// On any failure the partial blob is discarded exactly as `abort` would,
    /// and `IncompleteUpload` is returned.
    pub async fn finalize(&self, mut session: UploadSession) -> BlobResult<BlobMeta> {
        let id = session.blob_id();
        match self.seal(&mut session).await {
            Ok(record) => {
                session.close();
                info!(
                    blob_id = %id,
                    size_bytes = record.size_bytes,
                    chunk_count = record.chunk_count,
                    "upload finalized"
                );
                Ok(record.into())
            }
            Err(err) => {
                session.close();
                if let Err(cleanup) = remove_blob(self.chunks.as_ref(), &id).await {
                    warn!(blob_id = %id, error = %cleanup, "failed to discard incomplete upload");
                }
                warn!(blob_id = %id, error = %err, "upload could not be finalized");
                Err(match err {
                    BlobError::IncompleteUpload { .. } => err,
                    other => BlobError::incomplete(id, other.to_string()),
                })
            }
        }
    }

    async fn seal(&self, session: &mut UploadSession) -> BlobResult<BlobRecord> {
        let id = session.blob_id();
        if let UploadStatus::Failed { reason } = session.status() {
            return Err(BlobError::incomplete(id, reason.clone()));
        }

        let mut record = match self.chunks.get_record(&id).await? {
            Some(record) if record.state == BlobState::InProgress => record,
            _ => return Err(BlobError::incomplete(id, "upload session is no longer active")),
        };

        if let Some((index, tail)) = session.take_tail() {
            self.persist_chunk(session, index, tail).await?;
        }

        record.size_bytes = session.received_bytes();
        record.chunk_count = session.chunks_flushed();
        record.state = BlobState::Finalized;
        debug_assert_eq!(
            record.chunk_count,
            crate::codec::chunk_count(record.size_bytes, record.chunk_size)
        );

        self.chunks.put_record(&record).await?;
        Ok(record)
    }

    /// Discard an upload and everything it wrote so far
    pub async fn abort(&self, mut session: UploadSession) -> BlobResult<()> {
        let id = session.blob_id();
        let received_bytes = session.received_bytes();
        session.close();
        remove_blob(self.chunks.as_ref(), &id).await?;
        warn!(blob_id = %id, received_bytes, "upload aborted");
        Ok(())
    }

    /// Metadata of a finalized blob.
    ///
    /// Blobs still being uploaded are reported as `NotFound`.
    pub async fn stat(&self, id: &BlobId) -> BlobResult<BlobMeta> {
        match self.chunks.get_record(id).await? {
            Some(record) if record.is_finalized() => Ok(record.into()),
            _ => Err(BlobError::not_found(id.to_string())),
        }
    }

    /// Exact bytes of one chunk of a finalized blob
    pub async fn read_chunk(&self, id: &BlobId, index: u64) -> BlobResult<Bytes> {
        let meta = self.stat(id).await?;
        self.read_chunk_of(&meta, index).await
    }

    /// Like [`read_chunk`](Self::read_chunk) for a caller that already holds
    /// the blob's metadata.
    pub async fn read_chunk_of(&self, meta: &BlobMeta, index: u64) -> BlobResult<Bytes> {
        let expected = meta
            .layout()
            .chunk_len(index)
            .ok_or_else(|| BlobError::not_found(format!("{}/{}", meta.id, index)))?;

        let data = self
            .chunks
            .get_chunk(&meta.id, index)
            .await?
            .ok_or_else(|| BlobError::not_found(format!("{}/{}", meta.id, index)))?;

        if data.len() as u64 != expected {
            return Err(BlobError::CorruptChunk {
                id: meta.id.to_string(),
                index,
                expected,
                actual: data.len() as u64,
            });
        }

        debug!(blob_id = %meta.id, index, len = data.len(), "chunk read");
        Ok(data)
    }

    /// Delete a finalized blob as a whole. Readers see either the full blob
    /// or `NotFound`.
    pub async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        self.stat(id).await?;
        remove_blob(self.chunks.as_ref(), id).await?;
        info!(blob_id = %id, "blob deleted");
        Ok(())
    }
}
