use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{BlobId, BlobRecord, BlobResult, ChunkStore};

/// In-process backend keeping records and chunks in ordered maps.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    records: RwLock<BTreeMap<BlobId, BlobRecord>>,
    chunks: RwLock<BTreeMap<(BlobId, u64), Bytes>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently held, across all blobs
    pub async fn chunk_total(&self) -> usize {
        self.chunks.read().await.len()
    }

    /// Number of records currently held, in progress or finalized
    pub async fn record_total(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put_record(&self, record: &BlobRecord) -> BlobResult<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_record(&self, id: &BlobId) -> BlobResult<Option<BlobRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn delete_record(&self, id: &BlobId) -> BlobResult<()> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn put_chunk(&self, id: &BlobId, index: u64, data: Bytes) -> BlobResult<()> {
        self.chunks.write().await.insert((*id, index), data);
        Ok(())
    }

    async fn get_chunk(&self, id: &BlobId, index: u64) -> BlobResult<Option<Bytes>> {
        // Bytes clones are reference-counted, no copy of the chunk data
        Ok(self.chunks.read().await.get(&(*id, index)).cloned())
    }

    async fn delete_chunks(&self, id: &BlobId) -> BlobResult<()> {
        let mut chunks = self.chunks.write().await;
        let keys: Vec<(BlobId, u64)> = chunks
            .range((*id, 0)..=(*id, u64::MAX))
            .map(|(key, _)| *key)
            .collect();
        for key in keys {
            chunks.remove(&key);
        }
        Ok(())
    }
}
