use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::ChunkLayout;
use crate::range::CONTENT_TYPE;
use crate::{BlobId, BlobRecord, ByteStream, ResolvedRange};

/// Metadata of a finalized blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMeta {
    pub id: BlobId,
    pub size_bytes: u64,
    pub content_type: String,
    pub filename: Option<String>,
    pub chunk_size: u64,
    pub chunk_count: u64,
    pub created_at: DateTime<Utc>,
}

impl BlobMeta {
    /// Chunk geometry this blob was written with
    pub fn layout(&self) -> ChunkLayout {
        ChunkLayout::new(self.chunk_size, self.size_bytes)
    }
}

impl From<BlobRecord> for BlobMeta {
    fn from(record: BlobRecord) -> Self {
        Self {
            id: record.id,
            size_bytes: record.size_bytes,
            content_type: record.content_type,
            filename: record.filename,
            chunk_size: record.chunk_size,
            chunk_count: record.chunk_count,
            created_at: record.created_at,
        }
    }
}

/// A partial content answer ready to be sent.
///
/// Everything needed for the status line and headers is known up front; the
/// body is pulled lazily, one chunk read per item.
pub struct RangeReply {
    pub meta: BlobMeta,
    pub range: ResolvedRange,
    pub body: ByteStream,
}

impl RangeReply {
    pub fn content_length(&self) -> u64 {
        self.range.content_length()
    }

    /// `Content-Range`, `Accept-Ranges`, `Content-Length` and `Content-Type`
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = self.range.headers().to_vec();
        headers.push((CONTENT_TYPE, self.meta.content_type.clone()));
        headers
    }

    /// Split into head and body
    pub fn into_parts(self) -> (BlobMeta, ResolvedRange, ByteStream) {
        (self.meta, self.range, self.body)
    }
}

impl std::fmt::Debug for RangeReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeReply")
            .field("meta", &self.meta)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}
