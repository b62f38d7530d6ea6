//! # reel-blob: chunked blob storage with range streaming
//!
//! `reel-blob` stores large blobs (videos) as fixed-size chunks and serves
//! arbitrary byte ranges of them with HTTP partial-content semantics.
//!
//! ## Key Features
//!
//! - **Chunked storage**: blobs are split into fixed-size chunks (1 MiB by
//!   default) on write; a range read touches only the chunks it overlaps
//! - **All-or-nothing uploads**: a blob becomes visible only once its upload
//!   session is finalized; aborted or failed uploads leave nothing behind
//! - **Range requests**: `bytes=<start>-[<end>]` resolution with one chunk
//!   window per open-ended request
//! - **Streaming-first**: bodies are pulled chunk by chunk, never buffered
//!   whole, and stop reading as soon as the consumer goes away
//! - **Storage agnostic**: memory and filesystem backends, or any
//!   [`ChunkStore`] implementation
//! - **Server agnostic**: no HTTP framework coupling; headers are plain
//!   name/value pairs
//!
//! ## Quick Start
//!
//! ```rust
//! use reel_blob::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! // 1. Create a store with 4-byte chunks
//! let store = BlobStore::memory(BlobConfig::new().with_chunk_size(4))?;
//! let responder = StreamResponder::new(store);
//!
//! // 2. Upload from any byte stream
//! let body = futures_util::stream::iter(vec![
//!     Ok::<_, std::io::Error>(Bytes::from_static(b"hello, ")),
//!     Ok(Bytes::from_static(b"world")),
//! ]);
//! let put = BlobPut::new().with_content_type("text/plain");
//! let meta = responder.ingest(put, body).await?;
//! assert_eq!(meta.chunk_count, 3);
//!
//! // 3. Download a range
//! let reply = responder.open_range(&meta.id, Some("bytes=7-11")).await?;
//! assert_eq!(reply.range.content_range(), "bytes 7-11/12");
//!
//! let mut out = Vec::new();
//! reel_blob::pipe_range(reply.body, &mut out).await?;
//! assert_eq!(out, b"world");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  StreamResponder │  ← bodies in, bodies out
//! ├──────────────────┤
//! │  RangeResolver   │  ← Range header → concrete interval
//! ├──────────────────┤
//! │    BlobStore     │  ← sessions, visibility, integrity checks
//! ├──────────────────┤
//! │    ChunkStore    │  ← storage primitives (memory, filesystem, ...)
//! └──────────────────┘
//! ```
//!
//! The chunk arithmetic shared by all layers lives in [`codec`].

pub mod adapter;
pub mod codec;
mod config;
mod error;
mod fs_store;
mod memory_store;
pub mod range;
mod receipt;
pub mod responder;
pub mod store;
mod types;
mod upload;

// Re-export main types for clean API
pub use adapter::BlobStore;
pub use codec::{ChunkLayout, ChunkSpan};
pub use config::{BlobConfig, DEFAULT_CHUNK_SIZE};
pub use error::{BlobError, BlobResult};
pub use fs_store::FsChunkStore;
pub use memory_store::MemoryChunkStore;
pub use range::{unsatisfied_content_range, ByteRange, RangeResolver, ResolvedRange};
pub use receipt::{BlobMeta, RangeReply};
pub use responder::{pipe_range, StreamResponder};
pub use store::{BlobRecord, BlobState, ChunkStore};
pub use types::{BlobId, BlobPut, ByteStream, DEFAULT_CONTENT_TYPE};
pub use upload::{UploadSession, UploadStatus};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobConfig, BlobError, BlobId, BlobMeta, BlobPut, BlobResult, BlobStore, ByteStream,
        RangeReply, StreamResponder,
    };
}
