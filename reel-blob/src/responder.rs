//! Moves bytes between the blob store and request/response bodies.
//!
//! Downloads: once [`StreamResponder::open_range`] returns, the status and
//! headers are fixed. Chunk reads happen only as the body is polled, so a
//! client that goes away (body dropped) stops further storage reads. A read
//! that fails after headers went out can only end the body early; the stream
//! yields an error and the server drops the connection, leaving the client
//! with a truncated body.
//!
//! Uploads: [`StreamResponder::ingest`] feeds a byte source into an upload
//! session and either finalizes it or aborts it.

use std::io;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::{
    BlobError, BlobId, BlobMeta, BlobPut, BlobResult, BlobStore, ByteStream, RangeReply,
    RangeResolver, ResolvedRange,
};

#[derive(Clone)]
pub struct StreamResponder {
    store: BlobStore,
    resolver: RangeResolver,
}

impl StreamResponder {
    pub fn new(store: BlobStore) -> Self {
        let resolver = RangeResolver::from_config(store.config());
        Self { store, resolver }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn resolver(&self) -> &RangeResolver {
        &self.resolver
    }

    /// Resolve `range_header` against blob `id` and prepare the body.
    ///
    /// Fails with `NotFound` before looking at the header, so an unknown blob
    /// is reported as such even when the header is missing.
    pub async fn open_range(
        &self,
        id: &BlobId,
        range_header: Option<&str>,
    ) -> BlobResult<RangeReply> {
        let meta = self.store.stat(id).await?;
        let range = self.resolver.resolve(range_header, meta.size_bytes)?;
        let body = self.range_stream(meta.clone(), range);
        Ok(RangeReply { meta, range, body })
    }

    /// Lazily read the chunks covering `range`, yielding exactly the
    /// requested bytes in ascending order.
    pub fn range_stream(&self, meta: BlobMeta, range: ResolvedRange) -> ByteStream {
        let store = self.store.clone();
        let stream = async_stream::stream! {
            let spans = meta.layout().spans(range.start, range.end_exclusive());
            for span in spans {
                match store.read_chunk_of(&meta, span.index).await {
                    Ok(chunk) => {
                        yield Ok(chunk.slice(span.as_range()));
                    }
                    Err(err) => {
                        warn!(
                            blob_id = %meta.id,
                            index = span.index,
                            error = %err,
                            "chunk read failed mid-stream, truncating body"
                        );
                        yield Err(io::Error::new(io::ErrorKind::Other, err));
                        return;
                    }
                }
            }
        };
        Box::pin(stream)
    }

    /// Store everything `body` yields as a new blob.
    ///
    /// End of input finalizes the upload. An error from `body` or from the
    /// store aborts it, so no partial blob ever becomes visible, and the error
    /// is returned.
    pub async fn ingest<S, E>(&self, put: BlobPut, body: S) -> BlobResult<BlobMeta>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        futures_util::pin_mut!(body);
        let mut session = self.store.begin_upload_with(put).await?;

        while let Some(next) = body.next().await {
            let result = match next {
                Ok(bytes) => self.store.write(&mut session, &bytes).await,
                Err(err) => Err(BlobError::upstream(err)),
            };
            if let Err(err) = result {
                let id = session.blob_id();
                if let Err(cleanup) = self.store.abort(session).await {
                    warn!(blob_id = %id, error = %cleanup, "failed to discard aborted upload");
                }
                return Err(err);
            }
        }

        self.store.finalize(session).await
    }
}

/// Copy a body into `sink`, stopping at the first failed write.
///
/// Returns the number of bytes written. Nothing more is read from the body
/// once the sink reports an error, which is how a closed connection stops
/// storage reads.
pub async fn pipe_range<W>(mut body: ByteStream, sink: &mut W) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    sink.flush().await?;
    Ok(written)
}
