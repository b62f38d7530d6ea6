//! Chunk arithmetic.
//!
//! A blob of `L` bytes stored with chunk size `C` has `ceil(L / C)` chunks.
//! Chunk `i` starts at byte `i * C` and every chunk is exactly `C` bytes long
//! except the last, which holds `L - (count - 1) * C` bytes. Nothing in here
//! touches storage.

use std::iter::FusedIterator;

/// Number of chunks needed for `total_len` bytes.
pub fn chunk_count(total_len: u64, chunk_size: u64) -> u64 {
    assert!(chunk_size > 0, "chunk size must be non-zero");
    total_len.div_ceil(chunk_size)
}

/// The part of one chunk that contributes to a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Sequence index of the chunk within the blob
    pub index: u64,
    /// First byte to take, relative to the start of the chunk
    pub offset: u64,
    /// Number of bytes to take
    pub len: u64,
}

impl ChunkSpan {
    /// Span as a slice range into the chunk's bytes.
    pub fn as_range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// Chunk geometry of a single blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    chunk_size: u64,
    total_len: u64,
}

impl ChunkLayout {
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: u64, total_len: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            chunk_size,
            total_len,
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn chunk_count(&self) -> u64 {
        chunk_count(self.total_len, self.chunk_size)
    }

    /// Byte offset of chunk `index` within the blob.
    pub fn chunk_offset(&self, index: u64) -> u64 {
        index * self.chunk_size
    }

    /// Expected persisted length of chunk `index`, or `None` past the end.
    pub fn chunk_len(&self, index: u64) -> Option<u64> {
        let count = self.chunk_count();
        if index >= count {
            return None;
        }
        if index + 1 == count {
            Some(self.total_len - index * self.chunk_size)
        } else {
            Some(self.chunk_size)
        }
    }

    /// Chunk spans covering the half-open byte interval `[start, end)`, in
    /// ascending chunk order.
    ///
    /// Only the first and last span can be partial; every interior chunk is
    /// taken whole. An empty interval yields no spans.
    ///
    /// # Panics
    ///
    /// Panics unless `start <= end <= total_len`. Callers clamp the interval
    /// against the blob length before asking for spans.
    pub fn spans(&self, start: u64, end: u64) -> ChunkSpans {
        assert!(
            start <= end && end <= self.total_len,
            "byte interval [{start}, {end}) is outside a blob of {} bytes",
            self.total_len
        );
        ChunkSpans {
            chunk_size: self.chunk_size,
            pos: start,
            end,
        }
    }
}

/// Iterator returned by [`ChunkLayout::spans`].
#[derive(Debug, Clone)]
pub struct ChunkSpans {
    chunk_size: u64,
    pos: u64,
    end: u64,
}

impl Iterator for ChunkSpans {
    type Item = ChunkSpan;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let index = self.pos / self.chunk_size;
        let offset = self.pos % self.chunk_size;
        let len = (self.chunk_size - offset).min(self.end - self.pos);
        self.pos += len;
        Some(ChunkSpan { index, offset, len })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.pos >= self.end {
            return (0, Some(0));
        }
        let first = self.pos / self.chunk_size;
        let last = (self.end - 1) / self.chunk_size;
        let n = usize::try_from(last - first + 1).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl FusedIterator for ChunkSpans {}
