//! `Range` header resolution.
//!
//! Only the single-range form `bytes=<start>-[<end>]` is supported. Suffix
//! ranges (`bytes=-500`) and multi-range requests (`bytes=0-1,5-6`) are
//! rejected as malformed rather than answered with a full body or a
//! multipart response.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BlobConfig, BlobError, BlobResult};

pub const CONTENT_RANGE: &str = "content-range";
pub const ACCEPT_RANGES: &str = "accept-ranges";
pub const CONTENT_LENGTH: &str = "content-length";
pub const CONTENT_TYPE: &str = "content-type";

/// Value of `Accept-Ranges` on every partial response
pub const ACCEPT_RANGES_BYTES: &str = "bytes";

const UNIT_PREFIX: &str = "bytes=";

/// Byte range as requested by the client, not yet checked against a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>, // None means "one window from start"
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    pub fn from_start(start: u64) -> Self {
        Self { start, end: None }
    }
}

fn parse_offset(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for ByteRange {
    type Err = BlobError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let malformed = || BlobError::malformed_range(header);

        let value = header.trim();
        let spec = value
            .get(..UNIT_PREFIX.len())
            .filter(|unit| unit.eq_ignore_ascii_case(UNIT_PREFIX))
            .map(|_| &value[UNIT_PREFIX.len()..])
            .ok_or_else(malformed)?;

        if spec.contains(',') {
            return Err(malformed());
        }

        let (start, end) = spec.split_once('-').ok_or_else(malformed)?;
        let start = parse_offset(start.trim()).ok_or_else(malformed)?;
        let end = match end.trim() {
            "" => None,
            digits => Some(parse_offset(digits).ok_or_else(malformed)?),
        };

        if end.is_some_and(|end| end < start) {
            return Err(malformed());
        }

        Ok(Self { start, end })
    }
}

/// Range information for partial content, clamped to the blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    /// Inclusive, as in `Content-Range`
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Exclusive end, for chunk span arithmetic
    pub fn end_exclusive(&self) -> u64 {
        self.end + 1
    }

    pub fn is_full_content(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total_size
    }

    /// `Content-Range` value: `bytes <start>-<end>/<total>`
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }

    /// Headers describing this range on a 206 response
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (CONTENT_RANGE, self.content_range()),
            (ACCEPT_RANGES, ACCEPT_RANGES_BYTES.to_string()),
            (CONTENT_LENGTH, self.content_length().to_string()),
        ]
    }
}

/// `Content-Range` value for a 416 answer: `bytes */<total>`
pub fn unsatisfied_content_range(total_size: u64) -> String {
    format!("bytes */{total_size}")
}

/// Turns a `Range` header into a concrete interval of a blob.
///
/// Without an explicit end the answer covers at most one window (the chunk
/// size), so a client walking through a video issues one request per window.
#[derive(Debug, Clone, Copy)]
pub struct RangeResolver {
    window: u64,
    cap_explicit_end: bool,
}

impl RangeResolver {
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn new(window: u64) -> Self {
        assert!(window > 0, "range window must be non-zero");
        Self {
            window,
            cap_explicit_end: false,
        }
    }

    pub fn from_config(config: &BlobConfig) -> Self {
        Self::new(config.chunk_size).with_explicit_end_cap(config.cap_explicit_end)
    }

    pub fn with_explicit_end_cap(mut self, cap: bool) -> Self {
        self.cap_explicit_end = cap;
        self
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn resolve(&self, header: Option<&str>, total_size: u64) -> BlobResult<ResolvedRange> {
        let header = header.ok_or(BlobError::RangeRequired)?;
        let range: ByteRange = header.parse()?;
        self.clamp(range, total_size)
    }

    pub fn clamp(&self, range: ByteRange, total_size: u64) -> BlobResult<ResolvedRange> {
        if range.start >= total_size {
            return Err(BlobError::RangeNotSatisfiable {
                start: range.start,
                total_size,
            });
        }

        let last = total_size - 1;
        let window_end = range.start.saturating_add(self.window - 1);
        let end = match range.end {
            Some(end) if self.cap_explicit_end => end.min(window_end),
            Some(end) => end,
            None => window_end,
        };

        Ok(ResolvedRange {
            start: range.start,
            end: end.min(last),
            total_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1_048_576;

    fn resolve(header: &str, total: u64) -> BlobResult<ResolvedRange> {
        RangeResolver::new(MIB).resolve(Some(header), total)
    }

    #[test]
    fn parses_single_ranges() {
        assert_eq!("bytes=0-".parse::<ByteRange>().unwrap(), ByteRange::from_start(0));
        assert_eq!(
            "bytes=10-20".parse::<ByteRange>().unwrap(),
            ByteRange::new(10, Some(20))
        );
        assert_eq!(
            " Bytes=7-7 ".parse::<ByteRange>().unwrap(),
            ByteRange::new(7, Some(7))
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in [
            "",
            "bytes=",
            "bytes=-",
            "bytes=-500",
            "bytes=abc-",
            "bytes=1-x",
            "bytes=+1-2",
            "bytes=0-1,4-5",
            "items=0-10",
            "0-10",
            "bytes=10-5",
            "bytes=99999999999999999999999-",
        ] {
            let err = header.parse::<ByteRange>().unwrap_err();
            assert!(
                matches!(err, BlobError::MalformedRange { .. }),
                "{header:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn missing_header_is_required_error() {
        let err = RangeResolver::new(MIB).resolve(None, 100).unwrap_err();
        assert!(matches!(err, BlobError::RangeRequired));
    }

    #[test]
    fn open_ended_range_serves_one_window() {
        let range = resolve("bytes=0-", 5_000_000).unwrap();
        assert_eq!(range.content_range(), "bytes 0-1048575/5000000");
        assert_eq!(range.content_length(), MIB);
    }

    #[test]
    fn open_ended_range_stops_at_the_last_byte() {
        let range = resolve("bytes=4500000-", 5_000_000).unwrap();
        assert_eq!(range.end, 4_999_999);
        assert_eq!(range.content_length(), 500_000);
    }

    #[test]
    fn explicit_end_is_honored_and_clamped() {
        let range = resolve("bytes=100-3000000", 5_000_000).unwrap();
        assert_eq!((range.start, range.end), (100, 3_000_000));

        let range = resolve("bytes=100-9000000", 5_000_000).unwrap();
        assert_eq!(range.end, 4_999_999);
    }

    #[test]
    fn explicit_end_can_be_capped_to_the_window() {
        let resolver = RangeResolver::new(MIB).with_explicit_end_cap(true);
        let range = resolver.resolve(Some("bytes=100-3000000"), 5_000_000).unwrap();
        assert_eq!(range.end, 100 + MIB - 1);

        let range = resolver.resolve(Some("bytes=100-200"), 5_000_000).unwrap();
        assert_eq!(range.end, 200);
    }

    #[test]
    fn start_past_the_end_is_not_satisfiable() {
        let err = resolve("bytes=5000000-", 5_000_000).unwrap_err();
        assert!(matches!(
            err,
            BlobError::RangeNotSatisfiable { start: 5_000_000, total_size: 5_000_000 }
        ));
        assert_eq!(unsatisfied_content_range(5_000_000), "bytes */5000000");

        let err = resolve("bytes=0-", 0).unwrap_err();
        assert!(matches!(err, BlobError::RangeNotSatisfiable { .. }));
    }

    #[test]
    fn last_byte_only() {
        let range = resolve("bytes=9-", 10).unwrap();
        assert_eq!((range.start, range.end, range.content_length()), (9, 9, 1));
        assert_eq!(
            range.headers(),
            [
                (CONTENT_RANGE, "bytes 9-9/10".to_string()),
                (ACCEPT_RANGES, "bytes".to_string()),
                (CONTENT_LENGTH, "1".to_string()),
            ]
        );
    }
}
