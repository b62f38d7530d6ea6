use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {id}")]
    NotFound { id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Range header is required")]
    RangeRequired,

    #[error("Malformed range header: {header:?}")]
    MalformedRange { header: String },

    #[error("Range starting at byte {start} is not satisfiable for a blob of {total_size} bytes")]
    RangeNotSatisfiable { start: u64, total_size: u64 },

    #[error("Blob exceeds maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Upload {id} is incomplete: {reason}")]
    IncompleteUpload { id: String, reason: String },

    #[error("Chunk {index} of blob {id} is corrupt: expected {expected} bytes, found {actual}")]
    CorruptChunk {
        id: String,
        index: u64,
        expected: u64,
        actual: u64,
    },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl BlobError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn malformed_range<S: Into<String>>(header: S) -> Self {
        Self::MalformedRange {
            header: header.into(),
        }
    }

    /// Create an incomplete upload error
    pub fn incomplete<I: ToString, S: Into<String>>(id: I, reason: S) -> Self {
        Self::IncompleteUpload {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap an error raised by the byte source feeding an upload
    pub fn upstream<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Io {
            source: std::io::Error::new(std::io::ErrorKind::Other, error),
        }
    }

    /// True for errors caused by the request rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Invalid { .. }
                | Self::RangeRequired
                | Self::MalformedRange { .. }
                | Self::RangeNotSatisfiable { .. }
                | Self::TooLarge { .. }
        )
    }
}
