use std::sync::Arc;

use reel_blob::{BlobStore, StreamResponder};

/// Shared handler state.
#[derive(Clone)]
pub struct ReelState {
    pub responder: StreamResponder,
    /// Multipart field that carries the uploaded file
    pub upload_field: Arc<str>,
}

impl ReelState {
    pub fn new(store: BlobStore, upload_field: impl Into<Arc<str>>) -> Self {
        Self {
            responder: StreamResponder::new(store),
            upload_field: upload_field.into(),
        }
    }

    pub fn store(&self) -> &BlobStore {
        self.responder.store()
    }
}
