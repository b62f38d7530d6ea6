//! reel-axum: HTTP surface for reel.
//!
//! Serves `POST /upload` (multipart video upload), `GET /stream/{id}`
//! (single-range partial content) and `GET /health` on top of a
//! [`reel_blob::BlobStore`].

pub mod app;
pub mod config;
pub mod rest;
pub mod state;
mod error;
pub use error::{ErrorKind, ReelAxumError};
pub use state::ReelState;

pub use app::AxumApp;
pub use config::{ServerConfig, StorageKind};

/// Open the configured store and wire up the router.
pub async fn build(config: &ServerConfig) -> anyhow::Result<AxumApp> {
    let store = config.open_store().await?;
    tracing::info!(
        storage = ?config.storage,
        chunk_size = config.blob.chunk_size,
        max_upload_bytes = config.blob.max_blob_bytes,
        "blob store ready"
    );
    Ok(AxumApp::new(ReelState::new(store, config.upload_field.as_str())))
}
