use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use reel_blob::{BlobError, BlobId, BlobPut, DEFAULT_CONTENT_TYPE};
use serde::Serialize;

use crate::{ReelAxumError, ReelState};

const NO_FILE: &str = "No file uploaded.";

/// Body of a successful upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub message: &'static str,
    pub file_id: String,
    pub size: u64,
    pub chunk_count: u64,
    pub content_type: String,
}

pub fn router(state: ReelState) -> Router<()> {
    Router::new()
        .route("/upload", post(upload))
        .route("/stream/{id}", get(stream))
        .route("/health", get(|| async { "ok" }))
        // the store enforces its own size limit while streaming
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

fn map_multipart_error(err: MultipartError) -> ReelAxumError {
    ReelAxumError::bad_request(format!("Malformed multipart body: {}", err.body_text()))
}

/// Field read errors surface from `ingest` wrapped as I/O errors; they are the
/// client's fault, not the store's.
fn map_ingest_error(err: BlobError) -> ReelAxumError {
    if let BlobError::Io { source } = &err {
        if source.get_ref().is_some_and(|inner| inner.is::<MultipartError>()) {
            return ReelAxumError::bad_request(format!("Malformed multipart body: {source}"));
        }
    }
    err.into()
}

async fn upload(
    State(state): State<ReelState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadReceipt>), ReelAxumError> {
    let mut multipart = multipart.map_err(|_| ReelAxumError::bad_request(NO_FILE))?;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some(state.upload_field.as_ref()) {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        // an empty file input still sends a part, with no name
        if filename.as_deref() == Some("") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();

        let mut put = BlobPut::new().with_content_type(content_type);
        if let Some(filename) = filename {
            put = put.with_filename(filename);
        }

        let meta = state
            .responder
            .ingest(put, field)
            .await
            .map_err(map_ingest_error)?;

        tracing::info!(
            blob_id = %meta.id,
            size = meta.size_bytes,
            chunks = meta.chunk_count,
            "video uploaded"
        );

        let receipt = UploadReceipt {
            message: "Video uploaded successfully.",
            file_id: meta.id.to_string(),
            size: meta.size_bytes,
            chunk_count: meta.chunk_count,
            content_type: meta.content_type,
        };
        return Ok((StatusCode::CREATED, Json(receipt)));
    }

    Err(ReelAxumError::bad_request(NO_FILE))
}

async fn stream(
    State(state): State<ReelState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ReelAxumError> {
    // a malformed id can never name a stored video
    let Ok(blob_id) = id.parse::<BlobId>() else {
        return Err(ReelAxumError::not_found(id));
    };

    // decoded lossily so that existence is checked before the header is judged
    let range_header = headers
        .get(header::RANGE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let reply = state.responder.open_range(&blob_id, range_header.as_deref()).await?;
    let reply_headers = reply.headers();
    let (meta, range, body) = reply.into_parts();
    tracing::debug!(
        blob_id = %meta.id,
        content_range = %range.content_range(),
        "streaming range"
    );

    let mut response = Response::builder().status(StatusCode::PARTIAL_CONTENT);
    for (name, value) in reply_headers {
        response = response.header(name, value);
    }
    let response = response
        .body(Body::from_stream(body))
        .map_err(|e| ReelAxumError(e.into()))?;
    Ok(response)
}
