use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reel_blob::{unsatisfied_content_range, BlobError};
use serde_json::json;

/// Error classes surfaced to HTTP clients, with Feathers-ish names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,          // 400
    NotFound,            // 404
    PayloadTooLarge,     // 413
    RangeNotSatisfiable, // 416
    GeneralError,        // 500
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            ErrorKind::GeneralError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::RangeNotSatisfiable => "RangeNotSatisfiable",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::RangeNotSatisfiable => "range-not-satisfiable",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// Error returned by the HTTP handlers.
///
/// Wraps `anyhow::Error`; a [`BlobError`] anywhere in the chain decides the
/// status code, anything else is a 500.
#[derive(Debug)]
pub struct ReelAxumError(pub anyhow::Error);

impl ReelAxumError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(BlobError::invalid(message).into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self(BlobError::not_found(id).into())
    }
}

impl From<anyhow::Error> for ReelAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<BlobError> for ReelAxumError {
    fn from(e: BlobError) -> Self {
        Self(e.into())
    }
}

fn classify(err: &BlobError) -> ErrorKind {
    match err {
        BlobError::Invalid { .. } | BlobError::MalformedRange { .. } => ErrorKind::BadRequest,
        BlobError::NotFound { .. } => ErrorKind::NotFound,
        BlobError::TooLarge { .. } => ErrorKind::PayloadTooLarge,
        BlobError::RangeRequired | BlobError::RangeNotSatisfiable { .. } => {
            ErrorKind::RangeNotSatisfiable
        }
        BlobError::IncompleteUpload { .. }
        | BlobError::CorruptChunk { .. }
        | BlobError::Backend { .. }
        | BlobError::Io { .. }
        | BlobError::Serialization { .. } => ErrorKind::GeneralError,
    }
}

fn client_message(err: &BlobError) -> String {
    match err {
        BlobError::Invalid { message } => message.clone(),
        BlobError::NotFound { .. } => "Video not found.".to_string(),
        BlobError::RangeRequired => "Requires Range header.".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ReelAxumError {
    fn into_response(self) -> Response {
        let Some(blob) = self.0.chain().find_map(|e| e.downcast_ref::<BlobError>()) else {
            tracing::error!(error = ?self.0, "request failed");
            return error_response(ErrorKind::GeneralError, "Server error.".to_string(), None);
        };

        if !blob.is_client_error() {
            // storage details stay in the logs
            tracing::error!(error = ?self.0, "request failed");
            return error_response(ErrorKind::GeneralError, "Server error.".to_string(), None);
        }

        let kind = classify(blob);

        match blob {
            BlobError::RangeNotSatisfiable { total_size, .. } => {
                let data = json!({ "totalSize": total_size });
                let mut response = error_response(kind, client_message(blob), Some(data));
                if let Ok(value) = HeaderValue::from_str(&unsatisfied_content_range(*total_size)) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                response
            }
            _ => error_response(kind, client_message(blob), None),
        }
    }
}

fn error_response(kind: ErrorKind, message: String, data: Option<serde_json::Value>) -> Response {
    let mut body = json!({
        "name": kind.name(),
        "message": message,
        "code": kind.status().as_u16(),
        "className": kind.class_name(),
    });
    if let Some(data) = data {
        body["data"] = data;
    }
    (kind.status(), Json(body)).into_response()
}
