#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use reel_axum::{AxumApp, ReelState};
use std::sync::Arc;

use reel_blob::{BlobConfig, BlobStore, MemoryChunkStore};
use serde_json::Value;
use tower::ServiceExt;
use http_body_util::BodyExt;

pub const BOUNDARY: &str = "reel-test-boundary";

pub fn app_with(config: BlobConfig) -> AxumApp {
    let store = BlobStore::memory(config).unwrap();
    AxumApp::new(ReelState::new(store, "video"))
}

/// App over a memory backend the test can inspect
pub fn app_with_backend(config: BlobConfig) -> (AxumApp, Arc<MemoryChunkStore>) {
    let backend = Arc::new(MemoryChunkStore::new());
    let store = BlobStore::from_arc(backend.clone(), config).unwrap();
    (AxumApp::new(ReelState::new(store, "video")), backend)
}

pub fn app() -> AxumApp {
    app_with(BlobConfig::new())
}

/// One multipart part
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            content_type: Some(content_type),
            data,
        }
    }

    pub fn text(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            filename: None,
            content_type: None,
            data,
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn stream_request(id: &str, range: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(format!("/stream/{id}"));
    if let Some(range) = range {
        builder = builder.header("range", range);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn raw_body(res: axum::response::Response) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Upload `data` as the `video` field and return the new file id
pub async fn upload_video(ax: &AxumApp, data: &[u8]) -> String {
    let res = ax
        .router
        .clone()
        .oneshot(upload_request(&[Part::file("video", "clip.mp4", "video/mp4", data)]))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let body = json_body(res).await;
    body["fileId"].as_str().unwrap().to_string()
}

/// Deterministic test payload
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
