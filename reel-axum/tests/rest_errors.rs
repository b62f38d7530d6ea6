mod common;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use common::*;
use reel_blob::{BlobConfig, BlobId};
use tower::ServiceExt;

#[tokio::test]
async fn missing_range_header_is_416() {
    let ax = app();
    let id = upload_video(&ax, b"some video bytes").await;

    let res = ax.router.clone().oneshot(stream_request(&id, None)).await.unwrap();

    assert_eq!(res.status().as_u16(), 416);
    let body = json_body(res).await;
    assert_eq!(body["name"], "RangeNotSatisfiable");
    assert_eq!(body["message"], "Requires Range header.");
    assert_eq!(body["code"], 416);
    assert_eq!(body["className"], "range-not-satisfiable");
}

#[tokio::test]
async fn unknown_id_is_404() {
    let ax = app();
    let id = BlobId::new().to_string();

    let res = ax
        .router
        .clone()
        .oneshot(stream_request(&id, Some("bytes=0-")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["message"], "Video not found.");
    assert_eq!(body["className"], "not-found");
}

#[tokio::test]
async fn unknown_id_without_range_is_still_404() {
    let ax = app();
    let id = BlobId::new().to_string();

    let res = ax.router.clone().oneshot(stream_request(&id, None)).await.unwrap();

    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn malformed_id_is_404() {
    let ax = app();

    for id in ["not-an-id", "ZZZZ", "0123456789ABCDEF0123456789ABCDEF"] {
        let res = ax
            .router
            .clone()
            .oneshot(stream_request(id, Some("bytes=0-")))
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 404, "id {id:?}");
    }
}

#[tokio::test]
async fn start_beyond_end_is_416_with_total_size() {
    let ax = app();
    let id = upload_video(&ax, &pattern(100)).await;

    let res = ax
        .router
        .clone()
        .oneshot(stream_request(&id, Some("bytes=100-")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 416);
    assert_eq!(res.headers()["content-range"], "bytes */100");
    let body = json_body(res).await;
    assert_eq!(body["data"]["totalSize"], 100);
}

#[tokio::test]
async fn malformed_range_is_400() {
    let ax = app();
    let id = upload_video(&ax, &pattern(100)).await;

    for range in ["bytes=abc-", "items=0-10", "bytes=0-1,5-9", "bytes=-10", "bytes=9-3"] {
        let res = ax
            .router
            .clone()
            .oneshot(stream_request(&id, Some(range)))
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400, "range {range:?}");
        let body = json_body(res).await;
        assert_eq!(body["name"], "BadRequest");
    }
}

#[tokio::test]
async fn upload_without_file_field_is_400() {
    let ax = app();

    let res = ax
        .router
        .clone()
        .oneshot(upload_request(&[Part::text("title", b"no video here")]))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["message"], "No file uploaded.");
    assert_eq!(body["className"], "bad-request");
}

#[tokio::test]
async fn empty_file_input_is_400() {
    let ax = app();

    let res = ax
        .router
        .clone()
        .oneshot(upload_request(&[Part::file("video", "", "application/octet-stream", b"")]))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn non_multipart_upload_is_400() {
    let ax = app();

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", "application/json")
                .body(Body::from("{\"video\":\"x\"}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["message"], "No file uploaded.");
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let ax = app_with(BlobConfig::new().with_chunk_size(16).with_max_blob_bytes(64));

    let res = ax
        .router
        .clone()
        .oneshot(upload_request(&[Part::file(
            "video",
            "big.mp4",
            "video/mp4",
            &pattern(65),
        )]))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 413);
    let body = json_body(res).await;
    assert_eq!(body["name"], "PayloadTooLarge");
}

#[tokio::test]
async fn request_id_is_generated() {
    let ax = app();

    let res = ax.router.clone().oneshot(stream_request("nope", None)).await.unwrap();

    assert!(res.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let ax = app();
    let provided = HeaderValue::from_static("req-test-123");

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn unknown_id_with_undecodable_range_is_404() {
    let ax = app();
    let id = BlobId::new().to_string();

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/stream/{id}"))
                .header("range", HeaderValue::from_bytes(b"bytes=\xff-").unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn undecodable_range_on_known_id_is_400() {
    let ax = app();
    let id = upload_video(&ax, &pattern(100)).await;

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/stream/{id}"))
                .header("range", HeaderValue::from_bytes(b"bytes=\xff-").unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
}

#[tokio::test]
async fn truncated_upload_is_400_and_leaves_nothing() {
    let (ax, backend) = app_with_backend(BlobConfig::new().with_chunk_size(16));

    // field headers and some data, but no closing boundary
    let mut body = multipart_body(&[Part::file("video", "cut.mp4", "video/mp4", &pattern(100))]);
    let cut = body.len() - format!("\r\n--{BOUNDARY}--\r\n").len();
    body.truncate(cut);

    let res = ax
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Malformed multipart body"));

    assert_eq!(backend.record_total().await, 0);
    assert_eq!(backend.chunk_total().await, 0);
}
