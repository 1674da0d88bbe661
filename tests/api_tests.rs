use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bucket_fs::{
    models::bucket::BucketRef,
    routes::routes::build_router,
    services::{bucket_store::BucketStore, filesystem::BucketFilesystem},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

const BUCKET: &str = "api-test-bucket";

async fn setup() -> (Router, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = BucketStore::new(Arc::new(pool), tmp.path());
    store.migrate().await.unwrap();
    store.ensure_bucket(BUCKET).await.unwrap();

    let fs = BucketFilesystem::new(Arc::new(store), BucketRef::new(BUCKET));
    (build_router(fs), tmp)
}

async fn body_to_bytes(body: Body) -> Bytes {
    body.collect().await.unwrap().to_bytes()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = body_to_bytes(body).await;
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> axum::response::Response {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn put_file(app: &Router, path: &str, content: &'static str) {
    let resp = send(app, "PUT", &format!("/files/{path}"), Body::from(content)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

fn paths(listing: &Value) -> Vec<&str> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["path"].as_str().unwrap())
        .collect()
}

// ==================== Health Tests ====================

#[tokio::test]
async fn test_healthz_returns_200() {
    let (app, _tmp) = setup().await;

    let resp = send(&app, "GET", "/healthz", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_to_json(resp.into_body()).await["status"], "ok");
}

#[tokio::test]
async fn test_readyz_checks_sqlite_disk_and_bucket() {
    let (app, _tmp) = setup().await;

    let resp = send(&app, "GET", "/readyz", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_to_json(resp.into_body()).await;
    for check in ["sqlite", "disk", "bucket"] {
        assert_eq!(body["checks"][check]["ok"], true, "{check}");
    }
}

// ==================== File Tests ====================

#[tokio::test]
async fn test_put_then_get_round_trips() {
    let (app, _tmp) = setup().await;

    let req = Request::builder()
        .method("PUT")
        .uri("/files/docs/readme.md")
        .header(header::CONTENT_TYPE, "text/markdown")
        .body(Body::from("# hello"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let etag = resp.headers()[header::ETAG].to_str().unwrap().to_string();
    assert_eq!(etag, format!("\"{:x}\"", md5::compute(b"# hello")));

    let resp = send(&app, "GET", "/files/docs/readme.md", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_to_bytes(resp.into_body()).await[..], b"# hello");
}

#[tokio::test]
async fn test_get_missing_returns_404() {
    let (app, _tmp) = setup().await;

    let resp = send(&app, "GET", "/files/nope.txt", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_json(resp.into_body()).await["status"], 404);
}

#[tokio::test]
async fn test_head_reports_normalized_attributes() {
    let (app, _tmp) = setup().await;
    put_file(&app, "img/cat.png", "not really a png").await;

    let resp = send(&app, "HEAD", "/files/img/cat.png", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CONTENT_LENGTH], "16");
    assert!(headers.contains_key(header::LAST_MODIFIED));
}

#[tokio::test]
async fn test_metadata_json() {
    let (app, _tmp) = setup().await;
    put_file(&app, "a/report.pdf", "%PDF").await;

    let resp = send(&app, "GET", "/meta/a/report.pdf", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_to_json(resp.into_body()).await;
    assert_eq!(body["path"], "a/report.pdf");
    assert_eq!(body["file_size"], 4);
    assert_eq!(body["mime_type"], "application/pdf");
    assert!(body["visibility"].is_null());
    assert!(body["last_modified"].is_u64());
}

#[tokio::test]
async fn test_list_directory_scenario() {
    let (app, _tmp) = setup().await;
    put_file(&app, "a/b.txt", "b").await;
    put_file(&app, "a/c/d.txt", "d").await;
    put_file(&app, "e.txt", "e").await;

    let resp = send(&app, "GET", "/files?directory=a", Body::empty()).await;
    assert_eq!(paths(&body_to_json(resp.into_body()).await), ["a/b.txt"]);

    let resp = send(&app, "GET", "/files?directory=a&recursive=true", Body::empty()).await;
    assert_eq!(
        paths(&body_to_json(resp.into_body()).await),
        ["a/b.txt", "a/c/d.txt"]
    );

    let resp = send(&app, "GET", "/files", Body::empty()).await;
    assert_eq!(paths(&body_to_json(resp.into_body()).await), ["e.txt"]);
}

#[tokio::test]
async fn test_delete_then_delete_again_returns_404() {
    let (app, _tmp) = setup().await;
    put_file(&app, "tmp.txt", "x").await;

    let resp = send(&app, "DELETE", "/files/tmp.txt", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, "DELETE", "/files/tmp.txt", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ==================== Directory Tests ====================

#[tokio::test]
async fn test_directory_marker_lifecycle() {
    let (app, _tmp) = setup().await;

    let resp = send(&app, "PUT", "/dirs/photos", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_to_json(resp.into_body()).await["size_bytes"], 0);

    put_file(&app, "photos/cat.jpg", "meow").await;

    let resp = send(&app, "DELETE", "/dirs/photos", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, "GET", "/files?directory=photos", Body::empty()).await;
    assert_eq!(paths(&body_to_json(resp.into_body()).await), ["photos/cat.jpg"]);

    let resp = send(&app, "GET", "/meta/photos", Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ==================== Copy Tests ====================

#[tokio::test]
async fn test_copy_object() {
    let (app, _tmp) = setup().await;
    put_file(&app, "src.txt", "payload").await;

    let req = Request::builder()
        .method("POST")
        .uri("/copy")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"from": "src.txt", "to": "backup/src.txt"}).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, "GET", "/files/backup/src.txt", Body::empty()).await;
    assert_eq!(&body_to_bytes(resp.into_body()).await[..], b"payload");
}

// ==================== Name Tests ====================

#[tokio::test]
async fn test_unusual_names_round_trip() {
    let (app, _tmp) = setup().await;

    for (uri, name) in [("notes/v1..2.md", "notes/v1..2.md"), ("back%5Cslash", "back\\slash")] {
        put_file(&app, uri, "kept").await;

        let resp = send(&app, "GET", &format!("/files/{uri}"), Body::empty()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{name}");
        assert_eq!(&body_to_bytes(resp.into_body()).await[..], b"kept");

        let resp = send(&app, "GET", &format!("/meta/{uri}"), Body::empty()).await;
        assert_eq!(body_to_json(resp.into_body()).await["path"], name);
    }
}

#[tokio::test]
async fn test_overlong_object_name_returns_400() {
    let (app, _tmp) = setup().await;

    let uri = format!("/files/{}", "n".repeat(1025));
    let resp = send(&app, "PUT", &uri, Body::from("x")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
