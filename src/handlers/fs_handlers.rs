//! HTTP handlers for filesystem operations.
//! Bodies are streamed in and out; every call is forwarded to
//! `BucketFilesystem`, which owns the directory and metadata semantics.

use crate::{
    errors::AppError,
    models::{attributes::FileAttributes, stored_object::StoredObjectRef},
    services::{
        filesystem::{ReadStream, WriteOptions},
        normalizer::guess_mime_type,
    },
    state::SharedFs,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::DateTime;
use futures::StreamExt;
use serde::Deserialize;
use std::io;
use tokio_util::io::ReaderStream;

/// Query params accepted by `GET /files`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Body of `POST /copy`.
#[derive(Debug, Deserialize)]
pub struct CopyReq {
    pub from: String,
    pub to: String,
}

/// PUT `/files/{*path}` — store the request body as a new version.
pub async fn upload_file(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, AppError> {
    let options = WriteOptions {
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
    };

    let stream = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(|err| io::Error::new(io::ErrorKind::Other, err)));

    let stored = fs.write_stream(&path, stream, &options).await?;

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    set_etag(response.headers_mut(), &stored);
    Ok(response)
}

/// GET `/files/{*path}` — stream the current version.
pub async fn get_file(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let reader = match fs.read_stream(&path).await? {
        ReadStream::Ready(reader) => reader,
        ReadStream::Unavailable => {
            return Err(AppError::unavailable(format!(
                "content of `{}` is unavailable",
                path
            )));
        }
    };

    let mut response = Response::new(Body::from_stream(ReaderStream::new(reader)));
    *response.status_mut() = StatusCode::OK;
    let content_type = guess_mime_type(&path).unwrap_or_else(|| "application/octet-stream".into());
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}

/// HEAD `/files/{*path}` — normalized attributes as headers, no body.
pub async fn head_file(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let attrs = fs.metadata(&path).await?;
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    set_attribute_headers(response.headers_mut(), &attrs);
    Ok(response)
}

/// DELETE `/files/{*path}`
pub async fn delete_file(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fs.delete(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/files` — directory listing, supports ?directory=&recursive=
pub async fn list_files(
    State(fs): State<SharedFs>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<FileAttributes>>, AppError> {
    let entries = fs.list_contents(&q.directory, q.recursive).await?;
    Ok(Json(entries))
}

/// GET `/meta/{*path}`
pub async fn file_metadata(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
) -> Result<Json<FileAttributes>, AppError> {
    Ok(Json(fs.metadata(&path).await?))
}

/// PUT `/dirs/{*path}` — upload a zero-byte marker.
pub async fn create_directory(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let stored = fs.create_directory(&path, &WriteOptions::default()).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// DELETE `/dirs/{*path}` — removes the marker only, members stay.
pub async fn delete_directory(
    State(fs): State<SharedFs>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    fs.delete_directory(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/copy` — object-to-object copy inside the bucket.
pub async fn copy_file(
    State(fs): State<SharedFs>,
    Json(req): Json<CopyReq>,
) -> Result<Json<StoredObjectRef>, AppError> {
    let stored = fs
        .copy_object(&req.from, &req.to, &WriteOptions::default())
        .await?;
    Ok(Json(stored))
}

fn set_etag(headers: &mut HeaderMap, stored: &StoredObjectRef) {
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", stored.checksum)) {
        headers.insert(header::ETAG, value);
    }
}

fn set_attribute_headers(headers: &mut HeaderMap, attrs: &FileAttributes) {
    let content_type = attrs
        .mime_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    if let Some(size) = attrs.file_size {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    }

    let last_modified = attrs
        .last_modified
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    if let Some(value) = last_modified.and_then(|ts| HeaderValue::from_str(&ts.to_rfc2822()).ok()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}
