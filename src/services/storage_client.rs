//! The object-storage contract the filesystem layer is written against.
//!
//! Every call is scoped to a [`BucketRef`] plus an object name. Transport,
//! authentication, retries and pagination belong to the implementor.

use crate::models::{
    bucket::BucketRef,
    stored_object::{RawStoredObject, StoredObjectRef},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::{io, pin::Pin};
use thiserror::Error;
use tokio::io::AsyncWrite;

/// Request body accepted by [`StorageClient::upload`].
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("bucket `{0}` already exists")]
    BucketAlreadyExists(String),
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("file `{name}` not found in bucket `{bucket}`")]
    FileNotFound { bucket: String, name: String },
    #[error("file version `{0}` not found")]
    FileIdNotFound(String),
    #[error("invalid object name `{0}`")]
    InvalidObjectName(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Minimal versioned object-storage client.
///
/// Names are flat keys that may contain `/`. A name can have several stored
/// versions; lookups by name always resolve to the current one.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Whether any version of `name` exists.
    async fn file_exists(&self, bucket: &BucketRef, name: &str) -> StorageResult<bool>;

    /// Store `body` as a new version of `name`.
    async fn upload(
        &self,
        bucket: &BucketRef,
        name: &str,
        content_type: Option<&str>,
        body: ByteStream,
    ) -> StorageResult<StoredObjectRef>;

    /// Current version of `name`, or `FileNotFound`.
    async fn get_file(&self, bucket: &BucketRef, name: &str) -> StorageResult<RawStoredObject>;

    /// Full payload of one version addressed by id.
    async fn download(&self, bucket: &BucketRef, file_id: &str) -> StorageResult<Bytes>;

    /// Copy the current version of `name` into `sink`.
    ///
    /// Returns `false` when the backend acknowledged the request but could not
    /// deliver the payload.
    async fn download_by_name(
        &self,
        bucket: &BucketRef,
        name: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<bool>;

    /// Remove `name` from the bucket.
    async fn delete_file(&self, bucket: &BucketRef, name: &str) -> StorageResult<()>;

    /// Current version of every name in the bucket, in backend order.
    async fn list_files(&self, bucket: &BucketRef) -> StorageResult<Vec<RawStoredObject>>;
}
