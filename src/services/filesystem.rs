//! BucketFilesystem — generic filesystem operations over a flat, versioned
//! object store.
//!
//! Every call goes straight to the [`StorageClient`]; nothing is cached and
//! no state is kept between calls. Listings pass through the path matcher and
//! the normalizer; single-object metadata passes through the normalizer only.
//!
//! A few operations are deliberately weaker than their names suggest:
//! - [`BucketFilesystem::copy`] reads its source from the *local* filesystem.
//! - [`BucketFilesystem::move_file`] and [`BucketFilesystem::set_visibility`]
//!   do nothing.
//! - [`BucketFilesystem::delete_directory`] removes only the marker object
//!   named exactly like the directory, never its members.

use crate::{
    models::{
        attributes::{FileAttributes, Visibility},
        bucket::BucketRef,
        stored_object::StoredObjectRef,
    },
    services::{
        normalizer::normalize,
        path_matcher::filter_directory,
        storage_client::{ByteStream, StorageClient, StorageError},
    },
};
use bytes::Bytes;
use futures::{Stream, stream};
use std::{
    io,
    path::{Path, PathBuf},
    pin::Pin,
    sync::Arc,
};
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("`{0}` not found")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("reading local file `{}`: {source}", path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Backend failures are surfaced untouched.
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for FsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FileNotFound { name, .. } => FsError::NotFound(name),
            other => FsError::Storage(other),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;

/// Readable handle over downloaded object content.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Outcome of [`BucketFilesystem::read_stream`].
///
/// `Unavailable` is a normal result, not an error: the backend answered but
/// no readable handle could be produced. Callers must check for it.
pub enum ReadStream {
    Ready(ObjectReader),
    Unavailable,
}

impl std::fmt::Debug for ReadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadStream::Ready(_) => f.write_str("ReadStream::Ready(..)"),
            ReadStream::Unavailable => f.write_str("ReadStream::Unavailable"),
        }
    }
}

/// Per-write options.
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    /// Stored with the object version. Attribute queries still guess the
    /// mime type from the name.
    pub content_type: Option<String>,
}

pub struct BucketFilesystem<C> {
    client: Arc<C>,
    bucket: BucketRef,
}

impl<C> Clone for BucketFilesystem<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            bucket: self.bucket.clone(),
        }
    }
}

impl<C: StorageClient> BucketFilesystem<C> {
    pub fn new(client: Arc<C>, bucket: BucketRef) -> Self {
        Self { client, bucket }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn bucket(&self) -> &BucketRef {
        &self.bucket
    }

    fn ensure_path(path: &str) -> FsResult<()> {
        if path.is_empty() {
            return Err(FsError::InvalidArgument("path must not be empty".into()));
        }
        Ok(())
    }

    /// An empty path never names an object, so it is simply absent.
    pub async fn exists(&self, path: &str) -> FsResult<bool> {
        if path.is_empty() {
            return Ok(false);
        }
        Ok(self.client.file_exists(&self.bucket, path).await?)
    }

    /// Full content of the current version of `path`.
    pub async fn read(&self, path: &str) -> FsResult<Bytes> {
        Self::ensure_path(path)?;
        let file = self.client.get_file(&self.bucket, path).await?;
        debug!(path, file_id = %file.id, "downloading file version");
        Ok(self.client.download(&self.bucket, &file.id).await?)
    }

    /// Download `path` into a buffer and hand back a reader over it.
    pub async fn read_stream(&self, path: &str) -> FsResult<ReadStream> {
        Self::ensure_path(path)?;
        let mut sink = Vec::new();
        let delivered = self
            .client
            .download_by_name(&self.bucket, path, &mut sink)
            .await?;

        if !delivered {
            warn!(path, "download did not produce a readable stream");
            return Ok(ReadStream::Unavailable);
        }
        Ok(ReadStream::Ready(Box::pin(io::Cursor::new(sink))))
    }

    /// Upload `contents` as a new version of `path`.
    pub async fn write(
        &self,
        path: &str,
        contents: impl Into<Bytes>,
        options: &WriteOptions,
    ) -> FsResult<StoredObjectRef> {
        let contents = contents.into();
        let body: ByteStream = Box::pin(stream::once(async move { Ok::<_, io::Error>(contents) }));
        self.upload(path, body, options).await
    }

    /// Same contract as [`write`](Self::write), fed from a stream.
    pub async fn write_stream<S>(
        &self,
        path: &str,
        contents: S,
        options: &WriteOptions,
    ) -> FsResult<StoredObjectRef>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        self.upload(path, Box::pin(contents), options).await
    }

    async fn upload(
        &self,
        path: &str,
        body: ByteStream,
        options: &WriteOptions,
    ) -> FsResult<StoredObjectRef> {
        Self::ensure_path(path)?;
        let stored = self
            .client
            .upload(&self.bucket, path, options.content_type.as_deref(), body)
            .await?;
        debug!(path, file_id = %stored.id, size_bytes = stored.size_bytes, "uploaded");
        Ok(stored)
    }

    /// Upload the bytes of the **local** file `local_path` as `new_path`.
    ///
    /// The source is never looked up in the bucket. Use
    /// [`copy_object`](Self::copy_object) to copy between two object names.
    pub async fn copy(
        &self,
        local_path: impl AsRef<Path>,
        new_path: &str,
        options: &WriteOptions,
    ) -> FsResult<StoredObjectRef> {
        let local_path = local_path.as_ref();
        let contents = tokio::fs::read(local_path)
            .await
            .map_err(|source| FsError::LocalRead {
                path: local_path.to_path_buf(),
                source,
            })?;
        self.write(new_path, contents, options).await
    }

    /// Backend-to-backend copy: download the current version of `path` and
    /// upload it as `new_path`.
    pub async fn copy_object(
        &self,
        path: &str,
        new_path: &str,
        options: &WriteOptions,
    ) -> FsResult<StoredObjectRef> {
        let contents = self.read(path).await?;
        self.write(new_path, contents, options).await
    }

    /// Does nothing. The backend has no rename; callers must not assume
    /// either name changed.
    pub async fn move_file(&self, path: &str, new_path: &str, _options: &WriteOptions) -> FsResult<()> {
        debug!(path, new_path, "move is not supported; ignoring");
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> FsResult<()> {
        Self::ensure_path(path)?;
        Ok(self.client.delete_file(&self.bucket, path).await?)
    }

    /// Delete the marker object whose name is exactly `path`.
    pub async fn delete_marker(&self, path: &str) -> FsResult<()> {
        self.delete(path).await
    }

    /// Alias of [`delete_marker`](Self::delete_marker). Objects under
    /// `path/` are left in place.
    pub async fn delete_directory(&self, path: &str) -> FsResult<()> {
        self.delete_marker(path).await
    }

    /// Upload a zero-byte marker object named `path`.
    pub async fn create_directory(&self, path: &str, options: &WriteOptions) -> FsResult<StoredObjectRef> {
        self.write(path, Bytes::new(), options).await
    }

    /// Normalized attributes of the current version of `path`.
    pub async fn metadata(&self, path: &str) -> FsResult<FileAttributes> {
        Self::ensure_path(path)?;
        let file = self.client.get_file(&self.bucket, path).await?;
        Ok(normalize(&file))
    }

    pub async fn mime_type(&self, path: &str) -> FsResult<FileAttributes> {
        self.metadata(path).await
    }

    pub async fn file_size(&self, path: &str) -> FsResult<FileAttributes> {
        self.metadata(path).await
    }

    pub async fn last_modified(&self, path: &str) -> FsResult<FileAttributes> {
        self.metadata(path).await
    }

    /// Does nothing; the backend has no per-object ACL.
    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> FsResult<()> {
        debug!(path, ?visibility, "visibility is not supported; ignoring");
        Ok(())
    }

    /// Always an attribute record with nothing but the path.
    pub async fn visibility(&self, path: &str) -> FsResult<FileAttributes> {
        Self::ensure_path(path)?;
        Ok(FileAttributes::new(path))
    }

    /// Entries of `directory` (`""` is the bucket root), in backend order.
    pub async fn list_contents(&self, directory: &str, recursive: bool) -> FsResult<Vec<FileAttributes>> {
        let listed = self.client.list_files(&self.bucket).await?;
        let total = listed.len();
        let members = filter_directory(listed, directory, recursive, |raw| raw.name.as_str());
        debug!(directory, recursive, total, matched = members.len(), "listed bucket");
        Ok(members.iter().map(normalize).collect())
    }
}
