//! src/services/bucket_store.rs
//!
//! BucketStore — a versioned object store backed by SQLite for metadata and
//! local disk for payloads. Every upload adds a new row to `file_versions`;
//! payloads live beneath `base_path/{bucket}/{shard}/{shard}/{file_id}` so
//! that older versions stay addressable by id.

use crate::{
    models::{
        bucket::{Bucket, BucketRef},
        stored_object::{FileVersion, RawStoredObject, StoredObjectRef},
    },
    services::storage_client::{ByteStream, StorageClient, StorageError, StorageResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use md5::Context;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::{debug, warn};
use uuid::Uuid;

const MIGRATION_SQL: &str = include_str!("../../migrations/0001_init.sql");
const MAX_OBJECT_NAME_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;
const VERSION_COLUMNS: &str =
    "id, bucket_id, name, content_type, size_bytes, checksum, upload_timestamp, created_at";

/// Local implementation of [`StorageClient`].
///
/// Names are flat keys: a `/` inside a name is just another character here.
/// Cloning is cheap; clones share the pool.
#[derive(Clone)]
pub struct BucketStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where payloads are stored.
    pub base_path: PathBuf,
}

impl BucketStore {
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Apply the bundled schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> StorageResult<()> {
        let statements = MIGRATION_SQL
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        debug!("running {} migration statements", statements.len());
        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Object names are opaque keys and never touch the disk, so only the
    /// length limit and NUL are enforced.
    fn ensure_name_safe(name: &str) -> StorageResult<()> {
        let invalid = name.is_empty() || name.len() > MAX_OBJECT_NAME_LEN || name.contains('\0');
        if invalid {
            return Err(StorageError::InvalidObjectName(name.to_string()));
        }
        Ok(())
    }

    /// Validate bucket name format.
    ///
    /// S3-like rules: 3–63 characters of lowercase letters, digits, dots and
    /// hyphens; must start and end alphanumeric; no `..`, `.-` or `-.`; must
    /// not look like an IPv4 address.
    fn ensure_bucket_name_safe(name: &str) -> StorageResult<()> {
        let reject = |reason: &str| {
            Err(StorageError::InvalidBucketName {
                name: name.to_string(),
                reason: reason.into(),
            })
        };

        if name.len() < BUCKET_NAME_MIN_LEN || name.len() > BUCKET_NAME_MAX_LEN {
            return reject("must be between 3 and 63 characters");
        }
        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            return reject("allowed characters are lowercase letters, digits, dots, and hyphens");
        }
        if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
            return reject("must start and end with a lowercase letter or digit");
        }
        if name.contains("..") || name.contains("-.") || name.contains(".-") {
            return reject("cannot contain consecutive dots or dot-hyphen combinations");
        }
        if is_ipv4_like(name) {
            return reject("must not be formatted like an IP address");
        }
        Ok(())
    }

    fn bucket_root(&self, bucket_name: &str) -> PathBuf {
        self.base_path.join(bucket_name)
    }

    /// Two-level shard directories from MD5(bucket/file_id).
    fn payload_shards(bucket_name: &str, file_id: &Uuid) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", bucket_name, file_id));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    fn payload_path(&self, bucket_name: &str, file_id: &Uuid) -> PathBuf {
        let (shard_a, shard_b) = Self::payload_shards(bucket_name, file_id);
        let mut path = self.bucket_root(bucket_name);
        path.push(shard_a);
        path.push(shard_b);
        path.push(file_id.to_string());
        path
    }

    /// Create a bucket and its payload directory.
    pub async fn create_bucket(&self, name: &str) -> StorageResult<Bucket> {
        Self::ensure_bucket_name_safe(name)?;
        fs::create_dir_all(self.bucket_root(name)).await?;

        let bucket = Bucket {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        match sqlx::query("INSERT INTO buckets (id, name, created_at) VALUES (?, ?, ?)")
            .bind(bucket.id)
            .bind(&bucket.name)
            .bind(bucket.created_at)
            .execute(&*self.db)
            .await
        {
            Ok(_) => Ok(bucket),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::BucketAlreadyExists(name.to_string()))
            }
            Err(err) => Err(StorageError::Sqlx(err)),
        }
    }

    /// Fetch the named bucket, creating it on first use.
    pub async fn ensure_bucket(&self, name: &str) -> StorageResult<Bucket> {
        match self.fetch_bucket(&BucketRef::new(name)).await {
            Err(StorageError::BucketNotFound(_)) => match self.create_bucket(name).await {
                Err(StorageError::BucketAlreadyExists(_)) => {
                    self.fetch_bucket(&BucketRef::new(name)).await
                }
                other => other,
            },
            other => other,
        }
    }

    /// Resolve a bucket by id when one is given, otherwise by name.
    pub async fn fetch_bucket(&self, bucket: &BucketRef) -> StorageResult<Bucket> {
        let not_found = || StorageError::BucketNotFound(bucket.name.clone());
        let query = match &bucket.id {
            Some(id) => {
                let id = Uuid::parse_str(id).map_err(|_| not_found())?;
                sqlx::query_as::<_, Bucket>("SELECT id, name, created_at FROM buckets WHERE id = ?")
                    .bind(id)
            }
            None => {
                Self::ensure_bucket_name_safe(&bucket.name)?;
                sqlx::query_as::<_, Bucket>(
                    "SELECT id, name, created_at FROM buckets WHERE name = ?",
                )
                .bind(bucket.name.clone())
            }
        };

        query.fetch_one(&*self.db).await.map_err(|err| match err {
            sqlx::Error::RowNotFound => not_found(),
            other => StorageError::Sqlx(other),
        })
    }

    /// Current version of `name`: latest upload timestamp, then latest insert.
    async fn current_version(&self, bucket: &Bucket, name: &str) -> StorageResult<FileVersion> {
        sqlx::query_as::<_, FileVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM file_versions
             WHERE bucket_id = ? AND name = ?
             ORDER BY upload_timestamp DESC, seq DESC LIMIT 1"
        ))
        .bind(bucket.id)
        .bind(name)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StorageError::FileNotFound {
                bucket: bucket.name.clone(),
                name: name.to_string(),
            },
            other => StorageError::Sqlx(other),
        })
    }

    /// Every stored version of `name`, oldest first.
    pub async fn versions(&self, bucket: &BucketRef, name: &str) -> StorageResult<Vec<FileVersion>> {
        Self::ensure_name_safe(name)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let rows = sqlx::query_as::<_, FileVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM file_versions
             WHERE bucket_id = ? AND name = ?
             ORDER BY upload_timestamp ASC, seq ASC"
        ))
        .bind(bucket_rec.id)
        .bind(name)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Stream `body` into `final_path` via a synced temp file.
    ///
    /// Returns the byte count and hex MD5. The temp file is removed on any error.
    async fn write_payload(&self, final_path: &Path, mut body: ByteStream) -> StorageResult<(i64, String)> {
        let parent = final_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::new(
                ErrorKind::Other,
                "payload path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        let written: io::Result<()> = async {
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                size_bytes += chunk.len() as i64;
                digest.consume(&chunk);
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, final_path).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        Ok((size_bytes, format!("{:x}", digest.compute())))
    }

    /// Remove empty shard directories up to (not including) the bucket root.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl StorageClient for BucketStore {
    async fn file_exists(&self, bucket: &BucketRef, name: &str) -> StorageResult<bool> {
        Self::ensure_name_safe(name)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM file_versions WHERE bucket_id = ? AND name = ?",
        )
        .bind(bucket_rec.id)
        .bind(name)
        .fetch_one(&*self.db)
        .await?;
        Ok(count > 0)
    }

    async fn upload(
        &self,
        bucket: &BucketRef,
        name: &str,
        content_type: Option<&str>,
        body: ByteStream,
    ) -> StorageResult<StoredObjectRef> {
        Self::ensure_name_safe(name)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;

        let file_id = Uuid::new_v4();
        let payload_path = self.payload_path(&bucket_rec.name, &file_id);
        let (size_bytes, checksum) = self.write_payload(&payload_path, body).await?;

        let now = Utc::now();
        let inserted = sqlx::query_as::<_, FileVersion>(&format!(
            "INSERT INTO file_versions (
                id, bucket_id, name, content_type, size_bytes, checksum, upload_timestamp, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {VERSION_COLUMNS}"
        ))
        .bind(file_id)
        .bind(bucket_rec.id)
        .bind(name)
        .bind(content_type)
        .bind(size_bytes)
        .bind(&checksum)
        .bind(now.timestamp_millis())
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(version) => {
                debug!(
                    bucket = %bucket_rec.name,
                    name,
                    file_id = %version.id,
                    size_bytes,
                    "stored new file version"
                );
                Ok(version.to_object_ref())
            }
            Err(err) => {
                let _ = fs::remove_file(&payload_path).await;
                Err(StorageError::Sqlx(err))
            }
        }
    }

    async fn get_file(&self, bucket: &BucketRef, name: &str) -> StorageResult<RawStoredObject> {
        Self::ensure_name_safe(name)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let version = self.current_version(&bucket_rec, name).await?;
        Ok(version.into_raw(&bucket_rec.name))
    }

    async fn download(&self, bucket: &BucketRef, file_id: &str) -> StorageResult<Bytes> {
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let not_found = || StorageError::FileIdNotFound(file_id.to_string());
        let id = Uuid::parse_str(file_id).map_err(|_| not_found())?;

        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM file_versions WHERE id = ? AND bucket_id = ?",
        )
        .bind(id)
        .bind(bucket_rec.id)
        .fetch_one(&*self.db)
        .await?;
        if exists == 0 {
            return Err(not_found());
        }

        let path = self.payload_path(&bucket_rec.name, &id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    async fn download_by_name(
        &self,
        bucket: &BucketRef,
        name: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<bool> {
        Self::ensure_name_safe(name)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let version = self.current_version(&bucket_rec, name).await?;

        let path = self.payload_path(&bucket_rec.name, &version.id);
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(name, file_id = %version.id, "payload missing for stored version");
                return Ok(false);
            }
            Err(err) => return Err(StorageError::Io(err)),
        };

        tokio::io::copy(&mut file, sink).await?;
        sink.flush().await?;
        Ok(true)
    }

    async fn delete_file(&self, bucket: &BucketRef, name: &str) -> StorageResult<()> {
        let versions = self.versions(bucket, name).await?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        if versions.is_empty() {
            return Err(StorageError::FileNotFound {
                bucket: bucket_rec.name,
                name: name.to_string(),
            });
        }

        sqlx::query("DELETE FROM file_versions WHERE bucket_id = ? AND name = ?")
            .bind(bucket_rec.id)
            .bind(name)
            .execute(&*self.db)
            .await?;

        // Rows are gone; payload removal is best-effort from here on.
        let bucket_root = self.bucket_root(&bucket_rec.name);
        for version in &versions {
            let path = self.payload_path(&bucket_rec.name, &version.id);
            match fs::remove_file(&path).await {
                Ok(_) => debug!("removed payload {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!("payload {} already missing", path.display());
                }
                Err(err) => {
                    warn!(name, file_id = %version.id, "failed to remove payload {}: {}", path.display(), err);
                }
            }
            if let Some(parent) = path.parent() {
                self.prune_empty_dirs(parent, &bucket_root).await;
            }
        }

        Ok(())
    }

    async fn list_files(&self, bucket: &BucketRef) -> StorageResult<Vec<RawStoredObject>> {
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let rows = sqlx::query_as::<_, FileVersion>(
            "SELECT v.id AS id, v.bucket_id AS bucket_id, v.name AS name,
                    v.content_type AS content_type, v.size_bytes AS size_bytes,
                    v.checksum AS checksum, v.upload_timestamp AS upload_timestamp,
                    v.created_at AS created_at
             FROM file_versions v
             WHERE v.bucket_id = ? AND v.seq = (
                 SELECT w.seq FROM file_versions w
                 WHERE w.bucket_id = v.bucket_id AND w.name = v.name
                 ORDER BY w.upload_timestamp DESC, w.seq DESC LIMIT 1
             )
             ORDER BY v.name ASC",
        )
        .bind(bucket_rec.id)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_raw(&bucket_rec.name))
            .collect())
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
