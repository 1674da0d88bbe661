//! Records produced by the object-storage backend.
//!
//! These are consumed, never owned: the backend decides their lifecycle and the
//! filesystem layer only reads them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One stored version of an object, as reported by the backend.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RawStoredObject {
    /// Full path-like object name, e.g. `photos/2025/img.jpg`.
    pub name: String,

    /// Opaque version identifier.
    pub id: String,

    /// Payload size in bytes.
    pub size_bytes: u64,

    /// Upload time as a string of epoch-millisecond digits.
    pub upload_timestamp: String,

    /// Content type recorded at upload time, if any.
    pub content_type: Option<String>,

    pub bucket_id: String,
    pub bucket_name: String,
}

/// Handle returned by an upload.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredObjectRef {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub checksum: String,
}

/// A row of the `file_versions` table in the bundled store.
#[derive(Clone, FromRow, Debug)]
pub struct FileVersion {
    /// Version id; also names the payload file on disk.
    pub id: Uuid,

    /// Foreign key linking to the parent bucket.
    pub bucket_id: Uuid,

    pub name: String,

    pub content_type: Option<String>,

    pub size_bytes: i64,

    /// MD5 of the payload.
    pub checksum: String,

    /// Epoch milliseconds.
    pub upload_timestamp: i64,

    pub created_at: DateTime<Utc>,
}

impl FileVersion {
    /// Convert a row into the backend-neutral record, attaching the bucket's identity.
    pub fn into_raw(self, bucket_name: &str) -> RawStoredObject {
        RawStoredObject {
            name: self.name,
            id: self.id.to_string(),
            size_bytes: self.size_bytes.max(0) as u64,
            upload_timestamp: self.upload_timestamp.to_string(),
            content_type: self.content_type,
            bucket_id: self.bucket_id.to_string(),
            bucket_name: bucket_name.to_string(),
        }
    }

    pub fn to_object_ref(&self) -> StoredObjectRef {
        StoredObjectRef {
            id: self.id.to_string(),
            name: self.name.clone(),
            size_bytes: self.size_bytes.max(0) as u64,
            checksum: self.checksum.clone(),
        }
    }
}
