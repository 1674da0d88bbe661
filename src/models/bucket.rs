//! Represents a logical bucket — a flat namespace of versioned objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A storage bucket in the bundled object store.
///
/// Buckets hold object names only; there is no directory table. Anything that
/// looks like a folder is derived from `/` characters in object names.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Bucket {
    /// Unique identifier for this bucket.
    pub id: Uuid,

    /// Unique bucket name (must conform to DNS naming rules).
    pub name: String,

    /// When this bucket was created.
    pub created_at: DateTime<Utc>,
}

/// The `(bucketId, bucketName)` pair every storage call is scoped to.
///
/// The id is optional; backends resolve the bucket by name when it is absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketRef {
    pub id: Option<String>,
    pub name: String,
}

impl BucketRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
