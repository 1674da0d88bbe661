//! Normalized file attributes returned to filesystem callers.

use serde::{Deserialize, Serialize};

/// Object visibility. The bundled backends never report one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Uniform attribute record built fresh for every query.
///
/// A value object: it carries no identity beyond `path` and is never cached.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileAttributes {
    pub path: String,

    /// Size in bytes.
    pub file_size: Option<u64>,

    pub visibility: Option<Visibility>,

    /// Seconds since the Unix epoch.
    pub last_modified: Option<u64>,

    pub mime_type: Option<String>,
}

impl FileAttributes {
    /// An attribute record that knows nothing but its path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_size: None,
            visibility: None,
            last_modified: None,
            mime_type: None,
        }
    }
}
