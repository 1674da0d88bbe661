//! Defines routes for the filesystem API.
//!
//! ## Structure
//! - **Files**
//!   - `GET    /files?directory=&recursive=` — list a directory
//!   - `PUT    /files/{*path}` — upload a new version
//!   - `GET    /files/{*path}` — download the current version
//!   - `HEAD   /files/{*path}` — normalized attributes as headers
//!   - `DELETE /files/{*path}` — delete
//!   - `GET    /meta/{*path}` — normalized attributes as JSON
//! - **Directory markers**
//!   - `PUT    /dirs/{*path}` — create marker object
//!   - `DELETE /dirs/{*path}` — delete marker object (members stay)
//! - `POST /copy` — copy one object to another name
//!
//! The wildcard `*path` keeps nested names like `photos/2025/img.jpg` intact.

use crate::{
    handlers::{
        fs_handlers::{
            copy_file, create_directory, delete_directory, delete_file, file_metadata, get_file,
            head_file, list_files, upload_file,
        },
        health_handlers::{healthz, readyz},
    },
    state::SharedFs,
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build the router; callers attach a `SharedFs` with `.with_state(..)`.
pub fn routes() -> Router<SharedFs> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/files", get(list_files))
        .route(
            "/files/{*path}",
            put(upload_file)
                .get(get_file)
                .head(head_file)
                .delete(delete_file),
        )
        .route("/meta/{*path}", get(file_metadata))
        .route("/dirs/{*path}", put(create_directory).delete(delete_directory))
        .route("/copy", post(copy_file))
}

/// Router with state attached, ready to serve.
pub fn build_router(fs: SharedFs) -> Router {
    routes().with_state(fs)
}
