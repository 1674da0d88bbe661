//! Core data models for the bucket-backed filesystem.
//!
//! `FileAttributes` is what callers of the filesystem layer see. The other
//! entities describe what the object-storage backend hands back and map to
//! database rows of the bundled store via `sqlx::FromRow`.

pub mod attributes;
pub mod bucket;
pub mod stored_object;
