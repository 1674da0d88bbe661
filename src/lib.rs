//! Hierarchical filesystem view over a flat, versioned object bucket.
//!
//! Directories do not exist in the bucket; they are derived from `/` in
//! object names by [`services::path_matcher`]. Backend records are turned
//! into uniform [`models::attributes::FileAttributes`] by
//! [`services::normalizer`]. [`services::filesystem::BucketFilesystem`] is the
//! operation surface, generic over any [`services::storage_client::StorageClient`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
