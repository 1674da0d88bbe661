use crate::services::{bucket_store::BucketStore, filesystem::BucketFilesystem};

/// Router state: the filesystem view over the configured bucket.
pub type SharedFs = BucketFilesystem<BucketStore>;
