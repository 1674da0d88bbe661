pub mod bucket_store;
pub mod filesystem;
pub mod normalizer;
pub mod path_matcher;
pub mod storage_client;
