//! Maps raw backend records onto [`FileAttributes`].

use crate::models::{attributes::FileAttributes, stored_object::RawStoredObject};

/// Build the uniform attribute record for one stored object.
///
/// Total over its input: a malformed timestamp yields `last_modified: None`.
/// The mime type is guessed from the object *name*, never from its bytes, so
/// no download is needed to answer a metadata query.
pub fn normalize(raw: &RawStoredObject) -> FileAttributes {
    FileAttributes {
        path: raw.name.clone(),
        file_size: Some(raw.size_bytes),
        visibility: None,
        last_modified: millis_to_seconds(&raw.upload_timestamp),
        mime_type: guess_mime_type(&raw.name),
    }
}

/// Truncate an epoch-millisecond digit string to whole seconds.
///
/// Drops the last three characters; an empty remainder means unset.
pub fn millis_to_seconds(timestamp: &str) -> Option<u64> {
    let cut = timestamp
        .char_indices()
        .rev()
        .nth(2)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let seconds = &timestamp[..cut];
    if seconds.is_empty() {
        return None;
    }
    seconds.parse().ok()
}

pub fn guess_mime_type(name: &str) -> Option<String> {
    mime_guess::from_path(name).first().map(|mime| mime.to_string())
}
