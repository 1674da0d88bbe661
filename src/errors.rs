use crate::services::{filesystem::FsError, storage_client::StorageError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for handler errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 503 when the backend answered without usable content
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message);
        }

        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<FsError> for AppError {
    fn from(err: FsError) -> Self {
        let message = err.to_string();
        match err {
            FsError::NotFound(_) => AppError::not_found(message),
            FsError::InvalidArgument(_) => AppError::new(StatusCode::BAD_REQUEST, message),
            FsError::Storage(StorageError::BucketNotFound(_)) => AppError::not_found(message),
            FsError::Storage(
                StorageError::InvalidObjectName(_) | StorageError::InvalidBucketName { .. },
            ) => AppError::new(StatusCode::BAD_REQUEST, message),
            FsError::LocalRead { .. } | FsError::Storage(_) => AppError::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_filesystem_errors_to_statuses() {
        let cases = [
            (FsError::NotFound("a".into()), StatusCode::NOT_FOUND),
            (FsError::InvalidArgument("empty".into()), StatusCode::BAD_REQUEST),
            (
                FsError::Storage(StorageError::InvalidObjectName("/x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                FsError::Storage(StorageError::BucketNotFound("b".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                FsError::Storage(StorageError::Io(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status, expected);
        }
    }
}
