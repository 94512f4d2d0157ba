//! Unified error types for swcache.
//!
//! Every variant renders with a stable code prefix so tool callers can
//! match on the message without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the offline cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown request mode).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unresolvable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure: DNS, refused connection, timeout, reset.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Response body exceeded the configured byte cap.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// No bucket or entry found for the given name.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Bucket name did not follow the `<prefix>-v<version>` convention.
    #[error("INVALID_BUCKET: {0}")]
    InvalidBucket(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Network(msg) => (-32008, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::InvalidBucket(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
