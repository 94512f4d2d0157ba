//! The bucket store seam.
//!
//! The controller talks to storage only through [`CacheStorage`], so the
//! SQLite store and the in-memory store are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::request::{CacheRequest, CacheResponse};

/// One stored request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub bucket: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub response: CacheResponse,
    pub stored_at: String,
}

/// A set of named buckets, each mapping request identity to a response.
///
/// Every method is a single atomic operation; callers never rely on a
/// read-modify-write sequence across calls.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if it does not exist. Opening twice is a no-op.
    async fn open(&self, bucket: &str) -> Result<(), Error>;

    async fn has(&self, bucket: &str) -> Result<bool, Error>;

    /// Names of all buckets, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a bucket and every entry in it. Returns whether it existed.
    async fn delete(&self, bucket: &str) -> Result<bool, Error>;

    /// Look up the stored response for a request.
    async fn match_entry(&self, bucket: &str, request: &CacheRequest) -> Result<Option<CacheResponse>, Error>;

    /// Store a response, replacing any previous entry for the same request.
    /// Opens the bucket implicitly.
    async fn put(&self, bucket: &str, request: &CacheRequest, response: &CacheResponse) -> Result<(), Error> {
        self.put_all(bucket, vec![(request.clone(), response.clone())]).await
    }

    /// Store several entries at once: either all are written or none are.
    async fn put_all(&self, bucket: &str, entries: Vec<(CacheRequest, CacheResponse)>) -> Result<(), Error>;

    /// Entries of a bucket ordered by URL.
    async fn entries(&self, bucket: &str) -> Result<Vec<CachedEntry>, Error>;

    /// Remove a single entry. Returns whether it existed.
    async fn delete_entry(&self, bucket: &str, request: &CacheRequest) -> Result<bool, Error>;
}
