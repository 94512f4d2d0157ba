//! In-memory bucket store.
//!
//! Holds everything in a map behind an async lock. Used by tests and by
//! hosts that do not need entries to survive a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::{canonical_url, compute_entry_key};
use super::storage::{CacheStorage, CachedEntry};
use crate::Error;
use crate::request::{CacheRequest, CacheResponse};

#[derive(Debug, Default)]
struct Bucket {
    seq: u64,
    entries: BTreeMap<String, CachedEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    buckets: BTreeMap<String, Bucket>,
}

impl Inner {
    fn bucket_mut(&mut self, name: &str) -> &mut Bucket {
        let next_seq = &mut self.next_seq;
        self.buckets.entry(name.to_string()).or_insert_with(|| {
            let seq = *next_seq;
            *next_seq += 1;
            Bucket { seq, entries: BTreeMap::new() }
        })
    }
}

/// Bucket store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn make_entry(bucket: &str, request: &CacheRequest, response: &CacheResponse) -> CachedEntry {
    let url = canonical_url(&request.url);
    CachedEntry {
        bucket: bucket.to_string(),
        key: compute_entry_key(&request.method, &request.url),
        method: request.method.to_ascii_uppercase(),
        url,
        response: response.clone(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.inner.write().await.bucket_mut(bucket);
        Ok(())
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.inner.read().await.buckets.contains_key(bucket))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let inner = self.inner.read().await;
        let mut names: Vec<(&String, u64)> = inner.buckets.iter().map(|(k, b)| (k, b.seq)).collect();
        names.sort_by_key(|(_, seq)| *seq);
        Ok(names.into_iter().map(|(k, _)| k.clone()).collect())
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.inner.write().await.buckets.remove(bucket).is_some())
    }

    async fn match_entry(&self, bucket: &str, request: &CacheRequest) -> Result<Option<CacheResponse>, Error> {
        let key = compute_entry_key(&request.method, &request.url);
        let inner = self.inner.read().await;
        Ok(inner
            .buckets
            .get(bucket)
            .and_then(|b| b.entries.get(&key))
            .map(|e| e.response.clone()))
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(CacheRequest, CacheResponse)>) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        let target = inner.bucket_mut(bucket);
        for (request, response) in &entries {
            let entry = make_entry(bucket, request, response);
            target.entries.insert(entry.key.clone(), entry);
        }
        Ok(())
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<CachedEntry>, Error> {
        let inner = self.inner.read().await;
        let mut entries: Vec<CachedEntry> = inner
            .buckets
            .get(bucket)
            .map(|b| b.entries.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }

    async fn delete_entry(&self, bucket: &str, request: &CacheRequest) -> Result<bool, Error> {
        let key = compute_entry_key(&request.method, &request.url);
        let mut inner = self.inner.write().await;
        Ok(inner
            .buckets
            .get_mut(bucket)
            .map(|b| b.entries.remove(&key).is_some())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> CacheRequest {
        CacheRequest::get(Url::parse("https://example.org").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = MemoryStorage::new();
        let response = CacheResponse::new(200, "OK", "png-bytes");
        storage.put("yfo-cache-v1", &request("/logo.png"), &response).await.unwrap();

        let hit = storage.match_entry("yfo-cache-v1", &request("/logo.png")).await.unwrap();
        assert_eq!(hit, Some(response));
        assert!(storage.has("yfo-cache-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_other_bucket_misses() {
        let storage = MemoryStorage::new();
        storage
            .put("yfo-cache-v1", &request("/logo.png"), &CacheResponse::new(200, "OK", "x"))
            .await
            .unwrap();
        let miss = storage.match_entry("yfo-cache-v2", &request("/logo.png")).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let storage = MemoryStorage::new();
        storage.open("b-v2").await.unwrap();
        storage.open("a-v1").await.unwrap();
        storage.open("b-v2").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["b-v2".to_string(), "a-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_entry() {
        let storage = MemoryStorage::new();
        storage
            .put("yfo-cache-v1", &request("/ads.txt"), &CacheResponse::new(200, "OK", "old"))
            .await
            .unwrap();
        storage
            .put("yfo-cache-v1", &request("/ads.txt"), &CacheResponse::new(200, "OK", "new"))
            .await
            .unwrap();

        let entries = storage.entries("yfo-cache-v1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response.body, bytes::Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_delete_bucket_and_entry() {
        let storage = MemoryStorage::new();
        storage
            .put("yfo-cache-v1", &request("/ads.txt"), &CacheResponse::new(200, "OK", "x"))
            .await
            .unwrap();

        assert!(storage.delete_entry("yfo-cache-v1", &request("/ads.txt")).await.unwrap());
        assert!(!storage.delete_entry("yfo-cache-v1", &request("/ads.txt")).await.unwrap());
        assert!(storage.delete("yfo-cache-v1").await.unwrap());
        assert!(!storage.delete("yfo-cache-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
