//! Bucket and entry operations on the SQLite store.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::SqliteStorage;
use super::hash::{canonical_url, compute_entry_key};
use super::storage::{CacheStorage, CachedEntry};
use crate::Error;
use crate::request::{CacheRequest, CacheResponse};

/// Column list shared by entry queries.
const ENTRY_COLUMNS: &str = "bucket, key, method, url, status, status_text, headers_json, body, final_url, stored_at";

/// A request/response pair flattened into column values.
struct EntryRow {
    key: String,
    method: String,
    url: String,
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    final_url: Option<String>,
}

impl EntryRow {
    fn from_pair(request: &CacheRequest, response: &CacheResponse) -> Result<Self, Error> {
        let url = canonical_url(&request.url);
        Ok(Self {
            key: compute_entry_key(&request.method, &request.url),
            method: request.method.to_ascii_uppercase(),
            url,
            status: i64::from(response.status),
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
            final_url: response.url.as_ref().map(|u| u.to_string()),
        })
    }
}

/// Raw columns of one `entries` row, decoded outside the rusqlite closure.
type RawEntry = (String, String, String, String, i64, String, String, Vec<u8>, Option<String>, String);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn decode(raw: RawEntry) -> Result<CachedEntry, Error> {
    let (bucket, key, method, url, status, status_text, headers_json, body, final_url, stored_at) = raw;
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} for {url}")))?;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    let final_url = final_url
        .map(|u| url::Url::parse(&u))
        .transpose()
        .map_err(|e| Error::CorruptEntry(e.to_string()))?;

    Ok(CachedEntry {
        bucket,
        key,
        method,
        url,
        response: CacheResponse { status, status_text, headers, body: body.into(), url: final_url },
        stored_at,
    })
}

#[async_trait]
impl CacheStorage for SqliteStorage {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)",
                    params![bucket],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![bucket])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_entry(&self, bucket: &str, request: &CacheRequest) -> Result<Option<CacheResponse>, Error> {
        let bucket = bucket.to_string();
        let key = compute_entry_key(&request.method, &request.url);
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE bucket = ?1 AND key = ?2");
                match conn.query_row(&sql, params![bucket, key], read_raw) {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(decode).transpose().map(|e| e.map(|e| e.response))
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(CacheRequest, CacheResponse)>) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::from_pair(request, response))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, now],
                )?;
                for row in &rows {
                    tx.execute(
                        "INSERT INTO entries (
                        bucket, key, method, url, status, status_text,
                        headers_json, body, final_url, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(bucket, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        final_url = excluded.final_url,
                        stored_at = excluded.stored_at",
                        params![
                            &bucket,
                            &row.key,
                            &row.method,
                            &row.url,
                            row.status,
                            &row.status_text,
                            &row.headers_json,
                            &row.body,
                            &row.final_url,
                            &now,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<CachedEntry>, Error> {
        let bucket = bucket.to_string();
        let raws = self
            .conn
            .call(move |conn| -> Result<Vec<RawEntry>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE bucket = ?1 ORDER BY url ASC");
                let mut stmt = conn.prepare(&sql)?;
                let raws = stmt
                    .query_map(params![bucket], read_raw)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(raws)
            })
            .await
            .map_err(Error::from)?;

        raws.into_iter().map(decode).collect()
    }

    async fn delete_entry(&self, bucket: &str, request: &CacheRequest) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        let key = compute_entry_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE bucket = ?1 AND key = ?2", params![bucket, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> CacheRequest {
        CacheRequest::get(Url::parse("https://youth.example.org").unwrap().join(path).unwrap())
    }

    fn png() -> CacheResponse {
        CacheResponse::new(200, "OK", vec![0x89, b'P', b'N', b'G']).with_header("content-type", "image/png")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.put("yfo-cache-v19", &request("/assets/logo.png"), &png())
            .await
            .unwrap();

        let hit = db
            .match_entry("yfo-cache-v19", &request("/assets/logo.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit, png());
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.open("yfo-cache-v19").await.unwrap();
        let miss = db.match_entry("yfo-cache-v19", &request("/nope.png")).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_open_twice_single_bucket() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.open("yfo-cache-v19").await.unwrap();
        db.open("yfo-cache-v19").await.unwrap();
        assert_eq!(db.keys().await.unwrap(), vec!["yfo-cache-v19".to_string()]);
        assert!(db.has("yfo-cache-v19").await.unwrap());
        assert!(!db.has("yfo-cache-v18").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_oldest_first() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.open("yfo-cache-v17").await.unwrap();
        db.open("yfo-cache-v18").await.unwrap();
        db.open("unrelated-cache").await.unwrap();
        db.put("yfo-cache-v17", &request("/ads.txt"), &CacheResponse::new(200, "OK", "x"))
            .await
            .unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["yfo-cache-v17", "yfo-cache-v18", "unrelated-cache"]);
    }

    #[tokio::test]
    async fn test_put_all_rolls_back_on_failure() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_broken BEFORE INSERT ON entries
                     WHEN NEW.url LIKE '%broken%'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
            })
            .await
            .unwrap();

        let batch = vec![
            (request("/ads.txt"), CacheResponse::new(200, "OK", "google.com")),
            (request("/broken.js"), CacheResponse::new(200, "OK", "x")),
        ];
        assert!(db.put_all("yfo-cache-v19", batch).await.is_err());

        assert!(!db.has("yfo-cache-v19").await.unwrap());
        assert!(db.entries("yfo-cache-v19").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fragment_shares_entry() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.put("yfo-cache-v19", &request("/assets/logo.png#v2"), &png())
            .await
            .unwrap();

        let hit = db.match_entry("yfo-cache-v19", &request("/assets/logo.png")).await.unwrap();
        assert_eq!(hit, Some(png()));
        let entries = db.entries("yfo-cache-v19").await.unwrap();
        assert_eq!(entries[0].url, "https://youth.example.org/assets/logo.png");
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.put("yfo-cache-v18", &request("/ads.txt"), &CacheResponse::new(200, "OK", "google.com"))
            .await
            .unwrap();

        assert!(db.delete("yfo-cache-v18").await.unwrap());
        assert!(!db.delete("yfo-cache-v18").await.unwrap());

        let orphans: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_put_all_overwrites_same_key() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        let batch = vec![
            (request("/ads.txt"), CacheResponse::new(200, "OK", "v1")),
            (request("/manifest.webmanifest"), CacheResponse::new(200, "OK", "{}")),
        ];
        db.put_all("yfo-cache-v19", batch.clone()).await.unwrap();
        db.put_all("yfo-cache-v19", batch).await.unwrap();
        db.put("yfo-cache-v19", &request("/ads.txt"), &CacheResponse::new(200, "OK", "v2"))
            .await
            .unwrap();

        let entries = db.entries("yfo-cache-v19").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://youth.example.org/ads.txt");
        assert_eq!(entries[0].response.body, bytes::Bytes::from_static(b"v2"));
        assert_eq!(entries[0].method, "GET");
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        db.put("yfo-cache-v19", &request("/ads.txt"), &CacheResponse::new(200, "OK", "x"))
            .await
            .unwrap();
        assert!(db.delete_entry("yfo-cache-v19", &request("/ads.txt")).await.unwrap());
        assert!(db.entries("yfo-cache-v19").await.unwrap().is_empty());
        assert!(db.has("yfo-cache-v19").await.unwrap());
    }
}
