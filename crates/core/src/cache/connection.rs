//! Database connection management with pragma configuration.
//!
//! Opens the SQLite file, applies WAL and foreign-key pragmas (bucket
//! deletion cascades to its entries) and runs migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// SQLite-backed bucket store.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub(crate) conn: Connection,
}

impl SqliteStorage {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas and runs any
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = SqliteStorage::open_in_memory().await.unwrap();
        let foreign_keys: i64 = db
            .conn
            .call(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }
}
