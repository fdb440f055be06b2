//! Cache Storage using SQLite
//!
//! Each partition is a row in `cache_partitions`; its entries live in
//! `cache_entries` keyed by `(partition, method, url)`. Response headers are
//! stored as a JSON object and bodies as BLOBs.

use async_trait::async_trait;
use bridge_traits::{
    cache::{CacheKey, CacheStorage},
    error::{BridgeError, Result},
    http::{HttpMethod, HttpResponse},
};
use bytes::Bytes;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row, Sqlite, Transaction,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cache_partitions (
        name TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cache_entries (
        partition TEXT NOT NULL,
        method TEXT NOT NULL,
        url TEXT NOT NULL,
        status INTEGER NOT NULL,
        headers TEXT NOT NULL,
        body BLOB NOT NULL,
        stored_at INTEGER NOT NULL,
        PRIMARY KEY (partition, method, url)
    )
    "#,
];

fn db_err(context: &str, e: sqlx::Error) -> BridgeError {
    BridgeError::Storage(format!("{}: {}", context, e))
}

/// SQLite-backed partitioned response cache
pub struct SqliteCacheStorage {
    pool: SqlitePool,
}

impl SqliteCacheStorage {
    /// Open (or create) a cache database at the given path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| db_err("Failed to open cache database", e))?;

        Self::initialize(&pool).await?;
        debug!(path = ?db_path, "Initialized cache storage");

        Ok(Self { pool })
    }

    /// Create an in-memory cache storage (for testing)
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| db_err("Invalid in-memory URL", e))?;

        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| db_err("Failed to open in-memory cache", e))?;

        Self::initialize(&pool).await?;
        Ok(Self { pool })
    }

    async fn initialize(pool: &SqlitePool) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| db_err("Failed to create cache tables", e))?;
        }
        Ok(())
    }

    async fn ensure_partition(tx: &mut Transaction<'_, Sqlite>, partition: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO cache_partitions (name, created_at) VALUES (?, ?)")
            .bind(partition)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to create partition", e))?;
        Ok(())
    }

    async fn upsert_entry(
        tx: &mut Transaction<'_, Sqlite>,
        partition: &str,
        key: &CacheKey,
        response: &HttpResponse,
    ) -> Result<()> {
        let headers = serde_json::to_string(&response.headers).map_err(|e| {
            BridgeError::Storage(format!("Failed to encode headers: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO cache_entries (partition, method, url, status, headers, body, stored_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(partition, method, url) DO UPDATE SET
                status = excluded.status,
                headers = excluded.headers,
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(partition)
        .bind(key.method.as_str())
        .bind(&key.url)
        .bind(i64::from(response.status))
        .bind(headers)
        .bind(response.body.as_ref())
        .bind(Utc::now().timestamp_millis())
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to store cache entry", e))?;

        Ok(())
    }
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn partition_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM cache_partitions ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_err("Failed to list partitions", e))?;

        Ok(rows.iter().map(|row| row.get::<String, _>(0)).collect())
    }

    async fn lookup(&self, partition: &str, key: &CacheKey) -> Result<Option<HttpResponse>> {
        let row = sqlx::query(
            "SELECT status, headers, body FROM cache_entries \
             WHERE partition = ? AND method = ? AND url = ?",
        )
        .bind(partition)
        .bind(key.method.as_str())
        .bind(&key.url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to read cache entry", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: i64 = row.get(0);
        let headers: String = row.get(1);
        let body: Vec<u8> = row.get(2);

        let headers: HashMap<String, String> = serde_json::from_str(&headers).map_err(|e| {
            BridgeError::Storage(format!("Corrupt headers for {}: {}", key, e))
        })?;

        Ok(Some(HttpResponse {
            status: u16::try_from(status)
                .map_err(|_| BridgeError::Storage(format!("Corrupt status for {}", key)))?,
            headers,
            body: Bytes::from(body),
        }))
    }

    async fn put(&self, partition: &str, key: CacheKey, response: HttpResponse) -> Result<()> {
        self.put_all(partition, vec![(key, response)]).await
    }

    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(CacheKey, HttpResponse)>,
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        Self::ensure_partition(&mut tx, partition).await?;
        for (key, response) in &entries {
            Self::upsert_entry(&mut tx, partition, key, response).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit cache write", e))?;

        debug!(partition, count = entries.len(), "Stored cache entries");
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        sqlx::query("DELETE FROM cache_entries WHERE partition = ?")
            .bind(partition)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to delete partition entries", e))?;

        let removed = sqlx::query("DELETE FROM cache_partitions WHERE name = ?")
            .bind(partition)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to delete partition", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit partition delete", e))?;

        debug!(partition, existed = removed > 0, "Deleted partition");
        Ok(removed > 0)
    }

    async fn keys(&self, partition: &str) -> Result<Vec<CacheKey>> {
        let rows = sqlx::query(
            "SELECT method, url FROM cache_entries WHERE partition = ? ORDER BY url, method",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list cache keys", e))?;

        rows.iter()
            .map(|row| {
                let method: String = row.get(0);
                let url: String = row.get(1);
                Ok(CacheKey::new(HttpMethod::from_str(&method)?, url))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> HttpResponse {
        HttpResponse::new(200, body).with_header("content-type", "text/html")
    }

    #[tokio::test]
    async fn test_put_and_lookup_roundtrip() {
        let storage = SqliteCacheStorage::in_memory().await.unwrap();
        let key = CacheKey::get("https://quran.app/index.html");

        storage
            .put("static", key.clone(), response("<html>"))
            .await
            .unwrap();

        let cached = storage.lookup("static", &key).await.unwrap().unwrap();
        assert_eq!(cached.status, 200);
        assert_eq!(cached.body, Bytes::from("<html>"));
        assert_eq!(
            cached.headers.get("content-type"),
            Some(&"text/html".to_string())
        );

        assert!(storage.lookup("api", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let storage = SqliteCacheStorage::in_memory().await.unwrap();
        let key = CacheKey::get("https://api.quran.com/v4/chapters");

        storage.put("api", key.clone(), response("old")).await.unwrap();
        storage.put("api", key.clone(), response("new")).await.unwrap();

        let cached = storage.lookup("api", &key).await.unwrap().unwrap();
        assert_eq!(cached.body, Bytes::from("new"));
        assert_eq!(storage.keys("api").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partitions_are_created_lazily_and_deleted_whole() {
        let storage = SqliteCacheStorage::in_memory().await.unwrap();
        assert!(storage.partition_names().await.unwrap().is_empty());

        storage
            .put_all(
                "v0-static",
                vec![
                    (CacheKey::get("https://quran.app/"), response("root")),
                    (CacheKey::get("https://quran.app/manifest.json"), response("{}")),
                ],
            )
            .await
            .unwrap();
        storage
            .put("static", CacheKey::get("https://quran.app/"), response("root"))
            .await
            .unwrap();

        assert_eq!(
            storage.partition_names().await.unwrap(),
            vec!["static".to_string(), "v0-static".to_string()]
        );

        assert!(storage.delete_partition("v0-static").await.unwrap());
        assert!(!storage.delete_partition("v0-static").await.unwrap());
        assert!(storage.keys("v0-static").await.unwrap().is_empty());
        assert_eq!(storage.keys("static").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_backed_storage_persists() {
        let dir = std::env::temp_dir().join(format!("tilawa-cache-{}", uuid::Uuid::new_v4()));
        let path = dir.join("cache.db");
        let key = CacheKey::get("https://quran.app/index.html");

        {
            let storage = SqliteCacheStorage::new(path.clone()).await.unwrap();
            storage.put("static", key.clone(), response("shell")).await.unwrap();
        }

        let reopened = SqliteCacheStorage::new(path).await.unwrap();
        assert!(reopened.lookup("static", &key).await.unwrap().is_some());

        let _ = std::fs::remove_dir_all(dir);
    }
}
