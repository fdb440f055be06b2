//! # Offline Database
//!
//! Opens the SQLite pool backing the offline store and brings its schema up
//! to date.
//!
//! ## Schema Versions
//!
//! The schema version lives in `PRAGMA user_version`. Each entry in
//! [`MIGRATIONS`] upgrades the database by one version inside a single
//! transaction, so re-opening an up-to-date database is a no-op.
//!
//! | Version | Collections |
//! |---------|-------------|
//! | 1 | `surahs`, `audio`, `metadata` |

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info, warn};

use crate::config::OfflineStoreConfig;
use crate::error::{OfflineError, Result};

/// Metadata key recording when the schema was last upgraded.
pub const SCHEMA_MIGRATED_AT_KEY: &str = "schema_migrated_at";

const V1: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS surahs (
        number INTEGER PRIMARY KEY,
        payload TEXT NOT NULL,
        saved_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_surahs_saved_at ON surahs(saved_at)",
    r#"
    CREATE TABLE IF NOT EXISTS audio (
        key TEXT PRIMARY KEY,
        surah INTEGER NOT NULL,
        ayah INTEGER NOT NULL,
        reciter TEXT NOT NULL,
        data BLOB NOT NULL,
        size INTEGER NOT NULL,
        saved_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audio_saved_at ON audio(saved_at)",
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

const MIGRATIONS: &[&[&str]] = &[V1];

/// Current schema version.
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

pub async fn create_pool(config: &OfflineStoreConfig, now_millis: i64) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Opening offline store"
    );

    let mut options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .synchronous(SqliteSynchronous::Normal);

    if !config.is_in_memory() {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open offline store");
            OfflineError::Database(e)
        })?;

    run_migrations(&pool, now_millis).await?;

    Ok(pool)
}

pub async fn schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn run_migrations(pool: &Pool<Sqlite>, now_millis: i64) -> Result<()> {
    let current = schema_version(pool).await?;
    if current >= SCHEMA_VERSION {
        debug!(version = current, "Offline schema up to date");
        return Ok(());
    }

    for (index, statements) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let target = index as i64 + 1;
        info!(from = target - 1, to = target, "Upgrading offline schema");

        let mut tx = pool.begin().await?;
        for statement in statements.iter() {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| OfflineError::Migration(format!("version {}: {}", target, e)))?;
        }

        // PRAGMA does not accept bound parameters.
        sqlx::query(&format!("PRAGMA user_version = {}", target))
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO metadata (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(SCHEMA_MIGRATED_AT_KEY)
        .bind(now_millis.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let config = OfflineStoreConfig::in_memory(std::env::temp_dir());
        let pool = create_pool(&config, 1_000).await.unwrap();
        assert_eq!(schema_version(&pool).await.unwrap(), SCHEMA_VERSION);

        run_migrations(&pool, 2_000).await.unwrap();

        let (migrated_at,): (String,) =
            sqlx::query_as("SELECT value FROM metadata WHERE key = ?")
                .bind(SCHEMA_MIGRATED_AT_KEY)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(migrated_at, "1000");
    }

    #[tokio::test]
    async fn test_collections_exist() {
        let config = OfflineStoreConfig::in_memory(std::env::temp_dir());
        let pool = create_pool(&config, 0).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|(name,)| name).collect();
        assert_eq!(names, vec!["audio", "metadata", "surahs"]);
    }
}
