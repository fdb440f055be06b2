//! # Offline Store
//!
//! Explicit, user-initiated persistence for scripture text and recitations.
//!
//! ## Overview
//!
//! Three collections live in one SQLite database:
//!
//! - `surahs`: whole surahs keyed by number
//! - `audio`: recitation blobs keyed by `"{surah}-{ayah}-{reciter}"`
//! - `metadata`: free-form key/value bookkeeping
//!
//! Each operation runs in its own transaction on a single collection. Saving
//! a surah and saving its audio are independent commits.
//!
//! ## Failure Policy
//!
//! Explicit saves and deletes propagate storage errors. Advisory paths
//! (`save_audio` fetches, `get_audio`, `estimate_usage`) never fail; they log
//! and degrade to nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let store = OfflineStore::open(OfflineStoreConfig::from_core(&config), http).await?;
//! store.save_surah(surah).await?;
//! let numbers = store.saved_surah_numbers().await?;
//! store.close().await;
//! ```

use std::sync::Arc;

use bridge_traits::{
    Clock, HttpClient, HttpRequest, StorageEstimate, StorageEstimator, SystemClock,
};
use chrono::{DateTime, Utc};
use core_runtime::events::{CoreEvent, EventBus, OfflineEvent};
use sqlx::{Pool, Sqlite, Transaction};
use tracing::{debug, info, instrument, warn};

use crate::config::OfflineStoreConfig;
use crate::db;
use crate::error::{OfflineError, Result};
use crate::models::{playback_stem, AudioHandle, AudioKey, SavedSurah, Surah};

const AUDIO_FILE_EXTENSION: &str = "mp3";

pub struct OfflineStore {
    pool: Pool<Sqlite>,
    config: OfflineStoreConfig,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    estimator: Option<Arc<dyn StorageEstimator>>,
    event_bus: Option<EventBus>,
}

impl OfflineStore {
    /// Open the database, upgrading its schema if needed.
    pub async fn open(config: OfflineStoreConfig, http: Arc<dyn HttpClient>) -> Result<Self> {
        Self::open_with_clock(config, http, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        config: OfflineStoreConfig,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let pool = db::create_pool(&config, clock.unix_timestamp_millis()).await?;

        Ok(Self {
            pool,
            config,
            http,
            clock,
            estimator: None,
            event_bus: None,
        })
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn StorageEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &OfflineStoreConfig {
        &self.config
    }

    /// Release every pooled connection. Later operations fail.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Offline store closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    // ========================================================================
    // Surahs
    // ========================================================================

    #[instrument(skip(self, surah), fields(number = surah.number))]
    pub async fn save_surah(&self, surah: Surah) -> Result<SavedSurah> {
        surah.validate()?;

        let saved = SavedSurah {
            surah,
            saved_at: self.clock.now(),
        };
        let payload = serde_json::to_string(&saved)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO surahs (number, payload, saved_at) VALUES (?, ?, ?)
             ON CONFLICT(number) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at",
        )
        .bind(saved.surah.number as i64)
        .bind(payload)
        .bind(saved.saved_at.timestamp_millis())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("Surah saved for offline reading");
        self.emit(OfflineEvent::SurahSaved {
            number: saved.surah.number,
        });
        Ok(saved)
    }

    /// A surah that was never saved is `None`, not an error.
    pub async fn get_surah(&self, number: u16) -> Result<Option<SavedSurah>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM surahs WHERE number = ?")
            .bind(number as i64)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(payload,)| serde_json::from_str(&payload).map_err(OfflineError::from))
            .transpose()
    }

    /// Numbers of every saved surah, ascending.
    pub async fn saved_surah_numbers(&self) -> Result<Vec<u16>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT number FROM surahs ORDER BY number")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(number,)| number as u16).collect())
    }

    /// Idempotent: deleting an unsaved surah succeeds.
    #[instrument(skip(self))]
    pub async fn delete_surah(&self, number: u16) -> Result<()> {
        let result = sqlx::query("DELETE FROM surahs WHERE number = ?")
            .bind(number as i64)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Offline surah removed");
            self.emit(OfflineEvent::SurahDeleted { number });
        }
        Ok(())
    }

    // ========================================================================
    // Audio
    // ========================================================================

    /// Download and keep a recitation. Returns whether a record was written.
    ///
    /// A failed or non-2xx fetch is not an error: nothing is stored and
    /// `false` is returned. Storage failures still propagate.
    #[instrument(skip(self, source_url), fields(url = %core_runtime::logging::redact_url_query(source_url)))]
    pub async fn save_audio(
        &self,
        surah: u16,
        ayah: u16,
        reciter: &str,
        source_url: &str,
    ) -> Result<bool> {
        let key = AudioKey::new(surah, ayah, reciter);

        let response = match self.http.execute(HttpRequest::get(source_url)).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                let reason = format!("HTTP {}", response.status);
                self.skip_audio(&key, reason);
                return Ok(false);
            }
            Err(error) => {
                self.skip_audio(&key, error.to_string());
                return Ok(false);
            }
        };

        let size = response.body.len() as i64;
        let saved_at = self.clock.unix_timestamp_millis();
        let key_str = key.to_string();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO audio (key, surah, ayah, reciter, data, size, saved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                data = excluded.data, size = excluded.size, saved_at = excluded.saved_at",
        )
        .bind(&key_str)
        .bind(surah as i64)
        .bind(ayah as i64)
        .bind(reciter)
        .bind(response.body.as_ref())
        .bind(size)
        .bind(saved_at)
        .execute(&mut *tx)
        .await?;

        let evicted = match self.config.max_audio_bytes {
            Some(budget) => evict_oldest(&mut tx, budget, &key_str).await?,
            None => Vec::new(),
        };
        tx.commit().await?;

        info!(key = %key_str, size_bytes = size, "Recitation saved");
        self.emit(OfflineEvent::AudioSaved {
            key: key_str,
            size_bytes: size as u64,
        });

        for (evicted_key, evicted_size) in evicted {
            debug!(key = %evicted_key, size_bytes = evicted_size, "Evicted recitation");
            self.remove_playback_file(&evicted_key).await;
            self.emit(OfflineEvent::AudioEvicted {
                key: evicted_key,
                size_bytes: evicted_size,
            });
        }

        Ok(true)
    }

    /// Materialize a saved recitation as a playable file.
    ///
    /// Missing records and any storage or filesystem error yield `None`.
    pub async fn get_audio(&self, surah: u16, ayah: u16, reciter: &str) -> Option<AudioHandle> {
        let key = AudioKey::new(surah, ayah, reciter);

        match self.load_audio(&key).await {
            Ok(handle) => handle,
            Err(error) => {
                warn!(key = %key, error = %error, "Offline audio lookup failed");
                None
            }
        }
    }

    async fn load_audio(&self, key: &AudioKey) -> Result<Option<AudioHandle>> {
        let row: Option<(Vec<u8>, i64)> =
            sqlx::query_as("SELECT data, saved_at FROM audio WHERE key = ?")
                .bind(key.to_string())
                .fetch_optional(&self.pool)
                .await?;

        let Some((data, saved_at)) = row else {
            debug!(key = %key, "No offline audio");
            return Ok(None);
        };

        tokio::fs::create_dir_all(&self.config.playback_dir).await?;
        let path = self.playback_path(&key.file_stem());
        tokio::fs::write(&path, &data).await?;

        Ok(Some(AudioHandle {
            key: key.clone(),
            path,
            size_bytes: data.len() as u64,
            saved_at: from_millis(saved_at),
        }))
    }

    /// Returns whether a record was removed.
    pub async fn delete_audio(&self, key: &AudioKey) -> Result<bool> {
        let result = sqlx::query("DELETE FROM audio WHERE key = ?")
            .bind(key.to_string())
            .execute(&self.pool)
            .await?;

        self.remove_playback_file(&key.to_string()).await;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every saved recitation. Returns how many were removed.
    pub async fn clear_audio(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let keys: Vec<(String,)> = sqlx::query_as("SELECT key FROM audio")
            .fetch_all(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM audio").execute(&mut *tx).await?;
        tx.commit().await?;

        for (key,) in keys {
            self.remove_playback_file(&key).await;
        }
        info!(removed = result.rows_affected(), "Cleared offline audio");
        Ok(result.rows_affected())
    }

    /// Total bytes of stored recitations.
    pub async fn audio_usage_bytes(&self) -> Result<u64> {
        let (total,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(size), 0) FROM audio")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub async fn put_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO metadata (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    // ========================================================================
    // Usage
    // ========================================================================

    /// Usage and quota from the configured estimator; `0/0` when there is
    /// none or it fails.
    pub async fn estimate_usage(&self) -> StorageEstimate {
        let Some(estimator) = &self.estimator else {
            return StorageEstimate::unknown();
        };

        match estimator.estimate().await {
            Ok(estimate) => estimate,
            Err(error) => {
                warn!(error = %error, "Storage estimate unavailable");
                StorageEstimate::unknown()
            }
        }
    }

    fn skip_audio(&self, key: &AudioKey, reason: String) {
        warn!(key = %key, reason = %reason, "Recitation not saved");
        self.emit(OfflineEvent::AudioSkipped {
            key: key.to_string(),
            reason,
        });
    }

    async fn remove_playback_file(&self, key: &str) {
        let path = self.playback_path(&playback_stem(key));

        if let Err(error) = tokio::fs::remove_file(&path).await {
            if error.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %error, "Could not remove playback file");
            }
        }
    }

    fn playback_path(&self, stem: &str) -> std::path::PathBuf {
        self.config
            .playback_dir
            .join(format!("{}.{}", stem, AUDIO_FILE_EXTENSION))
    }

    fn emit(&self, event: OfflineEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Offline(event));
        }
    }
}

/// Delete the oldest recitations until the total fits `budget`. The record
/// named `keep` is never removed, even when it alone exceeds the budget.
async fn evict_oldest(
    tx: &mut Transaction<'_, Sqlite>,
    budget: u64,
    keep: &str,
) -> Result<Vec<(String, u64)>> {
    let (mut total,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(size), 0) FROM audio")
        .fetch_one(&mut **tx)
        .await?;

    let mut evicted = Vec::new();
    while total as u64 > budget {
        let oldest: Option<(String, i64)> = sqlx::query_as(
            "SELECT key, size FROM audio WHERE key != ? ORDER BY saved_at ASC, rowid ASC LIMIT 1",
        )
        .bind(keep)
        .fetch_optional(&mut **tx)
        .await?;

        let Some((key, size)) = oldest else {
            break;
        };

        sqlx::query("DELETE FROM audio WHERE key = ?")
            .bind(&key)
            .execute(&mut **tx)
            .await?;

        total -= size;
        evicted.push((key, size.max(0) as u64));
    }

    Ok(evicted)
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
