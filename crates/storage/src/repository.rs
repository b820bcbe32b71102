//! Cooldown repositories

use crate::StorageError;
use alerting::{CooldownError, CooldownKey, CooldownStore, InMemoryCooldownStore};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cooldowns (
    subject_id TEXT NOT NULL,
    hazard TEXT NOT NULL,
    last_fired_ms INTEGER NOT NULL,
    PRIMARY KEY (subject_id, hazard)
)";

/// Cooldown store backed by SQLite
///
/// The check-and-set is a single conditional upsert, so it stays atomic
/// across connections and processes sharing the database.
#[derive(Clone)]
pub struct SqliteCooldownStore {
    pool: SqlitePool,
}

impl SqliteCooldownStore {
    /// Connect and create the schema if needed
    ///
    /// In-memory databases are private to their connection, so their pool
    /// is limited to one connection whatever `max_connections` says.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let max_connections = if is_in_memory(url) { 1 } else { max_connections.max(1) };
        info!(
            "Opening SQLite cooldown store at {} ({} connections)",
            url, max_connections
        );
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    async fn fetch(&self, key: &CooldownKey) -> Result<Option<DateTime<Utc>>, StorageError> {
        let millis: Option<i64> = sqlx::query_scalar(
            "SELECT last_fired_ms FROM cooldowns WHERE subject_id = ? AND hazard = ?",
        )
        .bind(key.subject.as_str())
        .bind(key.hazard.as_str())
        .fetch_optional(&self.pool)
        .await?;

        millis
            .map(|ms| {
                DateTime::from_timestamp_millis(ms)
                    .ok_or_else(|| StorageError::CorruptRecord(format!("timestamp {}", ms)))
            })
            .transpose()
    }

    async fn store(&self, key: &CooldownKey, at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO cooldowns (subject_id, hazard, last_fired_ms) VALUES (?, ?, ?)
             ON CONFLICT(subject_id, hazard)
             DO UPDATE SET last_fired_ms = MAX(cooldowns.last_fired_ms, excluded.last_fired_ms)",
        )
        .bind(key.subject.as_str())
        .bind(key.hazard.as_str())
        .bind(at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fire(&self, key: &CooldownKey, now: DateTime<Utc>, window: Duration) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "INSERT INTO cooldowns (subject_id, hazard, last_fired_ms) VALUES (?, ?, ?)
             ON CONFLICT(subject_id, hazard)
             DO UPDATE SET last_fired_ms = excluded.last_fired_ms
             WHERE excluded.last_fired_ms - cooldowns.last_fired_ms >= ?",
        )
        .bind(key.subject.as_str())
        .bind(key.hazard.as_str())
        .bind(now.timestamp_millis())
        .bind(window.num_milliseconds().max(0))
        .execute(&self.pool)
        .await?;

        let fired = result.rows_affected() == 1;
        if !fired {
            debug!("{}/{} in cooldown", key.subject, key.hazard);
        }
        Ok(fired)
    }

    async fn purge(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM cooldowns WHERE last_fired_ms < ?")
            .bind(cutoff.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}

impl CooldownStore for SqliteCooldownStore {
    async fn get(&self, key: &CooldownKey) -> Result<Option<DateTime<Utc>>, CooldownError> {
        Ok(self.fetch(key).await?)
    }

    async fn set(&self, key: &CooldownKey, at: DateTime<Utc>) -> Result<(), CooldownError> {
        Ok(self.store(key, at).await?)
    }

    async fn try_fire(
        &self,
        key: &CooldownKey,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, CooldownError> {
        Ok(self.fire(key, now, window).await?)
    }

    async fn purge_inactive(&self, cutoff: DateTime<Utc>) -> Result<usize, CooldownError> {
        Ok(self.purge(cutoff).await?)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Cooldown store selected at startup
pub enum AnyCooldownStore {
    Memory(InMemoryCooldownStore),
    Sqlite(SqliteCooldownStore),
}

impl AnyCooldownStore {
    /// Open a store from a URL: `memory`, or an `sqlite:` URL
    pub async fn open(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        if url == "memory" {
            info!("Using in-memory cooldown store");
            Ok(AnyCooldownStore::Memory(InMemoryCooldownStore::new()))
        } else if url.starts_with("sqlite:") {
            Ok(AnyCooldownStore::Sqlite(
                SqliteCooldownStore::connect(url, max_connections).await?,
            ))
        } else {
            Err(StorageError::UnsupportedBackend(url.to_string()))
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyCooldownStore::Memory(_) => "memory",
            AnyCooldownStore::Sqlite(_) => "sqlite",
        }
    }
}

impl CooldownStore for AnyCooldownStore {
    async fn get(&self, key: &CooldownKey) -> Result<Option<DateTime<Utc>>, CooldownError> {
        match self {
            AnyCooldownStore::Memory(store) => store.get(key).await,
            AnyCooldownStore::Sqlite(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &CooldownKey, at: DateTime<Utc>) -> Result<(), CooldownError> {
        match self {
            AnyCooldownStore::Memory(store) => store.set(key, at).await,
            AnyCooldownStore::Sqlite(store) => store.set(key, at).await,
        }
    }

    async fn try_fire(
        &self,
        key: &CooldownKey,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, CooldownError> {
        match self {
            AnyCooldownStore::Memory(store) => store.try_fire(key, now, window).await,
            AnyCooldownStore::Sqlite(store) => store.try_fire(key, now, window).await,
        }
    }

    async fn purge_inactive(&self, cutoff: DateTime<Utc>) -> Result<usize, CooldownError> {
        match self {
            AnyCooldownStore::Memory(store) => store.purge_inactive(cutoff).await,
            AnyCooldownStore::Sqlite(store) => store.purge_inactive(cutoff).await,
        }
    }
}
