//! Cooldown state per (subject, hazard)

use crate::CooldownError;
use chrono::{DateTime, Duration, Utc};
use field_model::{HazardType, SubjectId};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use tracing::debug;

const SHARD_COUNT: usize = 16;

/// Cooldown entry key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub subject: SubjectId,
    pub hazard: HazardType,
}

impl CooldownKey {
    pub fn new(subject: SubjectId, hazard: HazardType) -> Self {
        Self { subject, hazard }
    }
}

/// Lifecycle of one (subject, hazard) pair, derived from its last-fired time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownPhase {
    /// Never fired, or the window has elapsed
    Idle,
    /// Fired at this instant
    Alerting,
    /// Fired within the window; new triggers are suppressed
    Cooling,
}

impl CooldownPhase {
    pub fn at(last_fired: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) -> Self {
        match last_fired {
            Some(last) if last == now => CooldownPhase::Alerting,
            Some(last) if now - last < window => CooldownPhase::Cooling,
            _ => CooldownPhase::Idle,
        }
    }
}

/// Persistent last-fired timestamps
///
/// `try_fire` is the only write on the alerting path and must be atomic per
/// key: concurrent callers for one key may not both observe an expired
/// window. Timestamps only move forward.
pub trait CooldownStore: Send + Sync {
    fn get(
        &self,
        key: &CooldownKey,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, CooldownError>> + Send;

    /// Record a fire; keeps the later of the stored and given timestamps
    fn set(
        &self,
        key: &CooldownKey,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), CooldownError>> + Send;

    /// Fire if the window has elapsed, returning whether it fired
    fn try_fire(
        &self,
        key: &CooldownKey,
        now: DateTime<Utc>,
        window: Duration,
    ) -> impl Future<Output = Result<bool, CooldownError>> + Send;

    /// Drop entries last fired before `cutoff`, returning how many
    fn purge_inactive(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize, CooldownError>> + Send;
}

type Shard = Mutex<HashMap<CooldownKey, DateTime<Utc>>>;

/// In-memory cooldown store, sharded over mutex-guarded maps
pub struct InMemoryCooldownStore {
    shards: Vec<Shard>,
}

impl InMemoryCooldownStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &CooldownKey) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    fn lock(shard: &Shard) -> Result<std::sync::MutexGuard<'_, HashMap<CooldownKey, DateTime<Utc>>>, CooldownError> {
        shard
            .lock()
            .map_err(|e| CooldownError::Lock(format!("cooldown shard poisoned: {}", e)))
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .filter_map(|s| s.lock().ok())
            .map(|s| s.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCooldownStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownStore for InMemoryCooldownStore {
    async fn get(&self, key: &CooldownKey) -> Result<Option<DateTime<Utc>>, CooldownError> {
        let shard = Self::lock(self.shard(key))?;
        Ok(shard.get(key).copied())
    }

    async fn set(&self, key: &CooldownKey, at: DateTime<Utc>) -> Result<(), CooldownError> {
        let mut shard = Self::lock(self.shard(key))?;
        let entry = shard.entry(key.clone()).or_insert(at);
        *entry = (*entry).max(at);
        Ok(())
    }

    async fn try_fire(
        &self,
        key: &CooldownKey,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, CooldownError> {
        let mut shard = Self::lock(self.shard(key))?;
        match shard.get_mut(key) {
            Some(last) if now - *last < window => {
                debug!("{}/{} in cooldown since {}", key.subject, key.hazard, last);
                Ok(false)
            }
            Some(last) => {
                *last = (*last).max(now);
                Ok(true)
            }
            None => {
                shard.insert(key.clone(), now);
                Ok(true)
            }
        }
    }

    async fn purge_inactive(&self, cutoff: DateTime<Utc>) -> Result<usize, CooldownError> {
        let mut removed = 0;
        for shard in &self.shards {
            let mut shard = Self::lock(shard)?;
            let before = shard.len();
            shard.retain(|_, last| *last >= cutoff);
            removed += before - shard.len();
        }
        Ok(removed)
    }
}
