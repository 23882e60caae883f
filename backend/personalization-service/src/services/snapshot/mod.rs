// ============================================
// Pattern Snapshots (模式快照)
// ============================================
//
// The engine keeps patterns in memory only. Snapshots let the caller
// persist them and hand the history back after a restart:
//
// - hydrate unknown users before their first record or recommend
// - write-through after each record, serialized per user
// - flush everything at shutdown
//
// Redis keys:
// - personalization:pattern:{user_id} - JSON-encoded UserPattern

use crate::error::{AppError, Result};
use crate::models::{InteractionEvent, RecordOutcome, UserPattern};
use crate::services::personalization::{PatternStore, PersonalizationEngine};
use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[async_trait]
pub trait PatternSnapshotStore: Send + Sync {
    async fn save(&self, user_id: &str, pattern: &UserPattern) -> Result<()>;

    async fn load(&self, user_id: &str) -> Result<Option<UserPattern>>;
}

const KEY_PREFIX: &str = "personalization:pattern";

pub struct RedisSnapshotStore {
    redis: redis::Client,
    /// Snapshot TTL in seconds (default: 90 days)
    ttl_secs: u64,
}

impl RedisSnapshotStore {
    pub fn new(redis: redis::Client) -> Self {
        Self {
            redis,
            ttl_secs: 90 * 86400,
        }
    }

    pub fn with_ttl_days(mut self, days: u32) -> Self {
        self.ttl_secs = days as u64 * 86400;
        self
    }

    fn pattern_key(&self, user_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, user_id)
    }
}

#[async_trait]
impl PatternSnapshotStore for RedisSnapshotStore {
    async fn save(&self, user_id: &str, pattern: &UserPattern) -> Result<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(pattern)?;

        let _: () = conn
            .set_ex(self.pattern_key(user_id), json, self.ttl_secs)
            .await?;

        debug!(user_id = %user_id, "Saved pattern snapshot");
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Option<UserPattern>> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let json: Option<String> = conn.get(self.pattern_key(user_id)).await?;

        json.map(|data| serde_json::from_str(&data).map_err(AppError::from))
            .transpose()
    }
}

/// Restores a user's snapshot into the store if the user is not live yet.
/// Returns whether a snapshot was installed.
pub async fn hydrate(
    store: &PatternStore,
    source: &dyn PatternSnapshotStore,
    user_id: &str,
) -> Result<bool> {
    if store.contains(user_id) {
        return Ok(false);
    }

    match source.load(user_id).await? {
        Some(pattern) => Ok(store.restore(user_id, pattern)),
        None => Ok(false),
    }
}

/// Write-through front for a snapshot store.
///
/// Holds one async lock per user across hydrate, record and save, so a
/// user's saved history is loaded before it can be overwritten and saves
/// land in the same order as the records that produced them.
pub struct SnapshotWriter {
    sink: Arc<dyn PatternSnapshotStore>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SnapshotWriter {
    pub fn new(sink: Arc<dyn PatternSnapshotStore>) -> Self {
        Self {
            sink,
            user_locks: DashMap::new(),
        }
    }

    pub fn sink(&self) -> &dyn PatternSnapshotStore {
        self.sink.as_ref()
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Loads the user's snapshot if the engine does not know the user yet.
    /// Load failures are logged; the engine then starts from an empty pattern.
    pub async fn ensure_loaded(&self, engine: &PersonalizationEngine, user_id: &str) {
        if engine.knows(user_id) {
            return;
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        match hydrate(engine.store(), self.sink.as_ref(), user_id).await {
            Ok(true) => debug!(user_id = %user_id, "Hydrated pattern snapshot"),
            Ok(false) => {}
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to hydrate pattern snapshot"),
        }
    }

    /// Records an event and saves the resulting pattern.
    ///
    /// A user unknown to the engine is hydrated first; if that load fails the
    /// event is rejected and the engine is left untouched. Save failures are
    /// logged and never change the outcome.
    pub async fn record(
        &self,
        engine: &PersonalizationEngine,
        user_id: &str,
        event: InteractionEvent,
    ) -> Result<RecordOutcome> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        if !engine.knows(user_id) && hydrate(engine.store(), self.sink.as_ref(), user_id).await? {
            debug!(user_id = %user_id, "Hydrated pattern snapshot");
        }

        let (outcome, pattern) = engine.record_and_snapshot(user_id, event);
        if let Err(e) = self.sink.save(user_id, &pattern).await {
            warn!(user_id = %user_id, error = %e, "Failed to persist pattern snapshot");
        }

        Ok(outcome)
    }
}

/// Drains the store into the sink. Failed saves are logged and skipped;
/// returns the number of patterns saved.
pub async fn flush(store: &PatternStore, sink: &dyn PatternSnapshotStore) -> usize {
    let patterns = store.drain();
    let total = patterns.len();
    let mut saved = 0;

    for (user_id, pattern) in patterns {
        match sink.save(&user_id, &pattern).await {
            Ok(()) => saved += 1,
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to flush pattern snapshot"),
        }
    }

    info!(saved, total, "Flushed pattern snapshots");
    saved
}
