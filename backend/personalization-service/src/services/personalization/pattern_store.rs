// ============================================
// User Pattern Store (用戶模式存儲)
// ============================================
//
// Process-local map of user id → pattern. The map is sharded (DashMap) so
// different users never contend; each pattern sits behind its own mutex
// so record/recommend on the same user are mutually exclusive.
//
// Lifecycle: constructed at service start, shared by reference, drained
// at shutdown.

use crate::models::UserPattern;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

type PatternSlot = Arc<Mutex<UserPattern>>;

#[derive(Default)]
pub struct PatternStore {
    patterns: DashMap<String, PatternSlot>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` on the user's pattern, creating an empty one first if needed
    pub fn with_pattern_mut<R>(&self, user_id: &str, f: impl FnOnce(&mut UserPattern) -> R) -> R {
        let slot = self.slot_or_create(user_id);
        let mut pattern = slot.lock();
        f(&mut pattern)
    }

    /// Runs `f` on the user's pattern, `None` if the user is unknown
    pub fn with_pattern<R>(&self, user_id: &str, f: impl FnOnce(&UserPattern) -> R) -> Option<R> {
        let slot = self.slot(user_id)?;
        let pattern = slot.lock();
        Some(f(&pattern))
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.patterns.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.patterns.iter().map(|e| e.key().clone()).collect()
    }

    /// Installs a caller-supplied pattern for a user the store has not seen.
    ///
    /// Returns false and leaves the store untouched when the user already
    /// has a pattern; live state always wins over restored history.
    pub fn restore(&self, user_id: &str, pattern: UserPattern) -> bool {
        let mut inserted = false;
        self.patterns.entry(user_id.to_string()).or_insert_with(|| {
            inserted = true;
            Arc::new(Mutex::new(pattern))
        });

        if inserted {
            debug!(user_id = %user_id, "Restored user pattern");
        }
        inserted
    }

    /// Removes and returns every pattern. Used at shutdown.
    pub fn drain(&self) -> Vec<(String, UserPattern)> {
        let user_ids = self.user_ids();
        user_ids
            .into_iter()
            .filter_map(|user_id| {
                let (user_id, slot) = self.patterns.remove(&user_id)?;
                let pattern = slot.lock().clone();
                Some((user_id, pattern))
            })
            .collect()
    }

    fn slot(&self, user_id: &str) -> Option<PatternSlot> {
        // clone the Arc so the shard lock is released before locking the pattern
        self.patterns.get(user_id).map(|entry| entry.value().clone())
    }

    fn slot_or_create(&self, user_id: &str) -> PatternSlot {
        if let Some(slot) = self.slot(user_id) {
            return slot;
        }

        self.patterns
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id = %user_id, "Created user pattern");
                Arc::new(Mutex::new(UserPattern::new()))
            })
            .value()
            .clone()
    }
}
