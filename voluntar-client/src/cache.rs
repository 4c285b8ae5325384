//! Response cache
//!
//! A flat key/value map with a fixed time-to-live. Expired entries are
//! dropped when read. Every invalidation bumps a generation counter so a
//! fetch that started before the invalidation cannot store stale data.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Entries live this long
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: HashMap<String, (Value, Instant)>,
    generation: u64,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            generation: 0,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<Value> {
        let (value, stored_at) = self.entries.get(key)?;

        if now.saturating_duration_since(*stored_at) >= self.ttl {
            tracing::debug!("Cache entry expired: {}", key);
            self.entries.remove(key);
            return None;
        }

        Some(value.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), (value, Instant::now()));
    }

    /// Current generation; changes on every `invalidate` and `clear`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store `value` only if nothing was invalidated since `generation`
    /// was read. Returns whether the value was stored.
    pub fn set_if_current(&mut self, key: impl Into<String>, value: Value, generation: u64) -> bool {
        if generation != self.generation {
            tracing::debug!("Dropping cache write made stale by an invalidation");
            return false;
        }

        self.set(key, value);
        true
    }

    /// Removes every key containing `pattern`; returns how many were removed
    pub fn invalidate(&mut self, pattern: &str) -> usize {
        self.generation = self.generation.wrapping_add(1);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        let removed = before - self.entries.len();

        if removed > 0 {
            tracing::debug!("Invalidated {} cache entr(ies) matching '{}'", removed, pattern);
        }

        removed
    }

    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
