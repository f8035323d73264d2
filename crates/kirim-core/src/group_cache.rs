use std::{collections::HashMap, time::Duration};

use tokio::time::Instant;

use crate::domain::MessagingId;

/// How long a resolved group name stays valid.
pub const DEFAULT_GROUP_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// One memoized name → group id resolution.
#[derive(Clone, Debug)]
pub struct GroupCacheEntry {
    pub normalized_key: String,
    pub group_id: MessagingId,
    pub resolved_at: Instant,
}

/// Whether `entry` is still inside its validity window at `now`.
pub fn is_fresh(entry: &GroupCacheEntry, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(entry.resolved_at) < ttl
}

/// TTL map from normalized group name to resolved group id.
///
/// Expiry is lazy: a stale entry is reported as a miss and stays in place until
/// the next successful resolution overwrites it. Nothing is ever evicted.
#[derive(Clone, Debug)]
pub struct GroupDirectoryCache {
    ttl: Duration,
    entries: HashMap<String, GroupCacheEntry>,
}

impl Default for GroupDirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_CACHE_TTL)
    }
}

impl GroupDirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<MessagingId> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<MessagingId> {
        self.entries
            .get(key)
            .filter(|e| is_fresh(e, now, self.ttl))
            .map(|e| e.group_id.clone())
    }

    pub fn insert(&mut self, key: &str, group_id: MessagingId) {
        self.insert_at(key, group_id, Instant::now());
    }

    /// Writes always win, fresh entry or not.
    pub fn insert_at(&mut self, key: &str, group_id: MessagingId, now: Instant) {
        self.entries.insert(
            key.to_string(),
            GroupCacheEntry {
                normalized_key: key.to_string(),
                group_id,
                resolved_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
