use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    domain::{GroupInfo, MessagingId},
    group_cache::GroupDirectoryCache,
    messaging::port::MessagingClient,
    Result,
};

/// Upper bound on names returned by [`GroupResolver::suggest`].
pub const DEFAULT_SUGGESTION_LIMIT: usize = 20;

/// Lookup key for a group name: trimmed and lowercased.
pub fn normalize_group_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Pick a group for `name` using three strictly ordered tiers:
/// byte-exact name, then case-insensitive equality, then substring containment.
///
/// Each tier takes the first hit in enumeration order and a later tier is only
/// consulted when every earlier one came up empty.
pub fn pick_group<'a>(groups: &'a [GroupInfo], name: &str) -> Option<&'a GroupInfo> {
    let key = normalize_group_name(name);
    if key.is_empty() {
        return None;
    }

    groups
        .iter()
        .find(|g| g.name == name)
        .or_else(|| groups.iter().find(|g| g.name.to_lowercase() == key))
        .or_else(|| groups.iter().find(|g| g.name.to_lowercase().contains(&key)))
}

/// Resolves human group names to messaging ids, memoized in a TTL cache.
///
/// Concurrent requests for the same cold name may both enumerate; the last
/// writer wins.
pub struct GroupResolver {
    client: Arc<dyn MessagingClient>,
    cache: Mutex<GroupDirectoryCache>,
    suggestion_limit: usize,
}

impl GroupResolver {
    pub fn new(client: Arc<dyn MessagingClient>, cache: GroupDirectoryCache) -> Self {
        Self {
            client,
            cache: Mutex::new(cache),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// `Ok(None)` means no group matched; enumeration failures are errors.
    pub async fn resolve(&self, name: &str) -> Result<Option<MessagingId>> {
        let key = normalize_group_name(name);
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(id) = self.cache.lock().await.get(&key) {
            tracing::debug!(group = %key, id = %id, "group cache hit");
            return Ok(Some(id));
        }

        let groups = self.client.enumerate_groups().await?;
        tracing::debug!(group = %key, enumerated = groups.len(), "group cache miss");

        let Some(target) = pick_group(&groups, name) else {
            return Ok(None);
        };

        let id = target.id.clone();
        self.cache.lock().await.insert(&key, id.clone());
        tracing::info!(group = %key, name = %target.name, id = %id, "resolved group");
        Ok(Some(id))
    }

    /// Up to the suggestion limit of group names containing `partial`
    /// (case-insensitive), in enumeration order. Empty `partial` lists all groups.
    pub async fn suggest(&self, partial: &str) -> Result<Vec<String>> {
        let key = normalize_group_name(partial);
        let groups = self.client.enumerate_groups().await?;

        Ok(groups
            .into_iter()
            .filter(|g| key.is_empty() || g.name.to_lowercase().contains(&key))
            .take(self.suggestion_limit)
            .map(|g| g.name)
            .collect())
    }
}
