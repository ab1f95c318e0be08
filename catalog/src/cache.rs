use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::model::{CategoryId, CategorySet, ItemSet};

/// Default lifetime of a resolved item set.
pub const DEFAULT_ITEM_TTL: TimeDelta = TimeDelta::hours(1);

/// Order-independent key derived from an (expanded) category set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<CategoryId>);

impl CacheKey {
    pub fn from_categories(categories: &CategorySet) -> Self {
        // BTreeSet iteration is sorted, so equal sets give equal keys.
        Self(categories.iter().copied().collect())
    }
}

#[derive(Clone, Debug)]
struct Entry {
    items: ItemSet,
    expires_at: DateTime<Utc>,
}

/// Time-bounded cache of resolved item sets.
///
/// Guarantees:
/// - An entry is served only while `now < expires_at`.
/// - Staleness is purely time based; catalog writes never invalidate entries.
/// - Concurrent misses may both refetch; the last write wins.
pub struct ItemCache {
    ttl: TimeDelta,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ItemCache {
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached items for `key` if the entry is still fresh.
    /// Stale entries are dropped on access.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<ItemSet> {
        let mut entries = self.entries.lock();

        let expires_at = entries.get(key)?.expires_at;
        if now < expires_at {
            return entries.get(key).map(|e| e.items.clone());
        }

        entries.remove(key);
        debug!("stale item cache entry dropped");
        None
    }

    /// Stores `items` under `key` and sweeps every other expired entry.
    /// A lifetime running past the end of representable time is clamped.
    #[instrument(skip(self, key, items), target = "catalog", fields(items = items.len()))]
    pub fn put(&self, key: CacheKey, items: ItemSet, now: DateTime<Utc>) {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        let swept = before - entries.len();

        entries.insert(key, Entry { items, expires_at });
        debug!(%expires_at, swept, "item cache entry stored");
    }
}

impl Default for ItemCache {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_TTL)
    }
}
