use std::sync::Arc;

use common::time::Clock;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, ItemCache};
use crate::expander::CategoryExpander;
use crate::model::{CategorySet, ItemSet};
use crate::source::Catalog;

/// Resolves a category selection to the items it contains.
///
/// The selection is expanded over the hierarchy first, and the expanded set
/// is the cache key, so two selections with the same closure share an entry.
pub struct ItemResolver {
    expander: CategoryExpander,
    catalog: Arc<dyn Catalog>,
    cache: ItemCache,
    clock: Arc<dyn Clock>,
}

impl ItemResolver {
    pub fn new(
        expander: CategoryExpander,
        catalog: Arc<dyn Catalog>,
        cache: ItemCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            expander,
            catalog,
            cache,
            clock,
        }
    }

    pub fn cache(&self) -> &ItemCache {
        &self.cache
    }

    /// Items belonging to `categories` or any of their descendants.
    ///
    /// A catalog failure is logged and yields an empty set; nothing is
    /// cached in that case so the next call retries the query.
    #[instrument(skip(self, categories), target = "catalog", fields(selected = categories.len()))]
    pub async fn resolve(&self, categories: &CategorySet) -> ItemSet {
        if categories.is_empty() {
            return ItemSet::new();
        }

        let expanded = self.expander.expand(categories).await;
        let key = CacheKey::from_categories(&expanded);

        if let Some(items) = self.cache.get(&key, self.clock.now()) {
            debug!(items = items.len(), "item cache hit");
            return items;
        }

        let items = match self.catalog.items_in(&expanded, true).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "catalog item query failed; resolving to no items");
                return ItemSet::new();
            }
        };

        info!(
            categories = expanded.len(),
            items = items.len(),
            "item set resolved from catalog"
        );

        self.cache.put(key, items.clone(), self.clock.now());
        items
    }
}
