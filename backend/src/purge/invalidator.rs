use std::sync::Arc;

use catalog::{Catalog, CategoryExpander, CategorySet, CategoryTree, ItemSet, join_ids};
use tracing::{info, instrument, warn};

use crate::logger::ActivityLog;
use crate::purge::transport::PurgeTransport;

/// Counts from one purge pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub purged: usize,
    pub skipped: usize,
}

/// Turns item and category sets into purge requests.
///
/// URL lookups that fail are logged and skipped; one bad entry never stops
/// the rest of the pass.
pub struct CacheInvalidator {
    catalog: Arc<dyn Catalog>,
    tree: Arc<dyn CategoryTree>,
    expander: CategoryExpander,
    transport: Arc<dyn PurgeTransport>,
    log: ActivityLog,
}

impl CacheInvalidator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        tree: Arc<dyn CategoryTree>,
        transport: Arc<dyn PurgeTransport>,
        log: ActivityLog,
    ) -> Self {
        Self {
            catalog,
            expander: CategoryExpander::new(tree.clone()),
            tree,
            transport,
            log,
        }
    }

    #[instrument(skip(self, items), target = "purge", fields(items = items.len()))]
    pub async fn purge_items(&self, items: &ItemSet) -> PurgeReport {
        let mut report = PurgeReport::default();

        for &item in items {
            match self.catalog.url_of(item).await {
                Ok(url) => {
                    self.transport.purge(&url);
                    self.log.log(format!("Purged cache for item URL: {url}"));
                    report.purged += 1;
                }
                Err(e) => {
                    warn!(item_id = %item, error = %e, "item url lookup failed");
                    self.log.log(format!("Failed to get URL for item ID: {item}"));
                    report.skipped += 1;
                }
            }
        }

        info!(purged = report.purged, skipped = report.skipped, "item purge pass done");
        report
    }

    /// Purges every category page in the closure of `categories`, then the
    /// storefront index. The index is purged even when nothing else is.
    #[instrument(skip(self, categories), target = "purge", fields(selected = categories.len()))]
    pub async fn purge_categories(&self, categories: &CategorySet) -> PurgeReport {
        let mut report = PurgeReport::default();
        self.log.log("Starting cache purging process.");

        if categories.is_empty() {
            self.log.log("No category IDs provided for cache purging.");
        } else {
            self.log.log(format!(
                "Selected category IDs for cache purging: {}",
                join_ids(categories)
            ));

            let expanded = self.expander.expand(categories).await;
            self.log.log(format!(
                "All category IDs (including children) for cache purging: {}",
                join_ids(&expanded)
            ));

            for &category in &expanded {
                match self.tree.url_of(category).await {
                    Ok(url) => {
                        self.transport.purge(&url);
                        self.log.log(format!("Purged cache for category URL: {url}"));
                        report.purged += 1;
                    }
                    Err(e) => {
                        warn!(category_id = %category, error = %e, "category url lookup failed");
                        self.log
                            .log(format!("Failed to get URL for category ID: {category}"));
                        report.skipped += 1;
                    }
                }
            }
        }

        let index = self.catalog.storefront_index_url();
        self.transport.purge(&index);
        self.log
            .log(format!("Purged cache for storefront index URL: {index}"));
        report.purged += 1;

        info!(purged = report.purged, skipped = report.skipped, "category purge pass done");
        report
    }
}
