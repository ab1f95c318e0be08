use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::model::CategorySet;
use crate::source::CategoryTree;

/// Expands a category selection into its closure over the hierarchy.
#[derive(Clone)]
pub struct CategoryExpander {
    tree: Arc<dyn CategoryTree>,
}

impl CategoryExpander {
    pub fn new(tree: Arc<dyn CategoryTree>) -> Self {
        Self { tree }
    }

    /// Returns `categories` plus every descendant of each of them.
    ///
    /// A failed lookup drops only that category's descendants; the category
    /// itself stays in the result. Lookups are not retried.
    #[instrument(skip(self, categories), target = "catalog", fields(input = categories.len()))]
    pub async fn expand(&self, categories: &CategorySet) -> CategorySet {
        let mut out = categories.clone();

        for &id in categories {
            match self.tree.children_of(id).await {
                Ok(children) => out.extend(children),
                Err(e) => {
                    warn!(category_id = %id, error = %e, "descendant lookup failed; keeping category only");
                }
            }
        }

        debug!(expanded = out.len(), "category selection expanded");
        out
    }
}
