//! Boundary traits for the external catalog and category hierarchy.
//!
//! Implementations live outside this crate (SQL adapters, HTTP clients,
//! test doubles). Lookup failures are reported as [`LookupError`] and are
//! never fatal to the callers in this workspace: they are logged and the
//! affected entry is skipped.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CategoryId, CategorySet, ItemId, ItemSet};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("catalog backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CategoryTree: Send + Sync {
    /// Direct and transitive descendants of `id`, excluding `id` itself.
    async fn children_of(&self, id: CategoryId) -> Result<CategorySet, LookupError>;

    /// Public URL of the category listing page.
    async fn url_of(&self, id: CategoryId) -> Result<String, LookupError>;
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Items whose category membership intersects `categories`.
    async fn items_in(
        &self,
        categories: &CategorySet,
        include_descendants: bool,
    ) -> Result<ItemSet, LookupError>;

    /// Public URL of the item page.
    async fn url_of(&self, id: ItemId) -> Result<String, LookupError>;

    /// Storefront index (shop landing page) URL.
    fn storefront_index_url(&self) -> String;
}
