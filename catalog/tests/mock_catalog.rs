use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use catalog::{Catalog, CategoryId, CategorySet, CategoryTree, ItemId, ItemSet, LookupError};

/// In-memory hierarchy + membership table.
#[derive(Default)]
pub struct MockCatalog {
    pub children: HashMap<CategoryId, Vec<CategoryId>>,
    pub members: HashMap<CategoryId, Vec<ItemId>>,
    pub fail_items_in: Mutex<bool>,
    pub items_in_calls: AtomicUsize,
    pub last_query: Mutex<Option<(CategorySet, bool)>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test convenience
    pub fn with_child(mut self, parent: u64, child: u64) -> Self {
        self.children
            .entry(CategoryId(parent))
            .or_default()
            .push(CategoryId(child));
        self
    }

    pub fn with_items(mut self, category: u64, items: &[u64]) -> Self {
        self.members
            .entry(CategoryId(category))
            .or_default()
            .extend(items.iter().copied().map(ItemId));
        self
    }

    pub fn calls(&self) -> usize {
        self.items_in_calls.load(Ordering::SeqCst)
    }

    fn descendants(&self, id: CategoryId) -> CategorySet {
        let mut out = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            for &c in self.children.get(&cur).into_iter().flatten() {
                if out.insert(c) {
                    stack.push(c);
                }
            }
        }
        out
    }
}

#[async_trait]
impl CategoryTree for MockCatalog {
    async fn children_of(&self, id: CategoryId) -> Result<CategorySet, LookupError> {
        Ok(self.descendants(id))
    }

    async fn url_of(&self, id: CategoryId) -> Result<String, LookupError> {
        Ok(format!("https://shop.test/product-category/{id}/"))
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn items_in(
        &self,
        categories: &CategorySet,
        include_descendants: bool,
    ) -> Result<ItemSet, LookupError> {
        self.items_in_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some((categories.clone(), include_descendants));

        if *self.fail_items_in.lock() {
            return Err(LookupError::Backend("catalog offline".into()));
        }

        let mut out = ItemSet::new();
        for c in categories {
            for &item in self.members.get(c).into_iter().flatten() {
                out.insert(item);
            }
        }
        Ok(out)
    }

    async fn url_of(&self, id: ItemId) -> Result<String, LookupError> {
        Ok(format!("https://shop.test/product/{id}/"))
    }

    fn storefront_index_url(&self) -> String {
        "https://shop.test/shop/".into()
    }
}
