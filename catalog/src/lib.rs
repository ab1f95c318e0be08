pub mod cache;
pub mod expander;
pub mod model;
pub mod resolver;
pub mod source;

pub use cache::{CacheKey, DEFAULT_ITEM_TTL, ItemCache};
pub use expander::CategoryExpander;
pub use model::{CategoryId, CategorySet, ItemId, ItemSet, join_ids};
pub use resolver::ItemResolver;
pub use source::{Catalog, CategoryTree, LookupError};
