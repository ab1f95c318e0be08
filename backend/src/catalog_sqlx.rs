//! SQLite-backed catalog and category hierarchy.

use async_trait::async_trait;
use catalog::{Catalog, CategoryId, CategorySet, CategoryTree, ItemId, ItemSet, LookupError};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::instrument;

use crate::db::{i64_to_id, id_to_i64};

const DESCENDANTS_SQL: &str = r#"
WITH RECURSIVE tree(id) AS (
  SELECT id FROM categories WHERE parent_id = ?
  UNION
  SELECT c.id FROM categories c JOIN tree t ON c.parent_id = t.id
)
SELECT id FROM tree;
"#;

/// Reads `categories`, `items` and `item_categories`; builds public URLs
/// from slugs under `base_url`.
#[derive(Clone)]
pub struct SqlxCatalog {
    pool: SqlitePool,
    base_url: String,
}

impl SqlxCatalog {
    pub fn new(pool: SqlitePool, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { pool, base_url }
    }

    async fn category_slug(&self, id: CategoryId) -> Result<String, LookupError> {
        let row = sqlx::query(r#"SELECT slug FROM categories WHERE id = ?;"#)
            .bind(to_i64(id.0)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(LookupError::CategoryNotFound(id))?;

        row.try_get("slug").map_err(backend)
    }
}

fn backend(e: impl std::fmt::Display) -> LookupError {
    LookupError::Backend(e.to_string())
}

fn to_i64(v: u64) -> Result<i64, LookupError> {
    id_to_i64(v).map_err(backend)
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push("(");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");
}

#[async_trait]
impl CategoryTree for SqlxCatalog {
    #[instrument(skip(self), target = "catalog", level = "debug")]
    async fn children_of(&self, id: CategoryId) -> Result<CategorySet, LookupError> {
        // Existence check so unknown ids surface as lookup failures.
        self.category_slug(id).await?;

        let rows = sqlx::query(DESCENDANTS_SQL)
            .bind(to_i64(id.0)?)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.iter()
            .map(|r| -> Result<CategoryId, LookupError> {
                let raw: i64 = r.try_get("id").map_err(backend)?;
                Ok(CategoryId(i64_to_id(raw).map_err(backend)?))
            })
            .filter(|c| c.as_ref().map_or(true, |c| *c != id))
            .collect()
    }

    async fn url_of(&self, id: CategoryId) -> Result<String, LookupError> {
        let slug = self.category_slug(id).await?;
        Ok(format!("{}/product-category/{slug}/", self.base_url))
    }
}

#[async_trait]
impl Catalog for SqlxCatalog {
    #[instrument(skip(self, categories), target = "catalog", level = "debug", fields(categories = categories.len()))]
    async fn items_in(
        &self,
        categories: &CategorySet,
        include_descendants: bool,
    ) -> Result<ItemSet, LookupError> {
        if categories.is_empty() {
            return Ok(ItemSet::new());
        }

        let ids = categories
            .iter()
            .map(|c| to_i64(c.0))
            .collect::<Result<Vec<_>, _>>()?;

        let mut qb = QueryBuilder::<Sqlite>::new("");
        if include_descendants {
            qb.push("WITH RECURSIVE tree(id) AS (SELECT id FROM categories WHERE id IN ");
            push_id_list(&mut qb, &ids);
            qb.push(
                " UNION SELECT c.id FROM categories c JOIN tree t ON c.parent_id = t.id) \
                 SELECT DISTINCT item_id FROM item_categories \
                 WHERE category_id IN (SELECT id FROM tree) OR category_id IN ",
            );
        } else {
            qb.push("SELECT DISTINCT item_id FROM item_categories WHERE category_id IN ");
        }
        push_id_list(&mut qb, &ids);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        rows.iter()
            .map(|r| -> Result<ItemId, LookupError> {
                let raw: i64 = r.try_get("item_id").map_err(backend)?;
                Ok(ItemId(i64_to_id(raw).map_err(backend)?))
            })
            .collect()
    }

    async fn url_of(&self, id: ItemId) -> Result<String, LookupError> {
        let row = sqlx::query(r#"SELECT slug FROM items WHERE id = ?;"#)
            .bind(to_i64(id.0)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or(LookupError::ItemNotFound(id))?;

        let slug: String = row.try_get("slug").map_err(backend)?;
        Ok(format!("{}/product/{slug}/", self.base_url))
    }

    fn storefront_index_url(&self) -> String {
        format!("{}/shop/", self.base_url)
    }
}
