use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Settings (single JSON document per key)
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS settings (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Per-item overrides
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS item_overrides (
  item_id BIGINT PRIMARY KEY,
  status TEXT NOT NULL CHECK (status IN ('unset', 'purchasable', 'unpurchasable')),
  updated_at_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Catalog: category hierarchy
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS categories (
  id BIGINT PRIMARY KEY,
  parent_id BIGINT NULL,
  slug TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Catalog: items
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS items (
  id BIGINT PRIMARY KEY,
  slug TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Catalog: membership
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS item_categories (
  item_id BIGINT NOT NULL,
  category_id BIGINT NOT NULL,
  PRIMARY KEY (item_id, category_id)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);"#)
        .execute(pool)
        .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_item_categories_category ON item_categories(category_id);"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
