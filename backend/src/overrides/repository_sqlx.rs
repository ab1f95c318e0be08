use anyhow::Context;
use async_trait::async_trait;
use catalog::ItemId;
use sqlx::{Row, SqlitePool};

use crate::db::{i64_to_id, id_to_i64};
use crate::overrides::model::PurchasabilityOverride;
use crate::overrides::repository::OverrideRepository;

/// SQLx-backed implementation of OverrideRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxOverrideRepository {
    pool: SqlitePool,
}

impl SqlxOverrideRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OverrideRepository for SqlxOverrideRepository {
    async fn load_all(&self) -> anyhow::Result<Vec<(ItemId, PurchasabilityOverride)>> {
        let rows = sqlx::query(r#"SELECT item_id, status FROM item_overrides;"#)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_override(&r) {
                Ok(v) => out.push(v),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the load
                    tracing::warn!(error = %e, "skipping malformed override row");
                }
            }
        }

        Ok(out)
    }

    async fn save(
        &self,
        item: ItemId,
        value: PurchasabilityOverride,
        now_ms: u64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO item_overrides (item_id, status, updated_at_ms)
VALUES (?, ?, ?)
ON CONFLICT(item_id) DO UPDATE SET
  status = excluded.status,
  updated_at_ms = excluded.updated_at_ms;
"#,
        )
        .bind(id_to_i64(item.0)?)
        .bind(value.as_str())
        .bind(id_to_i64(now_ms)?)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert override for item {item}"))?;

        Ok(())
    }
}

fn row_to_override(r: &sqlx::sqlite::SqliteRow) -> anyhow::Result<(ItemId, PurchasabilityOverride)> {
    let item = ItemId(i64_to_id(r.try_get("item_id")?)?);
    let status: String = r.try_get("status")?;
    let value = status
        .parse::<PurchasabilityOverride>()
        .with_context(|| format!("invalid status for item {item}"))?;

    Ok((item, value))
}
