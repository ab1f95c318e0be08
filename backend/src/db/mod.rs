pub mod schema;

use anyhow::{Context, anyhow};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .with_context(|| format!("failed to open database {database_url}"))?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate(&self.pool).await
    }
}

/* =========================
Numeric safety helpers
========================= */

pub(crate) fn id_to_i64(v: u64) -> anyhow::Result<i64> {
    i64::try_from(v).map_err(|_| anyhow!("id too large for i64: {v}"))
}

pub(crate) fn i64_to_id(v: i64) -> anyhow::Result<u64> {
    u64::try_from(v).map_err(|_| anyhow!("negative i64 where id expected: {v}"))
}
