use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::db::id_to_i64;
use crate::settings::model::Configuration;
use crate::settings::repository::SettingsRepository;

const SETTINGS_KEY: &str = "purchase_window";

/// Stores the configuration as one JSON document in the `settings` table.
pub struct SqlxSettingsRepository {
    pool: SqlitePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn load(&self) -> anyhow::Result<Option<Configuration>> {
        let row = sqlx::query(r#"SELECT value FROM settings WHERE key = ?;"#)
            .bind(SETTINGS_KEY)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("value")?;
        let config = serde_json::from_str(&raw).context("stored settings are not valid JSON")?;
        Ok(Some(config))
    }

    async fn save(&self, config: &Configuration, now_ms: u64) -> anyhow::Result<()> {
        let raw = serde_json::to_string(config)?;

        sqlx::query(
            r#"
INSERT INTO settings (key, value, updated_at_ms)
VALUES (?, ?, ?)
ON CONFLICT(key) DO UPDATE SET
  value = excluded.value,
  updated_at_ms = excluded.updated_at_ms;
"#,
        )
        .bind(SETTINGS_KEY)
        .bind(raw)
        .bind(id_to_i64(now_ms)?)
        .execute(&self.pool)
        .await
        .context("upsert settings")?;

        Ok(())
    }
}
