use anyhow::Result;
use async_trait::async_trait;

use crate::settings::model::Configuration;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// The stored configuration, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<Configuration>>;

    async fn save(&self, config: &Configuration, now_ms: u64) -> Result<()>;
}
