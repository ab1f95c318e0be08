use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::logger::warn_if_slow;
use crate::settings::model::Configuration;
use crate::settings::repository::SettingsRepository;

/// Single-writer store for the configuration.
///
/// Readers always see a whole configuration (old or new, never a mix).
pub struct SettingsStore {
    repo: Arc<dyn SettingsRepository>,
    tx: watch::Sender<Configuration>,
}

impl SettingsStore {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        let (tx, _rx) = watch::channel(Configuration::default());
        Self { repo, tx }
    }

    /// Builds the store from whatever is persisted (defaults if nothing).
    pub async fn load(repo: Arc<dyn SettingsRepository>) -> Result<Self> {
        let store = Self::new(repo);
        store.refresh().await?;
        Ok(store)
    }

    pub fn get_configuration(&self) -> Configuration {
        self.tx.borrow().clone()
    }

    /// Persists `config` and makes it current. Returns the previous value.
    #[instrument(skip(self, config), target = "settings", fields(categories = config.categories.len()))]
    pub async fn set_configuration(&self, config: Configuration, now_ms: u64) -> Result<Configuration> {
        let config = config.sanitized();

        warn_if_slow("db_save_settings", Duration::from_millis(50), async {
            self.repo.save(&config, now_ms).await
        })
        .await
        .context("failed to persist settings")?;

        let previous = self.tx.send_replace(config);
        debug!("configuration replaced");
        Ok(previous)
    }

    /// Re-reads storage. Returns the new value only when it differs from
    /// the current one.
    #[instrument(skip(self), target = "settings")]
    pub async fn refresh(&self) -> Result<Option<Configuration>> {
        let stored = self
            .repo
            .load()
            .await
            .context("failed to load settings")?
            .unwrap_or_default()
            .sanitized();

        let mut changed = false;
        self.tx.send_if_modified(|current| {
            if *current == stored {
                return false;
            }
            *current = stored.clone();
            changed = true;
            true
        });

        if changed {
            info!(categories = stored.categories.len(), "settings changed in storage");
            Ok(Some(stored))
        } else {
            Ok(None)
        }
    }
}
