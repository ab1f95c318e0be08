use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog::ItemId;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::logger::warn_if_slow;
use crate::overrides::model::PurchasabilityOverride;
use crate::overrides::repository::OverrideRepository;

/// Durable per-item overrides fronted by an in-memory index.
///
/// Writes go to the repository first and only then to the index, so the
/// index never reports a state that was not persisted. Reads are a single
/// map lookup and never touch storage. Reloads and writes are serialized
/// so a reload never applies a snapshot older than a finished write.
pub struct OverrideStore {
    repo: Arc<dyn OverrideRepository>,
    index: RwLock<HashMap<ItemId, PurchasabilityOverride>>,
    writes: Mutex<()>,
}

impl OverrideStore {
    pub fn new(repo: Arc<dyn OverrideRepository>) -> Self {
        Self {
            repo,
            index: RwLock::new(HashMap::new()),
            writes: Mutex::new(()),
        }
    }

    /// Builds the store and fills the index from storage.
    pub async fn load(repo: Arc<dyn OverrideRepository>) -> Result<Self> {
        let store = Self::new(repo);
        store.reload().await?;
        Ok(store)
    }

    /// Merges the persisted state into the index. Items missing from
    /// storage keep their indexed value.
    #[instrument(skip(self), target = "store")]
    pub async fn reload(&self) -> Result<()> {
        let _writes = self.writes.lock().await;
        let rows = warn_if_slow("db_load_overrides", Duration::from_millis(200), async {
            self.repo.load_all().await
        })
        .await
        .context("failed to load overrides from repository")?;

        let count = rows.len();
        self.index.write().extend(rows);

        info!(count, "override index loaded");
        Ok(())
    }

    /// Current override for `item`; `Unset` if never written.
    pub fn get(&self, item: ItemId) -> PurchasabilityOverride {
        self.index.read().get(&item).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[instrument(skip(self), target = "store", fields(item_id = %item, value = %value))]
    pub async fn set(&self, item: ItemId, value: PurchasabilityOverride, now_ms: u64) -> Result<()> {
        let _writes = self.writes.lock().await;
        debug!("persisting override");

        warn_if_slow("db_save_override", Duration::from_millis(50), async {
            self.repo.save(item, value, now_ms).await
        })
        .await
        .context("failed to persist override")?;

        self.index.write().insert(item, value);
        Ok(())
    }
}
