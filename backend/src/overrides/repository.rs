use anyhow::Result;
use async_trait::async_trait;
use catalog::ItemId;

use crate::overrides::model::PurchasabilityOverride;

#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// Every persisted override. Items without a row are `Unset`.
    async fn load_all(&self) -> Result<Vec<(ItemId, PurchasabilityOverride)>>;

    /// Upsert the override for one item.
    async fn save(&self, item: ItemId, value: PurchasabilityOverride, now_ms: u64) -> Result<()>;
}
