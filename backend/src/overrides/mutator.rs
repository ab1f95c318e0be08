use std::sync::Arc;

use catalog::{ItemSet, join_ids};
use common::time::Clock;
use tracing::{info, instrument};

use crate::error::StorageError;
use crate::logger::ActivityLog;
use crate::overrides::model::Target;
use crate::overrides::store::OverrideStore;

/// Writes forced purchasability for a batch of items.
///
/// Fail-fast: the first storage error aborts the remaining writes of the
/// call. Writes already made stay in place (each one is independent and
/// idempotent), and the error reports how many there were.
pub struct FlagMutator {
    store: Arc<OverrideStore>,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
}

impl FlagMutator {
    pub fn new(store: Arc<OverrideStore>, clock: Arc<dyn Clock>, log: ActivityLog) -> Self {
        Self { store, clock, log }
    }

    #[instrument(skip(self, items), target = "transition", fields(items = items.len(), target = %target))]
    pub async fn apply(&self, items: &ItemSet, target: Target) -> Result<ItemSet, StorageError> {
        let value = target.as_override();
        let now_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let mut applied = ItemSet::new();

        for &item in items {
            self.store
                .set(item, value, now_ms)
                .await
                .map_err(|source| StorageError::OverrideWrite {
                    item,
                    applied: applied.len(),
                    source,
                })?;

            applied.insert(item);
            self.log.log(format!("Item ID {item} set to {target}."));
        }

        info!(applied = %join_ids(&applied), "overrides written");
        Ok(applied)
    }
}
