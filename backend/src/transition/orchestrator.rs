use std::sync::Arc;

use async_trait::async_trait;
use catalog::{ItemResolver, ItemSet};
use common::logger::{TraceId, annotate_span, child_span, root_span};
use tokio::sync::Mutex;
use tracing::{Instrument, error, info, warn};

use crate::error::StorageError;
use crate::logger::ActivityLog;
use crate::overrides::model::Target;
use crate::overrides::mutator::FlagMutator;
use crate::purge::invalidator::{CacheInvalidator, PurgeReport};
use crate::scheduler::timer::TimerHandler;
use crate::scheduler::types::ScheduledTimer;
use crate::settings::store::SettingsStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// No categories configured; nothing was touched.
    NoCategories,
    Applied {
        items: ItemSet,
        item_purge: PurgeReport,
        category_purge: PurgeReport,
    },
}

/// The one routine that flips the flag for the configured categories.
///
/// Manual triggers and both timer slots all end up in
/// [`TransitionOrchestrator::transition`]. Runs are serialized.
pub struct TransitionOrchestrator {
    settings: Arc<SettingsStore>,
    resolver: ItemResolver,
    mutator: FlagMutator,
    invalidator: CacheInvalidator,
    log: ActivityLog,
    lock: Mutex<()>,
}

impl TransitionOrchestrator {
    pub fn new(
        settings: Arc<SettingsStore>,
        resolver: ItemResolver,
        mutator: FlagMutator,
        invalidator: CacheInvalidator,
        log: ActivityLog,
    ) -> Self {
        Self {
            settings,
            resolver,
            mutator,
            invalidator,
            log,
            lock: Mutex::new(()),
        }
    }

    pub fn invalidator(&self) -> &CacheInvalidator {
        &self.invalidator
    }

    /// Resolve → apply → purge items → purge categories.
    ///
    /// Resolution and purge failures are logged inside the pass; only a
    /// storage failure aborts it, in which case nothing is purged.
    pub async fn transition(&self, target: Target) -> Result<TransitionOutcome, StorageError> {
        let trace_id = TraceId::new();
        let span = root_span("transition", &trace_id);

        async move {
            let _guard = self.lock.lock().await;
            let categories = self.settings.get_configuration().categories;
            annotate_span(target.as_str(), categories.len());

            if categories.is_empty() {
                info!(target: "transition", "no categories configured; nothing to do");
                self.log
                    .log(format!("No categories configured; {target} transition skipped."));
                return Ok(TransitionOutcome::NoCategories);
            }

            let items = self.resolver.resolve(&categories).await;
            if items.is_empty() {
                warn!(target: "transition", "selected categories resolved to no items");
            }

            let items = self.mutator.apply(&items, target).await.inspect_err(|e| {
                error!(target: "transition", error = %e, "override write failed; transition aborted");
            })?;

            let (item_purge, category_purge) = async {
                (
                    self.invalidator.purge_items(&items).await,
                    self.invalidator.purge_categories(&categories).await,
                )
            }
            .instrument(child_span("purge"))
            .await;

            info!(
                target: "transition",
                items = items.len(),
                purged = item_purge.purged + category_purge.purged,
                skipped = item_purge.skipped + category_purge.skipped,
                "transition complete"
            );

            Ok(TransitionOutcome::Applied {
                items,
                item_purge,
                category_purge,
            })
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl TimerHandler for TransitionOrchestrator {
    async fn on_fire(&self, timer: ScheduledTimer) {
        let target = timer.action.target();
        self.log.log(format!(
            "Executing scheduled {target} transition at {}",
            self.log.local_time(timer.fire_at)
        ));

        if let Err(e) = self.transition(target).await {
            error!(target: "transition", action = %timer.action, error = %e, "scheduled transition failed");
        }
    }
}
