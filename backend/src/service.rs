//! Wiring of the whole purchase-window pipeline behind one facade.

use std::sync::Arc;

use anyhow::Context;
use catalog::{Catalog, CategoryExpander, CategoryTree, ItemCache, ItemId, ItemResolver};
use chrono::TimeDelta;
use common::time::Clock;
use tracing::{info, instrument, warn};

use crate::error::{AppError, StorageError};
use crate::logger::ActivityLog;
use crate::overrides::repository::OverrideRepository;
use crate::overrides::{FlagMutator, OverrideStore, PurchasabilityOverride, PurchasabilityPolicy, Target};
use crate::purge::{CacheInvalidator, PurgeTransport};
use crate::scheduler::{
    PlannerConfig, SchedulePlanner, ScheduledTimer, TimerService, TokioTimerService,
};
use crate::settings::{Configuration, SettingsRepository, SettingsStore};
use crate::transition::{TransitionOrchestrator, TransitionOutcome};

/// Collaborators the service is assembled from.
pub struct ServiceDeps {
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub override_repo: Arc<dyn OverrideRepository>,
    pub catalog: Arc<dyn Catalog>,
    pub tree: Arc<dyn CategoryTree>,
    pub transport: Arc<dyn PurgeTransport>,
    pub clock: Arc<dyn Clock>,
    pub log: ActivityLog,
    pub planner: PlannerConfig,
    pub item_cache_ttl: TimeDelta,
}

pub struct PurchaseWindowService {
    settings: Arc<SettingsStore>,
    overrides: Arc<OverrideStore>,
    policy: PurchasabilityPolicy,
    orchestrator: Arc<TransitionOrchestrator>,
    timers: Arc<dyn TimerService>,
    planner: SchedulePlanner,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
}

impl PurchaseWindowService {
    /// Loads settings and overrides from storage and wires the pipeline.
    /// No timers are installed until [`PurchaseWindowService::start`].
    pub async fn build(deps: ServiceDeps) -> anyhow::Result<Self> {
        let settings = Arc::new(
            SettingsStore::load(deps.settings_repo)
                .await
                .context("loading settings")?,
        );
        let overrides = Arc::new(
            OverrideStore::load(deps.override_repo)
                .await
                .context("loading overrides")?,
        );

        let log = deps.log;
        log.set_enabled(settings.get_configuration().logging_enabled);

        let resolver = ItemResolver::new(
            CategoryExpander::new(deps.tree.clone()),
            deps.catalog.clone(),
            ItemCache::new(deps.item_cache_ttl),
            deps.clock.clone(),
        );
        let mutator = FlagMutator::new(overrides.clone(), deps.clock.clone(), log.clone());
        let invalidator = CacheInvalidator::new(deps.catalog, deps.tree, deps.transport, log.clone());

        let orchestrator = Arc::new(TransitionOrchestrator::new(
            settings.clone(),
            resolver,
            mutator,
            invalidator,
            log.clone(),
        ));

        let timers: Arc<dyn TimerService> = Arc::new(TokioTimerService::new(
            orchestrator.clone(),
            deps.clock.clone(),
        ));
        let planner = SchedulePlanner::new(timers.clone(), deps.clock.clone(), log.clone(), deps.planner);

        Ok(Self {
            policy: PurchasabilityPolicy::new(overrides.clone()),
            settings,
            overrides,
            orchestrator,
            timers,
            planner,
            clock: deps.clock,
            log,
        })
    }

    /// Startup: installs timers for the stored window and purges the
    /// configured categories. A stored window that no longer validates is
    /// logged and leaves no timers.
    #[instrument(skip(self), target = "service")]
    pub async fn start(&self) -> Vec<ScheduledTimer> {
        let config = self.settings.get_configuration();

        let installed = self.planner.replan(&config).unwrap_or_else(|e| {
            warn!(error = %e, "stored window is invalid; no timers installed");
            Vec::new()
        });

        self.orchestrator
            .invalidator()
            .purge_categories(&config.categories)
            .await;
        self.log.log("Service started and cache purged");

        info!(timers = installed.len(), "service started");
        installed
    }

    /// Replaces the configuration and replans.
    ///
    /// The new value is persisted before the window is validated, so a
    /// rejected window is still stored; the error tells the caller the
    /// schedule was not installed.
    #[instrument(skip(self, config), target = "service")]
    pub async fn update_configuration(
        &self,
        config: Configuration,
    ) -> Result<Vec<ScheduledTimer>, AppError> {
        let now_ms = self.clock.now().timestamp_millis().max(0) as u64;
        self.settings
            .set_configuration(config, now_ms)
            .await
            .map_err(StorageError::Settings)?;

        let current = self.settings.get_configuration();
        self.log.set_enabled(current.logging_enabled);

        Ok(self.planner.replan(&current)?)
    }

    /// Persists `config` and validates its window without touching the
    /// installed timers. Returns the timers a replan would install now.
    ///
    /// For short-lived processes: the long-running instance picks the new
    /// value up on its next [`PurchaseWindowService::sync_settings`].
    #[instrument(skip(self, config), target = "service")]
    pub async fn save_configuration(
        &self,
        config: Configuration,
    ) -> Result<Vec<ScheduledTimer>, AppError> {
        let now_ms = self.clock.now().timestamp_millis().max(0) as u64;
        self.settings
            .set_configuration(config, now_ms)
            .await
            .map_err(StorageError::Settings)?;

        Ok(self.planner.preview(&self.settings.get_configuration())?)
    }

    pub async fn activate_now(&self) -> Result<TransitionOutcome, StorageError> {
        self.orchestrator.transition(Target::Purchasable).await
    }

    pub async fn deactivate_now(&self) -> Result<TransitionOutcome, StorageError> {
        self.orchestrator.transition(Target::Unpurchasable).await
    }

    /// Catalog hook: the effective purchasability of `item`.
    pub fn is_purchasable(&self, item: ItemId, default_value: bool) -> bool {
        self.policy.resolve(item, default_value)
    }

    pub fn override_of(&self, item: ItemId) -> PurchasabilityOverride {
        self.overrides.get(item)
    }

    /// Picks up changes written by other processes. Returns `true` when
    /// the configuration changed (and was replanned).
    #[instrument(skip(self), target = "service")]
    pub async fn sync_settings(&self) -> anyhow::Result<bool> {
        self.overrides.reload().await?;

        let Some(config) = self.settings.refresh().await? else {
            return Ok(false);
        };

        self.log.set_enabled(config.logging_enabled);
        if let Err(e) = self.planner.replan(&config) {
            warn!(error = %e, "updated window rejected");
        }
        Ok(true)
    }

    pub fn configuration(&self) -> Configuration {
        self.settings.get_configuration()
    }

    pub fn pending_timers(&self) -> Vec<ScheduledTimer> {
        self.timers.pending()
    }

    /// Cancels pending timers. In-flight transitions are not interrupted.
    pub fn shutdown(&self) {
        self.planner.clear();
        info!(target: "service", "service stopped");
    }
}
