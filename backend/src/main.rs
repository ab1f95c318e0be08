use std::sync::Arc;
use std::time::Duration;

use catalog::ItemId;
use clap::Parser;
use common::time::SystemClock;
use purchase_window::{
    catalog_sqlx::SqlxCatalog,
    cli::{Cli, Command, configuration_from_args},
    config::AppConfig,
    db::Db,
    logger::{ActivityLog, init_tracing},
    overrides::repository_sqlx::SqlxOverrideRepository,
    purge::HttpPurgeTransport,
    service::{PurchaseWindowService, ServiceDeps},
    settings::SqlxSettingsRepository,
    transition::TransitionOutcome,
};

/// Opens the database, runs migrations and assembles the service.
async fn init_service(
    cfg: &AppConfig,
    transport: Arc<HttpPurgeTransport>,
) -> anyhow::Result<Arc<PurchaseWindowService>> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let clock = Arc::new(SystemClock);
    let catalog = Arc::new(SqlxCatalog::new(db.pool.clone(), cfg.storefront_base_url.clone()));

    let deps = ServiceDeps {
        settings_repo: Arc::new(SqlxSettingsRepository::new(db.pool.clone())),
        override_repo: Arc::new(SqlxOverrideRepository::new(db.pool.clone())),
        catalog: catalog.clone(),
        tree: catalog,
        transport,
        clock: clock.clone(),
        log: ActivityLog::to_file(&cfg.activity_log_path, cfg.store_timezone, clock),
        planner: cfg.planner(),
        item_cache_ttl: cfg.item_cache_ttl,
    };

    Ok(Arc::new(PurchaseWindowService::build(deps).await?))
}

/// Re-reads settings and overrides at a fixed cadence so edits made by
/// other invocations reach the running timers.
fn start_settings_sync_loop(service: Arc<PurchaseWindowService>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match service.sync_settings().await {
                Ok(true) => tracing::info!(
                    timers = service.pending_timers().len(),
                    "settings changed; replanned"
                ),
                Ok(false) => {}
                Err(e) => tracing::error!(error = ?e, "settings sync failed"),
            }
        }
    });
}

fn report(outcome: &TransitionOutcome) {
    match outcome {
        TransitionOutcome::NoCategories => println!("no categories configured; nothing changed"),
        TransitionOutcome::Applied {
            items,
            item_purge,
            category_purge,
        } => println!(
            "{} items updated, {} urls purged, {} skipped",
            items.len(),
            item_purge.purged + category_purge.purged,
            item_purge.skipped + category_purge.skipped
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env();
    init_tracing(cfg.json_logs);

    let transport = Arc::new(HttpPurgeTransport::new(cfg.purge_timeout)?);
    let service = init_service(&cfg, transport.clone()).await?;

    match cli.command {
        Command::Serve => {
            tracing::info!("Starting purchase-window scheduler...");

            let timers = service.start().await;
            for t in &timers {
                tracing::info!(action = %t.action, fire_at = %t.fire_at, "timer pending");
            }

            start_settings_sync_loop(service.clone(), cfg.settings_poll_interval);

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
            service.shutdown();
        }

        Command::Configure {
            start,
            end,
            categories,
            logging,
        } => {
            let config = configuration_from_args(start, end, &categories, logging);
            let timers = service.save_configuration(config).await?;
            println!(
                "configuration saved; a running `serve` applies it within {}s",
                cfg.settings_poll_interval.as_secs()
            );
            for t in timers {
                println!(
                    "  {} will fire at {}",
                    t.action,
                    t.fire_at.with_timezone(&cfg.store_timezone)
                );
            }
        }

        Command::ActivateNow => report(&service.activate_now().await?),
        Command::DeactivateNow => report(&service.deactivate_now().await?),

        Command::Status { item: Some(id) } => {
            let item = ItemId(id);
            println!(
                "item {item}: override {}, purchasable (default true) {}",
                service.override_of(item),
                service.is_purchasable(item, true)
            );
        }
        Command::Status { item: None } => {
            println!("{}", serde_json::to_string_pretty(&service.configuration())?);
        }
    }

    let abandoned = transport.drain(cfg.purge_timeout).await;
    if abandoned > 0 {
        tracing::warn!(abandoned, "exiting with purge requests still in flight");
    }

    Ok(())
}
