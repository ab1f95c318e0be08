use std::str::FromStr;
use std::time::Duration;

use catalog::DEFAULT_ITEM_TTL;
use chrono::{FixedOffset, Offset, TimeDelta, Utc};

use crate::scheduler::planner::PlannerConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    // =========================
    // Storefront
    // =========================
    /// Base URL that category, item and storefront index URLs are built on.
    pub storefront_base_url: String,

    /// Fixed offset of the store. Window bounds are entered in this zone
    /// and activity log lines are stamped in it.
    pub store_timezone: FixedOffset,

    /// Append-only operator log. Written only while logging is enabled in
    /// the configuration.
    pub activity_log_path: String,

    // =========================
    // Caching and purging
    // =========================
    /// How long a resolved category selection stays cached.
    ///
    /// Catalog edits are not observed until the entry expires.
    pub item_cache_ttl: TimeDelta,

    /// Per-request timeout for purge calls. Purges are fire-and-forget, so
    /// this only bounds how long a background task lingers.
    pub purge_timeout: Duration,

    // =========================
    // Serve mode
    // =========================
    /// How often settings and overrides are re-read from storage to pick
    /// up edits made by other processes (e.g. the `configure` command).
    pub settings_poll_interval: Duration,

    /// Keep the current timers when a new window is rejected instead of
    /// clearing them before validation.
    pub preserve_schedule_on_invalid: bool,

    /// JSON logs when `APP_ENV=production`.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://purchase_window.db?mode=rwc".to_string()),

            storefront_base_url: std::env::var("STOREFRONT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            store_timezone: env_or("STORE_TIMEZONE", Utc.fix()),
            activity_log_path: std::env::var("ACTIVITY_LOG_PATH")
                .unwrap_or_else(|_| "purchase_window.log".to_string()),

            item_cache_ttl: cache_ttl(env_or("ITEM_CACHE_TTL_SECS", 3_600)),
            purge_timeout: Duration::from_millis(env_or("PURGE_TIMEOUT_MS", 2_000)),

            settings_poll_interval: Duration::from_secs(env_or::<u64>("SETTINGS_POLL_SECS", 30).max(1)),
            preserve_schedule_on_invalid: env_or("PRESERVE_SCHEDULE_ON_INVALID", false),
            json_logs: std::env::var("APP_ENV").unwrap_or_default() == "production",
        }
    }

    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            timezone: self.store_timezone,
            preserve_on_invalid: self.preserve_schedule_on_invalid,
        }
    }
}

/// Parses `key` if set and well-formed, otherwise `default`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

/// Seconds to a cache lifetime; values `TimeDelta` cannot hold fall back
/// to [`DEFAULT_ITEM_TTL`]. Negative input never gets here: it fails the
/// `u64` parse.
fn cache_ttl(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or_else(|| {
            tracing::warn!(secs, "item cache ttl out of range; using default");
            DEFAULT_ITEM_TTL
        })
}

fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = raw, "ignoring malformed setting; using default");
        default
    })
}
