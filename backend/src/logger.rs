use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use common::time::Clock;
use parking_lot::Mutex;

/// Installs the process-wide tracing subscriber (JSON in production).
pub fn init_tracing(json: bool) {
    common::logger::init_logger("purchase-window", json);
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

enum Sink {
    File(PathBuf),
    Memory(Mutex<Vec<String>>),
}

struct ActivityLogInner {
    enabled: AtomicBool,
    sink: Sink,
    timezone: FixedOffset,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

/// Operator-facing activity log.
///
/// Lines are `[YYYY-MM-DD HH:MM:SS] message`, stamped in the store time
/// zone and appended only while logging is enabled in the configuration.
/// Enabled lines are mirrored to tracing under the `activity` target.
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<ActivityLogInner>,
}

impl ActivityLog {
    fn with_sink(sink: Sink, timezone: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(ActivityLogInner {
                enabled: AtomicBool::new(false),
                sink,
                timezone,
                clock,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Appends to `path`, creating it on first write.
    pub fn to_file(path: impl Into<PathBuf>, timezone: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self::with_sink(Sink::File(path.into()), timezone, clock)
    }

    /// Keeps lines in memory; read them back with [`ActivityLog::lines`].
    pub fn in_memory(timezone: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self::with_sink(Sink::Memory(Mutex::new(Vec::new())), timezone, clock)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Relaxed)
    }

    pub fn log(&self, message: impl AsRef<str>) {
        if !self.is_enabled() {
            return;
        }

        let message = message.as_ref();
        tracing::info!(target: "activity", "{message}");

        let stamp = self
            .inner
            .clock
            .now()
            .with_timezone(&self.inner.timezone)
            .format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{stamp}] {message}");

        match &self.inner.sink {
            Sink::Memory(lines) => lines.lock().push(line),
            Sink::File(path) => {
                let _guard = self.inner.write_lock.lock();
                let written = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .and_then(|mut f| writeln!(f, "{line}"));

                if let Err(e) = written {
                    tracing::warn!(path = %path.display(), error = %e, "activity log write failed");
                }
            }
        }
    }

    /// Lines captured by an in-memory log. Empty for other sinks.
    pub fn lines(&self) -> Vec<String> {
        match &self.inner.sink {
            Sink::Memory(lines) => lines.lock().clone(),
            _ => Vec::new(),
        }
    }

    /// Formats a timestamp the way log lines are stamped.
    pub fn local_time(&self, at: chrono::DateTime<Utc>) -> String {
        at.with_timezone(&self.inner.timezone)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone};
    use common::time::ManualClock;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 4, 2, 22, 30, 5).unwrap(),
        ))
    }

    #[test]
    fn disabled_log_records_nothing() {
        let log = ActivityLog::in_memory(utc(), clock());

        log.log("ignored");

        assert!(log.lines().is_empty());
    }

    #[test]
    fn lines_are_stamped_in_store_time_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let log = ActivityLog::in_memory(plus_two, clock());
        log.set_enabled(true);

        log.log("Item ID 7 set to purchasable.");

        assert_eq!(
            log.lines(),
            vec!["[2026-04-03 00:30:05] Item ID 7 set to purchasable.".to_string()]
        );
    }

    #[test]
    fn clones_share_the_enabled_flag() {
        let log = ActivityLog::in_memory(utc(), clock());
        let other = log.clone();

        other.set_enabled(true);
        log.log("one");
        other.set_enabled(false);
        log.log("two");

        assert_eq!(log.lines().len(), 1);
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log");
        let log = ActivityLog::to_file(&path, utc(), clock());
        log.set_enabled(true);

        log.log("first");
        log.log("second");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "[2026-04-02 22:30:05] first\n[2026-04-02 22:30:05] second\n"
        );
    }

    #[tokio::test]
    async fn warn_if_slow_returns_inner_value() {
        let out = warn_if_slow("noop", Duration::from_secs(1), async { 41 + 1 }).await;
        assert_eq!(out, 42);
    }
}
