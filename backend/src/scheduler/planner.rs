use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use common::logger::{TraceId, annotate_span, root_span};
use common::time::Clock;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::logger::ActivityLog;
use crate::scheduler::timer::TimerService;
use crate::scheduler::types::{ScheduledTimer, TimerAction};
use crate::scheduler::window::ScheduleWindow;
use crate::settings::model::Configuration;

#[derive(Clone, Copy, Debug)]
pub struct PlannerConfig {
    /// Zone the window bounds are entered in.
    pub timezone: FixedOffset,

    /// Validate before cancelling, so a rejected window keeps the
    /// previously installed timers. Off by default: any replan clears the
    /// old schedule first.
    pub preserve_on_invalid: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            timezone: Utc.fix(),
            preserve_on_invalid: false,
        }
    }
}

/// Turns a configuration window into Activate/Deactivate timers.
pub struct SchedulePlanner {
    timers: Arc<dyn TimerService>,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
    cfg: PlannerConfig,
    lock: Mutex<()>,
}

impl SchedulePlanner {
    pub fn new(
        timers: Arc<dyn TimerService>,
        clock: Arc<dyn Clock>,
        log: ActivityLog,
        cfg: PlannerConfig,
    ) -> Self {
        Self {
            timers,
            clock,
            log,
            cfg,
            lock: Mutex::new(()),
        }
    }

    /// Recomputes both timers from `config` and returns what was installed.
    pub fn replan(&self, config: &Configuration) -> Result<Vec<ScheduledTimer>, ValidationError> {
        let _guard = self.lock.lock();
        let trace_id = TraceId::new();
        let span = root_span("replan", &trace_id);
        let _enter = span.enter();
        annotate_span("replan", config.categories.len());

        if !self.cfg.preserve_on_invalid {
            self.timers.clear_all();
        }

        let window = match self.window(config) {
            Ok(w) => w,
            Err(e) => {
                warn!(target: "planner", error = %e, "configuration window rejected");
                self.log.log(match e {
                    ValidationError::StartNotBeforeEnd { .. } => "Start date must be before end date.",
                    ValidationError::InvalidDateTime { .. } => "Invalid start or end date.",
                });
                return Err(e);
            }
        };

        if self.cfg.preserve_on_invalid {
            self.timers.clear_all();
        }

        let now = self.clock.now();
        let mut installed = Vec::with_capacity(2);

        for (label, bound, action) in [
            ("start", window.start, TimerAction::Activate),
            ("end", window.end, TimerAction::Deactivate),
        ] {
            if let Some(at) = bound {
                self.log.log(format!(
                    "Parsed {label} datetime: {} (Timestamp: {})",
                    self.log.local_time(at),
                    at.timestamp()
                ));
            }

            match self.install(bound, action, now) {
                Some(timer) => installed.push(timer),
                None => self.log.log(format!(
                    "{} timestamp is not set or in the past. Event not scheduled.",
                    capitalize(label)
                )),
            }
        }

        info!(target: "planner", installed = installed.len(), "replan complete");
        Ok(installed)
    }

    /// The timers [`SchedulePlanner::replan`] would install for `config`
    /// right now. Touches neither the timer slots nor the activity log.
    pub fn preview(&self, config: &Configuration) -> Result<Vec<ScheduledTimer>, ValidationError> {
        let window = self.window(config)?;
        let now = self.clock.now();

        Ok([
            (window.start, TimerAction::Activate),
            (window.end, TimerAction::Deactivate),
        ]
        .into_iter()
        .filter_map(|(bound, action)| {
            bound
                .filter(|at| *at > now)
                .map(|at| ScheduledTimer::new(at, action))
        })
        .collect())
    }

    fn window(&self, config: &Configuration) -> Result<ScheduleWindow, ValidationError> {
        let window = ScheduleWindow::parse(
            config.start.as_deref(),
            config.end.as_deref(),
            self.cfg.timezone,
        )?;
        window.validate()?;
        Ok(window)
    }

    fn install(
        &self,
        bound: Option<DateTime<Utc>>,
        action: TimerAction,
        now: DateTime<Utc>,
    ) -> Option<ScheduledTimer> {
        let at = bound.filter(|at| *at > now)?;
        let timer = ScheduledTimer::new(at, action);
        self.timers.schedule_once(timer);
        self.log.log(format!(
            "Scheduled {} event at {}",
            action.target(),
            self.log.local_time(at)
        ));
        Some(timer)
    }

    /// Cancels both slots.
    pub fn clear(&self) {
        let _guard = self.lock.lock();
        self.timers.clear_all();
        info!(target: "planner", "pending timers cleared");
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
