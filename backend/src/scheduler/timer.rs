//! One-shot timers keyed by slot.
//!
//! Each slot moves `Absent -> Scheduled -> Fired -> Absent`, or
//! `Scheduled -> Absent` when cancelled. Scheduling into an occupied slot
//! cancels the old timer first, so there is never more than one pending
//! timer per slot.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::time::Clock;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument};

use crate::scheduler::types::{ScheduledTimer, TimerAction};

/// Receives fired timers.
#[async_trait]
pub trait TimerHandler: Send + Sync {
    async fn on_fire(&self, timer: ScheduledTimer);
}

pub trait TimerService: Send + Sync {
    /// Installs `timer` in its slot, replacing whatever was there.
    fn schedule_once(&self, timer: ScheduledTimer);

    /// Returns `true` if a pending timer was removed.
    fn cancel(&self, action: TimerAction) -> bool;

    /// Pending timers ordered by fire time.
    fn pending(&self) -> Vec<ScheduledTimer>;

    fn clear_all(&self) {
        for action in TimerAction::ALL {
            self.cancel(action);
        }
    }
}

struct PendingTimer {
    timer: ScheduledTimer,
    generation: u64,
    cancel: oneshot::Sender<()>,
}

type Slots = Arc<Mutex<HashMap<TimerAction, PendingTimer>>>;

/// Tokio-backed [`TimerService`]. Must be used from inside a runtime.
pub struct TokioTimerService {
    handler: Arc<dyn TimerHandler>,
    clock: Arc<dyn Clock>,
    slots: Slots,
    generation: AtomicU64,
}

impl TokioTimerService {
    pub fn new(handler: Arc<dyn TimerHandler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            handler,
            clock,
            slots: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }
}

impl TimerService for TokioTimerService {
    #[instrument(skip(self), target = "timer", fields(action = %timer.action, fire_at = %timer.fire_at))]
    fn schedule_once(&self, timer: ScheduledTimer) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = (timer.fire_at - self.clock.now())
            .to_std()
            .unwrap_or_default();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let previous = self.slots.lock().insert(
            timer.action,
            PendingTimer {
                timer,
                generation,
                cancel: cancel_tx,
            },
        );
        if let Some(old) = previous {
            let _ = old.cancel.send(());
            debug!(replaced_generation = old.generation, "replaced pending timer");
        }

        let slots = self.slots.clone();
        let handler = self.handler.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel_rx => {
                    debug!(target: "timer", action = %timer.action, generation, "timer cancelled");
                    return;
                }
            }

            // A replan may have raced the wake-up; only the current generation fires.
            let current = {
                let mut slots = slots.lock();
                match slots.get(&timer.action) {
                    Some(p) if p.generation == generation => {
                        slots.remove(&timer.action);
                        true
                    }
                    _ => false,
                }
            };
            if !current {
                return;
            }

            info!(target: "timer", action = %timer.action, "timer fired");
            handler.on_fire(timer).await;
        });
    }

    fn cancel(&self, action: TimerAction) -> bool {
        match self.slots.lock().remove(&action) {
            Some(p) => {
                let _ = p.cancel.send(());
                debug!(target: "timer", action = %action, "pending timer cancelled");
                true
            }
            None => false,
        }
    }

    fn pending(&self) -> Vec<ScheduledTimer> {
        let mut out: Vec<_> = self.slots.lock().values().map(|p| p.timer).collect();
        out.sort_by_key(|t| (t.fire_at, t.action));
        out
    }
}
