use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::overrides::model::Target;

/// Timer slot. At most one pending timer exists per slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    /// Window opens: items become purchasable.
    Activate,
    /// Window closes: items become unpurchasable.
    Deactivate,
}

impl TimerAction {
    pub const ALL: [TimerAction; 2] = [TimerAction::Activate, TimerAction::Deactivate];

    pub fn target(self) -> Target {
        match self {
            TimerAction::Activate => Target::Purchasable,
            TimerAction::Deactivate => Target::Unpurchasable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerAction::Activate => "activate",
            TimerAction::Deactivate => "deactivate",
        }
    }
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTimer {
    pub fire_at: DateTime<Utc>,
    pub action: TimerAction,
}

impl ScheduledTimer {
    pub fn new(fire_at: DateTime<Utc>, action: TimerAction) -> Self {
        Self { fire_at, action }
    }
}
