use catalog::CategorySet;
use serde::{Deserialize, Serialize};

/// The whole editable configuration. Always replaced as one value.
///
/// `start` and `end` hold the local wall-clock text the admin entered
/// (`YYYY-MM-DDTHH:MM`); they are parsed against the store time zone by the
/// schedule planner. `None` means "no bound", which schedules nothing for
/// that side of the window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub categories: CategorySet,
    #[serde(default)]
    pub logging_enabled: bool,
}

impl Configuration {
    /// Trims the window bounds and turns blank ones into `None`.
    pub fn sanitized(self) -> Self {
        Self {
            start: clean(self.start),
            end: clean(self.end),
            ..self
        }
    }
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
