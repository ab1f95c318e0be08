pub mod planner;
pub mod timer;
pub mod types;
pub mod window;

pub use planner::{PlannerConfig, SchedulePlanner};
pub use timer::{TimerHandler, TimerService, TokioTimerService};
pub use types::{ScheduledTimer, TimerAction};
pub use window::ScheduleWindow;
