pub mod orchestrator;

pub use orchestrator::{TransitionOrchestrator, TransitionOutcome};
