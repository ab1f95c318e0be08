use catalog::ItemId;
use thiserror::Error;

/// A rejected schedule window. Surfaces to whoever saved the configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {field} date/time {value:?}; expected YYYY-MM-DDTHH:MM")]
    InvalidDateTime { field: &'static str, value: String },

    #[error("start date must be before end date (start {start}, end {end})")]
    StartNotBeforeEnd { start: String, end: String },
}

/// Persistence failures. Fatal to the operation that hit them.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write override for item {item} ({applied} items already written)")]
    OverrideWrite {
        item: ItemId,
        applied: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to persist settings")]
    Settings(#[source] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
