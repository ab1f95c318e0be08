pub mod model;
pub mod repository;
pub mod repository_sqlx;
pub mod store;

pub use model::Configuration;
pub use repository::SettingsRepository;
pub use repository_sqlx::SqlxSettingsRepository;
pub use store::SettingsStore;
