pub mod model;
pub mod mutator;
pub mod policy;
pub mod repository;
pub mod repository_sqlx;
pub mod store;

pub use model::{PurchasabilityOverride, Target};
pub use mutator::FlagMutator;
pub use policy::PurchasabilityPolicy;
pub use store::OverrideStore;
