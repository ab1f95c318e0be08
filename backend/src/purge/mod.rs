pub mod invalidator;
pub mod transport;

pub use invalidator::{CacheInvalidator, PurgeReport};
pub use transport::{HttpPurgeTransport, PurgeError, PurgeTransport};
