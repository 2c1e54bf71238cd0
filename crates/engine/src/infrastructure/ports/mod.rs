//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Campaign state storage (in-memory, JSON files, or a document database)
//! - Clock (for testing)

mod error;
mod store;
mod testing;

pub use error::RepoError;
pub use store::StateStore;
pub use testing::ClockPort;

#[cfg(test)]
pub use store::MockStateStore;
#[cfg(test)]
pub use testing::MockClockPort;
