//! Infrastructure: ports, storage adapters, clock, settings.

pub mod clock;
pub mod file_store;
pub mod memory_store;
pub mod ports;
pub mod settings;
