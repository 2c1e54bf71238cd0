//! Loresmith Engine library.
//!
//! Reconciles loosely-structured state-change proposals from the narrator and
//! from operators into each campaign's canonical state document.
//!
//! ## Structure
//!
//! - `reconciliation/` - Path parsing, deep merge, mission ledger, combat cleanup
//! - `use_cases/` - Directive and turn orchestration (load, reconcile, save)
//! - `infrastructure/` - Ports and adapters (state stores, clock, settings)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod reconciliation;
pub mod use_cases;

/// Test fixtures shared by unit and flow tests.
#[cfg(test)]
pub mod test_fixtures;

/// End-to-end flows against the real stores.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
