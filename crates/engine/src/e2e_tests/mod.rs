//! End-to-end flow tests.
//!
//! These tests drive complete `App` instances through the public use cases,
//! against the in-memory store and the JSON file store:
//! - Narrator turns with combat cleanup
//! - Operator directives, including legacy ledger repair
//! - Concurrent directives (last write wins)
//!
//! ```bash
//! cargo test -p loresmith-engine --lib e2e_tests
//! ```

mod e2e_helpers;

pub use e2e_helpers::*;
