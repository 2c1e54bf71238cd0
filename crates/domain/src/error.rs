//! Unified error types for the domain layer
//!
//! Most reconciliation paths degrade instead of failing, so this type is small:
//! it covers identifier parsing and the few places where a caller hands the
//! domain something that cannot be a game state document at all.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A value had the wrong JSON shape for where it was used
    #[error("Expected {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },
}

impl DomainError {
    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a shape mismatch error
    pub fn shape(expected: &'static str, found: &'static str) -> Self {
        Self::Shape { expected, found }
    }
}
