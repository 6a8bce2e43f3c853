//! Error types for StrataKV
//!
//! Provides a unified error type for all operations.
//!
//! There are no recoverable runtime errors: queries are infallible and
//! mutation never fails. Errors arise only from construction-time
//! preconditions (invalid configuration, unsorted bulk input).

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for StrataKV operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Bulk Construction Errors
    // -------------------------------------------------------------------------
    #[error("Bulk input not sorted: entry {position} is smaller than its predecessor")]
    UnsortedInput { position: usize },
}
