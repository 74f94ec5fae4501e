//! Workspace base error type.
//!
//! Sub-crates define their own error enums and either convert them into
//! `CoreError` or wrap `CoreError` as one variant (`tagq-sim` does the latter).

use thiserror::Error;

/// The error type for `tagq-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tagq-core`.
pub type CoreResult<T> = Result<T, CoreError>;
