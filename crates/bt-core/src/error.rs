//! Shared error type for `bt-core`.
//!
//! Sub-crates define their own error enums and fold `CoreError` into them
//! where a bad coordinate surfaces through a loader.

use thiserror::Error;

/// The top-level error type for `bt-core`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

/// Shorthand result type for `bt-core`.
pub type CoreResult<T> = Result<T, CoreError>;
