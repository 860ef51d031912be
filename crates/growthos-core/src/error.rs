//! Core error types.

use thiserror::Error;

use crate::lead::Stage;

/// Errors raised by the core domain model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Unrecognised simulation mode.
    #[error("unknown mode '{0}' (expected 'new' or 'old')")]
    UnknownMode(String),

    /// Stage change not allowed by the funnel.
    #[error("invalid stage transition {from} -> {to}")]
    InvalidTransition {
        /// Current stage.
        from: Stage,
        /// Requested stage.
        to: Stage,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
