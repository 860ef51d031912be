//! Engine error types.

use std::io;
use thiserror::Error;

/// Errors raised while preparing the engine.
///
/// Scenario runs themselves never fail: a vanished lead or a reset simply
/// ends the run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The scenario catalog file could not be read.
    #[error("Failed to read scenario catalog at {path}: {source}")]
    CatalogRead {
        /// Catalog path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The scenario catalog is not valid TOML for the expected shape.
    #[error("Failed to parse scenario catalog at {path}: {source}")]
    CatalogParse {
        /// Catalog path, or `<builtin>`.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The scenario catalog parsed but is inconsistent.
    #[error("Invalid scenario catalog: {0}")]
    InvalidCatalog(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
