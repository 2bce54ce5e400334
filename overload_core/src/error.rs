//! Error types for the overload_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for overload_core operations
///
/// Business outcomes (unresolved names, missing history, malformed set
/// fields) are never reported through this type; they live in the plan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Negative or NaN weight handed to the quantizer
    #[error("Invalid weight: {0}")]
    InvalidWeight(f64),

    /// No stored snapshot for the requested client
    #[error("No snapshot found for client '{0}'")]
    SnapshotNotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
