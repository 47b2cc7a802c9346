//! Error types for configuration and seed loading.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, configuration checks, and seed validation.

use bookstore_schema_core::ValidationError;
use thiserror::Error;

/// Errors that can occur while loading configuration or seed data.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Configuration failed a consistency check.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Seed data does not fit the catalog.
    #[error("invalid seed: {0}")]
    InvalidSeed(#[from] ValidationError),

    /// Seed file extension is neither YAML nor JSON.
    #[error("unsupported seed format: {0}")]
    UnsupportedFormat(String),

    /// All configured loader sources failed.
    #[error("no seed sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
