//! Error types for the platform crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or querying a platform.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlatformError {
    /// The platform file could not be read.
    #[error("Failed to read platform file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// File extension not recognised.
    #[error("Unsupported platform format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// Hardware settings are unusable.
    #[error("Invalid hardware settings: {0}")]
    InvalidHardwareSettings(String),

    /// A gate decomposition could not be parsed.
    #[error("Invalid gate decomposition '{name}': {reason}")]
    InvalidDecomposition {
        /// Decomposition key as written in the configuration.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A resource definition is malformed.
    #[error("Invalid resource definition '{resource}': {reason}")]
    InvalidResource {
        /// Resource name.
        resource: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
