//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found")]
    Missing {
        /// Path that was looked up.
        path: PathBuf,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The configuration file is not valid TOML.
    #[error("malformed configuration file")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Source TOML error.
        source: toml::de::Error,
    },
    /// A field failed validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section containing the field.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}
