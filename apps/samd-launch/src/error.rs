//! # Application Errors
//!
//! Error types of the app layer. Core errors (`SamdError`) and generation
//! errors (`GenerationError`) are wrapped, not flattened.

use crate::generation::GenerationError;
use samd_launch_core::{SamdError, ValidationError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking `AssessorConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error of the CLI and server.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] SamdError),

    #[error("generation setup failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(String),

    /// The report was written but some records did not complete.
    #[error("{failed} of {total} records failed")]
    IncompleteBatch { failed: usize, total: usize },
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Core(SamdError::Validation(e))
    }
}

impl AppError {
    /// Process exit code for this error.
    ///
    /// `2` means the batch ran but was only partially assessed.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::IncompleteBatch { .. } => 2,
            _ => 1,
        }
    }
}
