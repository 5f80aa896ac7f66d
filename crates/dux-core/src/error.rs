//! Error types for scanning and configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal conditions that prevent a scan from starting.
///
/// Failures below the root never surface here; they are counted in
/// [`ScanStats::access_errors`](crate::ScanStats) instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root path could not be stat'ed.
    #[error("Cannot stat root path {path}: {source}")]
    RootStatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path exists but is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The worker pool could not be started.
    #[error("Failed to start scan workers: {message}")]
    WorkerPool { message: String },
}

impl ScanError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> ScanErrorCode {
        match self {
            Self::RootStatFailed { .. } => ScanErrorCode::RootStatFailed,
            Self::NotADirectory { .. } => ScanErrorCode::NotDirectory,
            Self::WorkerPool { .. } => ScanErrorCode::WorkerPool,
        }
    }

    /// Path the error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::RootStatFailed { path, .. } | Self::NotADirectory { path } => Some(path),
            Self::WorkerPool { .. } => None,
        }
    }
}

/// Kind of fatal scan error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanErrorCode {
    RootStatFailed,
    NotDirectory,
    WorkerPool,
}

/// Errors raised while loading, saving or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be written.
    #[error("Cannot write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration value had the wrong shape.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A pattern rule carries a glob that does not compile.
    #[error("Invalid pattern '{pattern}' in rule '{rule}': {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },
}
