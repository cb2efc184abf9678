// src/error.rs

//! Unified error handling for ingestion and serving.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for dataset loading.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// A single fetch attempt ran out of time
    #[error("Request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Image decode/encode failed
    #[error("Transcode error: {0}")]
    Transcode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Dataset could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl AppError {
    /// Create a transcode error.
    pub fn transcode(message: impl fmt::Display) -> Self {
        Self::Transcode(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<image::ImageError> for AppError {
    fn from(error: image::ImageError) -> Self {
        Self::transcode(error)
    }
}

/// Failure of one dataset initialization attempt.
///
/// Cloneable so that every caller waiting on the same initialization
/// observes the same error.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// Segment file missing or unreadable
    #[error("Failed to read segment {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    /// Segment payload is not valid gzip content
    #[error("Failed to decompress segment {}: {source}", .path.display())]
    Decompress {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    /// Decompressed payload is not a well-formed segment
    #[error("Failed to parse segment {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

impl LoadError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn decompress(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Decompress {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Path of the segment that caused the failure.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Decompress { path, .. } | Self::Parse { path, .. } => {
                path
            }
        }
    }
}
