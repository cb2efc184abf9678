//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::retry::{Backoff, RetryPolicy};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP retrieval settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Chunked ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Image transcoding settings
    #[serde(default)]
    pub transcode: TranscodeConfig,

    /// Runtime dataset location
    #[serde(default)]
    pub store: StoreConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_attempts == 0 {
            return Err(AppError::validation("fetch.max_attempts must be > 0"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.ingest.chunk_size == 0 {
            return Err(AppError::validation("ingest.chunk_size must be > 0"));
        }
        if self.ingest.prefix.is_empty() {
            return Err(AppError::validation("ingest.prefix is empty"));
        }
        if self.transcode.size == 0 {
            return Err(AppError::validation("transcode.size must be > 0"));
        }
        if self.transcode.quality > 100 {
            return Err(AppError::validation("transcode.quality must be <= 100"));
        }
        Ok(())
    }
}

/// How long to wait between failed fetch attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Retry immediately
    #[default]
    None,
    /// Constant delay of `backoff_base_ms`
    Fixed,
    /// Doubling delay starting at `backoff_base_ms`, capped at `backoff_max_ms`
    Exponential,
}

/// HTTP retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total attempts per URL, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock bound on a single attempt, in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Skip TLS peer verification. This weakens transport authenticity and
    /// exists only because some image hosts serve broken certificate chains.
    #[serde(default = "defaults::accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub backoff: BackoffKind,

    #[serde(default)]
    pub backoff_base_ms: u64,

    #[serde(default)]
    pub backoff_max_ms: u64,

    /// Randomize exponential delays
    #[serde(default)]
    pub jitter: bool,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.backoff_base_ms);
        let backoff = match self.backoff {
            BackoffKind::None => Backoff::None,
            BackoffKind::Fixed => Backoff::Fixed(base),
            BackoffKind::Exponential => Backoff::Exponential {
                base,
                max: Duration::from_millis(self.backoff_max_ms.max(self.backoff_base_ms)),
                jitter: self.jitter,
            },
        };
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            accept_invalid_certs: defaults::accept_invalid_certs(),
            backoff: BackoffKind::None,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
            jitter: false,
        }
    }
}

/// Chunked ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Entries per chunk (and per segment file)
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// First chunk to process; earlier chunks are assumed complete
    #[serde(default)]
    pub start_index: usize,

    /// Pause between chunks, in seconds
    #[serde(default = "defaults::chunk_pause")]
    pub chunk_pause_secs: u64,

    /// Gzip segment files (required for the runtime loader)
    #[serde(default = "defaults::compress")]
    pub compress: bool,

    /// Skip chunks whose segment file already exists
    #[serde(default)]
    pub skip_existing: bool,

    /// Data URI prefix written into every segment
    #[serde(default = "defaults::prefix")]
    pub prefix: String,

    /// Directory segment files are written to
    #[serde(default = "defaults::segment_dir")]
    pub output_dir: PathBuf,
}

impl IngestConfig {
    pub fn chunk_pause(&self) -> Duration {
        Duration::from_secs(self.chunk_pause_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::chunk_size(),
            start_index: 0,
            chunk_pause_secs: defaults::chunk_pause(),
            compress: defaults::compress(),
            skip_existing: false,
            prefix: defaults::prefix(),
            output_dir: defaults::segment_dir(),
        }
    }
}

/// Image transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Edge length of the square output canvas
    #[serde(default = "defaults::canvas_size")]
    pub size: u32,

    /// Quality target (0-100)
    #[serde(default = "defaults::quality")]
    pub quality: u8,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            size: defaults::canvas_size(),
            quality: defaults::quality(),
        }
    }
}

/// Runtime dataset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory scanned for segment files when `segments` is empty
    #[serde(default = "defaults::segment_dir")]
    pub segment_dir: PathBuf,

    /// Explicit segment paths, in merge order
    #[serde(default)]
    pub segments: Vec<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            segment_dir: defaults::segment_dir(),
            segments: Vec::new(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Log one line per processed item during ingestion
    #[serde(default = "defaults::show_progress")]
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            show_progress: defaults::show_progress(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Fetch defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; emoji-atlas/0.1)".into()
    }
    pub fn accept_invalid_certs() -> bool {
        true
    }

    // Ingest defaults
    pub fn chunk_size() -> usize {
        500
    }
    pub fn chunk_pause() -> u64 {
        30
    }
    pub fn compress() -> bool {
        true
    }
    pub fn prefix() -> String {
        crate::models::DEFAULT_PREFIX.into()
    }
    pub fn segment_dir() -> PathBuf {
        PathBuf::from("segments")
    }

    // Transcode defaults
    pub fn canvas_size() -> u32 {
        72
    }
    pub fn quality() -> u8 {
        80
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn show_progress() -> bool {
        true
    }
}
