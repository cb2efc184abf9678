//! Storage abstractions for segment persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! segments/
//! ├── emojis_base64_segment_1.json.gz
//! ├── emojis_base64_segment_2.json.gz
//! └── ...
//! ```
//!
//! Segment numbers are 1-based and derived from the chunk index, so an
//! interrupted ingestion run can resume at any chunk.

pub mod codec;
pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Segment;

// Re-export for convenience
pub use local::LocalStorage;

/// File name stem shared by all segment files.
pub const SEGMENT_STEM: &str = "emojis_base64_segment_";

/// File name for the segment produced by chunk `index` (0-based).
pub fn segment_file_name(index: usize, compressed: bool) -> String {
    let ext = if compressed { "json.gz" } else { "json" };
    format!("{}{}.{}", SEGMENT_STEM, index + 1, ext)
}

/// Parse the 1-based segment number out of a segment file name.
pub fn segment_number(file_name: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(SEGMENT_STEM)?;
    let digits = rest
        .strip_suffix(".json.gz")
        .or_else(|| rest.strip_suffix(".json"))?;
    digits.parse().ok()
}

/// Metadata about a segment write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Where the segment was written
    pub location: String,
    /// Number of emoji entries in the segment
    pub entries: usize,
    /// Bytes written to storage
    pub bytes: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for segment storage backends.
#[async_trait]
pub trait SegmentStorage: Send + Sync {
    /// Storage key for the segment produced by chunk `index`.
    fn segment_key(&self, index: usize) -> String;

    /// Whether a segment already exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Persist a segment under `key`, replacing any previous content.
    async fn write_segment(&self, key: &str, segment: &Segment) -> Result<WriteMetadata>;
}
