//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── emojis_base64_segment_1.json.gz
//! ├── emojis_base64_segment_2.json.gz
//! └── emojis_base64_segment_N.json.gz
//! ```
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write never leaves a truncated segment behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Segment;
use crate::storage::{SegmentStorage, WriteMetadata, codec, segment_file_name, segment_number};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    compress: bool,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory, writing
    /// gzip-compressed segments.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            compress: true,
        }
    }

    /// Toggle gzip compression of written segments.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    #[cfg(test)]
    pub async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Segment files under the root, ordered by segment number.
    pub async fn segment_paths(&self) -> Result<Vec<PathBuf>> {
        list_segments(&self.root_dir).await
    }
}

#[async_trait]
impl SegmentStorage for LocalStorage {
    fn segment_key(&self, index: usize) -> String {
        segment_file_name(index, self.compress)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(key)).await?)
    }

    async fn write_segment(&self, key: &str, segment: &Segment) -> Result<WriteMetadata> {
        let bytes = codec::encode_segment(segment, self.compress)?;
        self.write_bytes(key, &bytes).await?;

        let location = self.path(key).display().to_string();
        log::info!(
            "Segment written: {} entries, {} bytes to {}",
            segment.len(),
            bytes.len(),
            location
        );

        Ok(WriteMetadata {
            location,
            entries: segment.len(),
            bytes: bytes.len(),
            timestamp: Utc::now(),
        })
    }
}

/// List segment files in `dir`, ordered by segment number.
///
/// When both a `.json` and a `.json.gz` exist for the same number only the
/// compressed file is kept, since that is what the loader reads.
pub async fn list_segments(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(usize, bool, PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(number) = segment_number(name) {
            found.push((number, name.ends_with(".gz"), entry.path()));
        }
    }

    // compressed first within the same number, then dedup by number
    found.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    found.dedup_by_key(|(number, _, _)| *number);

    Ok(found.into_iter().map(|(_, _, path)| path).collect())
}
