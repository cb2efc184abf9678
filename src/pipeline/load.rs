// src/pipeline/load.rs

//! Segment loading: read, inflate, parse and merge into one dataset.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;

use crate::error::{LoadError, LoadResult};
use crate::models::{Dataset, Segment};
use crate::storage::{codec, local::list_segments};

/// Where the loader finds its segments.
#[derive(Debug, Clone)]
pub enum SegmentSource {
    /// Explicit paths, in merge order
    Paths(Vec<PathBuf>),
    /// Every segment file in a directory, ordered by segment number
    Directory(PathBuf),
}

/// Reads a fixed, ordered set of segment files into a [`Dataset`].
#[derive(Debug, Clone)]
pub struct Loader {
    source: SegmentSource,
}

impl Loader {
    /// Load exactly these segments; the first must carry the prefix.
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            source: SegmentSource::Paths(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Load every segment found in `dir` at load time.
    pub fn discover(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: SegmentSource::Directory(dir.into()),
        }
    }

    /// Resolve the ordered list of segment paths.
    pub async fn paths(&self) -> LoadResult<Vec<PathBuf>> {
        match &self.source {
            SegmentSource::Paths(paths) => Ok(paths.clone()),
            SegmentSource::Directory(dir) => list_segments(dir).await.map_err(|e| match e {
                crate::error::AppError::Io(io) => LoadError::read(dir, io),
                other => LoadError::parse(dir, other),
            }),
        }
    }

    /// Read all segments concurrently and merge them in path order.
    pub async fn load(&self) -> LoadResult<Dataset> {
        let paths = self.paths().await?;
        let Some(first) = paths.first() else {
            let origin = match &self.source {
                SegmentSource::Directory(dir) => dir.clone(),
                SegmentSource::Paths(_) => PathBuf::new(),
            };
            return Err(LoadError::parse(origin, "no segment files to load"));
        };

        // try_join_all yields results in input order regardless of which
        // read finishes first
        let segments = try_join_all(paths.iter().map(|path| read_segment(path))).await?;

        let mut segments = segments.into_iter();
        let head = segments.next().unwrap_or_default();
        let Some(prefix) = head.prefix.clone() else {
            return Err(LoadError::parse(first, "first segment has no `prefix`"));
        };

        let mut dataset = Dataset::new(prefix);
        dataset.merge(head);
        for segment in segments {
            dataset.merge(segment);
        }

        if dataset.duplicate_names() > 0 {
            log::warn!(
                "{} emoji names appear in more than one segment; later segments won",
                dataset.duplicate_names()
            );
        }
        log::info!(
            "Loaded {} emojis from {} segments",
            dataset.len(),
            paths.len()
        );

        Ok(dataset)
    }
}

/// Read, inflate and parse one segment file.
pub async fn read_segment(path: &Path) -> LoadResult<Segment> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::read(path, e))?;
    let json = codec::decompress(&raw).map_err(|e| LoadError::decompress(path, e))?;
    serde_json::from_slice(&json).map_err(|e| LoadError::parse(path, e))
}
