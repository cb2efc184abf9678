// src/pipeline/chunk.rs

//! Order-preserving partitioning of the ingestion source.

use crate::error::{AppError, Result};
use crate::models::SourceMapping;

/// A bounded, ordered slice of the source mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 0-based position among all chunks
    pub index: usize,
    /// `(name, url)` pairs in source order
    pub entries: Vec<(&'a str, &'a str)>,
}

impl Chunk<'_> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `source` into chunks of `chunk_size` entries; the last may be shorter.
pub fn split_chunks(source: &SourceMapping, chunk_size: usize) -> Result<Vec<Chunk<'_>>> {
    if chunk_size == 0 {
        return Err(AppError::validation("chunk size must be > 0"));
    }

    let entries: Vec<(&str, &str)> = source
        .iter()
        .map(|(name, url)| (name.as_str(), url.as_str()))
        .collect();

    Ok(entries
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            index,
            entries: slice.to_vec(),
        })
        .collect())
}
