// src/config.rs

//! Input loading utilities.
//!
//! Configuration itself is loaded through `Config::load`; this module reads
//! the ingestion source mapping.

use std::path::Path;

use crate::error::Result;
use crate::models::SourceMapping;

/// Load the ingestion source: a JSON object mapping emoji name to image URL.
///
/// Document order is preserved, so chunk boundaries are stable across runs.
pub fn load_source(path: &Path) -> Result<SourceMapping> {
    let content = std::fs::read_to_string(path)?;
    let source: SourceMapping = serde_json::from_str(&content)?;
    log::info!("Loaded {} emoji sources from {}", source.len(), path.display());
    Ok(source)
}
