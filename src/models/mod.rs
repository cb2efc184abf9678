// src/models/mod.rs

//! Domain models shared by ingestion and serving.

mod config;
mod dataset;
mod emoji;

// Re-export all public types
pub use config::{
    BackoffKind, Config, FetchConfig, IngestConfig, LoggingConfig, StoreConfig, TranscodeConfig,
};
pub use dataset::Dataset;
pub use emoji::{DEFAULT_PREFIX, EmojiRecord, Segment, SegmentEntry};

/// Ingestion input: emoji name to source image URL, in document order.
pub type SourceMapping = indexmap::IndexMap<String, String>;
