//! Pipeline entry points.
//!
//! - `IngestPipeline`: fetch, transcode and persist emoji images as segments
//! - `Loader`: read segments back into a merged `Dataset`
//! - `UnicodeIndex`: codepoint lookup derived from a `Dataset`

pub mod chunk;
pub mod index;
pub mod ingest;
pub mod load;

pub use chunk::{Chunk, split_chunks};
pub use index::UnicodeIndex;
pub use ingest::{IngestOptions, IngestPipeline, IngestReport};
pub use load::{Loader, SegmentSource, read_segment};
