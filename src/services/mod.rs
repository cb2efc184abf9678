//! Service layer for ingestion.
//!
//! - Image retrieval with retries (`Fetcher`)
//! - Retry delay policy (`RetryPolicy`)
//! - Image normalization (`Transcoder`)

pub mod fetcher;
pub mod retry;
mod transcoder;

pub use fetcher::{Fetcher, HttpTransport, Transport};
pub use retry::{Backoff, RetryPolicy};
pub use transcoder::Transcoder;
