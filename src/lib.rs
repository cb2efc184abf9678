// src/lib.rs

//! emoji-atlas: emoji name/codepoint to image dataset.
//!
//! Offline, [`pipeline::IngestPipeline`] turns a name → URL mapping into
//! gzip-compressed segment files. At runtime, [`store::EmojiStore`] loads
//! those segments on first use and answers lookups by name or codepoint.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod store;
pub mod utils;

pub use error::{AppError, LoadError, Result};
pub use store::{Catalog, EmojiStore};
