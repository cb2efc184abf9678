// src/store.rs

//! Lazily loaded emoji lookups.
//!
//! [`EmojiStore`] is the handle a host application creates once and shares.
//! The first lookup (or an explicit [`EmojiStore::initialize`]) loads every
//! segment and builds the codepoint index; concurrent first callers all wait
//! on that single build. Once loaded the catalog is immutable and reads take
//! no lock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::{LoadError, LoadResult};
use crate::models::{Dataset, EmojiRecord, StoreConfig};
use crate::pipeline::{Loader, UnicodeIndex};

/// A loaded dataset together with its codepoint index.
#[derive(Debug)]
pub struct Catalog {
    dataset: Dataset,
    index: UnicodeIndex,
}

impl Catalog {
    pub fn build(dataset: Dataset) -> Self {
        let index = UnicodeIndex::build(&dataset);
        Self { dataset, index }
    }

    pub fn prefix(&self) -> &str {
        self.dataset.prefix()
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn record_by_name(&self, name: &str) -> Option<&EmojiRecord> {
        self.dataset.get(name)
    }

    pub fn record_by_unicode(&self, unicode: &str) -> Option<&EmojiRecord> {
        self.index.get(unicode).and_then(|name| self.dataset.get(name))
    }

    /// Data URI for `name`.
    pub fn by_name(&self, name: &str) -> Option<String> {
        self.record_by_name(name).map(|r| r.data_uri(self.prefix()))
    }

    /// Data URI for a `unicode` string such as `"U+1F600"`.
    pub fn by_unicode(&self, unicode: &str) -> Option<String> {
        self.record_by_unicode(unicode).map(|r| r.data_uri(self.prefix()))
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Names replaced by a later segment during the merge.
    pub fn duplicate_names(&self) -> usize {
        self.dataset.duplicate_names()
    }

    /// Records that displaced an earlier record with the same unicode.
    pub fn duplicate_unicodes(&self) -> usize {
        self.index.duplicates()
    }
}

type Build = Shared<BoxFuture<'static, LoadResult<Arc<Catalog>>>>;

/// Emoji lookups backed by segments loaded on first use.
pub struct EmojiStore {
    loader: Arc<Loader>,
    catalog: OnceLock<Arc<Catalog>>,
    pending: Mutex<Option<Build>>,
    load_attempts: AtomicUsize,
}

impl EmojiStore {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader: Arc::new(loader),
            catalog: OnceLock::new(),
            pending: Mutex::new(None),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Explicit segment list if configured, otherwise discover `segment_dir`.
    pub fn from_config(config: &StoreConfig) -> Self {
        let loader = if config.segments.is_empty() {
            Loader::discover(&config.segment_dir)
        } else {
            Loader::new(config.segments.iter().cloned())
        };
        Self::new(loader)
    }

    /// Load and index the dataset if that has not happened yet.
    ///
    /// Concurrent callers share a single load. A failed load is reported to
    /// every caller that waited on it and is not remembered: the next call
    /// starts a fresh attempt.
    pub async fn initialize(&self) -> LoadResult<Arc<Catalog>> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(Arc::clone(catalog));
        }

        let build = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            // published while we were waiting for the lock
            if let Some(catalog) = self.catalog.get() {
                return Ok(Arc::clone(catalog));
            }
            match pending.as_ref() {
                Some(build) => build.clone(),
                None => {
                    let build = self.start_build();
                    *pending = Some(build.clone());
                    build
                }
            }
        };

        let outcome = build.clone().await;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match &outcome {
            Ok(catalog) => {
                let _ = self.catalog.set(Arc::clone(catalog));
            }
            Err(error) => {
                log::error!("Emoji dataset initialization failed: {}", error);
            }
        }
        if pending.as_ref().is_some_and(|current| current.ptr_eq(&build)) {
            *pending = None;
        }

        outcome
    }

    fn start_build(&self) -> Build {
        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let loader = Arc::clone(&self.loader);

        async move {
            log::info!("Loading emoji dataset (attempt {})", attempt);
            let dataset = loader.load().await?;
            let catalog = Catalog::build(dataset);
            log::info!(
                "Emoji dataset ready: {} names, {} unicode keys",
                catalog.len(),
                catalog.index.len()
            );
            Ok::<_, LoadError>(Arc::new(catalog))
        }
        .boxed()
        .shared()
    }

    /// Data URI for the emoji called `name`.
    pub async fn get_by_name(&self, name: &str) -> LoadResult<Option<String>> {
        let catalog = self.initialize().await?;
        Ok(catalog.by_name(name))
    }

    /// Data URI for the emoji with the given `unicode` string.
    pub async fn get_by_unicode(&self, unicode: &str) -> LoadResult<Option<String>> {
        let catalog = self.initialize().await?;
        Ok(catalog.by_unicode(unicode))
    }

    /// Read-only view of the whole dataset.
    pub async fn get_all(&self) -> LoadResult<Arc<Catalog>> {
        self.initialize().await
    }

    /// Number of distinct emoji names.
    pub async fn get_count(&self) -> LoadResult<usize> {
        Ok(self.initialize().await?.len())
    }

    pub fn is_ready(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// How many load attempts have been started so far.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }
}
