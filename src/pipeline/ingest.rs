// src/pipeline/ingest.rs

//! Chunked, resumable ingestion of emoji images into segment files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::error::Result;
use crate::models::{Config, Segment, SegmentEntry, SourceMapping};
use crate::services::{Fetcher, Transcoder};
use crate::storage::SegmentStorage;
use crate::utils::url::{is_fetchable, unicode_from_url};

use super::chunk::{Chunk, split_chunks};

/// Knobs for a single ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Data URI prefix written into every segment
    pub prefix: String,
    /// Pause after each chunk except the last
    pub chunk_pause: Duration,
    /// Skip chunks whose segment already exists in storage
    pub skip_existing: bool,
    /// Log every processed item
    pub show_progress: bool,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.ingest.prefix.clone(),
            chunk_pause: config.ingest.chunk_pause(),
            skip_existing: config.ingest.skip_existing,
            show_progress: config.logging.show_progress,
        }
    }
}

/// Summary of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub chunks_total: usize,
    pub chunks_written: usize,
    pub chunks_skipped: usize,
    pub chunks_failed: usize,
    pub items_ok: usize,
    pub items_failed: usize,
    pub segments: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of processing one chunk.
#[derive(Debug, Default)]
struct ChunkOutcome {
    emojis: IndexMap<String, SegmentEntry>,
    failed: usize,
}

/// Drives fetch → transcode → persist over the source, one chunk at a time.
///
/// Items inside a chunk are processed sequentially, which bounds both the
/// number of open connections and the resident size of a run.
pub struct IngestPipeline {
    fetcher: Fetcher,
    transcoder: Transcoder,
    storage: Arc<dyn SegmentStorage>,
    options: IngestOptions,
}

impl IngestPipeline {
    pub fn new(
        fetcher: Fetcher,
        transcoder: Transcoder,
        storage: Arc<dyn SegmentStorage>,
        options: IngestOptions,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            storage,
            options,
        }
    }

    /// Process chunks `start_index..` of `source`, writing one segment each.
    ///
    /// Chunks before `start_index` are not touched, so a crashed run can be
    /// resumed from the first chunk without a segment. A storage failure only
    /// costs its own chunk and is counted in [`IngestReport::chunks_failed`].
    pub async fn run(
        &self,
        source: &SourceMapping,
        chunk_size: usize,
        start_index: usize,
    ) -> Result<IngestReport> {
        let started_at = Utc::now();
        let chunks = split_chunks(source, chunk_size)?;
        let total = chunks.len();

        let mut report = IngestReport {
            chunks_total: total,
            chunks_written: 0,
            chunks_skipped: 0,
            chunks_failed: 0,
            items_ok: 0,
            items_failed: 0,
            segments: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        if start_index >= total {
            log::warn!(
                "Start index {} is past the last chunk ({} chunks); nothing to do",
                start_index,
                total
            );
            report.finished_at = Utc::now();
            return Ok(report);
        }

        crate::utils::log::header(&format!(
            "Ingesting {} emojis in {} chunks of {} (starting at chunk {})",
            source.len(),
            total,
            chunk_size,
            start_index + 1
        ));

        for chunk in &chunks[start_index..] {
            let key = self.storage.segment_key(chunk.index);
            crate::utils::log::step(chunk.index + 1, total, &format!("Processing segment {key}"));

            if self.options.skip_existing {
                match self.storage.exists(&key).await {
                    Ok(true) => {
                        log::info!("Segment {} already exists, skipping", key);
                        report.chunks_skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(error) => {
                        log::error!("Failed to check segment {}: {}", key, error);
                        report.chunks_failed += 1;
                        self.pause_after(chunk, total).await;
                        continue;
                    }
                }
            }

            let outcome = self.process_chunk(chunk).await;
            let fetched = outcome.emojis.len();
            report.items_failed += outcome.failed;

            let segment = Segment {
                prefix: Some(self.options.prefix.clone()),
                emojis: outcome.emojis,
            };
            match self.storage.write_segment(&key, &segment).await {
                Ok(meta) => {
                    report.chunks_written += 1;
                    report.items_ok += fetched;
                    report.segments.push(PathBuf::from(meta.location));
                }
                Err(error) => {
                    log::error!("Failed to write segment {}: {}", key, error);
                    report.chunks_failed += 1;
                    report.items_failed += fetched;
                }
            }

            // relief point: release this chunk's buffers before the next one
            drop(segment);
            tokio::task::yield_now().await;

            self.pause_after(chunk, total).await;
        }

        report.finished_at = Utc::now();
        crate::utils::log::summary(
            "Ingestion",
            &[
                ("chunks", format!("{}/{}", report.chunks_written, total)),
                ("skipped", report.chunks_skipped.to_string()),
                ("failed", report.chunks_failed.to_string()),
                ("emojis written", report.items_ok.to_string()),
                ("emojis dropped", report.items_failed.to_string()),
                (
                    "elapsed",
                    format!("{}s", (report.finished_at - started_at).num_seconds()),
                ),
            ],
        );

        Ok(report)
    }

    /// Sleep between chunks; the last chunk of the source needs no pause.
    async fn pause_after(&self, chunk: &Chunk<'_>, total: usize) {
        if chunk.index + 1 == total || self.options.chunk_pause.is_zero() {
            return;
        }
        log::info!("Sleeping for {:?} before next chunk", self.options.chunk_pause);
        tokio::time::sleep(self.options.chunk_pause).await;
    }

    /// Fetch and transcode every entry of one chunk; failures drop the item.
    async fn process_chunk(&self, chunk: &Chunk<'_>) -> ChunkOutcome {
        let mut outcome = ChunkOutcome::default();
        let count = chunk.len();

        for (position, (name, url)) in chunk.entries.iter().enumerate() {
            if self.options.show_progress {
                log::info!("Processing {}/{} for image {}...", position + 1, count, name);
            }

            if !is_fetchable(url) {
                log::warn!("Skipping {}: invalid source URL {:?}", name, url);
                outcome.failed += 1;
                continue;
            }

            let Some(bytes) = self.fetcher.fetch(url).await else {
                log::warn!("Skipping {}: no data from {}", name, url);
                outcome.failed += 1;
                continue;
            };

            match self.transcoder.transcode(&bytes) {
                Ok(png) => {
                    outcome.emojis.insert(
                        name.to_string(),
                        SegmentEntry {
                            unicode: unicode_from_url(url),
                            payload: STANDARD.encode(png),
                        },
                    );
                }
                Err(error) => {
                    log::error!("Error processing {}: {}", name, error);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use tempfile::TempDir;

    use crate::error::AppError;
    use crate::pipeline::Loader;
    use crate::services::{RetryPolicy, Transport};
    use crate::storage::{LocalStorage, WriteMetadata};

    /// Serves canned bodies by URL; unknown URLs fail with 404.
    struct MapTransport {
        bodies: HashMap<String, Vec<u8>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for MapTransport {
        async fn get(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies.get(url).cloned().ok_or_else(|| AppError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn url(name: &str, code: &str) -> String {
        format!("https://cdn.example/thumbs/{name}_{code}.png")
    }

    struct Fixture {
        _tmp: TempDir,
        storage: Arc<LocalStorage>,
        transport: Arc<MapTransport>,
        source: SourceMapping,
    }

    /// Five emojis: "broken" serves non-image bytes and "missing" 404s.
    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));

        let mut source = SourceMapping::new();
        let mut bodies = HashMap::new();
        for (name, code) in [
            ("grinning-face", "1f600"),
            ("red-heart", "2764-fe0f"),
            ("broken", "1f4a5"),
            ("missing", "2753"),
            ("star", "2b50"),
        ] {
            let url = url(name, code);
            match name {
                "broken" => {
                    bodies.insert(url.clone(), b"not an image".to_vec());
                }
                "missing" => {}
                _ => {
                    bodies.insert(url.clone(), png_bytes());
                }
            }
            source.insert(name.to_string(), url);
        }

        Fixture {
            _tmp: tmp,
            storage,
            transport: Arc::new(MapTransport {
                bodies,
                calls: AtomicUsize::new(0),
            }),
            source,
        }
    }

    /// Delegates to local storage but refuses to write one key.
    struct RejectingStorage {
        inner: Arc<LocalStorage>,
        rejected: String,
    }

    #[async_trait]
    impl SegmentStorage for RejectingStorage {
        fn segment_key(&self, index: usize) -> String {
            self.inner.segment_key(index)
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            self.inner.exists(key).await
        }

        async fn write_segment(&self, key: &str, segment: &Segment) -> Result<WriteMetadata> {
            if key == self.rejected {
                return Err(AppError::Io(std::io::Error::other("disk full")));
            }
            self.inner.write_segment(key, segment).await
        }
    }

    fn pipeline_with(
        fx: &Fixture,
        storage: Arc<dyn SegmentStorage>,
        skip_existing: bool,
        chunk_pause: Duration,
    ) -> IngestPipeline {
        IngestPipeline::new(
            Fetcher::new(
                fx.transport.clone(),
                RetryPolicy::immediate(2),
                Duration::from_secs(1),
            ),
            Transcoder::default(),
            storage,
            IngestOptions {
                prefix: crate::models::DEFAULT_PREFIX.to_string(),
                chunk_pause,
                skip_existing,
                show_progress: false,
            },
        )
    }

    fn pipeline(fx: &Fixture, skip_existing: bool) -> IngestPipeline {
        pipeline_with(fx, fx.storage.clone(), skip_existing, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_bad_items_do_not_abort_chunk() {
        let fx = fixture();
        let report = pipeline(&fx, false).run(&fx.source, 2, 0).await.unwrap();

        assert_eq!(report.chunks_total, 3);
        assert_eq!(report.chunks_written, 3);
        assert_eq!(report.items_ok, 3);
        assert_eq!(report.items_failed, 2);
        // the 404 is retried once more, everything else succeeds first time
        assert_eq!(fx.transport.calls.load(Ordering::SeqCst), 6);

        let paths = fx.storage.segment_paths().await.unwrap();
        assert_eq!(paths.len(), 3);

        let dataset = Loader::new(paths).load().await.unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(dataset.get("broken").is_none());
        assert!(dataset.get("missing").is_none());

        let heart = dataset.get("red-heart").unwrap();
        assert_eq!(heart.unicode, "U+2764 U+FE0F");
        let png = STANDARD.decode(&heart.payload).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (72, 72));
    }

    #[tokio::test]
    async fn test_resume_from_start_index() {
        let fx = fixture();
        let report = pipeline(&fx, false).run(&fx.source, 2, 1).await.unwrap();

        assert_eq!(report.chunks_written, 2);
        assert!(!fx.storage.exists("emojis_base64_segment_1.json.gz").await.unwrap());
        assert!(fx.storage.exists("emojis_base64_segment_2.json.gz").await.unwrap());
        assert!(fx.storage.exists("emojis_base64_segment_3.json.gz").await.unwrap());
    }

    #[tokio::test]
    async fn test_skip_existing_segments() {
        let fx = fixture();
        pipeline(&fx, false).run(&fx.source, 2, 2).await.unwrap();
        let calls_before = fx.transport.calls.load(Ordering::SeqCst);

        let report = pipeline(&fx, true).run(&fx.source, 2, 0).await.unwrap();
        assert_eq!(report.chunks_skipped, 1);
        assert_eq!(report.chunks_written, 2);
        // chunk 3 ("star") was not fetched again
        assert_eq!(
            fx.transport.calls.load(Ordering::SeqCst) - calls_before,
            2 + 1 + 2
        );
    }

    #[tokio::test]
    async fn test_start_past_end_is_noop() {
        let fx = fixture();
        let report = pipeline(&fx, false).run(&fx.source, 500, 1).await.unwrap();
        assert_eq!(report.chunks_total, 1);
        assert_eq!(report.chunks_written, 0);
        assert_eq!(fx.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_is_dropped_without_fetching() {
        let fx = fixture();
        let mut source = SourceMapping::new();
        source.insert("weird".into(), "not a url".into());

        let report = pipeline(&fx, false).run(&source, 10, 0).await.unwrap();
        assert_eq!(report.items_failed, 1);
        assert_eq!(report.chunks_written, 1);
        assert_eq!(fx.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_write_only_costs_its_chunk() {
        let fx = fixture();
        let storage = Arc::new(RejectingStorage {
            inner: fx.storage.clone(),
            rejected: "emojis_base64_segment_1.json.gz".to_string(),
        });

        let report = pipeline_with(&fx, storage, false, Duration::ZERO)
            .run(&fx.source, 2, 0)
            .await
            .unwrap();

        assert_eq!(report.chunks_written, 2);
        assert_eq!(report.chunks_failed, 1);
        // both emojis of the rejected chunk are lost, plus "broken" and "missing"
        assert_eq!(report.items_ok, 1);
        assert_eq!(report.items_failed, 4);
        // every item was still fetched, "missing" twice
        assert_eq!(fx.transport.calls.load(Ordering::SeqCst), 6);

        assert!(!fx.storage.exists("emojis_base64_segment_1.json.gz").await.unwrap());
        assert!(fx.storage.exists("emojis_base64_segment_2.json.gz").await.unwrap());
        assert!(fx.storage.exists("emojis_base64_segment_3.json.gz").await.unwrap());
        assert_eq!(report.segments.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_chunks_but_not_after_last() {
        let fx = fixture();
        let pause = Duration::from_secs(30);

        let started = tokio::time::Instant::now();
        let report = pipeline_with(&fx, fx.storage.clone(), false, pause)
            .run(&fx.source, 2, 0)
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.chunks_written, 3);
        assert!(elapsed >= pause * 2, "elapsed {elapsed:?}");
        assert!(elapsed < pause * 3, "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_chunk_is_not_paced() {
        let fx = fixture();
        pipeline(&fx, false).run(&fx.source, 2, 0).await.unwrap();
        std::fs::remove_file(fx.storage.path("emojis_base64_segment_2.json.gz")).unwrap();

        let pause = Duration::from_secs(30);
        let started = tokio::time::Instant::now();
        let report = pipeline_with(&fx, fx.storage.clone(), true, pause)
            .run(&fx.source, 2, 0)
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.chunks_skipped, 2);
        assert_eq!(report.chunks_written, 1);
        // only the rewritten middle chunk pauses; the last chunk never does
        assert!(elapsed >= pause, "elapsed {elapsed:?}");
        assert!(elapsed < pause * 2, "elapsed {elapsed:?}");
    }
}
