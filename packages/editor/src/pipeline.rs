//! # Media Ingestion Pipeline
//!
//! Uploads pending files chunk by chunk and merges results into the draft.
//!
//! ```text
//! pending ──plan──▶ [chunk 0] ──upload──▶ merge ──▶ [chunk 1] ──upload──▶ merge ...
//! ```
//!
//! - At most one chunk is in flight; chunk N+1 starts only after chunk N's
//!   response is known
//! - Merged chunks are permanent. When chunk K fails, chunks before it stay
//!   in the draft and chunks K.. stay pending for a retry
//! - A success response with no items (or fewer items than files sent) is an
//!   integrity failure
//! - Each merged file's preview handle is released right after the merge
//! - The pipeline never holds the session state across an await. Each chunk
//!   is merged through a [`MergeTarget`] once its response is known, so the
//!   host keeps editing while a batch is in flight
//! - `Completed` is held on the signal by a spawned task; the upload call
//!   returns as soon as the last chunk is merged

use crate::collaborators::{MediaUploader, RemoteMedia};
use crate::config::EditorConfig;
use crate::draft::{DraftRecord, MediaItem, RecordId};
use crate::media::{plan_chunks, ChunkLimits, LocalId, PendingUpload};
use crate::preview::PreviewRegistry;
use atelier_common::{EditorError, EditorResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Blocking indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProgress {
    Idle,
    Optimizing,
    Completed,
}

/// Three-state progress signal observed by the host
#[derive(Debug, Clone)]
pub struct ProgressSignal {
    tx: Arc<watch::Sender<UploadProgress>>,
    /// Bumped on every transition so a stale hold never clears a newer state
    generation: Arc<AtomicU64>,
}

impl Default for ProgressSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UploadProgress::Idle);
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> UploadProgress {
        *self.tx.borrow()
    }

    pub fn set(&self, progress: UploadProgress) {
        self.transition(progress);
    }

    fn transition(&self, progress: UploadProgress) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(progress);
        generation
    }

    /// Show `Completed` now and return to `Idle` after `hold`, unless another
    /// transition happens first. Does not wait for the hold.
    pub fn complete(&self, hold: Duration) {
        let generation = self.transition(UploadProgress::Completed);
        if hold.is_zero() {
            self.set(UploadProgress::Idle);
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.set(UploadProgress::Idle);
            return;
        };

        let signal = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep(hold).await;
            if signal.generation.load(Ordering::SeqCst) == generation {
                signal.set(UploadProgress::Idle);
            }
        });
    }
}

/// What a fully successful run merged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub collection: String,
    pub merged: Vec<MediaItem>,
    pub chunks: usize,
}

/// Receives each uploaded chunk. Called between network calls, never across
/// one.
pub trait MergeTarget {
    /// Append `media` (the response for `chunk`) to `collection`, drop the
    /// chunk from the pending list and release its previews.
    fn merge(
        &mut self,
        collection: &str,
        chunk: &[PendingUpload],
        media: Vec<RemoteMedia>,
    ) -> EditorResult<Vec<MediaItem>>;
}

/// Borrowed session state the pipeline writes into directly
pub struct UploadTarget<'a> {
    pub draft: &'a mut DraftRecord,
    pub pending: &'a mut Vec<PendingUpload>,
    pub previews: &'a mut PreviewRegistry,
}

impl MergeTarget for UploadTarget<'_> {
    fn merge(
        &mut self,
        collection: &str,
        chunk: &[PendingUpload],
        media: Vec<RemoteMedia>,
    ) -> EditorResult<Vec<MediaItem>> {
        merge_chunk(self.draft, self.pending, self.previews, collection, chunk, media)
    }
}

/// Merge one chunk's response into `draft`.
pub fn merge_chunk(
    draft: &mut DraftRecord,
    pending: &mut Vec<PendingUpload>,
    previews: &mut PreviewRegistry,
    collection: &str,
    chunk: &[PendingUpload],
    media: Vec<RemoteMedia>,
) -> EditorResult<Vec<MediaItem>> {
    let items = draft.media_mut(collection).ok_or_else(|| {
        EditorError::validation(format!("'{}' is not a media collection", collection))
    })?;
    let mut merged = Vec::with_capacity(media.len());
    for remote in media {
        let item = remote.into_item(items.len());
        items.push(item.clone());
        merged.push(item);
    }

    let merged_ids: Vec<LocalId> = chunk.iter().map(|u| u.local_id).collect();
    pending.retain(|upload| !merged_ids.contains(&upload.local_id));
    for upload in chunk {
        previews.release(upload.preview);
    }
    Ok(merged)
}

pub struct MediaPipeline {
    uploader: Arc<dyn MediaUploader>,
    limits: ChunkLimits,
    completed_hold: Duration,
    progress: ProgressSignal,
}

impl MediaPipeline {
    pub fn new(uploader: Arc<dyn MediaUploader>, config: &EditorConfig) -> Self {
        Self {
            uploader,
            limits: ChunkLimits::from(config),
            completed_hold: config.completed_hold(),
            progress: ProgressSignal::new(),
        }
    }

    pub fn progress(&self) -> &ProgressSignal {
        &self.progress
    }

    pub fn limits(&self) -> ChunkLimits {
        self.limits
    }

    /// Upload `batch` (pending files of `collection`, in submission order) for
    /// record `owner`, merging each chunk into `target` as it lands.
    pub async fn upload<T: MergeTarget>(
        &self,
        owner: &RecordId,
        collection: &str,
        batch: Vec<PendingUpload>,
        target: &mut T,
    ) -> EditorResult<UploadReport> {
        let total = batch.len();
        let mut report = UploadReport {
            collection: collection.to_string(),
            ..UploadReport::default()
        };
        if total == 0 {
            return Ok(report);
        }

        let chunks = plan_chunks(batch, self.limits);
        report.chunks = chunks.len();
        tracing::info!(
            owner = %owner,
            collection,
            files = total,
            chunks = chunks.len(),
            "starting media upload"
        );
        self.progress.set(UploadProgress::Optimizing);

        for chunk in chunks {
            let files = chunk.entries.iter().map(|upload| upload.file.clone()).collect();
            let result = self
                .uploader
                .upload(owner, collection, files)
                .await
                .and_then(|items| {
                    if items.is_empty() {
                        Err(EditorError::integrity("upload succeeded but returned no media"))
                    } else if items.len() != chunk.len() {
                        Err(EditorError::integrity(format!(
                            "upload returned {} media for {} files",
                            items.len(),
                            chunk.len()
                        )))
                    } else {
                        Ok(items)
                    }
                })
                .and_then(|items| target.merge(collection, &chunk.entries, items));

            match result {
                Ok(merged) => report.merged.extend(merged),
                Err(source) => {
                    self.progress.set(UploadProgress::Idle);
                    let succeeded = report.merged.len();
                    tracing::warn!(
                        chunk = chunk.index,
                        succeeded,
                        pending = total - succeeded,
                        "media upload stopped: {}",
                        source
                    );
                    return Err(EditorError::PartialUpload {
                        succeeded,
                        pending: total - succeeded,
                        source: Box::new(source),
                    });
                }
            }
            tracing::debug!(chunk = chunk.index, files = chunk.len(), "chunk merged");
        }

        self.progress.complete(self.completed_hold);
        tracing::info!(collection, merged = report.merged.len(), "media upload finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Collection, RecordKind};
    use crate::media::FileHandle;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Uploader that fails on a chosen call and records call sizes
    struct ScriptedUploader {
        fail_call: Option<usize>,
        empty_call: Option<usize>,
        calls: Mutex<Vec<usize>>,
    }

    impl ScriptedUploader {
        fn new() -> Self {
            Self {
                fail_call: None,
                empty_call: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaUploader for ScriptedUploader {
        async fn upload(
            &self,
            _owner: &RecordId,
            _collection: &str,
            files: Vec<FileHandle>,
        ) -> EditorResult<Vec<RemoteMedia>> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(files.len());
                calls.len()
            };
            if self.fail_call == Some(call) {
                return Err(EditorError::network("connection reset"));
            }
            if self.empty_call == Some(call) {
                return Ok(Vec::new());
            }
            Ok(files
                .iter()
                .map(|f| RemoteMedia {
                    id: format!("remote-{}", f.name),
                    url: format!("https://cdn.test/{}", f.name),
                    thumbnail_url: None,
                    order: 0,
                    is_cover: false,
                })
                .collect())
        }
    }

    fn config() -> EditorConfig {
        EditorConfig {
            chunk_count_max: 4,
            completed_hold_ms: 0,
            ..EditorConfig::default()
        }
    }

    fn select(count: usize, previews: &mut PreviewRegistry) -> Vec<PendingUpload> {
        (0..count)
            .map(|i| PendingUpload {
                local_id: LocalId(i as u64),
                collection: "photos".to_string(),
                file: FileHandle::new(format!("{}.jpg", i), "image/jpeg", Utc::now(), vec![1u8; 16]),
                preview: previews.create(),
            })
            .collect()
    }

    fn draft() -> DraftRecord {
        let mut draft = DraftRecord::new(RecordKind::Property);
        draft
            .collections
            .insert("photos".to_string(), Collection::Media(Vec::new()));
        draft
    }

    #[tokio::test]
    async fn test_all_chunks_merge_in_order() {
        let uploader = Arc::new(ScriptedUploader::new());
        let pipeline = MediaPipeline::new(uploader.clone(), &config());
        let mut draft = draft();
        let mut previews = PreviewRegistry::new();
        let mut pending = select(10, &mut previews);

        let report = pipeline
            .upload(
                &RecordId::new("rec-1"),
                "photos",
                pending.clone(),
                &mut UploadTarget {
                    draft: &mut draft,
                    pending: &mut pending,
                    previews: &mut previews,
                },
            )
            .await
            .unwrap();

        assert_eq!(report.chunks, 3);
        assert_eq!(*uploader.calls.lock().unwrap(), vec![4, 4, 2]);
        let photos = draft.media("photos").unwrap();
        assert_eq!(photos.len(), 10);
        assert_eq!(photos[0].id, "remote-0.jpg");
        assert_eq!(photos[9].id, "remote-9.jpg");
        assert_eq!(photos[9].order, 9);
        assert!(pending.is_empty());
        assert_eq!(previews.outstanding(), 0);
        assert_eq!(pipeline.progress().current(), UploadProgress::Idle);
    }

    #[tokio::test]
    async fn test_second_chunk_failure_keeps_first() {
        let uploader = Arc::new(ScriptedUploader {
            fail_call: Some(2),
            ..ScriptedUploader::new()
        });
        let pipeline = MediaPipeline::new(uploader.clone(), &config());
        let mut draft = draft();
        let mut previews = PreviewRegistry::new();
        let mut pending = select(10, &mut previews);

        let err = pipeline
            .upload(
                &RecordId::new("rec-1"),
                "photos",
                pending.clone(),
                &mut UploadTarget {
                    draft: &mut draft,
                    pending: &mut pending,
                    previews: &mut previews,
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.succeeded_count(), Some(4));
        assert!(err.to_string().contains("4 file(s) uploaded, 6 still pending"));
        assert_eq!(draft.media("photos").unwrap().len(), 4);
        assert_eq!(pending.len(), 6);
        assert_eq!(pending[0].local_id, LocalId(4));
        assert_eq!(previews.outstanding(), 6);
        // The third chunk never started
        assert_eq!(uploader.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_success_is_integrity_failure() {
        let uploader = Arc::new(ScriptedUploader {
            empty_call: Some(1),
            ..ScriptedUploader::new()
        });
        let pipeline = MediaPipeline::new(uploader, &config());
        let mut draft = draft();
        let mut previews = PreviewRegistry::new();
        let mut pending = select(2, &mut previews);

        let err = pipeline
            .upload(
                &RecordId::new("rec-1"),
                "photos",
                pending.clone(),
                &mut UploadTarget {
                    draft: &mut draft,
                    pending: &mut pending,
                    previews: &mut previews,
                },
            )
            .await
            .unwrap_err();

        match err {
            EditorError::PartialUpload { succeeded, pending, source } => {
                assert_eq!(succeeded, 0);
                assert_eq!(pending, 2);
                assert!(matches!(*source, EditorError::Integrity(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(draft.media("photos").unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_state_is_held() {
        let signal = ProgressSignal::new();
        let mut rx = signal.subscribe();
        let hold = Duration::from_millis(1200);

        let started = tokio::time::Instant::now();
        signal.complete(hold);
        assert_eq!(signal.current(), UploadProgress::Completed);
        assert_eq!(started.elapsed(), Duration::ZERO);

        rx.borrow_and_update();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), UploadProgress::Idle);
        assert!(started.elapsed() >= hold);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_upload_outlives_stale_hold() {
        let signal = ProgressSignal::new();
        let hold = Duration::from_millis(1200);

        signal.complete(hold);
        tokio::time::sleep(Duration::from_millis(600)).await;
        signal.set(UploadProgress::Optimizing);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        // The first hold expired while the second batch was running
        assert_eq!(signal.current(), UploadProgress::Optimizing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_returns_before_hold_ends() {
        let uploader = Arc::new(ScriptedUploader::new());
        let pipeline = MediaPipeline::new(
            uploader,
            &EditorConfig {
                completed_hold_ms: 1200,
                ..config()
            },
        );
        let mut draft = draft();
        let mut previews = PreviewRegistry::new();
        let mut pending = select(3, &mut previews);

        let started = tokio::time::Instant::now();
        pipeline
            .upload(
                &RecordId::new("rec-1"),
                "photos",
                pending.clone(),
                &mut UploadTarget {
                    draft: &mut draft,
                    pending: &mut pending,
                    previews: &mut previews,
                },
            )
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(1200));
        assert_eq!(pipeline.progress().current(), UploadProgress::Completed);
        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(pipeline.progress().current(), UploadProgress::Idle);
    }
}
