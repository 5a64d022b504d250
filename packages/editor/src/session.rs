//! # Edit Session
//!
//! One operator editing one record. The session owns the draft, the pending
//! uploads and their previews, and wires every input through the components:
//!
//! ```text
//! input ──▶ draft ──▶ snapshot ──▶ dirty? ──▶ navigation guard
//!             ▲                                     │
//!   upload ───┤                         SaveDraft / Publish
//!   merge     │                                     ▼
//!             └────────── store response ◀── commit controller
//! ```
//!
//! The baseline is fixed when the session becomes hydrated (immediately for a
//! new record, after the fetch for an existing one) and re-fixed after every
//! successful commit. Narrow store operations (bootstrap, status, slot,
//! translation lock) only advance the record metadata of the baseline.
//!
//! Every method takes `&self`. Mutable state lives in one `RefCell` that is
//! borrowed only between awaits, so an upload or commit in flight never blocks
//! edits and navigation on the same task:
//!
//! - Uploads run one batch at a time (the upload lane); each chunk is merged
//!   under a short borrow as its response lands
//! - Concurrent triggers share the single bootstrap create
//! - Commits work on a copy of the draft. Field edits and newly merged media
//!   made while the commit is in flight are carried onto the store's answer
//!   and stay dirty
//! - A successful delete closes the session

use crate::collaborators::{Collaborators, Facet, RemoteMedia};
use crate::commit::{BootstrapOutcome, CommitController, CommitOutcome, CommitReceipt};
use crate::config::EditorConfig;
use crate::draft::{
    Collection, DraftRecord, FeatureRow, FieldValue, HomepageSlot, MediaItem, MediaRole,
    RecordId, RecordKind, RecordStatus,
};
use crate::facets::FacetResolver;
use crate::media::{validate_selection, FileHandle, LocalId, PendingUpload};
use crate::navigation::{
    Destination, GuardAction, Interception, NavigationGuard, NavigationHost, NavigationIntent,
    PromptChoice,
};
use crate::pipeline::{merge_chunk, MediaPipeline, MergeTarget, UploadProgress, UploadReport};
use crate::preview::PreviewRegistry;
use crate::reorder::{self, CompositeId};
use crate::schema::RecordSchema;
use crate::snapshot::{compute_snapshot, Snapshot, SnapshotDiffer};
use crate::suggestions;
use atelier_common::{EditorError, EditorResult};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::{watch, Mutex};

/// How a prompt resolution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Navigated(Destination),
    Stayed,
    /// The commit was refused because the record holds `slot`
    EvictionRequired { slot: HomepageSlot },
    NoPrompt,
}

struct SessionState {
    draft: DraftRecord,
    pending: Vec<PendingUpload>,
    /// Pending files that belong to a batch currently being uploaded
    uploading: BTreeSet<LocalId>,
    previews: PreviewRegistry,
    next_local_id: u64,
    differ: SnapshotDiffer,
    guard: NavigationGuard,
    closed: bool,
}

impl SessionState {
    fn snapshot(&self) -> Snapshot {
        compute_snapshot(&self.draft, &self.pending)
    }

    /// Baseline candidate: outstanding uploads are never "saved"
    fn saved_snapshot(&self) -> Snapshot {
        compute_snapshot(&self.draft, &[])
    }

    fn is_dirty(&self) -> bool {
        self.differ.is_dirty(&self.snapshot())
    }

    fn reset_baseline(&mut self) {
        let baseline = self.saved_snapshot();
        self.differ.reset_baseline(baseline);
    }

    fn patch_record(&mut self) {
        self.differ.patch_record(&self.draft);
    }

    fn sync_guard(&mut self) {
        let dirty = self.is_dirty();
        self.guard.sync_unload_prompt(dirty);
    }
}

/// Merges uploaded chunks into the shared session state
struct SessionMerge<'a> {
    state: &'a RefCell<SessionState>,
}

impl MergeTarget for SessionMerge<'_> {
    fn merge(
        &mut self,
        collection: &str,
        chunk: &[PendingUpload],
        media: Vec<RemoteMedia>,
    ) -> EditorResult<Vec<MediaItem>> {
        let mut state = self.state.borrow_mut();
        let SessionState {
            draft,
            pending,
            uploading,
            previews,
            ..
        } = &mut *state;
        let merged = merge_chunk(draft, pending, previews, collection, chunk, media)?;
        for upload in chunk {
            uploading.remove(&upload.local_id);
        }
        state.sync_guard();
        Ok(merged)
    }
}

pub struct EditSession {
    config: EditorConfig,
    schema: RecordSchema,
    collaborators: Collaborators,
    commit: CommitController,
    pipeline: MediaPipeline,
    facets: FacetResolver,
    upload_lane: Mutex<()>,
    state: RefCell<SessionState>,
}

impl EditSession {
    /// Session for an existing record that has not been fetched yet.
    /// It is never dirty until [`hydrate`](Self::hydrate) completes.
    pub fn loading(
        kind: RecordKind,
        collaborators: Collaborators,
        host: Box<dyn NavigationHost>,
        config: EditorConfig,
    ) -> EditorResult<Self> {
        config.validate()?;
        let schema = RecordSchema::for_kind(kind);
        let commit = CommitController::new(
            collaborators.store.clone(),
            collaborators.translator.clone(),
            schema.clone(),
            config.origin_locale.clone(),
        );
        let pipeline = MediaPipeline::new(collaborators.uploader.clone(), &config);
        let facets = FacetResolver::new(collaborators.facets.clone(), config.facet_debounce());
        let mut guard = NavigationGuard::new(host);
        guard.start();

        let state = SessionState {
            draft: schema.new_draft(),
            pending: Vec::new(),
            uploading: BTreeSet::new(),
            previews: PreviewRegistry::new(),
            next_local_id: 0,
            differ: SnapshotDiffer::new(),
            guard,
            closed: false,
        };
        Ok(Self {
            schema,
            collaborators,
            commit,
            pipeline,
            facets,
            upload_lane: Mutex::new(()),
            state: RefCell::new(state),
            config,
        })
    }

    /// Session for a brand-new record; hydrated immediately
    pub fn new_record(
        kind: RecordKind,
        collaborators: Collaborators,
        host: Box<dyn NavigationHost>,
        config: EditorConfig,
    ) -> EditorResult<Self> {
        let mut session = Self::loading(kind, collaborators, host, config)?;
        session.state.get_mut().reset_baseline();
        tracing::info!(?kind, "editing new record");
        Ok(session)
    }

    /// Fetch and hydrate an existing record
    pub async fn open(
        kind: RecordKind,
        id: &RecordId,
        collaborators: Collaborators,
        host: Box<dyn NavigationHost>,
        config: EditorConfig,
    ) -> EditorResult<Self> {
        let session = Self::loading(kind, collaborators, host, config)?;
        session.hydrate(id).await?;
        Ok(session)
    }

    /// Replace the draft with the stored record and fix the baseline
    pub async fn hydrate(&self, id: &RecordId) -> EditorResult<()> {
        let record = self.collaborators.store.fetch(id).await?;
        if record.kind != self.schema.kind {
            return Err(EditorError::validation(format!(
                "Record {} is a {:?}, not a {:?}",
                id, record.kind, self.schema.kind
            )));
        }

        let mut draft = self.schema.new_draft();
        record.merge_into(&mut draft);
        self.commit.bootstrapper().mark_persisted(id.clone());

        let mut state = self.state_mut();
        state.draft = draft;
        state.reset_baseline();
        state.sync_guard();
        tracing::info!(id = %id, kind = ?self.schema.kind, "record hydrated");
        Ok(())
    }

    fn state_mut(&self) -> RefMut<'_, SessionState> {
        self.state.borrow_mut()
    }

    /// Borrow the draft. Drop the guard before calling back into the session.
    pub fn draft(&self) -> Ref<'_, DraftRecord> {
        Ref::map(self.state.borrow(), |state| &state.draft)
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn pending(&self) -> Ref<'_, [PendingUpload]> {
        Ref::map(self.state.borrow(), |state| state.pending.as_slice())
    }

    pub fn previews(&self) -> Ref<'_, PreviewRegistry> {
        Ref::map(self.state.borrow(), |state| &state.previews)
    }

    pub fn guard(&self) -> Ref<'_, NavigationGuard> {
        Ref::map(self.state.borrow(), |state| &state.guard)
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.borrow().differ.is_hydrated()
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().snapshot()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.borrow().is_dirty()
    }

    pub fn changed_paths(&self) -> Vec<String> {
        let state = self.state.borrow();
        state.differ.changed_paths(&state.snapshot())
    }

    pub fn upload_progress(&self) -> watch::Receiver<UploadProgress> {
        self.pipeline.progress().subscribe()
    }

    fn ensure_open(&self) -> EditorResult<()> {
        if self.is_closed() {
            return Err(EditorError::validation("This editing session is closed"));
        }
        Ok(())
    }

    // ----- fields -----

    pub fn set_field(&self, name: impl Into<String>, value: FieldValue) {
        let mut state = self.state_mut();
        state.draft.set_field(name, value);
        state.sync_guard();
    }

    pub fn clear_field(&self, name: &str) -> Option<FieldValue> {
        let mut state = self.state_mut();
        let previous = state.draft.clear_field(name);
        state.sync_guard();
        previous
    }

    /// Merge content-parser guesses for `text`, using the record kind as the
    /// parser hint. Returns the fields that were written.
    pub async fn apply_suggestions(&self, text: &str) -> EditorResult<Vec<&'static str>> {
        let parser = self
            .collaborators
            .parser
            .clone()
            .ok_or_else(|| EditorError::validation("No content parser is configured"))?;

        let parsed = parser.parse(text, self.schema.kind).await?;
        let mut state = self.state_mut();
        let applied = suggestions::apply(&mut state.draft, &suggestions::from_parsed(parsed));
        state.sync_guard();
        tracing::info!(fields = ?applied, "applied parser suggestions");
        Ok(applied)
    }

    pub async fn lookup_facet(
        &self,
        facet: Facet,
        parent: Option<&str>,
        query: &str,
    ) -> Option<Vec<String>> {
        self.facets.lookup(facet, parent, query).await
    }

    // ----- collections -----

    /// Append a row to a row collection; returns the new row id
    pub fn add_row(
        &self,
        collection: &str,
        cells: BTreeMap<String, FieldValue>,
    ) -> EditorResult<String> {
        let mut state = self.state_mut();
        let rows = state
            .draft
            .rows_mut(collection)
            .ok_or_else(|| unknown_collection(collection))?;

        let mut n = rows.len() + 1;
        let id = loop {
            let candidate = format!("row-{}", n);
            if !rows.iter().any(|row| row.id == candidate) {
                break candidate;
            }
            n += 1;
        };
        rows.push(FeatureRow {
            id: id.clone(),
            order: rows.len(),
            cells,
        });
        state.sync_guard();
        Ok(id)
    }

    pub fn remove_row(&self, collection: &str, id: &str) -> EditorResult<FeatureRow> {
        let mut state = self.state_mut();
        let rows = state
            .draft
            .rows_mut(collection)
            .ok_or_else(|| unknown_collection(collection))?;
        let removed = reorder::remove(rows, id)
            .ok_or_else(|| EditorError::validation(format!("No row '{}' in '{}'", id, collection)))?;
        state.sync_guard();
        Ok(removed)
    }

    /// Remove a merged media item; the remaining items close the gap
    pub fn remove_media(&self, collection: &str, id: &str) -> EditorResult<MediaItem> {
        let mut state = self.state_mut();
        let items = state
            .draft
            .media_mut(collection)
            .ok_or_else(|| unknown_collection(collection))?;
        let removed = reorder::remove(items, id).ok_or_else(|| {
            EditorError::validation(format!("No media '{}' in '{}'", id, collection))
        })?;
        state.sync_guard();
        Ok(removed)
    }

    /// Derived roles of a media collection, in display order
    pub fn media_roles(&self, collection: &str) -> Option<Vec<MediaRole>> {
        let mut items = self.draft().media(collection)?.to_vec();
        reorder::normalize(&mut items);
        Some(reorder::roles(&items, self.config.portfolio_slots))
    }

    /// Drop `source` onto `destination`. Returns whether anything moved.
    pub fn drag(&self, source: &CompositeId, destination: &CompositeId) -> EditorResult<bool> {
        let collection = reorder::same_category(source, destination)?;
        let mut state = self.state_mut();
        let moved = match state.draft.collections.get_mut(collection) {
            Some(Collection::Media(items)) => {
                reorder::reorder(items, &source.item_id, &destination.item_id)
            }
            Some(Collection::Rows(rows)) => {
                reorder::reorder(rows, &source.item_id, &destination.item_id)
            }
            None => return Err(unknown_collection(collection)),
        };
        if moved {
            state.sync_guard();
        }
        Ok(moved)
    }

    // ----- media -----

    /// Validate a selection, queue it as pending, and upload it.
    ///
    /// Validation failures reject the whole selection before anything is
    /// queued or sent. The returned report covers this selection only.
    pub async fn add_files(
        &self,
        collection: &str,
        files: Vec<FileHandle>,
    ) -> EditorResult<UploadReport> {
        self.ensure_open()?;
        let queued = {
            let mut state = self.state_mut();
            if state.draft.media(collection).is_none() {
                return Err(unknown_collection(collection));
            }
            validate_selection(&files, &self.config)?;

            let mut queued = Vec::with_capacity(files.len());
            for file in files {
                state.next_local_id += 1;
                let local_id = LocalId(state.next_local_id);
                let preview = state.previews.create();
                state.pending.push(PendingUpload {
                    local_id,
                    collection: collection.to_string(),
                    file,
                    preview,
                });
                queued.push(local_id);
            }
            state.sync_guard();
            queued
        };

        self.upload_pending(collection, Some(&queued)).await
    }

    /// Re-run the pipeline for whatever is still pending in `collection`
    pub async fn retry_pending(&self, collection: &str) -> EditorResult<UploadReport> {
        self.ensure_open()?;
        if self.draft().media(collection).is_none() {
            return Err(unknown_collection(collection));
        }
        self.upload_pending(collection, None).await
    }

    /// Drop a pending file before it is uploaded. Files in a batch that is
    /// already being sent stay.
    pub fn remove_pending(&self, local_id: LocalId) -> bool {
        let mut state = self.state_mut();
        if state.uploading.contains(&local_id) {
            return false;
        }
        let Some(index) = state.pending.iter().position(|p| p.local_id == local_id) else {
            return false;
        };
        let removed = state.pending.remove(index);
        state.previews.release(removed.preview);
        state.sync_guard();
        true
    }

    /// Pending files of `collection` (restricted to `only` when given) that no
    /// running batch has claimed yet. Claims them when `claim` is set.
    fn select_batch(
        &self,
        collection: &str,
        only: Option<&[LocalId]>,
        claim: bool,
    ) -> Vec<PendingUpload> {
        let mut state = self.state_mut();
        let SessionState {
            pending, uploading, ..
        } = &mut *state;
        let batch: Vec<PendingUpload> = pending
            .iter()
            .filter(|upload| upload.collection == collection)
            .filter(|upload| only.map_or(true, |ids| ids.contains(&upload.local_id)))
            .filter(|upload| !uploading.contains(&upload.local_id))
            .cloned()
            .collect();
        if claim {
            uploading.extend(batch.iter().map(|upload| upload.local_id));
        }
        batch
    }

    async fn upload_pending(
        &self,
        collection: &str,
        only: Option<&[LocalId]>,
    ) -> EditorResult<UploadReport> {
        let empty = UploadReport {
            collection: collection.to_string(),
            ..UploadReport::default()
        };
        let waiting = self.select_batch(collection, only, false).len();
        if waiting == 0 {
            return Ok(empty);
        }

        let owner = match self.bootstrap().await {
            Ok(id) => id,
            Err(source) => {
                self.state_mut().sync_guard();
                return Err(EditorError::PartialUpload {
                    succeeded: 0,
                    pending: waiting,
                    source: Box::new(source),
                });
            }
        };

        let _lane = self.upload_lane.lock().await;
        let batch = self.select_batch(collection, only, true);
        if batch.is_empty() {
            return Ok(empty);
        }
        let claimed: Vec<LocalId> = batch.iter().map(|upload| upload.local_id).collect();

        let mut target = SessionMerge { state: &self.state };
        let result = self.pipeline.upload(&owner, collection, batch, &mut target).await;

        let mut state = self.state_mut();
        for local_id in &claimed {
            state.uploading.remove(local_id);
        }
        state.sync_guard();
        result
    }

    /// Make sure the record has an id before media can be attached to it
    async fn bootstrap(&self) -> EditorResult<RecordId> {
        let draft = self.draft().clone();
        let outcome = self.commit.ensure_persisted(&draft).await?;

        let mut state = self.state_mut();
        match outcome {
            BootstrapOutcome::Existing(id) => {
                if state.draft.persisted_id.is_none() {
                    state.draft.persisted_id = Some(id.clone());
                    state.patch_record();
                }
                Ok(id)
            }
            BootstrapOutcome::Created(record) => {
                // Callers sharing one create all land here; the first applies it
                if state.draft.persisted_id.is_none() {
                    // Placeholder field values stay on the store side only
                    state.draft.persisted_id = Some(record.id.clone());
                    state.draft.slug = record.slug;
                    state.draft.status = record.status;
                    state.patch_record();
                }
                Ok(record.id)
            }
        }
    }

    // ----- commit -----

    /// Persist keeping the current status
    pub async fn save(&self) -> EditorResult<CommitOutcome<CommitReceipt>> {
        self.persist(None).await
    }

    pub async fn save_draft(&self) -> EditorResult<CommitOutcome<CommitReceipt>> {
        self.persist(Some(RecordStatus::Draft)).await
    }

    pub async fn publish(&self) -> EditorResult<CommitOutcome<CommitReceipt>> {
        self.persist(Some(RecordStatus::Published)).await
    }

    async fn persist(&self, status: Option<RecordStatus>) -> EditorResult<CommitOutcome<CommitReceipt>> {
        self.ensure_open()?;
        let before = self.draft().clone();
        let mut committed = before.clone();
        let outcome = self.commit.persist(&mut committed, status).await;

        let mut state = self.state_mut();
        match &outcome {
            Ok(CommitOutcome::Done(_)) => {
                let current = std::mem::replace(&mut state.draft, committed);
                state.reset_baseline();
                carry_concurrent_edits(&mut state.draft, &before, &current);
            }
            // A forced translation lock mirrors store state
            Err(e) if e.is_conflict() => {
                state.draft.translations_locked = committed.translations_locked;
                state.patch_record();
            }
            _ => {}
        }
        state.sync_guard();
        outcome
    }

    pub async fn set_status(&self, status: RecordStatus) -> EditorResult<CommitOutcome<RecordStatus>> {
        self.ensure_open()?;
        let mut draft = self.draft().clone();
        let outcome = self.commit.set_status(&mut draft, status).await?;

        let mut state = self.state_mut();
        state.draft.status = draft.status;
        state.patch_record();
        state.sync_guard();
        Ok(outcome)
    }

    pub async fn assign_slot(&self, slot: HomepageSlot) -> EditorResult<Option<HomepageSlot>> {
        self.ensure_open()?;
        let mut draft = self.draft().clone();
        let assigned = self.commit.assign_slot(&mut draft, Some(slot)).await?;
        self.apply_slot(draft.homepage_slot);
        Ok(assigned)
    }

    pub async fn evict_from_slot(&self) -> EditorResult<()> {
        self.ensure_open()?;
        let mut draft = self.draft().clone();
        self.commit.evict_from_slot(&mut draft).await?;
        self.apply_slot(draft.homepage_slot);
        Ok(())
    }

    fn apply_slot(&self, slot: Option<HomepageSlot>) {
        let mut state = self.state_mut();
        state.draft.homepage_slot = slot;
        state.patch_record();
        state.sync_guard();
    }

    /// Delete the record. On success the draft no longer refers to a stored
    /// record and the session is closed.
    pub async fn delete(&self) -> EditorResult<CommitOutcome<()>> {
        self.ensure_open()?;
        let draft = self.draft().clone();
        let outcome = self.commit.delete(&draft).await?;
        if outcome.is_done() {
            {
                let mut state = self.state_mut();
                state.draft.persisted_id = None;
                state.draft.slug = None;
                state.draft.homepage_slot = None;
                let SessionState {
                    pending, previews, ..
                } = &mut *state;
                for upload in pending.drain(..) {
                    previews.release(upload.preview);
                }
                state.reset_baseline();
                state.sync_guard();
            }
            self.close();
        }
        Ok(outcome)
    }

    /// Request non-origin translations. Returns the merged locales; the
    /// translated copy is saved with the next commit.
    pub async fn request_translation(&self) -> EditorResult<Vec<String>> {
        self.ensure_open()?;
        let mut draft = self.draft().clone();
        let result = self.commit.request_translation(&mut draft).await;

        let mut state = self.state_mut();
        state.draft.translations = draft.translations;
        state.draft.translations_locked = draft.translations_locked;
        state.patch_record();
        state.sync_guard();
        result
    }

    // ----- navigation -----

    pub fn on_link_activation(&self, intent: NavigationIntent) -> Interception {
        let mut state = self.state_mut();
        let dirty = state.is_dirty();
        state.guard.on_link_activation(intent, dirty)
    }

    pub fn on_history_navigation(&self, intended: Destination) -> Interception {
        let mut state = self.state_mut();
        let dirty = state.is_dirty();
        state.guard.on_history_navigation(intended, dirty)
    }

    /// Whether the native leave-page prompt should be shown
    pub fn on_before_unload(&self) -> bool {
        let mut state = self.state_mut();
        let dirty = state.is_dirty();
        state.guard.on_before_unload(dirty)
    }

    pub fn tick(&self) {
        self.state_mut().guard.tick();
    }

    /// Apply the operator's answer to the unsaved-changes prompt
    pub async fn resolve_prompt(&self, choice: PromptChoice) -> EditorResult<NavigationOutcome> {
        let action = self.state_mut().guard.choose(choice);
        let status = match action {
            GuardAction::Navigated(destination) => return Ok(NavigationOutcome::Navigated(destination)),
            GuardAction::Cancelled => return Ok(NavigationOutcome::Stayed),
            GuardAction::NoPrompt => return Ok(NavigationOutcome::NoPrompt),
            GuardAction::CommitRequired(status) => status,
        };

        let result = self.persist(Some(status)).await;
        let mut state = self.state_mut();
        match result {
            Ok(CommitOutcome::Done(_)) => match state.guard.commit_succeeded() {
                Some(destination) => Ok(NavigationOutcome::Navigated(destination)),
                None => Ok(NavigationOutcome::NoPrompt),
            },
            Ok(CommitOutcome::EvictionRequired { slot }) => {
                state.guard.commit_failed();
                Ok(NavigationOutcome::EvictionRequired { slot })
            }
            Err(e) => {
                state.guard.commit_failed();
                Err(e)
            }
        }
    }

    /// Stop guarding and release every outstanding preview
    pub fn close(&self) {
        let mut state = self.state_mut();
        if state.closed {
            return;
        }
        state.guard.stop();
        let released = state.previews.release_all();
        state.pending.clear();
        state.uploading.clear();
        state.closed = true;
        tracing::info!(released, "edit session closed");
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn unknown_collection(name: &str) -> EditorError {
    EditorError::validation(format!("Unknown collection '{}'", name))
}

/// Re-apply onto `committed` what changed between `before` (the draft that was
/// sent) and `current` (the draft when the answer arrived): field edits, and
/// media merged in the meantime.
fn carry_concurrent_edits(committed: &mut DraftRecord, before: &DraftRecord, current: &DraftRecord) {
    let names: BTreeSet<&String> = before.fields.keys().chain(current.fields.keys()).collect();
    for name in names {
        let value = current.fields.get(name);
        if value == before.fields.get(name) {
            continue;
        }
        match value {
            Some(value) => {
                committed.fields.insert(name.clone(), value.clone());
            }
            None => {
                committed.fields.remove(name);
            }
        }
    }

    for (name, collection) in &current.collections {
        let Collection::Media(items) = collection else {
            continue;
        };
        let sent = before.media(name).unwrap_or_default();
        let Some(target) = committed.media_mut(name) else {
            continue;
        };
        for item in items {
            let known = sent.iter().chain(target.iter()).any(|other| other.id == item.id);
            if !known {
                target.push(MediaItem {
                    order: target.len(),
                    ..item.clone()
                });
            }
        }
    }
}
