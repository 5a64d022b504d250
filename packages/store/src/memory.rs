//! In-memory [`ContentStore`] and [`MediaUploader`].
//!
//! All state sits behind one lock, so a slot assignment and the eviction of the
//! previous holder are a single step. The lock is never held across an await.

use crate::error::StoreError;
use crate::faults::FaultPlan;
use crate::slug::slugify;
use async_trait::async_trait;
use atelier_common::{EditorError, EditorResult};
use atelier_editor::{
    ContentStore, FieldValue, FileHandle, HomepageSlot, MediaUploader, RecordId, RecordKind,
    RecordSchema, RecordStatus, RemoteMedia, StoreEntity, StoredRecord, Translation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreState {
    records: BTreeMap<RecordId, StoredRecord>,
    next_record: u64,
    next_media: u64,
}

/// Number of calls received per operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub creates: usize,
    pub updates: usize,
    pub fetches: usize,
    pub status_updates: usize,
    pub slot_updates: usize,
    pub deletes: usize,
    pub uploads: usize,
}

#[derive(Debug, Default)]
struct Counters {
    creates: AtomicUsize,
    updates: AtomicUsize,
    fetches: AtomicUsize,
    status_updates: AtomicUsize,
    slot_updates: AtomicUsize,
    deletes: AtomicUsize,
    uploads: AtomicUsize,
}

fn bump(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    faults: Mutex<FaultPlan>,
    counters: Counters,
    latency: Duration,
    origin_locale: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            origin_locale: "en".to_string(),
            ..Self::default()
        }
    }

    /// Delay every call by `latency` (lets concurrent callers interleave)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_origin_locale(mut self, locale: impl Into<String>) -> Self {
        self.origin_locale = locale.into();
        self
    }

    /// Load records previously written by [`save`](Self::save)
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let state: StoreState = serde_json::from_str(&raw).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), records = state.records.len(), "store loaded");
        Ok(Self {
            state: Mutex::new(state),
            ..Self::new()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&*self.state()).map_err(|source| {
            StoreError::Format {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Schedule failures for upcoming calls
    pub fn faults(&self) -> MutexGuard<'_, FaultPlan> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.counters;
        CallCounts {
            creates: c.creates.load(Ordering::SeqCst),
            updates: c.updates.load(Ordering::SeqCst),
            fetches: c.fetches.load(Ordering::SeqCst),
            status_updates: c.status_updates.load(Ordering::SeqCst),
            slot_updates: c.slot_updates.load(Ordering::SeqCst),
            deletes: c.deletes.load(Ordering::SeqCst),
            uploads: c.uploads.load(Ordering::SeqCst),
        }
    }

    /// Insert a record as-is (fixtures)
    pub fn seed(&self, record: StoredRecord) {
        let mut state = self.state();
        state.records.insert(record.id.clone(), record);
    }

    pub fn record(&self, id: &RecordId) -> Option<StoredRecord> {
        self.state().records.get(id).cloned()
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.state().records.values().cloned().collect()
    }

    pub fn slot_holder(&self, slot: HomepageSlot) -> Option<RecordId> {
        slot_holder(&self.state().records, slot)
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn has_foreign_translations(&self, translations: &BTreeMap<String, Translation>) -> bool {
        translations
            .keys()
            .any(|locale| !locale.eq_ignore_ascii_case(&self.origin_locale))
    }
}

fn slot_holder(records: &BTreeMap<RecordId, StoredRecord>, slot: HomepageSlot) -> Option<RecordId> {
    records
        .values()
        .find(|record| record.homepage_slot == Some(slot))
        .map(|record| record.id.clone())
}

fn api_error(status: u16, message: impl Into<String>) -> EditorError {
    let body = serde_json::json!({ "message": message.into() }).to_string();
    EditorError::from_api_response(status, &body)
}

fn not_found(id: &RecordId) -> EditorError {
    api_error(404, format!("Record {} not found", id))
}

/// Required-field rules the store enforces on every write
fn check_required(
    kind: RecordKind,
    status: RecordStatus,
    fields: &BTreeMap<String, FieldValue>,
    media: &BTreeMap<String, Vec<RemoteMedia>>,
) -> EditorResult<()> {
    let schema = RecordSchema::for_kind(kind);
    let filled = |name: &str| fields.get(name).map_or(false, |v| !v.is_empty());

    for field in schema.required_for_draft {
        if !filled(field) {
            return Err(api_error(422, format!("{} is required", field)));
        }
    }
    if status == RecordStatus::Published {
        for field in schema.required_for_publish {
            if !filled(field) {
                return Err(api_error(422, format!("{} is required to publish", field)));
            }
        }
        let has_cover = media
            .get(schema.media_collection)
            .map_or(false, |items| !items.is_empty());
        if !has_cover {
            return Err(api_error(422, "A cover image is required to publish"));
        }
    }
    Ok(())
}

/// Slug from the title, suffixed until no other record uses it
fn unique_slug(
    records: &BTreeMap<RecordId, StoredRecord>,
    fields: &BTreeMap<String, FieldValue>,
    owner: &RecordId,
) -> String {
    let base = slugify(fields.get("title").and_then(FieldValue::as_text).unwrap_or_default());
    let taken = |candidate: &str| {
        records
            .values()
            .any(|r| &r.id != owner && r.slug.as_deref() == Some(candidate))
    };

    let mut slug = base.clone();
    let mut n = 2;
    while taken(&slug) {
        slug = format!("{}-{}", base, n);
        n += 1;
    }
    slug
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create(&self, entity: StoreEntity) -> EditorResult<StoredRecord> {
        let call = bump(&self.counters.creates);
        self.pause().await;
        if let Some(fault) = self.faults().take_create(call) {
            return Err(fault.into_error());
        }
        check_required(entity.kind, entity.status, &entity.fields, &entity.media)?;

        let translations_locked = self.has_foreign_translations(&entity.translations);
        let mut state = self.state();
        state.next_record += 1;
        let id = RecordId::new(format!("rec-{}", state.next_record));
        let slug = unique_slug(&state.records, &entity.fields, &id);

        // Slots only change through update_homepage_slot
        let record = StoredRecord {
            id: id.clone(),
            kind: entity.kind,
            slug: Some(slug),
            status: entity.status,
            fields: entity.fields,
            media: entity.media,
            rows: entity.rows,
            homepage_slot: None,
            translations: entity.translations,
            translations_locked,
        };
        state.records.insert(id.clone(), record.clone());
        tracing::info!(id = %id, kind = ?record.kind, "record created");
        Ok(record)
    }

    async fn update(&self, id: &RecordId, entity: StoreEntity) -> EditorResult<StoredRecord> {
        let call = bump(&self.counters.updates);
        self.pause().await;
        if let Some(fault) = self.faults().take_update(call) {
            return Err(fault.into_error());
        }
        check_required(entity.kind, entity.status, &entity.fields, &entity.media)?;

        let foreign = self.has_foreign_translations(&entity.translations);
        let mut state = self.state();
        let slug = unique_slug(&state.records, &entity.fields, id);
        let record = state.records.get_mut(id).ok_or_else(|| not_found(id))?;

        if record.translations_locked && entity.translations != record.translations {
            return Err(api_error(409, "Translations are locked for this record"));
        }
        if entity.status == RecordStatus::Draft && record.homepage_slot.is_some() {
            return Err(api_error(422, "Remove the record from the homepage before unpublishing"));
        }

        // Slugs follow the title until the first publish
        if record.status == RecordStatus::Draft {
            record.slug = Some(slug);
        }
        record.kind = entity.kind;
        record.status = entity.status;
        record.fields = entity.fields;
        record.media = entity.media;
        record.rows = entity.rows;
        record.translations = entity.translations;
        record.translations_locked |= foreign;

        tracing::info!(id = %id, status = ?record.status, "record updated");
        Ok(record.clone())
    }

    async fn fetch(&self, id: &RecordId) -> EditorResult<StoredRecord> {
        bump(&self.counters.fetches);
        self.pause().await;
        self.record(id).ok_or_else(|| not_found(id))
    }

    async fn update_status(&self, id: &RecordId, status: RecordStatus) -> EditorResult<StoredRecord> {
        bump(&self.counters.status_updates);
        self.pause().await;

        let mut state = self.state();
        let record = state.records.get_mut(id).ok_or_else(|| not_found(id))?;
        match status {
            RecordStatus::Draft if record.homepage_slot.is_some() => {
                return Err(api_error(422, "Remove the record from the homepage before unpublishing"));
            }
            RecordStatus::Published => {
                check_required(record.kind, status, &record.fields, &record.media)?;
            }
            RecordStatus::Draft => {}
        }
        record.status = status;
        tracing::info!(id = %id, status = ?status, "status updated");
        Ok(record.clone())
    }

    async fn update_homepage_slot(
        &self,
        id: &RecordId,
        slot: Option<HomepageSlot>,
    ) -> EditorResult<StoredRecord> {
        bump(&self.counters.slot_updates);
        self.pause().await;

        let mut state = self.state();
        let status = state.records.get(id).ok_or_else(|| not_found(id))?.status;

        if let Some(slot) = slot {
            if status != RecordStatus::Published {
                return Err(api_error(422, "Only published records can be featured"));
            }
            for other in state.records.values_mut() {
                if &other.id != id && other.homepage_slot == Some(slot) {
                    tracing::info!(evicted = %other.id, ?slot, "homepage slot reassigned");
                    other.homepage_slot = None;
                }
            }
        }

        let record = state.records.get_mut(id).ok_or_else(|| not_found(id))?;
        record.homepage_slot = slot;
        Ok(record.clone())
    }

    async fn delete(&self, id: &RecordId) -> EditorResult<()> {
        bump(&self.counters.deletes);
        self.pause().await;

        let mut state = self.state();
        let record = state.records.get(id).ok_or_else(|| not_found(id))?;
        if record.homepage_slot.is_some() {
            return Err(api_error(422, "Remove the record from the homepage before deleting"));
        }
        state.records.remove(id);
        tracing::info!(id = %id, "record deleted");
        Ok(())
    }
}

#[async_trait]
impl MediaUploader for MemoryStore {
    async fn upload(
        &self,
        owner: &RecordId,
        collection: &str,
        files: Vec<FileHandle>,
    ) -> EditorResult<Vec<RemoteMedia>> {
        let call = bump(&self.counters.uploads);
        self.pause().await;
        match self.faults().take_upload(call) {
            Some(crate::Fault::EmptyMedia) => return Ok(Vec::new()),
            Some(fault) => return Err(fault.into_error()),
            None => {}
        }

        let mut state = self.state();
        let kind = state.records.get(owner).ok_or_else(|| not_found(owner))?.kind;
        if RecordSchema::for_kind(kind).media_collection != collection {
            return Err(api_error(
                422,
                format!("{:?} records have no media collection '{}'", kind, collection),
            ));
        }

        let mut media = Vec::with_capacity(files.len());
        for (order, file) in files.iter().enumerate() {
            state.next_media += 1;
            let url = format!("memory://{}/{}/{}-{}", owner, collection, state.next_media, file.name);
            media.push(RemoteMedia {
                id: format!("media-{}", state.next_media),
                thumbnail_url: Some(format!("{}?w=320", url)),
                url,
                order,
                is_cover: false,
            });
        }
        tracing::debug!(owner = %owner, collection, files = media.len(), "media stored");
        Ok(media)
    }
}
