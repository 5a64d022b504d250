//! # External Collaborators
//!
//! Interfaces to everything the editing session does not own: the content
//! store, the media upload endpoint, the AI content parser, the translation
//! service and the location facet lookup. Wire shapes live here too.

use crate::draft::{
    Collection, DraftRecord, FeatureRow, FieldValue, HomepageSlot, MediaItem, RecordId,
    RecordKind, RecordStatus, RemoteRef, Translation,
};
use crate::media::FileHandle;
use crate::reorder;
use async_trait::async_trait;
use atelier_common::EditorResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Media item as exchanged with the store and upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMedia {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub is_cover: bool,
}

impl RemoteMedia {
    /// Convert to a draft item at `order`; the remote cover flag is ignored
    /// because roles are derived from position
    pub fn into_item(self, order: usize) -> MediaItem {
        MediaItem {
            id: self.id,
            remote_ref: RemoteRef {
                url: self.url,
                thumbnail_url: self.thumbnail_url,
            },
            order,
        }
    }

    pub fn from_item(item: &MediaItem) -> Self {
        Self {
            id: item.id.clone(),
            url: item.remote_ref.url.clone(),
            thumbnail_url: item.remote_ref.thumbnail_url.clone(),
            order: item.order,
            is_cover: item.order == 0,
        }
    }
}

/// Create/update request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub kind: RecordKind,
    pub status: RecordStatus,
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub media: BTreeMap<String, Vec<RemoteMedia>>,
    #[serde(default)]
    pub rows: BTreeMap<String, Vec<FeatureRow>>,
    #[serde(default)]
    pub homepage_slot: Option<HomepageSlot>,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
}

impl StoreEntity {
    /// Serialize a draft into the store's expected shape
    pub fn from_draft(draft: &DraftRecord, status: RecordStatus) -> Self {
        let mut media = BTreeMap::new();
        let mut rows = BTreeMap::new();

        for (name, collection) in &draft.collections {
            match collection {
                Collection::Media(items) => {
                    let mut items = items.clone();
                    reorder::normalize(&mut items);
                    media.insert(name.clone(), items.iter().map(RemoteMedia::from_item).collect());
                }
                Collection::Rows(items) => {
                    let mut items = items.clone();
                    reorder::normalize(&mut items);
                    rows.insert(name.clone(), items);
                }
            }
        }

        Self {
            id: draft.persisted_id.clone(),
            kind: draft.kind,
            status,
            fields: draft.fields.clone(),
            media,
            rows,
            homepage_slot: draft.homepage_slot,
            translations: draft.translations.clone(),
        }
    }
}

/// Authoritative record as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    #[serde(default)]
    pub slug: Option<String>,
    pub status: RecordStatus,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub media: BTreeMap<String, Vec<RemoteMedia>>,
    #[serde(default)]
    pub rows: BTreeMap<String, Vec<FeatureRow>>,
    #[serde(default)]
    pub homepage_slot: Option<HomepageSlot>,
    #[serde(default)]
    pub translations: BTreeMap<String, Translation>,
    #[serde(default)]
    pub translations_locked: bool,
}

impl StoredRecord {
    /// Build a fresh draft from a hydration payload
    pub fn into_draft(self) -> DraftRecord {
        let mut draft = DraftRecord::new(self.kind);
        self.merge_into(&mut draft);
        draft
    }

    /// Overwrite the draft with authoritative values
    pub fn merge_into(self, draft: &mut DraftRecord) {
        draft.persisted_id = Some(self.id);
        draft.kind = self.kind;
        draft.slug = self.slug;
        draft.status = self.status;
        draft.fields = self.fields;
        draft.homepage_slot = self.homepage_slot;
        draft.translations = self.translations;
        draft.translations_locked = draft.translations_locked || self.translations_locked;

        for (name, mut items) in self.media {
            items.sort_by_key(|m| m.order);
            let items = items
                .into_iter()
                .enumerate()
                .map(|(order, media)| media.into_item(order))
                .collect();
            draft.collections.insert(name, Collection::Media(items));
        }
        for (name, mut rows) in self.rows {
            reorder::normalize(&mut rows);
            draft.collections.insert(name, Collection::Rows(rows));
        }
    }
}

/// Persistence and business rules for records
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create(&self, entity: StoreEntity) -> EditorResult<StoredRecord>;

    async fn update(&self, id: &RecordId, entity: StoreEntity) -> EditorResult<StoredRecord>;

    async fn fetch(&self, id: &RecordId) -> EditorResult<StoredRecord>;

    async fn update_status(&self, id: &RecordId, status: RecordStatus) -> EditorResult<StoredRecord>;

    /// Assign (or clear, with `None`) the homepage slot. Assignment evicts
    /// whichever record held the slot before.
    async fn update_homepage_slot(
        &self,
        id: &RecordId,
        slot: Option<HomepageSlot>,
    ) -> EditorResult<StoredRecord>;

    async fn delete(&self, id: &RecordId) -> EditorResult<()>;
}

/// Media upload endpoint.
///
/// Returns one item per file, in submission order. An empty array is a
/// failure even when the transport succeeded.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(
        &self,
        owner: &RecordId,
        collection: &str,
        files: Vec<FileHandle>,
    ) -> EditorResult<Vec<RemoteMedia>>;
}

/// Raw guess produced by the content parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedField {
    pub field: String,
    pub value: String,
}

impl ParsedField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// AI-assisted field extraction from free text
#[async_trait]
pub trait ContentParser: Send + Sync {
    async fn parse(&self, text: &str, hint: RecordKind) -> EditorResult<Vec<ParsedField>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub source_locale: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Translation service. A 409 means "already translated".
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        request: TranslationRequest,
    ) -> EditorResult<BTreeMap<String, Translation>>;
}

/// Location facets offered as suggestions while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    City,
    District,
    Neighborhood,
}

/// Read-only, best-effort location lookup
#[async_trait]
pub trait FacetLookup: Send + Sync {
    async fn lookup(
        &self,
        facet: Facet,
        parent: Option<&str>,
        query: &str,
    ) -> EditorResult<Vec<String>>;
}

/// Handles to every collaborator a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ContentStore>,
    pub uploader: Arc<dyn MediaUploader>,
    pub parser: Option<Arc<dyn ContentParser>>,
    pub translator: Option<Arc<dyn Translator>>,
    pub facets: Option<Arc<dyn FacetLookup>>,
}

impl Collaborators {
    pub fn new(store: Arc<dyn ContentStore>, uploader: Arc<dyn MediaUploader>) -> Self {
        Self {
            store,
            uploader,
            parser: None,
            translator: None,
            facets: None,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_facets(mut self, facets: Arc<dyn FacetLookup>) -> Self {
        self.facets = Some(facets);
        self
    }
}
