//! # Draft Record
//!
//! In-memory representation of a record being edited.
//!
//! The draft is owned by exactly one [`EditSession`](crate::EditSession). It is
//! created from schema defaults or from a hydration fetch, mutated by every
//! input and every upload merge, and superseded by the store's response on
//! commit.
//!
//! Media roles are never stored. [`MediaItem::role`] derives them from the
//! item's position so a reorder can never leave a stale cover behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier assigned by the content store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three kinds of records sharing one editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Property,
    Article,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    #[default]
    Draft,
    Published,
}

/// Mutually exclusive homepage placements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomepageSlot {
    Hero,
    FeaturedLeft,
    FeaturedRight,
    Spotlight,
}

impl HomepageSlot {
    pub const ALL: [HomepageSlot; 4] = [
        HomepageSlot::Hero,
        HomepageSlot::FeaturedLeft,
        HomepageSlot::FeaturedRight,
        HomepageSlot::Spotlight,
    ];
}

/// A scalar or list value held by a named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Tags(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty text and empty tag lists count as "not filled in"
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Tags(tags) => tags.iter().all(|t| t.trim().is_empty()),
            FieldValue::Flag(_) | FieldValue::Integer(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }
}

/// Derived role of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaRole {
    None,
    Cover,
    Portfolio,
}

impl MediaRole {
    /// Role for a zero-based position: first is the cover, the next
    /// `portfolio_slots` are portfolio items, the rest have no role
    pub fn at(order: usize, portfolio_slots: usize) -> Self {
        match order {
            0 => MediaRole::Cover,
            n if n <= portfolio_slots => MediaRole::Portfolio,
            _ => MediaRole::None,
        }
    }
}

/// Where the store keeps an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// A media file that has been uploaded and merged into the draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub remote_ref: RemoteRef,
    pub order: usize,
}

impl MediaItem {
    pub fn role(&self, portfolio_slots: usize) -> MediaRole {
        MediaRole::at(self.order, portfolio_slots)
    }
}

/// A positional row in a non-media collection (e.g. project feature rows)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: String,
    pub order: usize,
    #[serde(default)]
    pub cells: BTreeMap<String, FieldValue>,
}

/// An ordered collection owned by the draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "snake_case")]
pub enum Collection {
    Media(Vec<MediaItem>),
    Rows(Vec<FeatureRow>),
}

impl Collection {
    pub fn len(&self) -> usize {
        match self {
            Collection::Media(items) => items.len(),
            Collection::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-locale translated copy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Translation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// In-memory, not-yet-committed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub persisted_id: Option<RecordId>,
    pub kind: RecordKind,
    pub slug: Option<String>,
    pub status: RecordStatus,
    pub fields: BTreeMap<String, FieldValue>,
    pub collections: BTreeMap<String, Collection>,
    pub homepage_slot: Option<HomepageSlot>,
    pub translations: BTreeMap<String, Translation>,
    pub translations_locked: bool,
}

impl DraftRecord {
    /// Empty draft with no collections
    pub fn new(kind: RecordKind) -> Self {
        Self {
            persisted_id: None,
            kind,
            slug: None,
            status: RecordStatus::Draft,
            fields: BTreeMap::new(),
            collections: BTreeMap::new(),
            homepage_slot: None,
            translations: BTreeMap::new(),
            translations_locked: false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    /// Whether the field exists and holds a non-empty value
    pub fn is_filled(&self, name: &str) -> bool {
        self.fields.get(name).map_or(false, |v| !v.is_empty())
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn clear_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn media(&self, collection: &str) -> Option<&[MediaItem]> {
        match self.collections.get(collection) {
            Some(Collection::Media(items)) => Some(items),
            _ => None,
        }
    }

    pub fn media_mut(&mut self, collection: &str) -> Option<&mut Vec<MediaItem>> {
        match self.collections.get_mut(collection) {
            Some(Collection::Media(items)) => Some(items),
            _ => None,
        }
    }

    pub fn rows(&self, collection: &str) -> Option<&[FeatureRow]> {
        match self.collections.get(collection) {
            Some(Collection::Rows(rows)) => Some(rows),
            _ => None,
        }
    }

    pub fn rows_mut(&mut self, collection: &str) -> Option<&mut Vec<FeatureRow>> {
        match self.collections.get_mut(collection) {
            Some(Collection::Rows(rows)) => Some(rows),
            _ => None,
        }
    }

    /// Cover of a media collection (the item at order 0)
    pub fn cover(&self, collection: &str) -> Option<&MediaItem> {
        self.media(collection)
            .and_then(|items| items.iter().find(|item| item.order == 0))
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted_id.is_some()
    }
}
