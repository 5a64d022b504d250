//! Per-kind editing policy.
//!
//! Property listings, articles and marketing projects share one session; the
//! schema is what tells them apart: which collections exist, which fields are
//! required for each status, and what the bootstrap create fills in.

use crate::draft::{Collection, DraftRecord, FieldValue, RecordKind};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub kind: RecordKind,
    /// Collection whose first item is the cover
    pub media_collection: &'static str,
    pub row_collections: &'static [&'static str],
    /// Store-side required fields, even for drafts
    pub required_for_draft: &'static [&'static str],
    /// Required (in addition to a cover) before publishing
    pub required_for_publish: &'static [&'static str],
    /// Required (in addition to a cover) before taking a homepage slot.
    /// Empty when the kind cannot hold slots.
    pub required_for_slot: &'static [&'static str],
}

impl RecordSchema {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Property => Self {
                kind,
                media_collection: "photos",
                row_collections: &[],
                required_for_draft: &["title", "property_type", "sale_type"],
                required_for_publish: &["title"],
                required_for_slot: &["price", "property_type", "sale_type"],
            },
            RecordKind::Article => Self {
                kind,
                media_collection: "images",
                row_collections: &[],
                required_for_draft: &["title"],
                required_for_publish: &["title", "body"],
                required_for_slot: &[],
            },
            RecordKind::Project => Self {
                kind,
                media_collection: "gallery",
                row_collections: &["features"],
                required_for_draft: &["title"],
                required_for_publish: &["title"],
                required_for_slot: &[],
            },
        }
    }

    pub fn supports_homepage_slots(&self) -> bool {
        !self.required_for_slot.is_empty()
    }

    /// Empty draft with every collection present
    pub fn new_draft(&self) -> DraftRecord {
        let mut draft = DraftRecord::new(self.kind);
        draft
            .collections
            .insert(self.media_collection.to_string(), Collection::Media(Vec::new()));
        for name in self.row_collections {
            draft
                .collections
                .insert(name.to_string(), Collection::Rows(Vec::new()));
        }
        draft
    }

    /// Value the bootstrap create uses for an empty required field
    pub fn placeholder(&self, field: &str) -> FieldValue {
        match (self.kind, field) {
            (_, "title") => FieldValue::text("Untitled draft"),
            (RecordKind::Property, "property_type") => FieldValue::text("apartment"),
            (RecordKind::Property, "sale_type") => FieldValue::text("sale"),
            _ => FieldValue::text("-"),
        }
    }

    /// Copy of the draft with required-but-empty fields filled by placeholders
    pub fn with_placeholders(&self, draft: &DraftRecord) -> DraftRecord {
        let mut filled = draft.clone();
        for field in self.required_for_draft {
            if !filled.is_filled(field) {
                filled.set_field(*field, self.placeholder(field));
            }
        }
        filled
    }

    /// Required draft fields that are currently empty
    pub fn missing(&self, draft: &DraftRecord, required: &[&'static str]) -> Vec<&'static str> {
        required
            .iter()
            .copied()
            .filter(|field| !draft.is_filled(field))
            .collect()
    }

    /// Everything a homepage slot needs: the publish fields plus the slot fields
    pub fn slot_requirements(&self) -> Vec<&'static str> {
        let mut fields = self.required_for_publish.to_vec();
        for field in self.required_for_slot {
            if !fields.contains(field) {
                fields.push(field);
            }
        }
        fields
    }

    /// Human-readable requirements still open, including the cover image
    pub fn unmet_with_cover(&self, draft: &DraftRecord, required: &[&'static str]) -> Vec<String> {
        let mut unmet: Vec<String> = self
            .missing(draft, required)
            .into_iter()
            .map(|field| field.replace('_', " "))
            .collect();
        if draft.cover(self.media_collection).is_none() {
            unmet.push("cover image".to_string());
        }
        unmet
    }
}
