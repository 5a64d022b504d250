//! # Snapshot Differ
//!
//! Dirty-state tracking for the draft.
//!
//! A [`Snapshot`] is a normalized value tree of the draft plus the outstanding
//! pending uploads. Object keys are sorted, collections are sorted by order,
//! and pending uploads are reduced to name/size/modification time, so two
//! snapshots are equal exactly when the editable state is equal.
//!
//! The baseline is frozen only once hydration has finished; until then the
//! session is never dirty.

use crate::draft::{Collection, DraftRecord};
use crate::media::{FileFingerprint, PendingUpload};
use crate::reorder;
use serde_json::{json, Map, Value};

/// Immutable, order-normalized encoding of the editable state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tree: Value,
}

impl Snapshot {
    pub fn as_value(&self) -> &Value {
        &self.tree
    }

    /// Top-level paths whose values differ between two snapshots
    pub fn changed_paths(&self, other: &Snapshot) -> Vec<String> {
        let mut paths = Vec::new();
        for section in ["record", "fields", "collections", "translations"] {
            let ours = self.tree.get(section).and_then(Value::as_object);
            let theirs = other.tree.get(section).and_then(Value::as_object);
            match (ours, theirs) {
                (Some(ours), Some(theirs)) => {
                    let mut keys: Vec<&String> = ours.keys().chain(theirs.keys()).collect();
                    keys.sort();
                    keys.dedup();
                    for key in keys {
                        if ours.get(key) != theirs.get(key) {
                            paths.push(format!("{}.{}", section, key));
                        }
                    }
                }
                (ours, theirs) if ours != theirs => paths.push(section.to_string()),
                _ => {}
            }
        }
        if self.tree.get("pending") != other.tree.get("pending") {
            paths.push("pending".to_string());
        }
        paths
    }
}

/// Encode the draft and pending uploads for equality comparison.
pub fn compute_snapshot(draft: &DraftRecord, pending: &[PendingUpload]) -> Snapshot {
    let record = encode_record(draft);

    let fields: Map<String, Value> = draft
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), encode(value)))
        .collect();

    let collections: Map<String, Value> = draft
        .collections
        .iter()
        .map(|(name, collection)| (name.clone(), encode_collection(collection)))
        .collect();

    let translations: Map<String, Value> = draft
        .translations
        .iter()
        .map(|(locale, translation)| (locale.clone(), encode(translation)))
        .collect();

    let mut pending_files: Vec<(&str, FileFingerprint)> = pending
        .iter()
        .map(|upload| (upload.collection.as_str(), upload.file.fingerprint()))
        .collect();
    pending_files.sort();

    let pending: Vec<Value> = pending_files
        .into_iter()
        .map(|(collection, fingerprint)| {
            json!({
                "collection": collection,
                "name": fingerprint.name,
                "size": fingerprint.size,
                "modified": fingerprint.modified,
            })
        })
        .collect();

    Snapshot {
        tree: json!({
            "record": record,
            "fields": fields,
            "collections": collections,
            "translations": translations,
            "pending": pending,
        }),
    }
}

fn encode_record(draft: &DraftRecord) -> Value {
    json!({
        "persistedId": draft.persisted_id.as_ref().map(|id| id.as_str()),
        "kind": encode(&draft.kind),
        "slug": draft.slug,
        "status": encode(&draft.status),
        "homepageSlot": encode(&draft.homepage_slot),
        "translationsLocked": draft.translations_locked,
    })
}

fn encode_collection(collection: &Collection) -> Value {
    match collection {
        Collection::Media(items) => {
            let mut items = items.clone();
            reorder::normalize(&mut items);
            encode(&items)
        }
        Collection::Rows(rows) => {
            let mut rows = rows.clone();
            reorder::normalize(&mut rows);
            encode(&rows)
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Value {
    // Keys are always strings, so this cannot fail for draft types.
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!("snapshot encoding failed: {}", e);
        Value::Null
    })
}

/// Holds the frozen baseline and answers "is the draft dirty?"
#[derive(Debug, Default)]
pub struct SnapshotDiffer {
    baseline: Option<Snapshot>,
}

impl SnapshotDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the baseline (after hydration or after a successful commit)
    pub fn reset_baseline(&mut self, snapshot: Snapshot) {
        self.baseline = Some(snapshot);
    }

    /// Accept the draft's record metadata (id, slug, status, slot, lock) into
    /// the baseline, leaving field and collection edits dirty. Used after
    /// narrow store operations that only touch metadata.
    pub fn patch_record(&mut self, draft: &DraftRecord) {
        if let Some(Value::Object(sections)) = self.baseline.as_mut().map(|b| &mut b.tree) {
            sections.insert("record".to_string(), encode_record(draft));
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<&Snapshot> {
        self.baseline.as_ref()
    }

    /// Dirty means the current snapshot differs from the frozen baseline.
    /// Always `false` before the baseline exists.
    pub fn is_dirty(&self, current: &Snapshot) -> bool {
        match &self.baseline {
            Some(baseline) => baseline != current,
            None => false,
        }
    }

    pub fn changed_paths(&self, current: &Snapshot) -> Vec<String> {
        match &self.baseline {
            Some(baseline) => baseline.changed_paths(current),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{FieldValue, MediaItem, RecordKind, RemoteRef};
    use crate::media::{FileHandle, LocalId};
    use crate::preview::PreviewRegistry;
    use chrono::{TimeZone, Utc};

    fn photo(id: &str, order: usize) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            remote_ref: RemoteRef {
                url: format!("https://cdn.test/{}", id),
                thumbnail_url: None,
            },
            order,
        }
    }

    fn pending(previews: &mut PreviewRegistry, name: &str) -> PendingUpload {
        PendingUpload {
            local_id: LocalId(1),
            collection: "photos".to_string(),
            file: FileHandle::new(
                name,
                "image/png",
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                vec![0u8; 8],
            ),
            preview: previews.create(),
        }
    }

    #[test]
    fn test_not_dirty_before_baseline() {
        let differ = SnapshotDiffer::new();
        let mut draft = DraftRecord::new(RecordKind::Article);
        draft.set_field("title", FieldValue::text("Loading..."));
        assert!(!differ.is_dirty(&compute_snapshot(&draft, &[])));
        assert!(!differ.is_hydrated());
    }

    #[test]
    fn test_field_edit_marks_dirty_and_revert_clears() {
        let mut draft = DraftRecord::new(RecordKind::Article);
        draft.set_field("title", FieldValue::text("Spring"));

        let mut differ = SnapshotDiffer::new();
        differ.reset_baseline(compute_snapshot(&draft, &[]));

        draft.set_field("title", FieldValue::text("Summer"));
        let current = compute_snapshot(&draft, &[]);
        assert!(differ.is_dirty(&current));
        assert_eq!(differ.changed_paths(&current), vec!["fields.title"]);

        draft.set_field("title", FieldValue::text("Spring"));
        assert!(!differ.is_dirty(&compute_snapshot(&draft, &[])));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = DraftRecord::new(RecordKind::Property);
        a.set_field("price", FieldValue::Integer(100));
        a.set_field("city", FieldValue::text("Izmir"));

        let mut b = DraftRecord::new(RecordKind::Property);
        b.set_field("city", FieldValue::text("Izmir"));
        b.set_field("price", FieldValue::Integer(100));

        assert_eq!(compute_snapshot(&a, &[]), compute_snapshot(&b, &[]));
    }

    #[test]
    fn test_collection_storage_order_is_normalized() {
        let mut a = DraftRecord::new(RecordKind::Property);
        a.collections.insert(
            "photos".to_string(),
            Collection::Media(vec![photo("x", 0), photo("y", 1)]),
        );
        let mut b = DraftRecord::new(RecordKind::Property);
        b.collections.insert(
            "photos".to_string(),
            Collection::Media(vec![photo("y", 1), photo("x", 0)]),
        );
        assert_eq!(compute_snapshot(&a, &[]), compute_snapshot(&b, &[]));

        // A real reorder changes the snapshot
        let mut c = a.clone();
        if let Some(items) = c.media_mut("photos") {
            crate::reorder::reorder(items, "y", "x");
        }
        assert_ne!(compute_snapshot(&a, &[]), compute_snapshot(&c, &[]));
    }

    #[test]
    fn test_patch_record_keeps_field_edits_dirty() {
        let mut draft = DraftRecord::new(RecordKind::Property);
        let mut differ = SnapshotDiffer::new();
        differ.reset_baseline(compute_snapshot(&draft, &[]));

        draft.set_field("title", FieldValue::text("Garden flat"));
        draft.persisted_id = Some(crate::draft::RecordId::new("rec-4"));
        draft.slug = Some("garden-flat".to_string());
        differ.patch_record(&draft);

        let current = compute_snapshot(&draft, &[]);
        assert_eq!(differ.changed_paths(&current), vec!["fields.title"]);

        draft.clear_field("title");
        assert!(!differ.is_dirty(&compute_snapshot(&draft, &[])));
    }

    #[test]
    fn test_patch_record_without_baseline_is_noop() {
        let mut differ = SnapshotDiffer::new();
        differ.patch_record(&DraftRecord::new(RecordKind::Article));
        assert!(!differ.is_hydrated());
    }

    #[test]
    fn test_pending_selection_marks_dirty() {
        let draft = DraftRecord::new(RecordKind::Project);
        let mut previews = PreviewRegistry::new();
        let mut differ = SnapshotDiffer::new();
        differ.reset_baseline(compute_snapshot(&draft, &[]));

        let selection = vec![pending(&mut previews, "front.png")];
        let current = compute_snapshot(&draft, &selection);
        assert!(differ.is_dirty(&current));
        assert_eq!(differ.changed_paths(&current), vec!["pending"]);
    }
}
