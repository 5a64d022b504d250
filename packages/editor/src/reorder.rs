//! # Positional Reordering
//!
//! Pure permutation logic for ordered collections.
//!
//! ## Semantics
//!
//! - `reorder(items, dragged, target)` removes `dragged` and reinserts it at
//!   `target`'s former index; everything in between shifts by one
//! - Equal ids, or an id that is not present, make the call a no-op
//! - After every call the `order` values are `0..len`, matching slice position
//! - Media roles are derived from order (see [`MediaRole::at`]), so there is
//!   nothing to recompute beyond renumbering

use crate::draft::{FeatureRow, MediaItem, MediaRole};
use atelier_common::EditorError;

/// An item with a stable id and a zero-based position
pub trait Positioned {
    fn id(&self) -> &str;
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

impl Positioned for MediaItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

impl Positioned for FeatureRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

/// Move `dragged_id` to the position currently held by `target_id`.
///
/// Returns `true` if the collection changed.
pub fn reorder<T: Positioned>(items: &mut Vec<T>, dragged_id: &str, target_id: &str) -> bool {
    if dragged_id == target_id {
        return false;
    }

    let from = items.iter().position(|item| item.id() == dragged_id);
    let to = items.iter().position(|item| item.id() == target_id);

    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (from, to),
        _ => return false,
    };

    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);

    tracing::debug!(dragged = dragged_id, target = target_id, from, to, "reordered collection");
    true
}

/// Sort by current order (stable) and rewrite order values as `0..len`
pub fn normalize<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
    renumber(items);
}

/// Rewrite order values to match slice position
pub fn renumber<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index);
    }
}

/// Remove an item by id and close the gap. Returns the removed item.
pub fn remove<T: Positioned>(items: &mut Vec<T>, id: &str) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    let removed = items.remove(index);
    renumber(items);
    Some(removed)
}

/// Roles for a media collection, in slice order
pub fn roles(items: &[MediaItem], portfolio_slots: usize) -> Vec<MediaRole> {
    items
        .iter()
        .map(|item| item.role(portfolio_slots))
        .collect()
}

/// Id of a draggable item inside a view hosting several independent groups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    pub category: String,
    pub item_id: String,
}

impl CompositeId {
    pub fn new(category: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            item_id: item_id.into(),
        }
    }

    /// Parse the `category:item` form carried by drag events
    pub fn parse(raw: &str) -> Option<Self> {
        let (category, item_id) = raw.split_once(':')?;
        if category.is_empty() || item_id.is_empty() {
            return None;
        }
        Some(Self::new(category, item_id))
    }
}

/// Check that a drag stays inside one category.
///
/// Cross-category drops are refused outright; nothing is moved.
pub fn same_category<'a>(
    source: &'a CompositeId,
    destination: &'a CompositeId,
) -> Result<&'a str, EditorError> {
    if source.category != destination.category {
        return Err(EditorError::validation(format!(
            "Cannot move an item from '{}' to '{}'",
            source.category, destination.category
        )));
    }
    Ok(&source.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::RemoteRef;

    fn media(ids: &[&str]) -> Vec<MediaItem> {
        ids.iter()
            .enumerate()
            .map(|(order, id)| MediaItem {
                id: id.to_string(),
                remote_ref: RemoteRef {
                    url: format!("https://cdn.test/{}", id),
                    thumbnail_url: None,
                },
                order,
            })
            .collect()
    }

    fn ids(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|m| m.id.as_str()).collect()
    }

    fn assert_contiguous(items: &[MediaItem]) {
        for (index, item) in items.iter().enumerate() {
            assert_eq!(item.order, index);
        }
    }

    #[test]
    fn test_move_forward() {
        let mut items = media(&["a", "b", "c", "d"]);
        assert!(reorder(&mut items, "a", "c"));
        assert_eq!(ids(&items), vec!["b", "c", "a", "d"]);
        assert_contiguous(&items);
    }

    #[test]
    fn test_move_backward_becomes_cover() {
        let mut items = media(&["a", "b", "c", "d"]);
        assert!(reorder(&mut items, "d", "a"));
        assert_eq!(ids(&items), vec!["d", "a", "b", "c"]);
        assert_contiguous(&items);

        let roles = roles(&items, 3);
        assert_eq!(roles[0], MediaRole::Cover);
        assert_eq!(roles.iter().filter(|r| **r == MediaRole::Cover).count(), 1);
    }

    #[test]
    fn test_noop_cases() {
        let mut items = media(&["a", "b", "c"]);
        assert!(!reorder(&mut items, "b", "b"));
        assert!(!reorder(&mut items, "x", "b"));
        assert!(!reorder(&mut items, "a", "x"));
        assert_eq!(ids(&items), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_every_pair_is_a_permutation() {
        let all = ["a", "b", "c", "d", "e", "f"];
        for dragged in all {
            for target in all {
                let mut items = media(&all);
                reorder(&mut items, dragged, target);

                let mut seen = ids(&items);
                seen.sort();
                assert_eq!(seen, all.to_vec());
                assert_contiguous(&items);

                let roles = roles(&items, 3);
                assert_eq!(roles.iter().filter(|r| **r == MediaRole::Cover).count(), 1);
                assert_eq!(items[0].role(3), MediaRole::Cover);
                assert_eq!(roles[4], MediaRole::None);
            }
        }
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut items = media(&["a", "b", "c"]);
        let removed = remove(&mut items, "a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(ids(&items), vec!["b", "c"]);
        assert_contiguous(&items);
        assert_eq!(items[0].role(3), MediaRole::Cover);
    }

    #[test]
    fn test_normalize_sorts_by_order() {
        let mut items = media(&["a", "b", "c"]);
        items[0].order = 7;
        items[1].order = 2;
        items[2].order = 5;
        normalize(&mut items);
        assert_eq!(ids(&items), vec!["b", "c", "a"]);
        assert_contiguous(&items);
    }

    #[test]
    fn test_composite_ids() {
        let source = CompositeId::parse("interior:p1").unwrap();
        let same = CompositeId::parse("interior:p4").unwrap();
        let other = CompositeId::parse("exterior:p2").unwrap();

        assert_eq!(same_category(&source, &same).unwrap(), "interior");
        assert!(matches!(
            same_category(&source, &other),
            Err(EditorError::Validation(_))
        ));
        assert!(CompositeId::parse("no-separator").is_none());
        assert!(CompositeId::parse(":p1").is_none());
    }
}
