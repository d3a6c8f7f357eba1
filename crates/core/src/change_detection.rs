//! Structural change detection between a draft and the published tree.
//!
//! Trees are compared in canonical JSON form: object key order is irrelevant,
//! array order (root slots, children) is significant. Metadata keys the
//! editor rewrites on every save are ignored so a save without edits does not
//! count as a change.

use serde::Serialize;
use serde_json::Value;

use crate::configuration::ConfigurationTree;
use crate::diff::DiffStatus;

/// Metadata keys excluded from comparison.
pub const VOLATILE_METADATA_KEYS: &[&str] = &["lastModified", "lastSaved", "updatedAt"];

/// A slot that differs between the two trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotChange {
    pub slot_id: String,
    pub status: DiffStatus,
}

/// Per-slot breakdown of how a draft differs from its published counterpart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSummary {
    pub slot_changes: Vec<SlotChange>,
    pub root_order_changed: bool,
    pub metadata_changed: bool,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.slot_changes.is_empty() && !self.root_order_changed && !self.metadata_changed
    }
}

/// Returns `true` when `draft` differs from `published`.
///
/// A missing published counterpart always counts as a change.
pub fn has_changes(draft: &ConfigurationTree, published: Option<&ConfigurationTree>) -> bool {
    match published {
        None => true,
        Some(published) => canonical(draft) != canonical(published),
    }
}

/// Slot-level breakdown of the differences found by [`has_changes`].
///
/// With no published counterpart every draft slot is reported as added.
/// Slot ids are listed in sorted order.
pub fn summarize_changes(
    draft: &ConfigurationTree,
    published: Option<&ConfigurationTree>,
) -> ChangeSummary {
    let empty = ConfigurationTree::empty();
    let base = published.unwrap_or(&empty);

    let mut ids: Vec<&String> = draft.slots.keys().chain(base.slots.keys()).collect();
    ids.sort();
    ids.dedup();

    let slot_changes = ids
        .into_iter()
        .filter_map(|id| {
            let status = match (draft.slots.get(id), base.slots.get(id)) {
                (Some(_), None) => DiffStatus::Added,
                (None, Some(_)) => DiffStatus::Removed,
                (Some(a), Some(b)) if a != b => DiffStatus::Changed,
                _ => return None,
            };
            Some(SlotChange {
                slot_id: id.clone(),
                status,
            })
        })
        .collect();

    ChangeSummary {
        slot_changes,
        root_order_changed: draft.root_slots != base.root_slots,
        metadata_changed: stable_metadata(&draft.metadata) != stable_metadata(&base.metadata),
    }
}

fn canonical(tree: &ConfigurationTree) -> Value {
    let mut value = tree.to_value();
    if let Some(metadata) = value.get_mut("metadata").and_then(Value::as_object_mut) {
        for key in VOLATILE_METADATA_KEYS {
            metadata.remove(*key);
        }
    }
    value
}

fn stable_metadata(metadata: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    metadata
        .iter()
        .filter(|(k, _)| !VOLATILE_METADATA_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ConfigurationTree {
        ConfigurationTree::from_value(&value).unwrap()
    }

    fn base() -> ConfigurationTree {
        tree(json!({
            "slots": {
                "main": {"type": "container", "children": ["hero"]},
                "hero": {"type": "image", "props": {"src": "/a.png", "alt": "A"}}
            },
            "rootSlots": ["main"],
            "metadata": {"name": "Cart", "lastModified": "2026-01-01T00:00:00Z"}
        }))
    }

    #[test]
    fn identical_trees_have_no_changes() {
        assert!(!has_changes(&base(), Some(&base())));
        assert!(summarize_changes(&base(), Some(&base())).is_empty());
    }

    #[test]
    fn missing_published_counts_as_change() {
        assert!(has_changes(&base(), None));
        assert!(has_changes(&ConfigurationTree::empty(), None));
    }

    #[test]
    fn key_order_is_irrelevant() {
        let reordered = tree(json!({
            "metadata": {"lastModified": "2026-01-01T00:00:00Z", "name": "Cart"},
            "rootSlots": ["main"],
            "slots": {
                "hero": {"props": {"alt": "A", "src": "/a.png"}, "type": "image"},
                "main": {"children": ["hero"], "type": "container"}
            }
        }));
        assert!(!has_changes(&reordered, Some(&base())));
    }

    #[test]
    fn volatile_metadata_is_ignored() {
        let mut draft = base();
        draft
            .metadata
            .insert("lastModified".into(), json!("2026-02-02T00:00:00Z"));
        assert!(!has_changes(&draft, Some(&base())));
        assert!(summarize_changes(&draft, Some(&base())).is_empty());
    }

    #[test]
    fn prop_change_is_detected_and_summarised() {
        let mut draft = base();
        draft
            .slots
            .get_mut("hero")
            .unwrap()
            .props
            .insert("src".into(), json!("/b.png"));
        assert!(has_changes(&draft, Some(&base())));

        let summary = summarize_changes(&draft, Some(&base()));
        assert_eq!(
            summary.slot_changes,
            vec![SlotChange {
                slot_id: "hero".into(),
                status: DiffStatus::Changed
            }]
        );
        assert!(!summary.root_order_changed);
    }

    #[test]
    fn child_order_is_significant() {
        let a = tree(json!({
            "slots": {"m": {"type": "c", "children": ["x", "y"]}, "x": {}, "y": {}},
            "rootSlots": ["m"]
        }));
        let b = tree(json!({
            "slots": {"m": {"type": "c", "children": ["y", "x"]}, "x": {}, "y": {}},
            "rootSlots": ["m"]
        }));
        assert!(has_changes(&a, Some(&b)));
    }

    #[test]
    fn added_removed_and_root_order() {
        let draft = tree(json!({
            "slots": {"main": {"type": "container"}, "promo": {"type": "text"}},
            "rootSlots": ["promo", "main"]
        }));
        let summary = summarize_changes(&draft, Some(&base()));
        let find = |id: &str| {
            summary
                .slot_changes
                .iter()
                .find(|c| c.slot_id == id)
                .unwrap()
                .status
        };
        assert_eq!(find("promo"), DiffStatus::Added);
        assert_eq!(find("hero"), DiffStatus::Removed);
        assert_eq!(find("main"), DiffStatus::Changed);
        assert!(summary.root_order_changed);
        assert!(summary.metadata_changed);
    }

    #[test]
    fn summary_without_published_lists_every_slot_as_added() {
        let summary = summarize_changes(&base(), None);
        assert_eq!(summary.slot_changes.len(), 2);
        assert!(summary
            .slot_changes
            .iter()
            .all(|c| c.status == DiffStatus::Added));
    }
}
