//! Typed merge of A/B variant slot overrides onto a configuration tree.
//!
//! Precedence on an existing slot: `props` and `styles` merge key by key with
//! the override winning on collisions; `type`, `content`, `children` and any
//! other key the override sets replace the slot's value; keys the override
//! does not mention are left alone. Applying several variants in sequence
//! therefore lets a later variant win on the keys it shares with an earlier
//! one while keeping the earlier variant's other keys.
//!
//! A slot the base does not define is inserted and also attached to the
//! tree: appended to the children of the slot named by its `parentId`, or to
//! `rootSlots` when that parent is missing or unset. Served trees therefore
//! differ from an insert-only merge that leaves new slots detached.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::configuration::{ConfigurationTree, JsonMap, SlotDef};

/// A partial slot definition carried by an experiment variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotOverride {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub slot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    /// `false` suppresses insertion of a slot the base does not define.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Placement for a slot the base does not define.
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Slot overrides of one variant, in the order the variant lists them.
pub type SlotOverrides = IndexMap<String, SlotOverride>;

/// What applying one variant's overrides did to the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverrideOutcome {
    pub merged: Vec<String>,
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Merge `patch` onto an existing slot.
pub fn merge_slot(slot: &mut SlotDef, patch: &SlotOverride) {
    if let Some(slot_type) = &patch.slot_type {
        slot.slot_type = slot_type.clone();
    }
    if let Some(props) = &patch.props {
        merge_map(&mut slot.props, props);
    }
    if let Some(styles) = &patch.styles {
        merge_map(&mut slot.styles, styles);
    }
    if let Some(content) = &patch.content {
        slot.content = Some(content.clone());
    }
    if let Some(children) = &patch.children {
        slot.children = children.clone();
    }
    if let Some(enabled) = patch.enabled {
        slot.extra.insert("enabled".to_string(), Value::Bool(enabled));
    }
    if let Some(parent_id) = &patch.parent_id {
        slot.extra
            .insert("parentId".to_string(), Value::String(parent_id.clone()));
    }
    merge_map(&mut slot.extra, &patch.extra);
}

/// Build a brand-new slot from an override that targets an unknown slot id.
pub fn slot_from_override(patch: &SlotOverride) -> SlotDef {
    let mut slot = SlotDef::default();
    merge_slot(&mut slot, patch);
    slot
}

/// Apply every override of one variant to `tree`, in listed order.
///
/// Overrides for existing slots are merged with [`merge_slot`]. An override
/// for an unknown slot is inserted unless it says `enabled: false`; the new
/// slot is appended to its `parentId`'s children when that parent exists,
/// otherwise to `rootSlots`, so it is always reachable from the root.
pub fn apply_slot_overrides(
    tree: &mut ConfigurationTree,
    overrides: &SlotOverrides,
) -> OverrideOutcome {
    let mut outcome = OverrideOutcome::default();

    for (slot_id, patch) in overrides {
        if let Some(slot) = tree.slots.get_mut(slot_id) {
            merge_slot(slot, patch);
            outcome.merged.push(slot_id.clone());
            continue;
        }

        if patch.enabled == Some(false) {
            outcome.skipped.push(slot_id.clone());
            continue;
        }

        tree.slots.insert(slot_id.clone(), slot_from_override(patch));
        attach_new_slot(tree, slot_id, patch.parent_id.as_deref());
        outcome.inserted.push(slot_id.clone());
    }

    outcome
}

/// Link an inserted slot under `parent_id`, falling back to the root.
fn attach_new_slot(tree: &mut ConfigurationTree, slot_id: &str, parent_id: Option<&str>) {
    let parent = parent_id
        .filter(|p| *p != slot_id)
        .and_then(|p| tree.slots.get_mut(p));

    match parent {
        Some(parent) => {
            if !parent.children.iter().any(|c| c == slot_id) {
                parent.children.push(slot_id.to_string());
            }
        }
        None => {
            if !tree.root_slots.iter().any(|r| r == slot_id) {
                tree.root_slots.push(slot_id.to_string());
            }
        }
    }
}

fn merge_map(target: &mut JsonMap, patch: &JsonMap) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}
