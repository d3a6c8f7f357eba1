//! Typed page-layout configuration tree and its write-time validation.
//!
//! A configuration is a flat map of slot definitions plus an ordered list of
//! root slot ids; nesting is expressed through each slot's `children` list.
//! Shape and cross-reference checks run when a draft is written, so readers
//! (publishing, overlay resolution) can trust stored trees.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// JSON object used for free-form props, styles and metadata.
pub type JsonMap = serde_json::Map<String, Value>;

/// Maximum number of slots a single configuration may define.
pub const MAX_SLOTS: usize = 1000;

/// Maximum length of a slot id.
pub const MAX_SLOT_ID_LENGTH: usize = 128;

/// The configuration tree stored on every version record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationTree {
    pub slots: BTreeMap<String, SlotDef>,
    #[serde(rename = "rootSlots")]
    pub root_slots: Vec<String>,
    #[serde(default)]
    pub metadata: JsonMap,
}

/// A single slot definition.
///
/// Keys the editor stores beyond the core fields (layout hints, `parentId`,
/// `className`, ...) are kept in `extra` so they survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    #[serde(rename = "type", default)]
    pub slot_type: String,
    #[serde(default)]
    pub props: JsonMap,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub styles: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl SlotDef {
    pub fn new(slot_type: &str) -> Self {
        Self {
            slot_type: slot_type.to_string(),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: &[&str]) -> Self {
        self.children = children.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }
}

impl ConfigurationTree {
    /// The empty tree held by `init` records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate a tree received from a client.
    ///
    /// Missing or mistyped `slots`/`rootSlots` and dangling references are
    /// reported as [`CoreError::Validation`].
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::Validation(
                "Configuration must be a JSON object".to_string(),
            ));
        }
        let tree: ConfigurationTree = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Invalid configuration: {e}")))?;
        tree.validate()?;
        Ok(tree)
    }

    /// Serialize into a JSON value. Infallible for this type.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Check slot ids and every `rootSlots`/`children` reference.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.slots.len() > MAX_SLOTS {
            return Err(CoreError::Validation(format!(
                "Configuration must not define more than {MAX_SLOTS} slots, got {}",
                self.slots.len()
            )));
        }

        for id in self.slots.keys() {
            validate_slot_id(id)?;
        }

        let mut seen_roots = HashSet::new();
        for root in &self.root_slots {
            if !self.slots.contains_key(root) {
                return Err(CoreError::Validation(format!(
                    "rootSlots references unknown slot '{root}'"
                )));
            }
            if !seen_roots.insert(root.as_str()) {
                return Err(CoreError::Validation(format!(
                    "rootSlots lists slot '{root}' more than once"
                )));
            }
        }

        for (id, slot) in &self.slots {
            for child in &slot.children {
                if child == id {
                    return Err(CoreError::Validation(format!(
                        "Slot '{id}' lists itself as a child"
                    )));
                }
                if !self.slots.contains_key(child) {
                    return Err(CoreError::Validation(format!(
                        "Slot '{id}' references unknown child slot '{child}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Whether `slot_id` can be reached from `rootSlots` through `children`.
    pub fn is_reachable(&self, slot_id: &str) -> bool {
        let mut stack: Vec<&str> = self.root_slots.iter().map(String::as_str).collect();
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == slot_id {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(slot) = self.slots.get(current) {
                stack.extend(slot.children.iter().map(String::as_str));
            }
        }
        false
    }
}

fn validate_slot_id(id: &str) -> Result<(), CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::Validation(
            "Slot id must not be empty".to_string(),
        ));
    }
    if id.len() > MAX_SLOT_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "Slot id must not exceed {MAX_SLOT_ID_LENGTH} characters, got {}",
            id.len()
        )));
    }
    Ok(())
}
