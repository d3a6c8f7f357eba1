//! Record metadata and the single-level revert snapshot it carries.
//!
//! A revert draft stores what it replaced under `metadata.revertMetadata`:
//! either the full state of the user's previous draft, or a marker saying
//! there was none. Undo restores from that snapshot (or deletes the draft).
//! A second revert overwrites the snapshot; there is no undo stack.

use serde::{Deserialize, Serialize};

use crate::configuration::{ConfigurationTree, JsonMap};
use crate::slot_status::SlotStatus;
use crate::types::DbId;

/// The `metadata` column of a slot configuration record.
///
/// Keys other than `revertMetadata` are preserved untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(
        rename = "revertMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub revert_metadata: Option<RevertMetadata>,
    #[serde(flatten)]
    pub other: JsonMap,
}

/// What a revert draft replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RevertMetadata {
    Replaced(RevertSnapshot),
    NoPreviousDraft(NoPreviousDraft),
}

/// Full state of the draft a revert overwrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertSnapshot {
    pub replaced_draft_id: DbId,
    pub original_configuration: ConfigurationTree,
    pub original_parent_version_id: Option<DbId>,
    pub original_current_edit_id: Option<DbId>,
    pub original_has_unpublished_changes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_status: Option<SlotStatus>,
}

/// Marker for a revert draft created when the user had no draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoPreviousDraft {
    pub no_previous_draft: bool,
}

impl RevertMetadata {
    pub fn no_previous_draft() -> Self {
        Self::NoPreviousDraft(NoPreviousDraft {
            no_previous_draft: true,
        })
    }
}

impl RecordMetadata {
    /// Replace any existing snapshot with `revert`.
    pub fn with_revert(mut self, revert: RevertMetadata) -> Self {
        self.revert_metadata = Some(revert);
        self
    }

    /// Remove and return the snapshot, leaving other keys intact.
    pub fn take_revert(&mut self) -> Option<RevertMetadata> {
        self.revert_metadata.take()
    }

    pub fn is_empty(&self) -> bool {
        self.revert_metadata.is_none() && self.other.is_empty()
    }

    /// `None` when nothing is left, so an undo does not leave `{}` behind.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_previous_draft_shape() {
        let meta = RecordMetadata::default().with_revert(RevertMetadata::no_previous_draft());
        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({"revertMetadata": {"noPreviousDraft": true}})
        );
    }

    #[test]
    fn snapshot_round_trips_and_keeps_other_keys() {
        let value = json!({
            "source": "editor",
            "revertMetadata": {
                "replacedDraftId": 12,
                "originalConfiguration": {"slots": {}, "rootSlots": [], "metadata": {}},
                "originalParentVersionId": 4,
                "originalCurrentEditId": null,
                "originalHasUnpublishedChanges": true
            }
        });
        let meta: RecordMetadata = serde_json::from_value(value.clone()).unwrap();
        match &meta.revert_metadata {
            Some(RevertMetadata::Replaced(snapshot)) => {
                assert_eq!(snapshot.replaced_draft_id, 12);
                assert_eq!(snapshot.original_parent_version_id, Some(4));
                assert_eq!(snapshot.original_current_edit_id, None);
                assert!(snapshot.original_has_unpublished_changes);
                assert_eq!(snapshot.original_status, None);
            }
            other => panic!("unexpected metadata: {other:?}"),
        }
        assert_eq!(meta.other["source"], json!("editor"));
        assert_eq!(serde_json::to_value(&meta).unwrap(), value);
    }

    #[test]
    fn no_previous_draft_parses() {
        let meta: RecordMetadata =
            serde_json::from_value(json!({"revertMetadata": {"noPreviousDraft": true}})).unwrap();
        assert_eq!(
            meta.revert_metadata,
            Some(RevertMetadata::no_previous_draft())
        );
    }

    #[test]
    fn take_revert_leaves_other_keys() {
        let mut meta: RecordMetadata = serde_json::from_value(json!({
            "note": "keep me",
            "revertMetadata": {"noPreviousDraft": true}
        }))
        .unwrap();
        assert!(meta.take_revert().is_some());
        assert_eq!(meta.other["note"], json!("keep me"));
        assert!(meta.clone().into_option().is_some());

        let mut only_revert =
            RecordMetadata::default().with_revert(RevertMetadata::no_previous_draft());
        only_revert.take_revert();
        assert!(only_revert.into_option().is_none());
    }
}
