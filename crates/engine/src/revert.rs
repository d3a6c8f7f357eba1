//! Reverting a page to an earlier acceptance/published version.
//!
//! The canonical mechanism is the revert draft: the target's content is
//! copied into the user's draft and the draft it replaced is kept as a
//! single-level undo snapshot in `metadata.revertMetadata`.
//!
//! The legacy whole-version revert is an adapter over the same
//! derive-from-target step: instead of a draft it inserts a new published
//! version and marks every later published/acceptance version `reverted`.

use std::sync::Arc;

use serde::Serialize;
use storefront_core::error::CoreError;
use storefront_core::revert::{RecordMetadata, RevertMetadata, RevertSnapshot};
use storefront_core::slot_status::{self, require_status, SlotStatus};
use storefront_core::types::DbId;
use storefront_db::models::slot_configuration::{
    DraftInsert, NewSlotConfiguration, SlotConfiguration, SlotContentUpdate,
};
use storefront_db::store::VersionStore;

use crate::error::EngineResult;
use crate::records::{load, require_owner, stale_write};

#[derive(Clone)]
pub struct RevertEngine {
    store: Arc<dyn VersionStore>,
}

/// Result of [`RevertEngine::undo_revert`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UndoOutcome {
    /// The revert draft replaced an earlier draft, which is back in place.
    Restored { record: SlotConfiguration },
    /// The user had no draft before the revert, so the revert draft is gone.
    Deleted { id: DbId },
}

/// Result of [`RevertEngine::revert_to_version`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyRevert {
    pub record: SlotConfiguration,
    pub superseded_count: u64,
}

impl RevertEngine {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Turn the user's draft for the target's page into a copy of the target.
    ///
    /// An existing open record is overwritten in place after its full state
    /// is saved as the undo snapshot; otherwise a new draft is created and
    /// marked as having no previous draft.
    pub async fn create_revert_draft(
        &self,
        store_id: DbId,
        target_id: DbId,
        user_id: DbId,
    ) -> EngineResult<SlotConfiguration> {
        let target = load(self.store.as_ref(), store_id, target_id).await?;
        require_status(target_id, target.status, &SlotStatus::REVERTIBLE)?;

        let existing = self
            .store
            .find_open_draft(store_id, target.page_type, user_id)
            .await?;
        let record = match existing {
            Some(draft) => self.overwrite_draft(&draft, &target).await?,
            None => {
                let metadata =
                    RecordMetadata::default().with_revert(RevertMetadata::no_previous_draft());
                let mut input = derive_from_target(&target, user_id, SlotStatus::Draft);
                input.current_edit_id = Some(target.id);
                input.has_unpublished_changes = true;
                input.metadata = Some(metadata);

                match self.store.insert_draft_if_absent(input).await? {
                    DraftInsert::Created(record) => record,
                    // Lost a race with another first edit: revert that draft instead.
                    DraftInsert::Existing(draft) => self.overwrite_draft(&draft, &target).await?,
                }
            }
        };

        tracing::info!(
            store_id,
            page_type = %record.page_type,
            config_id = record.id,
            user_id,
            version_number = record.version_number,
            target_id,
            target_version = target.version_number,
            "Created revert draft",
        );
        Ok(record)
    }

    async fn overwrite_draft(
        &self,
        draft: &SlotConfiguration,
        target: &SlotConfiguration,
    ) -> EngineResult<SlotConfiguration> {
        let snapshot = RevertSnapshot {
            replaced_draft_id: draft.id,
            original_configuration: draft.tree().clone(),
            original_parent_version_id: draft.parent_version_id,
            original_current_edit_id: draft.current_edit_id,
            original_has_unpublished_changes: draft.has_unpublished_changes,
            original_status: Some(draft.status),
        };
        let metadata = draft
            .record_metadata()
            .with_revert(RevertMetadata::Replaced(snapshot));

        let update = SlotContentUpdate {
            status: SlotStatus::Draft,
            configuration: target.tree().clone(),
            parent_version_id: Some(target.id),
            current_edit_id: Some(target.id),
            has_unpublished_changes: true,
            metadata: Some(metadata),
        };

        match self.store.update_content(draft.store_id, draft.id, update).await? {
            Some(record) => Ok(record),
            None => Err(stale_write(
                self.store.as_ref(),
                draft.store_id,
                draft.id,
                &SlotStatus::OPEN,
            )
            .await),
        }
    }

    /// Undo the most recent revert on a revert draft.
    ///
    /// Restores the replaced draft's configuration, lineage and flag exactly
    /// and drops the snapshot (other metadata keys stay), or deletes the
    /// draft when the revert created it.
    pub async fn undo_revert(
        &self,
        store_id: DbId,
        draft_id: DbId,
        user_id: DbId,
    ) -> EngineResult<UndoOutcome> {
        let draft = load(self.store.as_ref(), store_id, draft_id).await?;
        require_owner(&draft, user_id)?;
        require_status(draft_id, draft.status, &SlotStatus::OPEN)?;
        if draft.current_edit_id.is_none() {
            return Err(not_a_revert_draft(&draft, "current_edit_id").into());
        }

        let mut metadata = draft.record_metadata();
        let outcome = match metadata.take_revert() {
            None => return Err(not_a_revert_draft(&draft, "revertMetadata").into()),
            Some(RevertMetadata::NoPreviousDraft(_)) => {
                if !self.store.delete_open(store_id, draft_id).await? {
                    let store = self.store.as_ref();
                    return Err(stale_write(store, store_id, draft_id, &SlotStatus::OPEN).await);
                }
                UndoOutcome::Deleted { id: draft_id }
            }
            Some(RevertMetadata::Replaced(snapshot)) => {
                let status = snapshot
                    .original_status
                    .filter(SlotStatus::is_open)
                    .unwrap_or(SlotStatus::Draft);
                let update = SlotContentUpdate {
                    status,
                    configuration: snapshot.original_configuration,
                    parent_version_id: snapshot.original_parent_version_id,
                    current_edit_id: snapshot.original_current_edit_id,
                    has_unpublished_changes: snapshot.original_has_unpublished_changes,
                    metadata: metadata.into_option(),
                };
                match self.store.update_content(store_id, draft_id, update).await? {
                    Some(record) => UndoOutcome::Restored { record },
                    None => {
                        let store = self.store.as_ref();
                        return Err(stale_write(store, store_id, draft_id, &SlotStatus::OPEN).await);
                    }
                }
            }
        };

        tracing::info!(
            store_id,
            page_type = %draft.page_type,
            config_id = draft_id,
            user_id,
            version_number = draft.version_number,
            deleted = matches!(outcome, UndoOutcome::Deleted { .. }),
            "Undid revert",
        );
        Ok(outcome)
    }

    /// Legacy whole-version revert: publish a copy of the target as a new
    /// version and mark later published/acceptance versions `reverted`.
    pub async fn revert_to_version(
        &self,
        store_id: DbId,
        target_id: DbId,
        actor: DbId,
    ) -> EngineResult<LegacyRevert> {
        let target = load(self.store.as_ref(), store_id, target_id).await?;
        require_status(target_id, target.status, &SlotStatus::REVERTIBLE)?;

        let mut input = derive_from_target(&target, actor, SlotStatus::Published);
        input.published_by = Some(actor);

        let Some((superseded_count, record)) = self
            .store
            .supersede_and_insert(target_id, target.version_number, input)
            .await?
        else {
            let store = self.store.as_ref();
            return Err(stale_write(store, store_id, target_id, &SlotStatus::REVERTIBLE).await);
        };

        tracing::info!(
            store_id,
            page_type = %record.page_type,
            config_id = record.id,
            user_id = actor,
            version_number = record.version_number,
            target_id,
            superseded_count,
            "Reverted to version",
        );
        Ok(LegacyRevert {
            record,
            superseded_count,
        })
    }
}

/// A new record carrying the target's content, derived from the target.
fn derive_from_target(
    target: &SlotConfiguration,
    user_id: DbId,
    status: SlotStatus,
) -> NewSlotConfiguration {
    let mut input = NewSlotConfiguration::draft(
        target.store_id,
        user_id,
        target.page_type,
        status,
        target.tree().clone(),
    );
    input.parent_version_id = Some(target.id);
    input
}

fn not_a_revert_draft(draft: &SlotConfiguration, missing: &str) -> CoreError {
    CoreError::InvalidStateTransition {
        entity: slot_status::ENTITY,
        id: draft.id,
        actual: format!("{} without {missing}", draft.status),
        required: "a revert draft".to_string(),
    }
}
