//! Slot configuration models and DTOs.
//!
//! Defines the row struct for `slot_configurations` and the insert/update
//! inputs the repository and version stores accept.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use storefront_core::configuration::ConfigurationTree;
use storefront_core::page_type::PageType;
use storefront_core::revert::RecordMetadata;
use storefront_core::slot_status::SlotStatus;
use storefront_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One version of a page layout, from the `slot_configurations` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SlotConfiguration {
    pub id: DbId,
    pub store_id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub page_type: PageType,
    pub version_number: i32,
    #[sqlx(try_from = "String")]
    pub status: SlotStatus,
    pub configuration: Json<ConfigurationTree>,
    pub parent_version_id: Option<DbId>,
    pub current_edit_id: Option<DbId>,
    pub has_unpublished_changes: bool,
    pub metadata: Option<Json<RecordMetadata>>,
    pub published_at: Option<Timestamp>,
    pub published_by: Option<DbId>,
    pub acceptance_published_at: Option<Timestamp>,
    pub acceptance_published_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SlotConfiguration {
    pub fn tree(&self) -> &ConfigurationTree {
        &self.configuration.0
    }

    /// Metadata as a value, empty when the column is NULL.
    pub fn record_metadata(&self) -> RecordMetadata {
        self.metadata
            .as_ref()
            .map(|m| m.0.clone())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Insert DTO
// ---------------------------------------------------------------------------

/// Input for inserting a new version. The version number is allocated by the
/// store, never supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewSlotConfiguration {
    pub store_id: DbId,
    pub user_id: DbId,
    pub page_type: PageType,
    pub status: SlotStatus,
    pub configuration: ConfigurationTree,
    pub parent_version_id: Option<DbId>,
    pub current_edit_id: Option<DbId>,
    pub has_unpublished_changes: bool,
    pub metadata: Option<RecordMetadata>,
    /// Stamped together with `published_at` when `status` is `published`.
    pub published_by: Option<DbId>,
}

impl NewSlotConfiguration {
    /// An editable record for `user_id`.
    pub fn draft(
        store_id: DbId,
        user_id: DbId,
        page_type: PageType,
        status: SlotStatus,
        configuration: ConfigurationTree,
    ) -> Self {
        Self {
            store_id,
            user_id,
            page_type,
            status,
            configuration,
            parent_version_id: None,
            current_edit_id: None,
            has_unpublished_changes: false,
            metadata: None,
            published_by: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Update DTOs
// ---------------------------------------------------------------------------

/// Full overwrite of the editable columns of an open record.
///
/// Nullable fields are written as given, so `None` clears the column.
#[derive(Debug, Clone)]
pub struct SlotContentUpdate {
    pub status: SlotStatus,
    pub configuration: ConfigurationTree,
    pub parent_version_id: Option<DbId>,
    pub current_edit_id: Option<DbId>,
    pub has_unpublished_changes: bool,
    pub metadata: Option<RecordMetadata>,
}

impl SlotContentUpdate {
    /// Start from the record's current editable state.
    pub fn from_record(record: &SlotConfiguration) -> Self {
        Self {
            status: record.status,
            configuration: record.tree().clone(),
            parent_version_id: record.parent_version_id,
            current_edit_id: record.current_edit_id,
            has_unpublished_changes: record.has_unpublished_changes,
            metadata: record.metadata.as_ref().map(|m| m.0.clone()),
        }
    }
}

/// A conditional status change: applied only while the record is in `from`.
#[derive(Debug, Clone, Copy)]
pub struct StatusTransition {
    pub from: SlotStatus,
    pub to: SlotStatus,
    pub actor: DbId,
    pub clear_unpublished_changes: bool,
}

/// Result of an insert-if-absent on the open-draft slot.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftInsert {
    Created(SlotConfiguration),
    Existing(SlotConfiguration),
}

impl DraftInsert {
    pub fn into_record(self) -> SlotConfiguration {
        match self {
            Self::Created(record) | Self::Existing(record) => record,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}
