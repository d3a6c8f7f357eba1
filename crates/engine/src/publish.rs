//! Status transitions toward production, bulk publish, and the read-side
//! views editors use to decide what to publish.
//!
//! Publishing never copies content: the record itself moves through
//! `draft -> acceptance -> published` (or `draft -> published` on the legacy
//! path) and keeps its version number.

use std::sync::Arc;

use serde::Serialize;
use storefront_core::change_detection::{has_changes, summarize_changes, ChangeSummary};
use storefront_core::pagination::{
    clamp_limit, clamp_offset, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
use storefront_core::page_type::PageType;
use storefront_core::slot_status::{require_status, SlotStatus};
use storefront_core::types::DbId;
use storefront_db::models::slot_configuration::{SlotConfiguration, StatusTransition};
use storefront_db::store::VersionStore;

use crate::error::EngineResult;
use crate::records::{load, require_owner, stale_write};

#[derive(Clone)]
pub struct PublishPipeline {
    store: Arc<dyn VersionStore>,
}

/// One page published by [`PublishPipeline::bulk_publish_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedPage {
    pub page_type: PageType,
    pub config_id: DbId,
    pub version_number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkPublishResult {
    pub published_count: usize,
    pub published: Vec<PublishedPage>,
    /// Drafts left alone because they match the published version.
    pub unchanged: Vec<PageType>,
}

/// How one of the user's drafts compares to what is live.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageChangeStatus {
    pub page_type: PageType,
    pub draft_id: DbId,
    pub draft_status: SlotStatus,
    pub version_number: i32,
    pub has_unpublished_changes: bool,
    pub differs_from_published: bool,
    pub published_version_number: Option<i32>,
    pub changes: ChangeSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnpublishedStatus {
    pub has_any_changes: bool,
    pub pages: Vec<PageChangeStatus>,
}

impl PublishPipeline {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// `draft -> acceptance`.
    pub async fn publish_to_acceptance(
        &self,
        store_id: DbId,
        id: DbId,
        actor: DbId,
    ) -> EngineResult<SlotConfiguration> {
        self.transition(store_id, id, actor, SlotStatus::Draft, SlotStatus::Acceptance, false)
            .await
    }

    /// `acceptance -> published`. The unpublished-changes flag is left as is.
    pub async fn publish_to_production(
        &self,
        store_id: DbId,
        id: DbId,
        actor: DbId,
    ) -> EngineResult<SlotConfiguration> {
        self.transition(store_id, id, actor, SlotStatus::Acceptance, SlotStatus::Published, false)
            .await
    }

    /// `draft -> published`, skipping acceptance and clearing the
    /// unpublished-changes flag.
    pub async fn legacy_publish(
        &self,
        store_id: DbId,
        id: DbId,
        actor: DbId,
    ) -> EngineResult<SlotConfiguration> {
        self.transition(store_id, id, actor, SlotStatus::Draft, SlotStatus::Published, true)
            .await
    }

    async fn transition(
        &self,
        store_id: DbId,
        id: DbId,
        actor: DbId,
        from: SlotStatus,
        to: SlotStatus,
        clear_unpublished_changes: bool,
    ) -> EngineResult<SlotConfiguration> {
        let record = load(self.store.as_ref(), store_id, id).await?;
        require_owner(&record, actor)?;
        require_status(id, record.status, &[from])?;

        let transition = StatusTransition {
            from,
            to,
            actor,
            clear_unpublished_changes,
        };
        let Some(updated) = self.store.transition_status(store_id, id, transition).await? else {
            return Err(stale_write(self.store.as_ref(), store_id, id, &[from]).await);
        };

        tracing::info!(
            store_id,
            page_type = %updated.page_type,
            config_id = id,
            user_id = actor,
            version_number = updated.version_number,
            from = %from,
            to = %to,
            "Slot configuration status changed",
        );
        Ok(updated)
    }

    /// Legacy-publish every draft of the user in the store whose content
    /// differs from its page's latest published version.
    ///
    /// Pages are handled one after another; each publish is its own
    /// conditional transition, so a draft another request already published
    /// fails the whole call with the usual state error.
    pub async fn bulk_publish_all(
        &self,
        store_id: DbId,
        user_id: DbId,
    ) -> EngineResult<BulkPublishResult> {
        let drafts = self.store.list_open_drafts_for_user(store_id, user_id).await?;
        let mut result = BulkPublishResult::default();

        for draft in drafts.iter().filter(|d| d.status == SlotStatus::Draft) {
            let published = self
                .store
                .find_latest_by_status(store_id, draft.page_type, SlotStatus::Published)
                .await?;
            if !has_changes(draft.tree(), published.as_ref().map(|p| p.tree())) {
                result.unchanged.push(draft.page_type);
                continue;
            }

            let record = self.legacy_publish(store_id, draft.id, user_id).await?;
            result.published.push(PublishedPage {
                page_type: record.page_type,
                config_id: record.id,
                version_number: record.version_number,
            });
        }

        result.published_count = result.published.len();
        tracing::info!(
            store_id,
            user_id,
            published = result.published_count,
            unchanged = result.unchanged.len(),
            "Bulk publish finished",
        );
        Ok(result)
    }

    /// Compare each of the user's open records with the live version of its
    /// page. Read-only.
    pub async fn unpublished_status(
        &self,
        store_id: DbId,
        user_id: DbId,
    ) -> EngineResult<UnpublishedStatus> {
        let drafts = self.store.list_open_drafts_for_user(store_id, user_id).await?;
        let mut status = UnpublishedStatus::default();

        for draft in drafts {
            let published = self
                .store
                .find_latest_by_status(store_id, draft.page_type, SlotStatus::Published)
                .await?;
            let published_tree = published.as_ref().map(|p| p.tree());
            let differs = has_changes(draft.tree(), published_tree);

            status.has_any_changes |= differs;
            status.pages.push(PageChangeStatus {
                page_type: draft.page_type,
                draft_id: draft.id,
                draft_status: draft.status,
                version_number: draft.version_number,
                has_unpublished_changes: draft.has_unpublished_changes,
                differs_from_published: differs,
                published_version_number: published.as_ref().map(|p| p.version_number),
                changes: summarize_changes(draft.tree(), published_tree),
            });
        }

        Ok(status)
    }

    /// Acceptance, published and reverted versions of a page, newest first.
    pub async fn version_history(
        &self,
        store_id: DbId,
        page_type: PageType,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> EngineResult<Vec<SlotConfiguration>> {
        let limit = clamp_limit(limit, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT);
        let offset = clamp_offset(offset);
        Ok(self
            .store
            .list_by_statuses(store_id, page_type, &SlotStatus::HISTORY, limit, offset)
            .await?)
    }

    /// The newest version waiting in acceptance, if any.
    pub async fn acceptance_preview(
        &self,
        store_id: DbId,
        page_type: PageType,
    ) -> EngineResult<Option<SlotConfiguration>> {
        Ok(self
            .store
            .find_latest_by_status(store_id, page_type, SlotStatus::Acceptance)
            .await?)
    }
}
