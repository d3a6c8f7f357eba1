//! The persistence contract the engine is written against.
//!
//! Each method is one atomic unit of work. Methods that create a record
//! allocate its version number themselves; callers never compute one.

use async_trait::async_trait;
use storefront_core::page_type::PageType;
use storefront_core::slot_status::SlotStatus;
use storefront_core::types::DbId;

use crate::models::slot_configuration::{
    DraftInsert, NewSlotConfiguration, SlotConfiguration, SlotContentUpdate, StatusTransition,
};
use crate::repositories::SlotConfigurationRepo;
use crate::DbPool;

#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn find_by_id(
        &self,
        store_id: DbId,
        id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    async fn find_open_draft(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    async fn find_latest_by_status(
        &self,
        store_id: DbId,
        page_type: PageType,
        status: SlotStatus,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    /// Records in any of `statuses`, highest version first.
    async fn list_by_statuses(
        &self,
        store_id: DbId,
        page_type: PageType,
        statuses: &[SlotStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error>;

    async fn list_open_drafts_for_user(
        &self,
        store_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error>;

    /// Create an open record, or return the one the user already holds.
    async fn insert_draft_if_absent(
        &self,
        input: NewSlotConfiguration,
    ) -> Result<DraftInsert, sqlx::Error>;

    async fn insert_version(
        &self,
        input: NewSlotConfiguration,
    ) -> Result<SlotConfiguration, sqlx::Error>;

    /// `None` if the record is missing or no longer open.
    async fn update_content(
        &self,
        store_id: DbId,
        id: DbId,
        update: SlotContentUpdate,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    /// `None` if the record is missing or not in `transition.from`.
    async fn transition_status(
        &self,
        store_id: DbId,
        id: DbId,
        transition: StatusTransition,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    /// Delete an open record; `false` if nothing was removed.
    async fn delete_open(&self, store_id: DbId, id: DbId) -> Result<bool, sqlx::Error>;

    /// Mark published/acceptance records above `above_version` reverted and
    /// insert `input`, atomically. `None` if `target_id` stopped being
    /// published or in acceptance before the write.
    async fn supersede_and_insert(
        &self,
        target_id: DbId,
        above_version: i32,
        input: NewSlotConfiguration,
    ) -> Result<Option<(u64, SlotConfiguration)>, sqlx::Error>;

    async fn set_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
        config_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    async fn find_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// [`VersionStore`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgVersionStore {
    pool: DbPool,
}

impl PgVersionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn find_by_id(
        &self,
        store_id: DbId,
        id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::find_by_id(&self.pool, store_id, id).await
    }

    async fn find_open_draft(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::find_open_draft(&self.pool, store_id, page_type, user_id).await
    }

    async fn find_latest_by_status(
        &self,
        store_id: DbId,
        page_type: PageType,
        status: SlotStatus,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::find_latest_by_status(&self.pool, store_id, page_type, status).await
    }

    async fn list_by_statuses(
        &self,
        store_id: DbId,
        page_type: PageType,
        statuses: &[SlotStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::list_by_statuses(
            &self.pool, store_id, page_type, statuses, limit, offset,
        )
        .await
    }

    async fn list_open_drafts_for_user(
        &self,
        store_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::list_open_drafts_for_user(&self.pool, store_id, user_id).await
    }

    async fn insert_draft_if_absent(
        &self,
        input: NewSlotConfiguration,
    ) -> Result<DraftInsert, sqlx::Error> {
        SlotConfigurationRepo::insert_draft_if_absent(&self.pool, &input).await
    }

    async fn insert_version(
        &self,
        input: NewSlotConfiguration,
    ) -> Result<SlotConfiguration, sqlx::Error> {
        SlotConfigurationRepo::insert_version(&self.pool, &input).await
    }

    async fn update_content(
        &self,
        store_id: DbId,
        id: DbId,
        update: SlotContentUpdate,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::update_content(&self.pool, store_id, id, &update).await
    }

    async fn transition_status(
        &self,
        store_id: DbId,
        id: DbId,
        transition: StatusTransition,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::transition_status(&self.pool, store_id, id, &transition).await
    }

    async fn delete_open(&self, store_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        SlotConfigurationRepo::delete_open(&self.pool, store_id, id).await
    }

    async fn supersede_and_insert(
        &self,
        target_id: DbId,
        above_version: i32,
        input: NewSlotConfiguration,
    ) -> Result<Option<(u64, SlotConfiguration)>, sqlx::Error> {
        SlotConfigurationRepo::supersede_and_insert(&self.pool, target_id, above_version, &input)
            .await
    }

    async fn set_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
        config_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::set_current_edit(&self.pool, store_id, page_type, user_id, config_id)
            .await
    }

    async fn find_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        SlotConfigurationRepo::find_current_edit(&self.pool, store_id, page_type, user_id).await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}
