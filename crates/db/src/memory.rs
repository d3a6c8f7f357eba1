//! In-process [`VersionStore`] with the same invariants as the Postgres one.
//!
//! A single mutex guards all state, so every method is atomic. Used by the
//! engine and API test suites and for running without a database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::types::Json;
use storefront_core::page_type::PageType;
use storefront_core::slot_status::SlotStatus;
use storefront_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::models::slot_configuration::{
    DraftInsert, NewSlotConfiguration, SlotConfiguration, SlotContentUpdate, StatusTransition,
};
use crate::store::VersionStore;

#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<DbId, SlotConfiguration>,
    counters: HashMap<(DbId, PageType), i32>,
    last_id: DbId,
    last_tick: Option<Timestamp>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, ordered by id.
    pub async fn all(&self) -> Vec<SlotConfiguration> {
        self.inner.lock().await.records.values().cloned().collect()
    }
}

impl Inner {
    /// Strictly increasing clock so `updated_at` ordering is total.
    fn tick(&mut self) -> Timestamp {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    fn allocate_version(&mut self, store_id: DbId, page_type: PageType) -> i32 {
        let stored_max = self
            .records
            .values()
            .filter(|r| r.store_id == store_id && r.page_type == page_type)
            .map(|r| r.version_number)
            .max()
            .unwrap_or(0);
        let counter = self.counters.entry((store_id, page_type)).or_insert(0);
        *counter = (*counter).max(stored_max) + 1;
        *counter
    }

    fn open_draft(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Option<&SlotConfiguration> {
        self.records.values().find(|r| {
            r.store_id == store_id
                && r.page_type == page_type
                && r.user_id == user_id
                && r.status.is_open()
        })
    }

    fn insert(&mut self, input: NewSlotConfiguration) -> SlotConfiguration {
        let version_number = self.allocate_version(input.store_id, input.page_type);
        let now = self.tick();
        self.last_id += 1;
        let published = input.status == SlotStatus::Published;
        let record = SlotConfiguration {
            id: self.last_id,
            store_id: input.store_id,
            user_id: input.user_id,
            page_type: input.page_type,
            version_number,
            status: input.status,
            configuration: Json(input.configuration),
            parent_version_id: input.parent_version_id,
            current_edit_id: input.current_edit_id,
            has_unpublished_changes: input.has_unpublished_changes,
            metadata: input.metadata.map(Json),
            published_at: published.then_some(now),
            published_by: input.published_by,
            acceptance_published_at: None,
            acceptance_published_by: None,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(record.id, record.clone());
        record
    }

    fn scoped_mut(&mut self, store_id: DbId, id: DbId) -> Option<&mut SlotConfiguration> {
        self.records.get_mut(&id).filter(|r| r.store_id == store_id)
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn find_by_id(
        &self,
        store_id: DbId,
        id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner.records.get(&id).filter(|r| r.store_id == store_id).cloned())
    }

    async fn find_open_draft(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner.open_draft(store_id, page_type, user_id).cloned())
    }

    async fn find_latest_by_status(
        &self,
        store_id: DbId,
        page_type: PageType,
        status: SlotStatus,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .values()
            .filter(|r| r.store_id == store_id && r.page_type == page_type && r.status == status)
            .max_by_key(|r| r.version_number)
            .cloned())
    }

    async fn list_by_statuses(
        &self,
        store_id: DbId,
        page_type: PageType,
        statuses: &[SlotStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<SlotConfiguration> = inner
            .records
            .values()
            .filter(|r| {
                r.store_id == store_id && r.page_type == page_type && statuses.contains(&r.status)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_open_drafts_for_user(
        &self,
        store_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<SlotConfiguration>, sqlx::Error> {
        let inner = self.inner.lock().await;
        let mut drafts: Vec<SlotConfiguration> = inner
            .records
            .values()
            .filter(|r| r.store_id == store_id && r.user_id == user_id && r.status.is_open())
            .cloned()
            .collect();
        drafts.sort_by(|a, b| a.page_type.as_str().cmp(b.page_type.as_str()));
        Ok(drafts)
    }

    async fn insert_draft_if_absent(
        &self,
        input: NewSlotConfiguration,
    ) -> Result<DraftInsert, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.open_draft(input.store_id, input.page_type, input.user_id) {
            return Ok(DraftInsert::Existing(existing.clone()));
        }
        Ok(DraftInsert::Created(inner.insert(input)))
    }

    async fn insert_version(
        &self,
        input: NewSlotConfiguration,
    ) -> Result<SlotConfiguration, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        Ok(inner.insert(input))
    }

    async fn update_content(
        &self,
        store_id: DbId,
        id: DbId,
        update: SlotContentUpdate,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let now = inner.tick();
        let Some(record) = inner.scoped_mut(store_id, id).filter(|r| r.status.is_open()) else {
            return Ok(None);
        };
        record.status = update.status;
        record.configuration = Json(update.configuration);
        record.parent_version_id = update.parent_version_id;
        record.current_edit_id = update.current_edit_id;
        record.has_unpublished_changes = update.has_unpublished_changes;
        record.metadata = update.metadata.map(Json);
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn transition_status(
        &self,
        store_id: DbId,
        id: DbId,
        transition: StatusTransition,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let now = inner.tick();
        let Some(record) = inner
            .scoped_mut(store_id, id)
            .filter(|r| r.status == transition.from)
        else {
            return Ok(None);
        };
        record.status = transition.to;
        match transition.to {
            SlotStatus::Acceptance => {
                record.acceptance_published_at = Some(now);
                record.acceptance_published_by = Some(transition.actor);
            }
            SlotStatus::Published => {
                record.published_at = Some(now);
                record.published_by = Some(transition.actor);
            }
            _ => {}
        }
        if transition.clear_unpublished_changes {
            record.has_unpublished_changes = false;
        }
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn delete_open(&self, store_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let removable = inner
            .records
            .get(&id)
            .is_some_and(|r| r.store_id == store_id && r.status.is_open());
        if removable {
            inner.records.remove(&id);
            // ON DELETE SET NULL
            for record in inner.records.values_mut() {
                if record.parent_version_id == Some(id) {
                    record.parent_version_id = None;
                }
                if record.current_edit_id == Some(id) {
                    record.current_edit_id = None;
                }
            }
        }
        Ok(removable)
    }

    async fn supersede_and_insert(
        &self,
        target_id: DbId,
        above_version: i32,
        input: NewSlotConfiguration,
    ) -> Result<Option<(u64, SlotConfiguration)>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let revertible = inner.records.get(&target_id).is_some_and(|r| {
            r.store_id == input.store_id && SlotStatus::REVERTIBLE.contains(&r.status)
        });
        if !revertible {
            return Ok(None);
        }
        let now = inner.tick();
        let mut superseded = 0;
        for record in inner.records.values_mut() {
            if record.store_id == input.store_id
                && record.page_type == input.page_type
                && record.version_number > above_version
                && SlotStatus::REVERTIBLE.contains(&record.status)
            {
                record.status = SlotStatus::Reverted;
                record.updated_at = now;
                superseded += 1;
            }
        }
        let record = inner.insert(input);
        Ok(Some((superseded, record)))
    }

    async fn set_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
        config_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let mut inner = self.inner.lock().await;
        let target_exists = inner
            .records
            .get(&config_id)
            .is_some_and(|r| r.store_id == store_id && r.page_type == page_type);
        if !target_exists {
            return Ok(None);
        }

        let now = inner.tick();
        for record in inner.records.values_mut() {
            if record.store_id == store_id
                && record.page_type == page_type
                && record.user_id == user_id
                && record.current_edit_id.is_some()
            {
                record.current_edit_id = None;
                record.updated_at = now;
            }
        }

        let now = inner.tick();
        let record = inner.records.get_mut(&config_id).map(|record| {
            record.current_edit_id = Some(config_id);
            record.updated_at = now;
            record.clone()
        });
        Ok(record)
    }

    async fn find_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> Result<Option<SlotConfiguration>, sqlx::Error> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .values()
            .filter(|r| {
                r.store_id == store_id
                    && r.page_type == page_type
                    && r.user_id == user_id
                    && r.current_edit_id.is_some()
            })
            .max_by_key(|r| (r.updated_at, r.id))
            .cloned())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
