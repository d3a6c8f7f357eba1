//! Per-user editable drafts: get-or-create, content updates, deletion.

use std::sync::Arc;

use storefront_core::configuration::ConfigurationTree;
use storefront_core::page_type::PageType;
use storefront_core::slot_status::{require_status, SlotStatus};
use storefront_core::template::TemplateProvider;
use storefront_core::types::DbId;
use storefront_db::models::slot_configuration::{
    NewSlotConfiguration, SlotConfiguration, SlotContentUpdate,
};
use storefront_db::store::VersionStore;

use crate::error::EngineResult;
use crate::records::{load, require_owner, stale_write};

#[derive(Clone)]
pub struct DraftManager {
    store: Arc<dyn VersionStore>,
    templates: Arc<dyn TemplateProvider>,
}

impl DraftManager {
    pub fn new(store: Arc<dyn VersionStore>, templates: Arc<dyn TemplateProvider>) -> Self {
        Self { store, templates }
    }

    /// Return the user's open record for the page, creating a `draft` if
    /// there is none.
    ///
    /// A new draft clones the latest published configuration, or the page's
    /// default template when nothing has been published. It starts with no
    /// unpublished changes.
    pub async fn get_or_create_draft(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> EngineResult<SlotConfiguration> {
        if let Some(existing) = self.store.find_open_draft(store_id, page_type, user_id).await? {
            return Ok(existing);
        }

        let published = self
            .store
            .find_latest_by_status(store_id, page_type, SlotStatus::Published)
            .await?;
        let (configuration, parent_version_id) = match &published {
            Some(record) => (record.tree().clone(), Some(record.id)),
            None => (self.templates.default_template(page_type).await?, None),
        };

        let mut input = NewSlotConfiguration::draft(
            store_id,
            user_id,
            page_type,
            SlotStatus::Draft,
            configuration,
        );
        input.parent_version_id = parent_version_id;

        let outcome = self.store.insert_draft_if_absent(input).await?;
        if outcome.was_created() {
            let record = outcome.into_record();
            tracing::info!(
                store_id,
                page_type = %page_type,
                config_id = record.id,
                user_id,
                version_number = record.version_number,
                from_published = parent_version_id.is_some(),
                "Created draft",
            );
            return Ok(record);
        }
        Ok(outcome.into_record())
    }

    /// Return the user's open record for the page, creating an empty `init`
    /// record if there is none.
    pub async fn init_draft(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> EngineResult<SlotConfiguration> {
        if let Some(existing) = self.store.find_open_draft(store_id, page_type, user_id).await? {
            return Ok(existing);
        }

        let input = NewSlotConfiguration::draft(
            store_id,
            user_id,
            page_type,
            SlotStatus::Init,
            ConfigurationTree::empty(),
        );
        let outcome = self.store.insert_draft_if_absent(input).await?;
        if outcome.was_created() {
            let record = outcome.into_record();
            tracing::info!(
                store_id,
                page_type = %page_type,
                config_id = record.id,
                user_id,
                version_number = record.version_number,
                "Created init record",
            );
            return Ok(record);
        }
        Ok(outcome.into_record())
    }

    /// Fetch one record in the store scope.
    pub async fn get_configuration(
        &self,
        store_id: DbId,
        id: DbId,
    ) -> EngineResult<SlotConfiguration> {
        load(self.store.as_ref(), store_id, id).await
    }

    /// Replace the draft's configuration.
    ///
    /// An `init` record becomes a `draft`. A reset clears the
    /// unpublished-changes flag; any other write sets it.
    pub async fn update_draft(
        &self,
        store_id: DbId,
        id: DbId,
        user_id: DbId,
        configuration: ConfigurationTree,
        is_reset: bool,
    ) -> EngineResult<SlotConfiguration> {
        configuration.validate()?;

        let record = load(self.store.as_ref(), store_id, id).await?;
        require_owner(&record, user_id)?;
        require_status(id, record.status, &SlotStatus::OPEN)?;

        let mut update = SlotContentUpdate::from_record(&record);
        update.status = SlotStatus::Draft;
        update.configuration = configuration;
        update.has_unpublished_changes = !is_reset;

        let Some(updated) = self.store.update_content(store_id, id, update).await? else {
            return Err(stale_write(self.store.as_ref(), store_id, id, &SlotStatus::OPEN).await);
        };

        tracing::info!(
            store_id,
            page_type = %updated.page_type,
            config_id = id,
            user_id,
            version_number = updated.version_number,
            is_reset,
            "Updated draft",
        );
        Ok(updated)
    }

    /// Hard-delete the user's draft.
    pub async fn delete_draft(&self, store_id: DbId, id: DbId, user_id: DbId) -> EngineResult<()> {
        let record = load(self.store.as_ref(), store_id, id).await?;
        require_owner(&record, user_id)?;
        require_status(id, record.status, &[SlotStatus::Draft])?;

        if !self.store.delete_open(store_id, id).await? {
            return Err(stale_write(self.store.as_ref(), store_id, id, &[SlotStatus::Draft]).await);
        }

        tracing::info!(
            store_id,
            page_type = %record.page_type,
            config_id = id,
            user_id,
            version_number = record.version_number,
            "Deleted draft",
        );
        Ok(())
    }
}
