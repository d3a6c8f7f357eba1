//! Advisory marker of the version a user is looking at while editing.
//! Never consulted by publish transitions.

use std::sync::Arc;

use storefront_core::error::CoreError;
use storefront_core::page_type::PageType;
use storefront_core::types::DbId;
use storefront_db::models::slot_configuration::SlotConfiguration;
use storefront_db::store::VersionStore;

use crate::error::EngineResult;
use crate::records::{load, not_found, require_owner};

#[derive(Clone)]
pub struct CurrentEditTracker {
    store: Arc<dyn VersionStore>,
}

impl CurrentEditTracker {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Move the user's marker for the page onto `config_id`.
    pub async fn set_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
        config_id: DbId,
    ) -> EngineResult<SlotConfiguration> {
        let record = load(self.store.as_ref(), store_id, config_id).await?;
        if record.page_type != page_type {
            return Err(CoreError::Validation(format!(
                "Configuration {config_id} is for page type '{}', not '{page_type}'",
                record.page_type
            ))
            .into());
        }
        require_owner(&record, user_id)?;

        let updated = self
            .store
            .set_current_edit(store_id, page_type, user_id, config_id)
            .await?
            .ok_or_else(|| not_found(config_id))?;

        tracing::info!(
            store_id,
            page_type = %page_type,
            config_id,
            user_id,
            version_number = updated.version_number,
            "Set current edit",
        );
        Ok(updated)
    }

    pub async fn get_current_edit(
        &self,
        store_id: DbId,
        page_type: PageType,
        user_id: DbId,
    ) -> EngineResult<Option<SlotConfiguration>> {
        Ok(self
            .store
            .find_current_edit(store_id, page_type, user_id)
            .await?)
    }
}
