#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use storefront_core::configuration::ConfigurationTree;
use storefront_core::experiment::{
    ActiveExperiment, AssignmentContext, AssignmentProvider, ExperimentCatalog, NoExperiments,
    ProviderError, VariantAssignment,
};
use storefront_core::page_type::PageType;
use storefront_core::slot_status::SlotStatus;
use storefront_core::template::BuiltinTemplates;
use storefront_core::types::DbId;
use storefront_db::memory::MemoryVersionStore;
use storefront_db::models::slot_configuration::{NewSlotConfiguration, SlotConfiguration};
use storefront_db::store::VersionStore;
use storefront_engine::{
    CurrentEditTracker, DraftManager, OverlayResolver, PublishPipeline, RevertEngine,
};

pub const STORE: DbId = 1;
pub const USER: DbId = 10;
pub const OTHER_USER: DbId = 20;

/// Every engine component wired to one in-memory store.
pub struct Harness {
    pub store: Arc<MemoryVersionStore>,
    pub drafts: DraftManager,
    pub publish: PublishPipeline,
    pub revert: RevertEngine,
    pub current_edit: CurrentEditTracker,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryVersionStore::new());
        let dyn_store: Arc<dyn VersionStore> = store.clone();
        Self {
            drafts: DraftManager::new(dyn_store.clone(), Arc::new(BuiltinTemplates)),
            publish: PublishPipeline::new(dyn_store.clone()),
            revert: RevertEngine::new(dyn_store.clone()),
            current_edit: CurrentEditTracker::new(dyn_store),
            store,
        }
    }

    pub fn resolver(
        &self,
        catalog: Arc<dyn ExperimentCatalog>,
        assignments: Arc<dyn AssignmentProvider>,
    ) -> OverlayResolver {
        OverlayResolver::new(self.store.clone(), Arc::new(BuiltinTemplates), catalog, assignments)
    }

    pub fn resolver_without_experiments(&self) -> OverlayResolver {
        self.resolver(Arc::new(NoExperiments), Arc::new(NoExperiments))
    }

    /// Insert a published version directly, bypassing the draft workflow.
    pub async fn seed_published(
        &self,
        page_type: PageType,
        tree: ConfigurationTree,
    ) -> SlotConfiguration {
        let mut input =
            NewSlotConfiguration::draft(STORE, USER, page_type, SlotStatus::Published, tree);
        input.published_by = Some(USER);
        self.store.insert_version(input).await.unwrap()
    }

    /// Draft, edit and legacy-publish `tree` for `USER`.
    pub async fn publish_tree(
        &self,
        page_type: PageType,
        tree: ConfigurationTree,
    ) -> SlotConfiguration {
        let draft = self.drafts.get_or_create_draft(STORE, page_type, USER).await.unwrap();
        self.drafts
            .update_draft(STORE, draft.id, USER, tree, false)
            .await
            .unwrap();
        self.publish.legacy_publish(STORE, draft.id, USER).await.unwrap()
    }
}

/// A valid tree with a single root slot whose content is `label`.
pub fn tree(label: &str) -> ConfigurationTree {
    ConfigurationTree::from_value(&json!({
        "slots": {
            "main": {"type": "container", "children": ["hero"]},
            "hero": {"type": "text", "content": label, "styles": {"color": "red"}}
        },
        "rootSlots": ["main"],
        "metadata": {"label": label}
    }))
    .unwrap()
}

/// Catalog returning a fixed experiment list, or failing.
pub struct StaticCatalog(pub Result<Vec<ActiveExperiment>, String>);

#[async_trait]
impl ExperimentCatalog for StaticCatalog {
    async fn active_experiments(
        &self,
        _store_id: DbId,
        _page_type: PageType,
    ) -> Result<Vec<ActiveExperiment>, ProviderError> {
        self.0.clone().map_err(ProviderError::Unavailable)
    }
}

/// Assigns each experiment id to a fixed variant; missing ids fail.
pub struct FixedAssignments(pub HashMap<String, String>);

#[async_trait]
impl AssignmentProvider for FixedAssignments {
    async fn get_variant(
        &self,
        experiment_id: &str,
        _session_id: &str,
        _context: &AssignmentContext,
    ) -> Result<VariantAssignment, ProviderError> {
        let variant_id = self.0.get(experiment_id).ok_or_else(|| {
            ProviderError::Unavailable(format!("no assignment for {experiment_id}"))
        })?;
        Ok(VariantAssignment {
            variant_id: variant_id.clone(),
            variant_name: variant_id.to_uppercase(),
            is_control: variant_id == "control",
        })
    }
}
