use std::sync::Arc;

use storefront_core::experiment::{AssignmentProvider, ExperimentCatalog};
use storefront_core::template::TemplateProvider;
use storefront_db::store::VersionStore;
use storefront_engine::{
    CurrentEditTracker, DraftManager, OverlayResolver, PublishPipeline, RevertEngine,
};

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: every component holds its collaborators behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Backing version store, used directly by the health check.
    pub store: Arc<dyn VersionStore>,
    pub drafts: DraftManager,
    pub publish: PublishPipeline,
    pub revert: RevertEngine,
    pub current_edit: CurrentEditTracker,
    pub overlay: OverlayResolver,
}

impl AppState {
    /// Wire every engine component to one store and set of providers.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn VersionStore>,
        templates: Arc<dyn TemplateProvider>,
        catalog: Arc<dyn ExperimentCatalog>,
        assignments: Arc<dyn AssignmentProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            drafts: DraftManager::new(Arc::clone(&store), Arc::clone(&templates)),
            publish: PublishPipeline::new(Arc::clone(&store)),
            revert: RevertEngine::new(Arc::clone(&store)),
            current_edit: CurrentEditTracker::new(Arc::clone(&store)),
            overlay: OverlayResolver::new(Arc::clone(&store), templates, catalog, assignments),
            store,
        }
    }
}
