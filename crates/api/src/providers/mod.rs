//! Construction of the external providers the engine is wired to.
//!
//! - [`templates::FileTemplateProvider`] -- default templates from disk.
//! - [`experiment_providers`] -- the A/B testing client, or no experiments.

pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use storefront_core::experiment::{AssignmentProvider, ExperimentCatalog, NoExperiments};
use storefront_experiments::{AbTestingClient, AbTestingError};

use crate::config::ServerConfig;

/// Catalog and assignment provider for the configured A/B service.
///
/// Without `AB_TESTING_URL` every page is served without experiments.
pub fn experiment_providers(
    config: &ServerConfig,
) -> Result<(Arc<dyn ExperimentCatalog>, Arc<dyn AssignmentProvider>), AbTestingError> {
    match &config.ab_testing_url {
        Some(url) => {
            let client = Arc::new(AbTestingClient::new(
                url,
                Duration::from_millis(config.ab_testing_timeout_ms),
            )?);
            tracing::info!(
                url = %url,
                timeout_ms = config.ab_testing_timeout_ms,
                "A/B testing client configured",
            );
            let catalog: Arc<dyn ExperimentCatalog> = client.clone();
            let assignments: Arc<dyn AssignmentProvider> = client;
            Ok((catalog, assignments))
        }
        None => {
            tracing::info!("AB_TESTING_URL not set, experiments disabled");
            let catalog: Arc<dyn ExperimentCatalog> = Arc::new(NoExperiments);
            let assignments: Arc<dyn AssignmentProvider> = Arc::new(NoExperiments);
            Ok((catalog, assignments))
        }
    }
}
