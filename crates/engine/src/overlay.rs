//! Serve-time resolution: the live configuration of a page with the slot
//! overrides of the visitor's experiment variants merged on top.
//!
//! Resolution is read-only. Provider failures degrade per experiment: a
//! failed assignment lookup drops that experiment's overrides and the rest
//! are still applied, and a failed catalog lookup serves the base as is.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use storefront_core::configuration::ConfigurationTree;
use storefront_core::experiment::{
    ActiveExperiment, AssignmentContext, AssignmentProvider, ExperimentCatalog, ProviderError,
    VariantAssignment,
};
use storefront_core::overlay::{apply_slot_overrides, OverrideOutcome};
use storefront_core::page_type::PageType;
use storefront_core::slot_status::SlotStatus;
use storefront_core::template::TemplateProvider;
use storefront_core::types::DbId;
use storefront_db::store::VersionStore;

use crate::error::EngineResult;

#[derive(Clone)]
pub struct OverlayResolver {
    store: Arc<dyn VersionStore>,
    templates: Arc<dyn TemplateProvider>,
    catalog: Arc<dyn ExperimentCatalog>,
    assignments: Arc<dyn AssignmentProvider>,
}

/// Where the base configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedSource {
    Published,
    DefaultTemplate,
}

/// An experiment whose variant overrides were merged into the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedExperiment {
    pub experiment_id: String,
    pub variant_id: String,
    pub variant_name: String,
    pub outcome: OverrideOutcome,
}

/// The configuration a visitor is served. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServedConfiguration {
    pub configuration: ConfigurationTree,
    pub source: ServedSource,
    pub config_id: Option<DbId>,
    pub version_number: Option<i32>,
    pub applied_experiments: Vec<AppliedExperiment>,
}

/// Visitor hints forwarded to the assignment provider.
#[derive(Debug, Clone, Default)]
pub struct VisitorContext {
    pub session_id: Option<String>,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub customer_id: Option<String>,
}

impl OverlayResolver {
    pub fn new(
        store: Arc<dyn VersionStore>,
        templates: Arc<dyn TemplateProvider>,
        catalog: Arc<dyn ExperimentCatalog>,
        assignments: Arc<dyn AssignmentProvider>,
    ) -> Self {
        Self {
            store,
            templates,
            catalog,
            assignments,
        }
    }

    /// Resolve the configuration to serve for a page.
    ///
    /// Falls back to the default template when nothing is published.
    /// Without a session id no assignment can be made, so the base is
    /// served unmodified.
    pub async fn resolve_for_serving(
        &self,
        store_id: DbId,
        page_type: PageType,
        visitor: &VisitorContext,
    ) -> EngineResult<ServedConfiguration> {
        let published = self
            .store
            .find_latest_by_status(store_id, page_type, SlotStatus::Published)
            .await?;
        let (base, source, config_id, version_number) = match published {
            Some(record) => (
                record.configuration.0,
                ServedSource::Published,
                Some(record.id),
                Some(record.version_number),
            ),
            None => (
                self.templates.default_template(page_type).await?,
                ServedSource::DefaultTemplate,
                None,
                None,
            ),
        };

        let Some(session_id) = visitor.session_id.as_deref() else {
            return Ok(ServedConfiguration {
                configuration: base,
                source,
                config_id,
                version_number,
                applied_experiments: Vec::new(),
            });
        };

        let experiments = match self.catalog.active_experiments(store_id, page_type).await {
            Ok(experiments) => experiments,
            Err(e) => {
                tracing::warn!(
                    store_id,
                    page_type = %page_type,
                    error = %e,
                    "Experiment catalog unavailable, serving base",
                );
                Vec::new()
            }
        };

        let context = AssignmentContext {
            store_id,
            page_type: Some(page_type),
            device_type: visitor.device_type.clone(),
            user_agent: visitor.user_agent.clone(),
            customer_id: visitor.customer_id.clone(),
        };
        let assignments = join_all(
            experiments
                .iter()
                .map(|exp| self.assignments.get_variant(&exp.id, session_id, &context)),
        )
        .await;

        let resolved: Vec<(ActiveExperiment, Result<VariantAssignment, ProviderError>)> =
            experiments.into_iter().zip(assignments).collect();
        let (configuration, applied_experiments) = apply_experiments(&base, &resolved);

        if !applied_experiments.is_empty() {
            tracing::debug!(
                store_id,
                page_type = %page_type,
                applied = applied_experiments.len(),
                "Applied experiment overrides",
            );
        }

        Ok(ServedConfiguration {
            configuration,
            source,
            config_id,
            version_number,
            applied_experiments,
        })
    }
}

/// Merge the assigned variants' overrides onto a copy of `base`, in the
/// order the experiments are listed.
///
/// Control assignments are skipped. A failed assignment or an assignment to
/// a variant the experiment does not define is logged and skipped.
pub fn apply_experiments(
    base: &ConfigurationTree,
    experiments: &[(ActiveExperiment, Result<VariantAssignment, ProviderError>)],
) -> (ConfigurationTree, Vec<AppliedExperiment>) {
    let mut tree = base.clone();
    let mut applied = Vec::new();

    for (experiment, assignment) in experiments {
        let assignment = match assignment {
            Ok(assignment) => assignment,
            Err(e) => {
                tracing::warn!(
                    experiment_id = %experiment.id,
                    error = %e,
                    "Variant assignment failed, skipping experiment",
                );
                continue;
            }
        };
        if assignment.is_control {
            continue;
        }
        let Some(variant) = experiment.variant(&assignment.variant_id) else {
            tracing::warn!(
                experiment_id = %experiment.id,
                variant_id = %assignment.variant_id,
                "Assigned variant not found in experiment, skipping",
            );
            continue;
        };
        if variant.is_control {
            continue;
        }

        let outcome = apply_slot_overrides(&mut tree, &variant.slot_overrides);
        applied.push(AppliedExperiment {
            experiment_id: experiment.id.clone(),
            variant_id: variant.id.clone(),
            variant_name: assignment.variant_name.clone(),
            outcome,
        });
    }

    (tree, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_core::experiment::ExperimentVariant;

    fn base() -> ConfigurationTree {
        ConfigurationTree::from_value(&json!({
            "slots": {
                "hero": {"type": "image", "content": "Welcome", "styles": {"color": "red"}}
            },
            "rootSlots": ["hero"]
        }))
        .unwrap()
    }

    fn experiment(id: &str, overrides: serde_json::Value) -> ActiveExperiment {
        ActiveExperiment {
            id: id.to_string(),
            name: id.to_string(),
            variants: vec![
                ExperimentVariant {
                    id: "control".to_string(),
                    name: "Control".to_string(),
                    is_control: true,
                    slot_overrides: Default::default(),
                },
                ExperimentVariant {
                    id: "b".to_string(),
                    name: "B".to_string(),
                    is_control: false,
                    slot_overrides: serde_json::from_value(overrides).unwrap(),
                },
            ],
        }
    }

    fn assigned(variant_id: &str, is_control: bool) -> Result<VariantAssignment, ProviderError> {
        Ok(VariantAssignment {
            variant_id: variant_id.to_string(),
            variant_name: variant_id.to_uppercase(),
            is_control,
        })
    }

    #[test]
    fn no_experiments_returns_base() {
        let (tree, applied) = apply_experiments(&base(), &[]);
        assert_eq!(tree, base());
        assert!(applied.is_empty());
    }

    #[test]
    fn control_assignment_is_skipped() {
        let experiments = vec![(
            experiment("e1", json!({"hero": {"content": "B"}})),
            assigned("control", true),
        )];
        let (tree, applied) = apply_experiments(&base(), &experiments);
        assert_eq!(tree, base());
        assert!(applied.is_empty());
    }

    #[test]
    fn failed_assignment_does_not_block_others() {
        let experiments = vec![
            (
                experiment("e1", json!({"hero": {"content": "First"}})),
                Err(ProviderError::Unavailable("timeout".to_string())),
            ),
            (
                experiment("e2", json!({"hero": {"styles": {"color": "blue"}}})),
                assigned("b", false),
            ),
        ];
        let (tree, applied) = apply_experiments(&base(), &experiments);
        assert_eq!(tree.slots["hero"].content, Some(json!("Welcome")));
        assert_eq!(tree.slots["hero"].styles["color"], json!("blue"));
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].experiment_id, "e2");
    }

    #[test]
    fn unknown_variant_is_skipped() {
        let experiments = vec![(
            experiment("e1", json!({"hero": {"content": "B"}})),
            assigned("zzz", false),
        )];
        let (tree, applied) = apply_experiments(&base(), &experiments);
        assert_eq!(tree, base());
        assert!(applied.is_empty());
    }

    #[test]
    fn base_is_not_mutated() {
        let original = base();
        let experiments = vec![(
            experiment("e1", json!({"hero": {"content": "B"}, "promo": {"type": "text"}})),
            assigned("b", false),
        )];
        let (tree, applied) = apply_experiments(&original, &experiments);
        assert_eq!(original, base());
        assert_eq!(tree.slots["hero"].content, Some(json!("B")));
        assert_eq!(applied[0].outcome.inserted, vec!["promo"]);
    }
}
