//! Experiment and variant-assignment types consumed at serve time, and the
//! provider traits the overlay resolver reads them through.
//!
//! Bucketing, ramp-up and statistics belong to the external A/B service; this
//! side only receives the list of running experiments and a sticky variant
//! assignment per session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::overlay::SlotOverrides;
use crate::page_type::PageType;
use crate::types::DbId;

/// A running experiment targeting one page type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveExperiment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub variants: Vec<ExperimentVariant>,
}

/// One arm of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentVariant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_control: bool,
    #[serde(default)]
    pub slot_overrides: SlotOverrides,
}

impl ActiveExperiment {
    pub fn variant(&self, variant_id: &str) -> Option<&ExperimentVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

/// The variant a session is assigned to for one experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAssignment {
    pub variant_id: String,
    pub variant_name: String,
    pub is_control: bool,
}

/// Device and visitor hints forwarded to the assignment provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentContext {
    pub store_id: DbId,
    pub page_type: Option<PageType>,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub customer_id: Option<String>,
}

/// Failure talking to an experiment provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached or timed out.
    #[error("Experiment provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with something other than the expected payload.
    #[error("Experiment provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Source of the experiments currently running for a page.
#[async_trait]
pub trait ExperimentCatalog: Send + Sync {
    async fn active_experiments(
        &self,
        store_id: DbId,
        page_type: PageType,
    ) -> Result<Vec<ActiveExperiment>, ProviderError>;
}

/// Sticky variant assignment for a visitor session.
#[async_trait]
pub trait AssignmentProvider: Send + Sync {
    async fn get_variant(
        &self,
        experiment_id: &str,
        session_id: &str,
        context: &AssignmentContext,
    ) -> Result<VariantAssignment, ProviderError>;
}

/// Provider used when no A/B service is configured: nothing is running and
/// every session sees the control.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExperiments;

#[async_trait]
impl ExperimentCatalog for NoExperiments {
    async fn active_experiments(
        &self,
        _store_id: DbId,
        _page_type: PageType,
    ) -> Result<Vec<ActiveExperiment>, ProviderError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl AssignmentProvider for NoExperiments {
    async fn get_variant(
        &self,
        _experiment_id: &str,
        _session_id: &str,
        _context: &AssignmentContext,
    ) -> Result<VariantAssignment, ProviderError> {
        Ok(VariantAssignment {
            variant_id: "control".to_string(),
            variant_name: "Control".to_string(),
            is_control: true,
        })
    }
}
