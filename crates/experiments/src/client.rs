//! HTTP client for the A/B testing service endpoints.
//!
//! - `GET  {base}/api/experiments/active?store_id=..&page_type=..`
//! - `POST {base}/api/experiments/{id}/assignments`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::experiment::{
    ActiveExperiment, AssignmentContext, AssignmentProvider, ExperimentCatalog, ProviderError,
    VariantAssignment,
};
use storefront_core::page_type::PageType;
use storefront_core::types::DbId;

/// HTTP client for one A/B testing service.
#[derive(Debug, Clone)]
pub struct AbTestingClient {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the A/B testing service layer.
#[derive(Debug, thiserror::Error)]
pub enum AbTestingError {
    /// The HTTP request itself failed (network, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("A/B testing API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl From<AbTestingError> for ProviderError {
    fn from(err: AbTestingError) -> Self {
        match &err {
            AbTestingError::Request(e) if e.is_decode() => {
                ProviderError::InvalidResponse(err.to_string())
            }
            _ => ProviderError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActiveExperimentsResponse {
    // Decoded one by one so a malformed entry only drops itself.
    #[serde(default)]
    experiments: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct AssignmentRequest<'a> {
    session_id: &'a str,
    context: &'a AssignmentContext,
}

impl AbTestingClient {
    /// Create a client with its own connection pool.
    ///
    /// * `base_url` - e.g. `http://ab-testing:8080`; a trailing slash is ignored.
    /// * `timeout` - applied to every request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AbTestingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Experiments currently running on a page.
    pub async fn fetch_active(
        &self,
        store_id: DbId,
        page_type: PageType,
    ) -> Result<Vec<ActiveExperiment>, AbTestingError> {
        let response = self
            .client
            .get(format!("{}/api/experiments/active", self.base_url))
            .query(&[
                ("store_id", store_id.to_string()),
                ("page_type", page_type.as_str().to_string()),
            ])
            .send()
            .await?;
        let body: ActiveExperimentsResponse = Self::parse_response(response).await?;
        Ok(body
            .experiments
            .into_iter()
            .filter_map(|raw| {
                let id = raw.get("id").cloned();
                serde_json::from_value::<ActiveExperiment>(raw)
                    .map_err(|e| {
                        tracing::warn!(
                            store_id,
                            page_type = %page_type,
                            experiment_id = ?id,
                            error = %e,
                            "Skipping malformed experiment",
                        );
                    })
                    .ok()
            })
            .collect())
    }

    /// Sticky variant for a session in one experiment.
    pub async fn assign(
        &self,
        experiment_id: &str,
        session_id: &str,
        context: &AssignmentContext,
    ) -> Result<VariantAssignment, AbTestingError> {
        let response = self
            .client
            .post(format!(
                "{}/api/experiments/{experiment_id}/assignments",
                self.base_url
            ))
            .json(&AssignmentRequest {
                session_id,
                context,
            })
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AbTestingError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AbTestingError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AbTestingError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ExperimentCatalog for AbTestingClient {
    async fn active_experiments(
        &self,
        store_id: DbId,
        page_type: PageType,
    ) -> Result<Vec<ActiveExperiment>, ProviderError> {
        self.fetch_active(store_id, page_type).await.map_err(|e| {
            tracing::warn!(
                store_id,
                page_type = %page_type,
                error = %e,
                "Failed to fetch active experiments",
            );
            e.into()
        })
    }
}

#[async_trait]
impl AssignmentProvider for AbTestingClient {
    async fn get_variant(
        &self,
        experiment_id: &str,
        session_id: &str,
        context: &AssignmentContext,
    ) -> Result<VariantAssignment, ProviderError> {
        self.assign(experiment_id, session_id, context)
            .await
            .map_err(ProviderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = AbTestingClient::with_client(reqwest::Client::new(), "http://ab:8080/");
        assert_eq!(client.base_url, "http://ab:8080");
    }

    #[test]
    fn api_error_maps_to_unavailable() {
        let err: ProviderError = AbTestingError::Api {
            status: 503,
            body: "down".to_string(),
        }
        .into();
        assert!(matches!(err, ProviderError::Unavailable(msg) if msg.contains("503")));
    }
}
