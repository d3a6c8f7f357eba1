//! Public serve-time endpoint used by storefront renderers.

use axum::extract::{Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use storefront_core::types::DbId;
use storefront_engine::overlay::VisitorContext;

use super::parse_page_type;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header a renderer may use instead of the `session_id` query parameter.
const SESSION_HEADER: &str = "x-session-id";

/// Visitor hints forwarded to experiment assignment.
#[derive(Debug, Default, Deserialize)]
pub struct ServeParams {
    pub session_id: Option<String>,
    pub device_type: Option<String>,
    pub customer_id: Option<String>,
}

/// GET /storefront/stores/{store_id}/pages/{page_type}/configuration
pub async fn serve_configuration(
    State(state): State<AppState>,
    Path((store_id, page_type)): Path<(DbId, String)>,
    Query(params): Query<ServeParams>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&page_type)?;
    let visitor = VisitorContext {
        session_id: params.session_id.or_else(|| header_value(&headers, SESSION_HEADER)),
        device_type: params.device_type,
        user_agent: header_value(&headers, USER_AGENT.as_str()),
        customer_id: params.customer_id,
    };

    let served = state
        .overlay
        .resolve_for_serving(store_id, page_type, &visitor)
        .await?;
    Ok(Json(DataResponse { data: served }))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
