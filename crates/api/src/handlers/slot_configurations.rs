//! Editor endpoints for slot configuration drafts, publishing and reverts.
//!
//! All routes require an authenticated editor; the token's user id is the
//! acting user for ownership checks and publish stamps.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use storefront_core::configuration::ConfigurationTree;
use storefront_core::types::DbId;

use super::parse_page_type;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `PUT /{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    /// The full replacement tree. Parsed and validated before anything is
    /// written.
    pub configuration: serde_json::Value,
    /// `true` when the editor reset the draft to its published content.
    #[serde(default)]
    pub is_reset: bool,
}

/// Query parameters for the version history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// POST /stores/{store_id}/slot-configurations/drafts/{page_type}
pub async fn get_or_create_draft(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, page_type)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&page_type)?;
    let draft = state
        .drafts
        .get_or_create_draft(store_id, page_type, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: draft }))
}

/// POST /stores/{store_id}/slot-configurations/drafts/{page_type}/init
pub async fn init_draft(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, page_type)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&page_type)?;
    let draft = state
        .drafts
        .init_draft(store_id, page_type, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: draft }))
}

/// GET /stores/{store_id}/slot-configurations/{id}
pub async fn get_configuration(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let record = state.drafts.get_configuration(store_id, id).await?;
    Ok(Json(DataResponse { data: record }))
}

/// PUT /stores/{store_id}/slot-configurations/{id}
pub async fn update_draft(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateDraftRequest>,
) -> AppResult<impl IntoResponse> {
    let tree = ConfigurationTree::from_value(&input.configuration)?;
    let record = state
        .drafts
        .update_draft(store_id, id, user.user_id, tree, input.is_reset)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /stores/{store_id}/slot-configurations/{id}
pub async fn delete_draft(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    state.drafts.delete_draft(store_id, id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// POST /stores/{store_id}/slot-configurations/{id}/publish-to-acceptance
pub async fn publish_to_acceptance(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .publish
        .publish_to_acceptance(store_id, id, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /stores/{store_id}/slot-configurations/{id}/publish-to-production
pub async fn publish_to_production(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .publish
        .publish_to_production(store_id, id, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /stores/{store_id}/slot-configurations/{id}/publish
///
/// Single-step publish straight from `draft`.
pub async fn legacy_publish(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .publish
        .legacy_publish(store_id, id, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /stores/{store_id}/slot-configurations/publish-all
pub async fn bulk_publish_all(
    user: AuthUser,
    State(state): State<AppState>,
    Path(store_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let result = state.publish.bulk_publish_all(store_id, user.user_id).await?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /stores/{store_id}/slot-configurations/unpublished-status
pub async fn unpublished_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(store_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state
        .publish
        .unpublished_status(store_id, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: status }))
}

/// GET /stores/{store_id}/slot-configurations/history/{page_type}
pub async fn version_history(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, page_type)): Path<(DbId, String)>,
    Query(params): Query<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&page_type)?;
    let history = state
        .publish
        .version_history(store_id, page_type, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /stores/{store_id}/slot-configurations/acceptance/{page_type}
///
/// `data` is `null` when nothing is waiting in acceptance.
pub async fn acceptance_preview(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, page_type)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&page_type)?;
    let record = state.publish.acceptance_preview(store_id, page_type).await?;
    Ok(Json(DataResponse { data: record }))
}

// ---------------------------------------------------------------------------
// Reverts
// ---------------------------------------------------------------------------

/// POST /stores/{store_id}/slot-configurations/{id}/revert-draft
///
/// `{id}` is the published or acceptance version to revert to.
pub async fn create_revert_draft(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let draft = state
        .revert
        .create_revert_draft(store_id, id, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: draft }))
}

/// POST /stores/{store_id}/slot-configurations/{id}/undo-revert
///
/// `{id}` is the revert draft.
pub async fn undo_revert(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.revert.undo_revert(store_id, id, user.user_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /stores/{store_id}/slot-configurations/{id}/revert
///
/// Whole-version revert: republishes `{id}` as a new version and marks
/// every later version `reverted`.
pub async fn revert_to_version(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .revert
        .revert_to_version(store_id, id, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// Current edit
// ---------------------------------------------------------------------------

/// Body of `POST /{id}/current-edit`.
#[derive(Debug, Deserialize)]
pub struct SetCurrentEditRequest {
    pub page_type: String,
}

/// POST /stores/{store_id}/slot-configurations/{id}/current-edit
pub async fn set_current_edit(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<SetCurrentEditRequest>,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&input.page_type)?;
    let record = state
        .current_edit
        .set_current_edit(store_id, page_type, user.user_id, id)
        .await?;
    Ok(Json(DataResponse { data: record }))
}

/// GET /stores/{store_id}/slot-configurations/current-edit/{page_type}
///
/// `data` is `null` when the editor has not marked a version.
pub async fn get_current_edit(
    user: AuthUser,
    State(state): State<AppState>,
    Path((store_id, page_type)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let page_type = parse_page_type(&page_type)?;
    let record = state
        .current_edit
        .get_current_edit(store_id, page_type, user.user_id)
        .await?;
    Ok(Json(DataResponse { data: record }))
}
