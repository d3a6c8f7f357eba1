//! Editor routes mounted at `/stores/{store_id}/slot-configurations`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::slot_configurations as handlers;
use crate::state::AppState;

/// ```text
/// POST   /drafts/{page_type}            get_or_create_draft
/// POST   /drafts/{page_type}/init       init_draft
/// POST   /publish-all                   bulk_publish_all
/// GET    /unpublished-status            unpublished_status
/// GET    /history/{page_type}           version_history
/// GET    /acceptance/{page_type}        acceptance_preview
/// GET    /current-edit/{page_type}      get_current_edit
/// GET    /{id}                          get_configuration
/// PUT    /{id}                          update_draft
/// DELETE /{id}                          delete_draft
/// POST   /{id}/publish-to-acceptance    publish_to_acceptance
/// POST   /{id}/publish-to-production    publish_to_production
/// POST   /{id}/publish                  legacy_publish
/// POST   /{id}/revert-draft             create_revert_draft
/// POST   /{id}/undo-revert              undo_revert
/// POST   /{id}/revert                   revert_to_version
/// POST   /{id}/current-edit             set_current_edit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/drafts/{page_type}", post(handlers::get_or_create_draft))
        .route("/drafts/{page_type}/init", post(handlers::init_draft))
        .route("/publish-all", post(handlers::bulk_publish_all))
        .route("/unpublished-status", get(handlers::unpublished_status))
        .route("/history/{page_type}", get(handlers::version_history))
        .route("/acceptance/{page_type}", get(handlers::acceptance_preview))
        .route("/current-edit/{page_type}", get(handlers::get_current_edit))
        .route(
            "/{id}",
            get(handlers::get_configuration)
                .put(handlers::update_draft)
                .delete(handlers::delete_draft),
        )
        .route(
            "/{id}/publish-to-acceptance",
            post(handlers::publish_to_acceptance),
        )
        .route(
            "/{id}/publish-to-production",
            post(handlers::publish_to_production),
        )
        .route("/{id}/publish", post(handlers::legacy_publish))
        .route("/{id}/revert-draft", post(handlers::create_revert_draft))
        .route("/{id}/undo-revert", post(handlers::undo_revert))
        .route("/{id}/revert", post(handlers::revert_to_version))
        .route("/{id}/current-edit", post(handlers::set_current_edit))
}
