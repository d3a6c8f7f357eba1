pub mod health;
pub mod slot_configurations;
pub mod storefront;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /stores/{store_id}/slot-configurations/...            editor routes (auth required)
/// /storefront/stores/{store_id}/pages/{page_type}/...   serve-time resolution (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/stores/{store_id}/slot-configurations",
            slot_configurations::router(),
        )
        .nest("/storefront", storefront::router())
}
