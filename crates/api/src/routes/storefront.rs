//! Public routes mounted at `/storefront`.

use axum::routing::get;
use axum::Router;

use crate::handlers::storefront;
use crate::state::AppState;

/// ```text
/// GET /stores/{store_id}/pages/{page_type}/configuration   serve_configuration
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/stores/{store_id}/pages/{page_type}/configuration",
        get(storefront::serve_configuration),
    )
}
