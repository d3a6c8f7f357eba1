//! Request handlers.
//!
//! Handlers parse path/query/body input, delegate to the engine components
//! held in [`AppState`](crate::state::AppState), and map errors via
//! [`AppError`](crate::error::AppError).

pub mod health;
pub mod slot_configurations;
pub mod storefront;

use storefront_core::page_type::PageType;

use crate::error::AppResult;

/// Parse a `{page_type}` path segment, rejecting unknown values with 400.
pub(crate) fn parse_page_type(raw: &str) -> AppResult<PageType> {
    Ok(PageType::from_str_value(raw)?)
}
