//! Request extractors shared by the editor routes.
//!
//! - [`auth::AuthUser`] -- the editor identified by a JWT Bearer token.

pub mod auth;
