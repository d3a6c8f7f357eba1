//! Client for the external A/B testing service.
//!
//! The service owns experiments, bucketing and statistics. This crate only
//! reads the experiments running on a page and the sticky variant a session
//! is assigned to, exposing both through the provider traits of
//! `storefront-core`.

pub mod client;

pub use client::{AbTestingClient, AbTestingError};
