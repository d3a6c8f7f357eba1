//! Domain layer for storefront page-layout configurations.
//!
//! Holds everything that does not touch I/O: identifiers, the error type,
//! the status state machine, the typed configuration tree and its write-time
//! validation, change detection, A/B override merging, revert snapshot
//! metadata, and the traits the engine uses to reach external providers.

pub mod change_detection;
pub mod configuration;
pub mod diff;
pub mod error;
pub mod experiment;
pub mod overlay;
pub mod page_type;
pub mod pagination;
pub mod revert;
pub mod slot_status;
pub mod template;
pub mod types;
