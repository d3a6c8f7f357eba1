//! Draft, publish, revert and serve-time overlay logic for slot
//! configurations.
//!
//! Every component holds an `Arc<dyn VersionStore>` and is cheap to clone.
//! Store scoping is explicit on every call; ownership checks happen here,
//! not in the store.

pub mod current_edit;
pub mod drafts;
pub mod error;
pub mod overlay;
pub mod publish;
mod records;
pub mod revert;

pub use current_edit::CurrentEditTracker;
pub use drafts::DraftManager;
pub use error::{EngineError, EngineResult};
pub use overlay::OverlayResolver;
pub use publish::PublishPipeline;
pub use revert::RevertEngine;
