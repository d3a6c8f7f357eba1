//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or a connection inside a transaction) as the
//! first argument.

pub mod slot_configuration_repo;
pub mod version_counter_repo;

pub use slot_configuration_repo::SlotConfigurationRepo;
pub use version_counter_repo::VersionCounterRepo;
