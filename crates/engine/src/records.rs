//! Lookups and checks shared by the engine components.

use storefront_core::error::CoreError;
use storefront_core::slot_status::{self, require_status, SlotStatus};
use storefront_core::types::DbId;
use storefront_db::models::slot_configuration::SlotConfiguration;
use storefront_db::store::VersionStore;

use crate::error::{EngineError, EngineResult};

/// Load a record in the store scope or fail with `NotFound`.
pub(crate) async fn load(
    store: &dyn VersionStore,
    store_id: DbId,
    id: DbId,
) -> EngineResult<SlotConfiguration> {
    store
        .find_by_id(store_id, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Only the owner may change a record.
pub(crate) fn require_owner(record: &SlotConfiguration, user_id: DbId) -> Result<(), CoreError> {
    if record.user_id == user_id {
        return Ok(());
    }
    Err(CoreError::Forbidden(format!(
        "{} {} belongs to another user",
        slot_status::ENTITY,
        record.id
    )))
}

/// Explain why a conditional write matched no row: the record was deleted
/// or moved out of `allowed` after it was checked.
pub(crate) async fn stale_write(
    store: &dyn VersionStore,
    store_id: DbId,
    id: DbId,
    allowed: &[SlotStatus],
) -> EngineError {
    match store.find_by_id(store_id, id).await {
        Ok(None) => not_found(id),
        Ok(Some(current)) => match require_status(id, current.status, allowed) {
            Err(e) => e.into(),
            Ok(()) => CoreError::Conflict(format!(
                "{} {id} was modified concurrently",
                slot_status::ENTITY
            ))
            .into(),
        },
        Err(e) => e.into(),
    }
}

pub(crate) fn not_found(id: DbId) -> EngineError {
    CoreError::NotFound {
        entity: slot_status::ENTITY,
        id,
    }
    .into()
}
