use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A lifecycle operation was attempted on a record whose status does not
    /// allow it.
    #[error("Invalid state transition for {entity} {id}: status is '{actual}', requires {required}")]
    InvalidStateTransition {
        entity: &'static str,
        id: DbId,
        actual: String,
        required: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
