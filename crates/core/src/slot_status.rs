//! Lifecycle status of a slot configuration record and the transitions
//! between them.
//!
//! ```text
//! init --(first content write)--> draft --(to acceptance)--> acceptance --(to production)--> published
//! draft --(legacy publish)--> published
//! published|acceptance --(legacy revert, superseded rows)--> reverted
//! ```
//!
//! `reverted` is terminal. A revert *draft* is a different record, so it does
//! not appear as an edge here.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const STATUS_INIT: &str = "init";
pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_ACCEPTANCE: &str = "acceptance";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_REVERTED: &str = "reverted";

/// All valid status values.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_INIT,
    STATUS_DRAFT,
    STATUS_ACCEPTANCE,
    STATUS_PUBLISHED,
    STATUS_REVERTED,
];

/// Entity name used in errors raised about slot configuration records.
pub const ENTITY: &str = "SlotConfiguration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Init,
    Draft,
    Acceptance,
    Published,
    Reverted,
}

impl SlotStatus {
    /// Statuses that make a record the owner's editable draft.
    pub const OPEN: [SlotStatus; 2] = [SlotStatus::Init, SlotStatus::Draft];

    /// Statuses a revert may start from.
    pub const REVERTIBLE: [SlotStatus; 2] = [SlotStatus::Published, SlotStatus::Acceptance];

    /// Statuses listed in version history.
    pub const HISTORY: [SlotStatus; 3] = [
        SlotStatus::Acceptance,
        SlotStatus::Published,
        SlotStatus::Reverted,
    ];

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_INIT => Ok(Self::Init),
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_ACCEPTANCE => Ok(Self::Acceptance),
            STATUS_PUBLISHED => Ok(Self::Published),
            STATUS_REVERTED => Ok(Self::Reverted),
            _ => Err(CoreError::Validation(format!(
                "Invalid status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => STATUS_INIT,
            Self::Draft => STATUS_DRAFT,
            Self::Acceptance => STATUS_ACCEPTANCE,
            Self::Published => STATUS_PUBLISHED,
            Self::Reverted => STATUS_REVERTED,
        }
    }

    /// `true` for `init` and `draft`.
    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    /// Whether the state machine has a direct edge from `self` to `to`.
    pub fn can_transition_to(&self, to: SlotStatus) -> bool {
        matches!(
            (self, to),
            (Self::Init, Self::Draft)
                | (Self::Draft, Self::Acceptance)
                | (Self::Draft, Self::Published)
                | (Self::Acceptance, Self::Published)
                | (Self::Published, Self::Reverted)
                | (Self::Acceptance, Self::Reverted)
        )
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SlotStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_value(&value)
    }
}

/// Require `actual` to be one of `allowed`, naming both sides on failure.
pub fn require_status(
    id: DbId,
    actual: SlotStatus,
    allowed: &[SlotStatus],
) -> Result<(), CoreError> {
    if allowed.contains(&actual) {
        return Ok(());
    }
    let required = allowed
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(" or ");
    Err(CoreError::InvalidStateTransition {
        entity: ENTITY,
        id,
        actual: actual.as_str().to_string(),
        required,
    })
}
