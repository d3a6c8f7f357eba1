//! Per-key diff state used when summarising how a draft differs from the
//! published configuration.

use serde::{Deserialize, Serialize};

/// The status of one slot in a draft-vs-published comparison.
///
/// - `Added`   -- present only in the draft.
/// - `Removed` -- present only in the published configuration.
/// - `Changed` -- present in both with different definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
}

impl DiffStatus {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
