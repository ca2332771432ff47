use serde::Serialize;

use super::expansion::ExpansionState;
use super::validation::ValidationErrors;

/// Result of a toggle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ToggleOutcome {
    /// The transition ran; carries the new state.
    Applied(ExpansionState),
    /// Another transition was in flight; the request was dropped.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SaveOutcome {
    Saved,
    /// Validation blocked the commit; nothing was sent to the backend.
    Invalid(ValidationErrors),
    /// The backend rejected the update; the row was reloaded and stays editable.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CreateOutcome<T> {
    Created(T),
    Invalid(ValidationErrors),
    Failed,
}

/// Result of one page load, tagged with its sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    Applied { seq: u64 },
    /// A newer load was issued meanwhile; this response was discarded.
    Stale { seq: u64 },
    /// The backend failed; the page was cleared and the error notified.
    Failed { seq: u64 },
}

impl LoadOutcome {
    pub fn seq(self) -> u64 {
        match self {
            Self::Applied { seq } | Self::Stale { seq } | Self::Failed { seq } => seq,
        }
    }

    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
