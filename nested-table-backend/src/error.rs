use serde::Serialize;
use thiserror::Error;

/// Unified error type for all backend operations.
///
/// One variant per backend operation so the table core can pick the matching
/// recovery: an empty page for [`Fetch`](Self::Fetch), an authoritative
/// reload for [`Update`](Self::Update), and so on.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "code", content = "details")]
pub enum BackendError {
    /// Listing a page failed.
    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    /// The row vanished (or never existed).
    #[error("Row not found: {id}")]
    NotFound {
        /// ID that was looked up.
        id: String,
    },

    /// Creating a row failed.
    #[error("Failed to create row: {0}")]
    Create(String),

    /// Updating a row failed.
    #[error("Failed to update row {id}: {detail}")]
    Update {
        /// ID of the row being updated.
        id: String,
        /// Error details.
        detail: String,
    },

    /// Deleting a row failed.
    #[error("Failed to delete row {id}: {detail}")]
    Delete {
        /// ID of the row being deleted.
        id: String,
        /// Error details.
        detail: String,
    },

    /// A row could not be converted to or from its JSON projection.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    /// Whether this error is an expected outcome (e.g. a row deleted elsewhere).
    ///
    /// Callers log expected errors at `warn` and everything else at `error`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Backend result alias.
pub type Result<T> = std::result::Result<T, BackendError>;
