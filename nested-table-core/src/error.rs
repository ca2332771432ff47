//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export backend error type
pub use nested_table_backend::BackendError;

/// Core layer error type
///
/// Backend failures are normally absorbed by the controller (notified and
/// mapped onto an outcome); the remaining variants report misuse such as
/// editing while nothing is expanded.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Backend error (converted from the backend crate)
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// No row is expanded
    #[error("No row is expanded")]
    NotExpanded,

    /// No row is in edit mode
    #[error("No row is being edited")]
    NotEditing,

    /// The row is not part of the current page
    #[error("Row not on current page: {0}")]
    RowNotOnPage(String),

    /// The row has no ID
    #[error("Row has no id")]
    MissingRowId,

    /// The field is read-only or unknown
    #[error("Field is not editable: {0}")]
    FieldNotEditable(String),

    /// The event is not allowed in the current expansion state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Another expand/collapse/edit transition is in progress
    #[error("Another transition is in progress")]
    Busy,

    /// `start()` has not been called yet
    #[error("Table controller not started")]
    NotStarted,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The controller was torn down
    #[error("Table controller has been shut down")]
    ShutDown,
}

impl CoreError {
    /// Whether it is expected behavior (user input, stale UI, teardown), used
    /// for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when
    /// returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::NotExpanded
            | Self::NotEditing
            | Self::RowNotOnPage(_)
            | Self::MissingRowId
            | Self::FieldNotEditable(_)
            | Self::InvalidTransition(_)
            | Self::Busy
            | Self::ShutDown => true,
            Self::Backend(e) => e.is_expected(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
