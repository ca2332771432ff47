use serde::{Deserialize, Serialize};

use super::expansion::{ExpansionState, RowId};

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// Question put to the confirmation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
}

impl ConfirmRequest {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Responsive breakpoint reported by the external layout observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Small,
    Medium,
    #[default]
    Large,
}

/// Domain events published to parents through [`TableController::subscribe`].
///
/// [`TableController::subscribe`]: crate::TableController::subscribe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TableEvent {
    #[serde(rename_all = "camelCase")]
    PageLoaded { seq: u64, page: u32, total: u64 },
    ExpansionChanged { from: ExpansionState, to: ExpansionState },
    #[serde(rename_all = "camelCase")]
    RowRefreshed { row_id: RowId },
    #[serde(rename_all = "camelCase")]
    RowRemoved { row_id: RowId },
    ColumnsChanged {
        breakpoint: Breakpoint,
        columns: Vec<String>,
    },
}

/// Page navigation request coming from the pager widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageChange {
    pub page: u32,
    /// New page size, if the user changed it.
    pub page_size: Option<u32>,
}

impl PageChange {
    pub fn to(page: u32) -> Self {
        Self {
            page,
            page_size: None,
        }
    }

    pub fn resize(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: Some(page_size),
        }
    }
}
