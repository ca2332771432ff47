//! Expansion state machine
//!
//! [`transition`] is pure: it maps `(state, event)` to the next state plus the
//! ordered side effects the controller must run. It never touches rows, so it
//! can be exercised without any page or rendering layer.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

pub type RowId = String;

/// Which row (if any) is expanded, and whether it is being edited.
///
/// At most one row is ever expanded, and `Editing` always names that row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "rowId")]
pub enum ExpansionState {
    #[default]
    Closed,
    Open(RowId),
    Editing(RowId),
}

impl ExpansionState {
    pub fn expanded_id(&self) -> Option<&str> {
        match self {
            Self::Closed => None,
            Self::Open(id) | Self::Editing(id) => Some(id),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded_id() == Some(id)
    }
}

/// Inputs of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionEvent {
    /// Row header clicked.
    Toggle(RowId),
    /// Switch the open row to edit mode.
    Edit,
    /// Backend accepted the edited row.
    SaveSucceeded,
    /// Backend rejected the edited row; the authoritative copy is already on the page.
    SaveFailed,
    /// Abandon the edit.
    Cancel,
    /// Backend confirmed deletion of a row.
    Deleted(RowId),
    /// Close whatever is expanded (page change, vanished row).
    Collapse,
}

/// Side effects of a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Capture a fresh backup of the row, replacing any previous one.
    Snapshot(RowId),
    /// Drop the backup and release the edit buffer.
    Discard(RowId),
    /// Put the backup back into the row, release the buffer, drop the backup.
    Restore(RowId),
    /// Wire the edit buffer to the row (the previous wiring is released first).
    AttachBuffer(RowId),
    /// Release the edit buffer.
    DetachBuffer(RowId),
    /// Remove the row from the current page.
    RemoveRow(RowId),
    /// Re-project the row's display fields.
    Refresh(RowId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ExpansionState,
    pub to: ExpansionState,
    pub effects: Vec<Effect>,
}

/// Compute the next state and its effects.
pub fn transition(state: &ExpansionState, event: &ExpansionEvent) -> CoreResult<Transition> {
    use Effect::{AttachBuffer, Discard, DetachBuffer, Refresh, RemoveRow, Restore, Snapshot};
    use ExpansionState::{Closed, Editing, Open};

    let (to, effects) = match (state, event) {
        (_, ExpansionEvent::Toggle(id)) if id.is_empty() => return Err(CoreError::MissingRowId),

        (Closed, ExpansionEvent::Toggle(id)) => {
            (Open(id.clone()), vec![Snapshot(id.clone()), Refresh(id.clone())])
        }
        (Open(cur), ExpansionEvent::Toggle(id)) if cur == id => {
            (Closed, vec![Discard(cur.clone()), Refresh(cur.clone())])
        }
        (Editing(cur), ExpansionEvent::Toggle(id)) if cur == id => {
            (Closed, vec![Restore(cur.clone()), Refresh(cur.clone())])
        }
        (Open(cur), ExpansionEvent::Toggle(id)) => (
            Open(id.clone()),
            vec![
                Discard(cur.clone()),
                Refresh(cur.clone()),
                Snapshot(id.clone()),
                Refresh(id.clone()),
            ],
        ),
        (Editing(cur), ExpansionEvent::Toggle(id)) => (
            Open(id.clone()),
            vec![
                Restore(cur.clone()),
                Refresh(cur.clone()),
                Snapshot(id.clone()),
                Refresh(id.clone()),
            ],
        ),

        (Open(cur), ExpansionEvent::Edit) => (
            Editing(cur.clone()),
            vec![Snapshot(cur.clone()), AttachBuffer(cur.clone())],
        ),
        (Closed, ExpansionEvent::Edit) => return Err(CoreError::NotExpanded),

        (Editing(cur), ExpansionEvent::SaveSucceeded) => (
            Open(cur.clone()),
            vec![
                DetachBuffer(cur.clone()),
                Snapshot(cur.clone()),
                Refresh(cur.clone()),
            ],
        ),
        (Editing(cur), ExpansionEvent::SaveFailed) => (
            Editing(cur.clone()),
            vec![
                Snapshot(cur.clone()),
                AttachBuffer(cur.clone()),
                Refresh(cur.clone()),
            ],
        ),
        (Editing(cur), ExpansionEvent::Cancel) => (
            Open(cur.clone()),
            vec![
                Restore(cur.clone()),
                Snapshot(cur.clone()),
                Refresh(cur.clone()),
            ],
        ),
        (
            Closed | Open(_),
            ExpansionEvent::SaveSucceeded | ExpansionEvent::SaveFailed | ExpansionEvent::Cancel,
        ) => return Err(CoreError::NotEditing),

        (_, ExpansionEvent::Deleted(id)) if state.is_expanded(id) => {
            (Closed, vec![Discard(id.clone()), RemoveRow(id.clone())])
        }
        (_, ExpansionEvent::Deleted(id)) => (state.clone(), vec![RemoveRow(id.clone())]),

        (Closed, ExpansionEvent::Collapse) => (Closed, Vec::new()),
        (Open(cur), ExpansionEvent::Collapse) => {
            (Closed, vec![Discard(cur.clone()), Refresh(cur.clone())])
        }
        (Editing(cur), ExpansionEvent::Collapse) => {
            (Closed, vec![Restore(cur.clone()), Refresh(cur.clone())])
        }

        (Editing(_), ExpansionEvent::Edit) => {
            return Err(CoreError::InvalidTransition(format!(
                "{event:?} while {state:?}"
            )))
        }
    };

    Ok(Transition {
        from: state.clone(),
        to,
        effects,
    })
}
