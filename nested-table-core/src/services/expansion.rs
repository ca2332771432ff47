//! Expansion controller - runs state machine transitions against the page

use nested_table_backend::Row;

use super::edit_session::EditSession;
use super::TableContext;
use crate::error::{CoreError, CoreResult};
use crate::types::{
    transition, Effect, ExpansionEvent, ExpansionState, PageState, RowId, TableRow, Transition,
};

/// What a dispatched event did.
#[derive(Debug)]
pub struct Applied<T> {
    pub transition: Transition,
    /// Rows whose display fields were re-projected
    pub refreshed: Vec<RowId>,
    /// Rows taken off the page
    pub removed: Vec<TableRow<T>>,
}

impl<T> Applied<T> {
    pub fn changed_state(&self) -> bool {
        self.transition.from != self.transition.to
    }
}

/// Owns the expansion state and the edit session.
#[derive(Debug)]
pub struct ExpansionController<T> {
    state: ExpansionState,
    session: EditSession<T>,
}

impl<T: Row> ExpansionController<T> {
    pub fn new(read_only: Vec<String>) -> Self {
        Self {
            state: ExpansionState::Closed,
            session: EditSession::new(read_only),
        }
    }

    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    pub fn session(&self) -> &EditSession<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession<T> {
        &mut self.session
    }

    /// Apply `event`: compute the transition, run its effects in order, commit
    /// the new state.
    ///
    /// Fails without touching anything if the event is not allowed or a row
    /// the transition needs is not on the page.
    pub fn dispatch(
        &mut self,
        event: ExpansionEvent,
        page: &mut PageState<T>,
        ctx: &TableContext<T>,
    ) -> CoreResult<Applied<T>> {
        let transition = transition(&self.state, &event)?;

        for effect in &transition.effects {
            if let Effect::Snapshot(id) | Effect::AttachBuffer(id) = effect {
                if !page.contains(id) {
                    return Err(CoreError::RowNotOnPage(id.clone()));
                }
            }
        }

        let mut refreshed = Vec::new();
        let mut removed = Vec::new();
        for effect in &transition.effects {
            match effect {
                Effect::Snapshot(id) => {
                    if let Some(row) = page.find(id) {
                        self.session.snapshot(&row.row);
                    }
                }
                Effect::Discard(_) => self.session.discard(),
                Effect::Restore(id) => {
                    if let Some(backup) = self.session.cancel(id) {
                        page.replace_row(ctx.format(backup));
                    }
                }
                Effect::AttachBuffer(id) => self.session.attach(id),
                Effect::DetachBuffer(_) => {
                    self.session.detach();
                }
                Effect::RemoveRow(id) => {
                    if let Some(row) = page.remove(id) {
                        removed.push(row);
                    }
                }
                Effect::Refresh(id) => {
                    if let Some(slot) = page.find_mut(id) {
                        *slot = ctx.format(slot.row.clone());
                        refreshed.push(id.clone());
                    }
                }
            }
        }

        log::debug!(
            "{event:?}: {:?} -> {:?}",
            transition.from,
            transition.to
        );
        self.state = transition.to.clone();
        Ok(Applied {
            transition,
            refreshed,
            removed,
        })
    }

    /// Bring the expansion in line with a freshly applied page.
    ///
    /// A vanished expanded row collapses. A row still being edited keeps its
    /// in-memory values (`edited`); an open row gets a fresh backup.
    pub fn reconcile(
        &mut self,
        page: &mut PageState<T>,
        edited: Option<TableRow<T>>,
        ctx: &TableContext<T>,
    ) -> CoreResult<Option<Applied<T>>> {
        let Some(id) = self.state.expanded_id().map(str::to_string) else {
            return Ok(None);
        };

        if !page.contains(&id) {
            log::debug!("Expanded row {id} is not on the new page");
            return self.dispatch(ExpansionEvent::Collapse, page, ctx).map(Some);
        }

        if self.state.is_editing() {
            if let Some(edited) = edited.filter(|r| r.id() == id) {
                page.replace_row(edited);
            }
        } else if let Some(row) = page.find(&id) {
            self.session.snapshot(&row.row);
        }
        Ok(None)
    }
}
