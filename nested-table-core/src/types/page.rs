use std::collections::BTreeMap;

use nested_table_backend::{PageQuery, PageResult, Row, SortDirection};
use serde::Serialize;

use super::expansion::ExpansionState;

/// Display-only projection of a row, produced by `TableHooks::format_row`.
pub type DisplayFields = BTreeMap<String, String>;

/// A row plus its derived display fields.
///
/// `display` is never persisted: commits and reloads only ever carry `row`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow<T> {
    pub row: T,
    pub display: DisplayFields,
}

impl<T: Row> TableRow<T> {
    pub fn id(&self) -> &str {
        self.row.id()
    }
}

/// The page currently held by the controller.
#[derive(Debug, Clone)]
pub struct PageState<T> {
    pub rows: Vec<TableRow<T>>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub filter: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    /// Sequence number of the load whose result is shown.
    pub applied_seq: u64,
    pub loading: bool,
}

impl<T: Row> PageState<T> {
    pub fn new(page_size: u32, sort_field: impl Into<String>, sort_direction: SortDirection) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
            page_size,
            filter: String::new(),
            sort_field: sort_field.into(),
            sort_direction,
            applied_seq: 0,
            loading: false,
        }
    }

    /// Query reproducing the current view.
    pub fn query(&self) -> PageQuery {
        PageQuery::new(
            self.filter.clone(),
            self.page,
            self.page_size,
            self.sort_field.clone(),
            self.sort_direction,
        )
    }

    /// Replace the page wholesale with a fetched result.
    pub fn apply(&mut self, seq: u64, result: PageResult<TableRow<T>>) {
        self.total = result.total;
        self.page = result.page;
        self.total_pages = result.total_pages;
        self.rows = result.data;
        self.applied_seq = seq;
    }

    /// Drop the rows of a failed load; the requested page index is kept.
    pub fn clear(&mut self, seq: u64) {
        self.rows.clear();
        self.total = 0;
        self.total_pages = 0;
        self.applied_seq = seq;
    }

    pub fn find(&self, id: &str) -> Option<&TableRow<T>> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TableRow<T>> {
        self.rows.iter_mut().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Remove a row, keeping `total` consistent.
    pub fn remove(&mut self, id: &str) -> Option<TableRow<T>> {
        let idx = self.rows.iter().position(|r| r.id() == id)?;
        self.total = self.total.saturating_sub(1);
        Some(self.rows.remove(idx))
    }

    /// Replace the row with the same ID; returns `false` if it is not on the page.
    pub fn replace_row(&mut self, row: TableRow<T>) -> bool {
        match self.find_mut(row.id()) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }
}

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot<T> {
    pub rows: Vec<TableRow<T>>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub filter: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub expansion: ExpansionState,
    pub columns: Vec<String>,
    pub loading: bool,
}
