//! Backup snapshot and live edit buffer of the edited row

use nested_table_backend::{from_value, to_value, Row};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::traits::TableHooks;
use crate::types::{RowId, ValidationErrors};

/// Immutable pre-edit copy of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBackup<T> {
    pub row_id: RowId,
    pub snapshot: T,
}

/// Field values written through the edit form since the buffer was attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditBuffer {
    pub row_id: RowId,
    pub changes: Map<String, Value>,
}

impl EditBuffer {
    fn new(row_id: &str) -> Self {
        Self {
            row_id: row_id.to_string(),
            changes: Map::new(),
        }
    }
}

/// What a commit would send.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitPlan<T> {
    Invalid(ValidationErrors),
    Ready {
        /// Formalized row to hand to the backend
        row: T,
        /// Top-level fields that differ from the backup
        changed: Vec<String>,
    },
}

/// Owns the backup and the edit buffer.
///
/// There is at most one of each, and a buffer always belongs to the row the
/// backup was taken from.
#[derive(Debug)]
pub struct EditSession<T> {
    backup: Option<EditBackup<T>>,
    buffer: Option<EditBuffer>,
    read_only: Vec<String>,
}

impl<T: Row> EditSession<T> {
    pub fn new(read_only: Vec<String>) -> Self {
        Self {
            backup: None,
            buffer: None,
            read_only,
        }
    }

    pub fn backup(&self) -> Option<&EditBackup<T>> {
        self.backup.as_ref()
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.buffer.as_ref()
    }

    pub fn is_editable(&self, field: &str) -> bool {
        !self.read_only.iter().any(|f| f == field)
    }

    /// Capture a fresh backup, replacing whatever was held before.
    pub fn snapshot(&mut self, row: &T) {
        self.backup = Some(EditBackup {
            row_id: row.id().to_string(),
            snapshot: row.clone(),
        });
    }

    pub fn discard(&mut self) {
        self.backup = None;
        self.buffer = None;
    }

    /// Wire a new edit buffer to `row_id`, releasing the previous one first.
    pub fn attach(&mut self, row_id: &str) {
        if let Some(prev) = self.detach() {
            log::debug!(
                "Released edit buffer of row {} ({} pending fields)",
                prev.row_id,
                prev.changes.len()
            );
        }
        self.buffer = Some(EditBuffer::new(row_id));
    }

    pub fn detach(&mut self) -> Option<EditBuffer> {
        self.buffer.take()
    }

    /// Write one form field into the edited row.
    pub fn write_field(&mut self, row: &mut T, field: &str, value: Value) -> CoreResult<()> {
        if !self.buffer.as_ref().is_some_and(|b| b.row_id == row.id()) {
            return Err(CoreError::NotEditing);
        }
        if !self.is_editable(field) {
            return Err(CoreError::FieldNotEditable(field.to_string()));
        }

        let mut json = to_value(row)?;
        match json.as_object_mut() {
            Some(map) if map.contains_key(field) => {
                map.insert(field.to_string(), value.clone());
            }
            _ => return Err(CoreError::FieldNotEditable(field.to_string())),
        }
        *row = from_value(json)?;

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.changes.insert(field.to_string(), value);
        }
        Ok(())
    }

    /// Leave edit mode without saving: release the buffer and hand back the backup.
    ///
    /// Returns `None` if no backup of `row_id` is held.
    pub fn cancel(&mut self, row_id: &str) -> Option<T> {
        self.buffer = None;
        match self.backup.take() {
            Some(backup) if backup.row_id == row_id => Some(backup.snapshot),
            Some(backup) => {
                log::warn!(
                    "Dropping backup of row {} while cancelling row {row_id}",
                    backup.row_id
                );
                None
            }
            None => None,
        }
    }

    /// Top-level fields of `row` that differ from the backup.
    pub fn diff(&self, row: &T) -> CoreResult<Vec<String>> {
        let Some(backup) = &self.backup else {
            return Ok(Vec::new());
        };
        let before = to_value(&backup.snapshot)?;
        let after = to_value(row)?;
        let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
            return Ok(Vec::new());
        };
        Ok(after
            .iter()
            .filter(|(k, v)| before.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect())
    }

    /// Formalize and validate the edited row.
    pub fn prepare_commit(&self, row: &T, hooks: &dyn TableHooks<T>) -> CoreResult<CommitPlan<T>> {
        if !self.buffer.as_ref().is_some_and(|b| b.row_id == row.id()) {
            return Err(CoreError::NotEditing);
        }
        let mut row = row.clone();
        hooks.formalize(&mut row);
        let errors = hooks.validate(&row);
        if !errors.is_valid() {
            return Ok(CommitPlan::Invalid(errors));
        }
        let changed = self.diff(&row)?;
        Ok(CommitPlan::Ready { row, changed })
    }
}
