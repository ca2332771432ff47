//! Concrete-table hooks

use std::marker::PhantomData;

use nested_table_backend::Row;

use crate::types::{DisplayFields, ValidationErrors};

/// Per-entity customisation points of a table.
///
/// Every method except `class_name` has a no-op default, so a minimal table
/// only names its entity.
pub trait TableHooks<T: Row>: Send + Sync {
    /// Display name of the entity, used in notifications and dialogs.
    fn class_name(&self) -> &str;

    /// Header label of a column.
    fn column_label(&self, name: &str) -> String {
        name.to_string()
    }

    /// Project derived display-only fields after every fetch or read.
    fn format_row(&self, _row: &T, _display: &mut DisplayFields) {}

    /// Normalize a row right before it is sent to `update` or `create`.
    fn formalize(&self, _row: &mut T) {}

    /// Field-level validation run on commit and create.
    fn validate(&self, _row: &T) -> ValidationErrors {
        ValidationErrors::new()
    }
}

/// Hooks that only carry a class name
pub struct DefaultHooks<T> {
    class_name: String,
    _row: PhantomData<fn() -> T>,
}

impl<T> DefaultHooks<T> {
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            _row: PhantomData,
        }
    }
}

impl<T: Row> TableHooks<T> for DefaultHooks<T> {
    fn class_name(&self) -> &str {
        &self.class_name
    }
}
