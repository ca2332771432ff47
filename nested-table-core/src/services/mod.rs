//! Table services: page loading, edit session and expansion state machine

mod edit_session;
mod expansion;
mod page_loader;

pub use edit_session::{CommitPlan, EditBackup, EditBuffer, EditSession};
pub use expansion::{Applied, ExpansionController};
pub use page_loader::{PageLoad, PageLoader};

use std::sync::Arc;

use nested_table_backend::utils::truncate_for_log;
use nested_table_backend::{CrudBackend, Row};

use crate::config::TableConfig;
use crate::error::CoreError;
use crate::traits::{Confirmer, Notifier, TableHooks};
use crate::types::{DisplayFields, NotificationKind, TableRow};

/// Table context - holds every collaborator of one table
///
/// The embedding application creates it (usually through
/// [`TableControllerBuilder`](crate::TableControllerBuilder)) and injects the
/// backend plus its UI-specific notifier and confirmer.
pub struct TableContext<T: Row> {
    /// Source of truth for persisted rows
    pub backend: Arc<dyn CrudBackend<T>>,
    /// Entity-specific formatting, validation and labels
    pub hooks: Arc<dyn TableHooks<T>>,
    /// User feedback
    pub notifier: Arc<dyn Notifier>,
    /// Yes/no prompts
    pub confirmer: Arc<dyn Confirmer>,
    pub config: TableConfig,
}

impl<T: Row> TableContext<T> {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CrudBackend<T>>,
        hooks: Arc<dyn TableHooks<T>>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
        config: TableConfig,
    ) -> Self {
        Self {
            backend,
            hooks,
            notifier,
            confirmer,
            config,
        }
    }

    pub fn class_name(&self) -> &str {
        self.hooks.class_name()
    }

    /// Run the display hook over a row.
    pub fn format(&self, row: T) -> TableRow<T> {
        let mut display = DisplayFields::new();
        self.hooks.format_row(&row, &mut display);
        TableRow { row, display }
    }

    pub fn notify_success(&self, message: &str) {
        self.notifier.notify(NotificationKind::Success, message);
    }

    /// Log a failure at the level its kind deserves and tell the user.
    pub fn report(&self, action: &str, err: &CoreError) {
        let message = format!("Failed to {action} {}: {err}", self.class_name());
        if err.is_expected() {
            log::warn!("{}", truncate_for_log(&message));
        } else {
            log::error!("{}", truncate_for_log(&message));
        }
        self.notifier.notify(NotificationKind::Error, &message);
    }
}
