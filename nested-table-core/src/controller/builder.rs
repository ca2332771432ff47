use std::sync::Arc;

use nested_table_backend::{CrudBackend, Row};

use super::TableController;
use crate::config::TableConfig;
use crate::error::CoreResult;
use crate::services::TableContext;
use crate::traits::{AlwaysConfirm, Confirmer, DefaultHooks, LogNotifier, Notifier, TableHooks};

/// Injects the collaborators of a [`TableController`].
///
/// Only the backend is required. Missing hooks default to [`DefaultHooks`]
/// named after the backend's class, the notifier to [`LogNotifier`] and the
/// confirmer to [`AlwaysConfirm`].
pub struct TableControllerBuilder<T: Row> {
    backend: Arc<dyn CrudBackend<T>>,
    hooks: Option<Arc<dyn TableHooks<T>>>,
    notifier: Option<Arc<dyn Notifier>>,
    confirmer: Option<Arc<dyn Confirmer>>,
    config: TableConfig,
}

impl<T: Row> TableControllerBuilder<T> {
    #[must_use]
    pub fn new(backend: Arc<dyn CrudBackend<T>>) -> Self {
        Self {
            backend,
            hooks: None,
            notifier: None,
            confirmer: None,
            config: TableConfig::default(),
        }
    }

    #[must_use]
    pub fn hooks(mut self, hooks: Arc<dyn TableHooks<T>>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    #[must_use]
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the controller. Nothing runs until [`TableController::start`].
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the configuration does not validate.
    pub fn build(self) -> CoreResult<TableController<T>> {
        let config = self.config.validated()?;
        let hooks: Arc<dyn TableHooks<T>> = match self.hooks {
            Some(hooks) => hooks,
            None => Arc::new(DefaultHooks::new(self.backend.class_name())),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LogNotifier) as Arc<dyn Notifier>);
        let confirmer = self
            .confirmer
            .unwrap_or_else(|| Arc::new(AlwaysConfirm) as Arc<dyn Confirmer>);

        let ctx = Arc::new(TableContext::new(
            self.backend,
            hooks,
            notifier,
            confirmer,
            config,
        ));
        Ok(TableController::from_context(ctx))
    }
}
