//! Nested Table Core Library
//!
//! Entity-agnostic controller for a paginated, sortable, filterable table
//! whose rows expand into an inline edit panel, with at most one row expanded
//! and at most one row editable at a time. It provides:
//! - Debounced search and row toggling, with single-flight transitions
//! - Snapshot/rollback editing and authoritative reload after a failed save
//! - Subscription lifecycle with full release at teardown
//!
//! Rendering, dialogs, routing and breakpoint detection stay outside; the
//! controller talks to them through the traits in [`traits`] and the events
//! of [`TableController::subscribe`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nested_table_backend::{InMemoryBackend, Row};
//! use nested_table_core::TableController;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Task {
//!     id: String,
//!     title: String,
//! }
//!
//! impl Row for Task {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//!
//!     fn set_id(&mut self, id: String) {
//!         self.id = id;
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(InMemoryBackend::<Task>::new("Task", Vec::new()));
//!     let table = TableController::builder(backend).build()?;
//!     table.start().await?;
//!     table.search("write docs")?;
//!     table.teardown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod gate;
pub mod services;
pub mod subscriptions;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::{ColumnSets, TableConfig};
pub use controller::{TableController, TableControllerBuilder};
pub use error::{CoreError, CoreResult};
pub use gate::{DebounceGate, SingleFlight};
pub use services::TableContext;
pub use subscriptions::SubscriptionRegistry;
pub use traits::{AlwaysConfirm, Confirmer, DefaultHooks, LogNotifier, Notifier, TableHooks};
pub use types::{
    Breakpoint, ConfirmRequest, CreateOutcome, DeleteOutcome, ExpansionState, LoadOutcome,
    NotificationKind, PageChange, SaveOutcome, TableEvent, TableRow, TableSnapshot,
    ToggleOutcome, ValidationErrors,
};
