//! Collaborator abstraction trait definition

mod confirmer;
mod hooks;
mod notifier;

pub use confirmer::{AlwaysConfirm, Confirmer};
pub use hooks::{DefaultHooks, TableHooks};
pub use notifier::{LogNotifier, Notifier};
