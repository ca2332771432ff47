//! Confirmation collaborator Trait

use async_trait::async_trait;

use crate::types::ConfirmRequest;

/// Confirmer Trait
///
/// Asks the user a yes/no question (typically a modal dialog). The pending
/// prompt is a suspension point: the controller drops it on teardown.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Returns `true` only if the user accepted.
    async fn confirm(&self, request: &ConfirmRequest) -> bool;
}

/// Confirmer that accepts everything
///
/// Default implementation for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmer for AlwaysConfirm {
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        log::debug!("Auto-confirming '{}'", request.title);
        true
    }
}
