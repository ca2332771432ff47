//! Notification collaborator Trait

use nested_table_backend::utils::truncate_for_log;

use crate::types::NotificationKind;

/// Notifier Trait
///
/// Fire-and-forget user feedback (toasts, status bar, ...). Implementations
/// must not block; the controller calls it while holding table state.
pub trait Notifier: Send + Sync {
    /// Show a message to the user
    ///
    /// # Arguments
    /// * `kind` - Severity
    /// * `message` - Already localized message
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Notifier that forwards to the `log` facade
///
/// Default implementation, used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let message = truncate_for_log(message);
        match kind {
            NotificationKind::Success | NotificationKind::Info => log::info!("{message}"),
            NotificationKind::Error => log::error!("{message}"),
        }
    }
}
