//! Leveled message sink for user-facing tracker notices.
//!
//! Hosts inject their own [`Messenger`] (a status bar, a notification area);
//! the default forwards everything to `tracing`.

use std::sync::Arc;

/// Receives leveled text messages tagged with the emitting component.
pub trait Messenger: Send + Sync {
    fn info(&self, source: &str, message: &str);
    fn warn(&self, source: &str, message: &str);
    fn debug(&self, source: &str, message: &str);
}

/// Shared, swappable messenger handle.
pub type SharedMessenger = Arc<dyn Messenger>;

impl std::fmt::Debug for dyn Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Messenger")
    }
}

/// Forwards messages to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessenger;

impl Messenger for TracingMessenger {
    fn info(&self, source: &str, message: &str) {
        tracing::info!(source, "{message}");
    }

    fn warn(&self, source: &str, message: &str) {
        tracing::warn!(source, "{message}");
    }

    fn debug(&self, source: &str, message: &str) {
        tracing::debug!(source, "{message}");
    }
}
