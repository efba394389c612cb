//! User-visible alert seam.
//!
//! Several flows need to surface a blocking notification to whoever is
//! driving the UI (validation findings, submission outcomes, the resolver
//! watchdog). The rendering layer implements [`AlertSink`]; library code
//! never assumes how alerts are displayed.

use std::sync::Arc;

/// Sink for user-visible alert messages.
pub trait AlertSink: Send + Sync {
    /// Surface a single blocking message to the user.
    fn alert(&self, message: &str);
}

/// Default sink that forwards alerts to the tracing pipeline.
///
/// Useful for headless contexts and as a safe fallback when no UI
/// integration has been wired up.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAlerts;

impl AlertSink for TracingAlerts {
    fn alert(&self, message: &str) {
        tracing::warn!(target: "alert", "{message}");
    }
}

impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    fn alert(&self, message: &str) {
        (**self).alert(message);
    }
}
