//! Notifier trait and built-in implementations for alert side effects.
//!
//! Steps report alerts through a [`Notifier`]. Delivery is fire-and-forget:
//! `notify` has no return value, so a pipeline can never branch on it.

use std::sync::Mutex;

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

// ---------------------------------------------------------------------------
// TracingNotifier
// ---------------------------------------------------------------------------

/// Writes every notification to the `tracing` log at `warn` level.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "orderflow::alert", "{message}");
    }
}

// ---------------------------------------------------------------------------
// NullNotifier
// ---------------------------------------------------------------------------

pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _message: &str) {}
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Keeps every message it receives, in order. Useful in tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
