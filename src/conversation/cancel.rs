//! Cooperative cancellation for message runs.
//!
//! A run checks its [`CancelSignal`] at every step boundary; a step already in
//! flight is allowed to finish.

use crate::types::MessageId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Active runs keyed by the message that started them, so a cancel request
/// naming a message id reaches the matching run.
#[derive(Default)]
pub struct Cancellations {
    signals: Mutex<HashMap<MessageId, CancelSignal>>,
}

impl Cancellations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal for a new run; re-registering a message returns the existing signal.
    pub fn register(&self, message_id: &MessageId) -> CancelSignal {
        self.signals
            .lock()
            .entry(message_id.clone())
            .or_default()
            .clone()
    }

    /// Cancel the run for `message_id`. Returns false when no run is registered.
    pub fn cancel(&self, message_id: &MessageId) -> bool {
        match self.signals.lock().get(message_id) {
            Some(signal) => {
                signal.cancel();
                true
            }
            None => false,
        }
    }

    /// Forget a finished run.
    pub fn release(&self, message_id: &MessageId) {
        self.signals.lock().remove(message_id);
    }

    pub fn active(&self) -> usize {
        self.signals.lock().len()
    }
}
