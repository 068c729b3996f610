//! Observers of blanking state changes (tray icon, log).

use tracing::{info, warn};

use crate::blanking::{ActivationMode, DeactivationReason};
use crate::error::SentinelError;

/// Emitted on every activation and deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    pub active: bool,
    /// Set when `active`.
    pub mode: Option<ActivationMode>,
    /// Set when not `active`.
    pub reason: Option<DeactivationReason>,
    /// Surfaces up after the change.
    pub overlays: usize,
}

/// Receives state changes and absorbed failures. Implementations only
/// present them; they never feed back into the decision.
pub trait NotificationSink {
    fn state_changed(&mut self, event: &StateChanged);

    fn diagnostic(&mut self, error: &SentinelError) {
        warn!("{}", error);
    }
}

/// Sink that only logs.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn state_changed(&mut self, event: &StateChanged) {
        if event.active {
            info!(
                "Blanking active ({:?}) on {} monitor(s)",
                event.mode.unwrap_or(ActivationMode::Automatic),
                event.overlays
            );
        } else {
            info!("Blanking off ({:?})", event.reason);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Sink that keeps everything it is told.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub events: Rc<RefCell<Vec<StateChanged>>>,
        pub errors: Rc<RefCell<Vec<SentinelError>>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<StateChanged> {
            self.events.borrow().clone()
        }

        pub(crate) fn errors(&self) -> Vec<SentinelError> {
            self.errors.borrow().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn state_changed(&mut self, event: &StateChanged) {
            self.events.borrow_mut().push(*event);
        }

        fn diagnostic(&mut self, error: &SentinelError) {
            self.errors.borrow_mut().push(error.clone());
        }
    }
}
