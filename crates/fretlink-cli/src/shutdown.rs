use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown flag shared between the Ctrl+C handler, the keyboard and the device loop
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    flag: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Raw flag polled by [`fretlink_core::Controller::run`]
    pub fn flag(&self) -> &AtomicBool {
        &self.flag
    }
}
