//! Run-wide cancellation flag, checked by the engine between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::SyncError;

/// Cloneable handle; every clone observes the same flag.
///
/// Tripping it never interrupts a running subprocess. The engine notices at
/// its next checkpoint and fails the repository with
/// [`SyncError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled { step })` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self, step: &'static str) -> Result<(), SyncError> {
        if self.is_cancelled() {
            return Err(SyncError::Cancelled { step });
        }
        Ok(())
    }
}
