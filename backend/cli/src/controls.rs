//! Busy flags for actions that must not run twice at once.
//!
//! A control (scan, ask) is acquired before its async work starts and
//! released when the guard drops, on success and failure alike.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pricesnap_core::SnapError;

#[derive(Debug, Clone)]
pub struct BusyFlag {
    name: &'static str,
    busy: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Mark the control busy, or fail if it already is.
    pub fn try_acquire(&self) -> Result<BusyGuard, SnapError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(SnapError::Busy(self.name));
        }
        Ok(BusyGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

#[must_use = "the control is released as soon as the guard is dropped"]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}
