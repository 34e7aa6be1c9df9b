//! Cooperative cancellation for long-running layout computations.
//!
//! The engine has no internal timeout; callers that race a layout against a
//! timer hand a clone of [`CancelToken`] to the engine and flip it when the
//! deadline passes. The simulator checks the token every few iterations, so
//! a timed-out request stops burning CPU instead of running to completion
//! unseen.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Cloning is cheap; all clones observe the same flag. A token that is never
/// cancelled adds one relaxed atomic load per check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
