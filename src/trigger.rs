//! One-shot cross-thread voice trigger.
//!
//! The listener thread raises the flag when the command phrase is heard; the
//! arbitration loop consumes it with test-and-clear semantics. Raising an
//! already-raised flag is a no-op, so triggers that arrive while one is
//! pending coalesce instead of queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared single-slot trigger signal.
///
/// Cloning is cheap and shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct TriggerFlag {
    raised: Arc<AtomicBool>,
}

impl TriggerFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Idempotent.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Consume the flag: returns true exactly once per raise, clearing it.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }

    /// Peek without consuming. Used only for logging.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
