//! Cooperative cancellation for running jobs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Job-scoped cancellation signal.
///
/// Cloning shares the underlying flag, so one token can be handed to a
/// signal handler while the job polls it. The runner checks the token at
/// the start of each source iteration and at every step of a directory
/// merge; output already written when cancellation is observed is not
/// reverted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Canceled`] when cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(Error::Canceled)
        } else {
            Ok(())
        }
    }
}
