use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::error::{MontageError, MontageResult, Stage};

/// Cooperative cancellation shared between a running job and its owner.
///
/// A token trips either when [`CancelToken::cancel`] is called or when its optional deadline
/// passes. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that only trips on an explicit cancel.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Return `true` once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`MontageError::Cancelled`] attributed to `stage` if the token has tripped.
    pub fn check(&self, stage: Stage) -> MontageResult<()> {
        if self.is_cancelled() {
            tracing::warn!(%stage, "job cancelled");
            return Err(MontageError::Cancelled { stage });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cancel.rs"]
mod tests;
