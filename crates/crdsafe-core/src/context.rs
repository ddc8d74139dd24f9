//! Cancellation context for upgrade checks

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::CheckError;

/// Cancellation handle polled between rules and version pairs
///
/// Clones share the cancel flag, so a clone handed to another thread can
/// abort a running check.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CheckContext {
    /// A context that is never cancelled
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Cancel this context and all of its clones
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the context was cancelled or has expired
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.is_expired()
    }

    fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return `Aborted` if the context is done
    pub(crate) fn poll(&self, during: &str) -> Result<(), CheckError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(CheckError::Aborted {
                reason: format!("cancelled during {}", during),
            });
        }
        if self.is_expired() {
            return Err(CheckError::Aborted {
                reason: format!("deadline exceeded during {}", during),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_cancels() {
        let ctx = CheckContext::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.poll("test").is_ok());
    }

    #[test]
    fn test_cancel_propagates_to_clones() {
        let ctx = CheckContext::background();
        let clone = ctx.clone();
        ctx.cancel();

        assert!(clone.is_cancelled());
        let err = clone.poll("rule NoScopeChange").unwrap_err();
        assert!(matches!(err, CheckError::Aborted { .. }));
        assert!(err.to_string().contains("cancelled during rule NoScopeChange"));
    }

    #[test]
    fn test_zero_timeout_expires() {
        let ctx = CheckContext::with_timeout(Duration::ZERO);
        assert!(ctx.is_cancelled());
        assert!(ctx.poll("test").unwrap_err().to_string().contains("deadline"));
    }
}
