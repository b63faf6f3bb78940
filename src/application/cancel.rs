//! Shared cancellation flag between a consumer and its traversers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clones observe the same flag. Cancelling is idempotent and irreversible.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
