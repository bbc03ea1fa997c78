use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, cooperative cancellation signal.
///
/// Set once on the first failure of any stage. Stages poll it at iteration
/// boundaries; work already in progress is allowed to finish.
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
