use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The coarse phase a long running dataset pass is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessPhase {
    Initializing,
    Running,
    Finalizing,
    Completed,
}

/// Observer of a long running dataset pass. All methods default to no-ops so
/// callers only override what they care about.
pub trait ProgressObserver: Send {
    fn phase_changed(&mut self, _phase: ProcessPhase) {}
    /// Called at row granularity; `done` counts processed rows of `total`
    fn progress(&mut self, _done: usize, _total: usize) {}
}

/// The observer used when nobody is watching
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// A cooperative cancellation flag, checked by dataset passes at row
/// boundaries. Clones share the flag.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cancel_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
