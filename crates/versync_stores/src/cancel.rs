use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token for cancelling a batch before it starts writing.
///
/// Clones share state, so a signal handler can hold one while the engine
/// checks another. The engine ignores the token once `Committing` begins.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
