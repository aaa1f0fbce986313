use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop request for the running read loop.
///
/// Setting it twice before the loop looks is the same as setting it once.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Consume a pending request.
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes_once() {
        let signal = StopSignal::new();
        signal.request();
        signal.request();
        assert!(signal.is_requested());
        assert!(signal.take());
        assert!(!signal.take());
    }

    #[test]
    fn test_clones_share_flag() {
        let signal = StopSignal::new();
        signal.clone().request();
        assert!(signal.is_requested());
        signal.clear();
        assert!(!signal.is_requested());
    }
}
