// One-way latch guarding order-detail fetches.
//
// Shops without order-detail permission fail every detail call after a
// long walk through all candidate endpoints. Once one guarded call fails
// the latch opens and later guarded calls skip the network until it is
// explicitly reset.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared open/closed flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct DetailBreaker {
    open: Arc<AtomicBool>,
}

impl DetailBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Open the latch. Returns `true` if this call opened it.
    pub fn trip(&self) -> bool {
        !self.open.swap(true, Ordering::AcqRel)
    }

    /// Close the latch so guarded fetches are attempted again.
    pub fn reset(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_is_shared_and_resettable() {
        let breaker = DetailBreaker::new();
        let clone = breaker.clone();

        assert!(!breaker.is_open());
        assert!(clone.trip());
        assert!(!breaker.trip());
        assert!(breaker.is_open());

        breaker.reset();
        assert!(!clone.is_open());
    }
}
