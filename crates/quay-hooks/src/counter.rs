use std::sync::atomic::{AtomicI64, Ordering};

/// A named signed-integer cell with atomic read/update.
///
/// Counters are created lazily by the owning session; the first access
/// observes zero.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    pub fn update(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::SeqCst);
    }
}
