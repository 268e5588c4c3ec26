use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically increasing logical time, independent of wall clock. Never
/// reused, never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalTime(pub u64);

impl LogicalTime {
    pub const ZERO: LogicalTime = LogicalTime(0);
}

/// Shared source of [`LogicalTime`] ticks. Cloning shares the same counter.
#[derive(Debug, Clone, Default)]
pub struct Clock(Arc<AtomicU64>);

impl Clock {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }

    /// Advances the clock and returns the new, unique value.
    pub fn tick(&self) -> LogicalTime {
        LogicalTime(self.0.fetch_add(1, Ordering::SeqCst))
    }

    /// Reads the current value without advancing it.
    pub fn peek(&self) -> LogicalTime {
        LogicalTime(self.0.load(Ordering::SeqCst))
    }
}
