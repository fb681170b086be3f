//! Per-thread allocation counters for wire handles

use std::cell::Cell;

thread_local! {
    static ALLOCATED: Cell<u64> = const { Cell::new(0) };
    static FREED: Cell<u64> = const { Cell::new(0) };
}

/// Counts of handles allocated and freed on the current thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireStats {
    pub allocated: u64,
    pub freed: u64,
}

impl WireStats {
    /// Handles allocated but not yet freed
    pub fn live(&self) -> i64 {
        self.allocated as i64 - self.freed as i64
    }

    /// Counts accumulated since an earlier snapshot
    pub fn since(&self, earlier: &WireStats) -> WireStats {
        WireStats {
            allocated: self.allocated - earlier.allocated,
            freed: self.freed - earlier.freed,
        }
    }
}

/// Current counters for this thread
pub fn snapshot() -> WireStats {
    WireStats {
        allocated: ALLOCATED.with(Cell::get),
        freed: FREED.with(Cell::get),
    }
}

pub(crate) fn record_alloc() {
    ALLOCATED.with(|c| c.set(c.get() + 1));
}

pub(crate) fn record_free() {
    FREED.with(|c| c.set(c.get() + 1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_this_thread() {
        let before = snapshot();
        record_alloc();
        record_alloc();
        record_free();
        let delta = snapshot().since(&before);
        assert_eq!(delta, WireStats { allocated: 2, freed: 1 });
        assert_eq!(delta.live(), 1);
    }
}
