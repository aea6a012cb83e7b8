use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of inode timestamps, in whole seconds since the Unix epoch.
pub trait Clock {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            secs: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, secs: u64) {
        self.secs.set(secs);
    }

    pub fn advance(&self, secs: u64) {
        self.secs.set(self.secs.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.secs.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now(), 105);
        clock.set(7);
        assert_eq!(handle.now(), 7);
    }
}
