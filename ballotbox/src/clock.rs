use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix time in seconds (UTC)
pub type Timestamp = u64;

pub const SECONDS_PER_HOUR: u64 = 3600;

/// Source of the current time
///
/// The voting window is never enforced by a scheduler. Every operation that depends on
/// the window asks the clock for `now` and compares it against the window bounds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // A clock set before 1970 reads as the epoch
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to
#[derive(Default, Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        ManualClock {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::sync::Arc;

    #[test]
    fn manual_clock() {
        let clock = Arc::new(ManualClock::new(1_000));
        let shared = clock.clone();
        assert_eq!(shared.now(), 1_000);
        clock.advance(SECONDS_PER_HOUR);
        assert_eq!(shared.now(), 1_000 + SECONDS_PER_HOUR);
        clock.set(5);
        assert_eq!(shared.now(), 5);
        assert!(SystemClock.now() > 1_600_000_000);
    }
}
