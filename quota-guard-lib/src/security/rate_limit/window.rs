//! The window module defines [FixedWindow], the per-key call counter behind the rate guard.

use ahash::AHashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::sync::lock_or_recover;

// Upper bound for a window deadline when `now + window` is not representable.
const MAX_WINDOW: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct RateCounter {
    count: u32,
    reset_at: Instant,
}

/// Outcome of recording a call against a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The call was counted; `count` is the number of calls in the window so far.
    Counted { count: u32, reset_at: Instant },
    /// The window is full. Nothing was recorded.
    Exhausted { count: u32, reset_at: Instant },
}

/// Per-key fixed-window counters.
///
/// Each key owns a `{count, reset_at}` pair. A call at or after `reset_at`
/// starts a new window with `count = 1`; otherwise the call is counted if the
/// window still has room.
pub struct FixedWindow {
    counters: Mutex<AHashMap<String, RateCounter>>,
    window: Duration,
}

impl FixedWindow {
    pub fn new(window: Duration) -> Self {
        Self { counters: Mutex::new(AHashMap::new()), window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record one call for `key` at `now`, allowing at most `max` per window.
    pub fn observe_at(&self, key: &str, max: u32, now: Instant) -> Observation {
        let mut counters = self.lock();

        if let Some(counter) = counters.get_mut(key).filter(|c| now < c.reset_at) {
            if counter.count >= max {
                return Observation::Exhausted { count: counter.count, reset_at: counter.reset_at };
            }
            counter.count = counter.count.saturating_add(1);
            return Observation::Counted { count: counter.count, reset_at: counter.reset_at };
        }

        let counter = RateCounter { count: 1, reset_at: self.deadline(now) };
        counters.insert(key.to_string(), counter);
        Observation::Counted { count: counter.count, reset_at: counter.reset_at }
    }

    /// Calls recorded for `key` in the window that is current at `now`.
    pub fn count_at(&self, key: &str, now: Instant) -> u32 {
        self.lock()
            .get(key)
            .filter(|counter| now < counter.reset_at)
            .map_or(0, |counter| counter.count)
    }

    /// Remove counters whose window ended before `now`. Returns how many were removed.
    pub fn purge_stale_at(&self, now: Instant) -> usize {
        let mut counters = self.lock();
        let before = counters.len();
        counters.retain(|_, counter| now < counter.reset_at);
        before.saturating_sub(counters.len())
    }

    /// Number of keys with a counter, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn deadline(&self, now: Instant) -> Instant {
        now.checked_add(self.window)
            .or_else(|| now.checked_add(MAX_WINDOW))
            .unwrap_or(now)
    }

    fn lock(&self) -> MutexGuard<'_, AHashMap<String, RateCounter>> {
        lock_or_recover(&self.counters, "rate_window")
    }
}
