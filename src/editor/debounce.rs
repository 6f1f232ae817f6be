//! Debounced request scheduling driven by an explicit clock.
//!
//! A `Debouncer` holds at most one pending request per key. Scheduling again
//! for the same key replaces the payload and pushes the deadline out, so only
//! the last request of a burst fires. Time is passed in by the caller; there
//! are no background timers, which keeps the debouncer testable and lets the
//! owner defuse everything on close.

use indexmap::IndexMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    deadline: Instant,
    payload: T,
}

/// Per-key debouncer.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use treequill::editor::debounce::Debouncer;
///
/// let mut debouncer = Debouncer::new(Duration::from_millis(200));
/// let t0 = Instant::now();
///
/// debouncer.schedule("qty", 1, t0);
/// debouncer.schedule("qty", 12, t0 + Duration::from_millis(50));
///
/// assert!(debouncer.due(t0 + Duration::from_millis(200)).is_empty());
/// assert_eq!(debouncer.due(t0 + Duration::from_millis(250)), vec![("qty", 12)]);
/// ```
#[derive(Debug, Clone)]
pub struct Debouncer<K, T> {
    delay: Duration,
    pending: IndexMap<K, Pending<T>>,
    defused: bool,
}

impl<K: Eq + Hash + Clone, T> Debouncer<K, T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: IndexMap::new(),
            defused: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `payload` for `key`, replacing any pending request for it.
    ///
    /// Ignored once the debouncer has been defused.
    pub fn schedule(&mut self, key: K, payload: T, now: Instant) {
        if self.defused {
            return;
        }
        let deadline = now + self.delay;
        // Re-insert so iteration order follows the latest schedule
        self.pending.shift_remove(&key);
        self.pending.insert(key, Pending { deadline, payload });
    }

    /// Removes and returns every request whose deadline has passed, oldest
    /// deadline first.
    pub fn due(&mut self, now: Instant) -> Vec<(K, T)> {
        if self.defused {
            return Vec::new();
        }
        let ready: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();

        let mut fired: Vec<(Instant, K, T)> = ready
            .into_iter()
            .filter_map(|k| {
                self.pending
                    .shift_remove(&k)
                    .map(|p| (p.deadline, k, p.payload))
            })
            .collect();
        fired.sort_by_key(|(deadline, _, _)| *deadline);
        fired.into_iter().map(|(_, k, t)| (k, t)).collect()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Drops the pending request for `key` without firing it.
    pub fn cancel(&mut self, key: &K) -> bool {
        self.pending.shift_remove(key).is_some()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drops all pending requests and refuses new ones.
    pub fn defuse(&mut self) {
        self.pending.clear();
        self.defused = true;
    }

    pub fn is_defused(&self) -> bool {
        self.defused
    }
}
