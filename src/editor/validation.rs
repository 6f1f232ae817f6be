//! Per-node validity tracking.
//!
//! `ValidationMap` records whether each node's record passed validation and
//! answers whether the whole collection may be saved. Absent entries count as
//! valid, so an empty map is save-able.
//!
//! Validation can be asynchronous. Callers that dispatch deferred work take a
//! [`ValidationTicket`] with [`ValidationMap::begin`] and hand it back with
//! the result. Tickets carry a sequence number drawn from one counter; only
//! the newest ticket issued for a key may write that key's entry, so a slow
//! stale result can never overwrite a newer one.
//!
//! # Example
//!
//! ```
//! use treequill::editor::validation::ValidationMap;
//!
//! let mut map = ValidationMap::new();
//! assert!(map.all_valid());
//!
//! let stale = map.begin("a");
//! let fresh = map.begin("a");
//! assert!(map.complete(fresh, false));
//! assert!(!map.complete(stale, true)); // superseded, ignored
//! assert!(!map.all_valid());
//! ```

use std::collections::HashMap;
use std::hash::Hash;

/// Handle for one in-flight validation of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationTicket<K> {
    key: K,
    seq: u64,
}

impl<K: Copy> ValidationTicket<K> {
    pub fn key(&self) -> K {
        self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Validity flags keyed by node identity.
#[derive(Debug, Clone)]
pub struct ValidationMap<K> {
    entries: HashMap<K, bool>,
    /// Newest sequence number issued per key
    latest: HashMap<K, u64>,
    next_seq: u64,
}

impl<K: Copy + Eq + Hash> ValidationMap<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            latest: HashMap::new(),
            next_seq: 1,
        }
    }

    /// Records a synchronous result. Supersedes any in-flight ticket for `key`.
    pub fn set_valid(&mut self, key: K, is_valid: bool) {
        self.bump(key);
        self.entries.insert(key, is_valid);
    }

    /// Forgets `key` entirely, including any in-flight ticket.
    pub fn clear_valid(&mut self, key: K) {
        self.entries.remove(&key);
        self.latest.remove(&key);
    }

    /// Returns the recorded flag for `key`, if any.
    pub fn get(&self, key: K) -> Option<bool> {
        self.entries.get(&key).copied()
    }

    /// AND over all recorded flags; true when nothing is recorded.
    pub fn all_valid(&self) -> bool {
        self.entries.values().all(|valid| *valid)
    }

    /// Number of entries currently recorded as invalid.
    pub fn invalid_count(&self) -> usize {
        self.entries.values().filter(|valid| !**valid).count()
    }

    /// Keys currently recorded as invalid, in no particular order.
    pub fn invalid_keys(&self) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, valid)| !**valid)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Starts an asynchronous validation of `key`.
    pub fn begin(&mut self, key: K) -> ValidationTicket<K> {
        let seq = self.bump(key);
        ValidationTicket { key, seq }
    }

    /// Applies a result if its ticket is still the newest for the key.
    ///
    /// Returns whether the result was applied.
    pub fn complete(&mut self, ticket: ValidationTicket<K>, is_valid: bool) -> bool {
        match self.latest.get(&ticket.key) {
            Some(&seq) if seq == ticket.seq => {
                self.entries.insert(ticket.key, is_valid);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump(&mut self, key: K) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest.insert(key, seq);
        seq
    }
}

impl<K: Copy + Eq + Hash> Default for ValidationMap<K> {
    fn default() -> Self {
        Self::new()
    }
}
