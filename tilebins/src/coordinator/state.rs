//! Cache state guarded by the coordinator's lock.

use std::collections::{HashMap, HashSet};

use crate::bins::BinRecord;
use crate::coord::TileKey;

use super::TileReadyCallback;

/// Resident data, outstanding fetches and their waiters.
///
/// A key is in at most one of `resident` and `pending`, and has a `waiters`
/// entry exactly when it is pending.
pub(crate) struct CacheState<T> {
    resident: HashMap<TileKey, Vec<BinRecord<T>>>,
    pending: HashSet<TileKey>,
    waiters: HashMap<TileKey, Vec<TileReadyCallback>>,
}

impl<T> CacheState<T> {
    pub(crate) fn new() -> Self {
        Self {
            resident: HashMap::new(),
            pending: HashSet::new(),
            waiters: HashMap::new(),
        }
    }

    pub(crate) fn is_resident(&self, key: &TileKey) -> bool {
        self.resident.contains_key(key)
    }

    pub(crate) fn is_pending(&self, key: &TileKey) -> bool {
        self.pending.contains(key)
    }

    /// Keys that are resident or pending.
    pub(crate) fn tracked_keys(&self) -> impl Iterator<Item = &TileKey> {
        self.resident.keys().chain(self.pending.iter())
    }

    /// Marks a key pending with its first waiter.
    pub(crate) fn begin_fetch(&mut self, key: TileKey, waiter: TileReadyCallback) {
        debug_assert!(!self.is_resident(&key) && !self.is_pending(&key));
        self.pending.insert(key);
        self.waiters.insert(key, vec![waiter]);
    }

    /// Appends a waiter to a pending key. Returns false if the key is not
    /// pending.
    pub(crate) fn add_waiter(&mut self, key: &TileKey, waiter: TileReadyCallback) -> bool {
        if !self.pending.contains(key) {
            return false;
        }
        self.waiters.entry(*key).or_default().push(waiter);
        true
    }

    /// Stores a completed tile and takes its waiters in registration order.
    ///
    /// Returns `None` without touching anything if the key is not pending.
    pub(crate) fn complete(
        &mut self,
        key: TileKey,
        records: Vec<BinRecord<T>>,
    ) -> Option<Vec<TileReadyCallback>> {
        if !self.pending.remove(&key) {
            return None;
        }
        let waiters = self.waiters.remove(&key).unwrap_or_default();
        self.resident.insert(key, records);
        Some(waiters)
    }

    /// Drops a pending key without storing data. Returns the number of
    /// waiters dropped, or `None` if the key was not pending.
    pub(crate) fn abandon(&mut self, key: &TileKey) -> Option<usize> {
        if !self.pending.remove(key) {
            return None;
        }
        Some(self.waiters.remove(key).map_or(0, |w| w.len()))
    }

    /// Removes every trace of a key. Returns true if anything was removed.
    pub(crate) fn release(&mut self, key: &TileKey) -> bool {
        let was_resident = self.resident.remove(key).is_some();
        let was_pending = self.pending.remove(key);
        let had_waiters = self.waiters.remove(key).is_some();
        was_resident || was_pending || had_waiters
    }

    pub(crate) fn resident(&self, key: &TileKey) -> Option<&[BinRecord<T>]> {
        self.resident.get(key).map(Vec::as_slice)
    }

    /// Resident entries sorted by key.
    pub(crate) fn resident_sorted(&self) -> Vec<(&TileKey, &Vec<BinRecord<T>>)> {
        let mut entries: Vec<_> = self.resident.iter().collect();
        entries.sort_by_key(|(key, _)| **key);
        entries
    }

    pub(crate) fn waiter_count(&self, key: &TileKey) -> usize {
        self.waiters.get(key).map_or(0, Vec::len)
    }

    /// Number of keys holding a waiter list.
    pub(crate) fn waiter_entries(&self) -> usize {
        self.waiters.len()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn resident_count(&self) -> usize {
        self.resident.len()
    }
}
