//! Per-key mutual exclusion around the read-then-create step.

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

/// Table of short-lived locks keyed by normalized email or phone.
///
/// Entries exist only while some caller holds or waits on them.
#[derive(Default)]
pub struct KeyLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Holds every requested key until dropped.
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    keys: Vec<String>,
    guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until all `keys` are held. Keys are taken in sorted order so
    /// overlapping callers cannot deadlock.
    pub fn acquire(&self, mut keys: Vec<String>) -> KeyGuard<'_> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let slot = {
                let mut table = self.table.lock();
                Arc::clone(table.entry(key.clone()).or_default())
            };
            guards.push(slot.lock_arc());
        }

        KeyGuard {
            locks: self,
            keys,
            guards,
        }
    }

    /// Number of keys currently tracked.
    pub fn active(&self) -> usize {
        self.table.lock().len()
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guards.clear();

        let mut table = self.locks.table.lock();
        for key in &self.keys {
            // Only the table's own reference left: nobody holds or waits on it.
            if table.get(key).map_or(false, |slot| Arc::strong_count(slot) == 1) {
                table.remove(key);
            }
        }
    }
}
