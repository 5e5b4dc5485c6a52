use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{KeyValueStore, ABSENT};

/// A concurrent hashmap implemented with one coarse-grained reader/writer
/// lock.
///
/// Readers share the lock, writers hold it exclusively, so a `get` that
/// starts after a `put` has returned always observes it.
///
/// No fairness between readers and writers is promised: the lock is
/// `std::sync::RwLock`, whose preference is left to the platform, in favour
/// of raw throughput over protection from writer starvation.
#[derive(Default)]
pub struct RwLockedMap(RwLock<HashMap<i32, i32>>);

impl RwLockedMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for RwLockedMap {
    fn get(&self, key: i32) -> i32 {
        // a panic while holding the lock cannot leave an i32 map half
        // written, so poisoning is ignored.
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&key).copied().unwrap_or(ABSENT)
    }

    fn put(&self, key: i32, value: i32) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    fn name(&self) -> &'static str {
        "lock"
    }
}
