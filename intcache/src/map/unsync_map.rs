use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use super::{KeyValueStore, ABSENT};

/// A plain `HashMap` with no synchronization at all.
///
/// # Concurrency hazard
///
/// Like [`ChainedTable`](super::ChainedTable), this map is declared `Sync`
/// only so the unsynchronized baseline can be measured. Sharing it is sound
/// only once every key that will be touched is already present: overwriting
/// an existing key is a relaxed atomic store, but inserting a new key may
/// rehash the table under the feet of concurrent readers. Nothing checks this
/// at runtime.
#[derive(Default)]
pub struct UnsyncMap(UnsafeCell<HashMap<i32, AtomicI32>>);

// SAFETY: see "Concurrency hazard" above.
unsafe impl Sync for UnsyncMap {}

impl UnsyncMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> &HashMap<i32, AtomicI32> {
        // SAFETY: shared reads only race with a structural insertion, which
        // the type's contract rules out.
        unsafe { &*self.0.get() }
    }
}

impl KeyValueStore for UnsyncMap {
    fn get(&self, key: i32) -> i32 {
        self.entries()
            .get(&key)
            .map_or(ABSENT, |v| v.load(Ordering::Relaxed))
    }

    fn put(&self, key: i32, value: i32) {
        if let Some(slot) = self.entries().get(&key) {
            slot.store(value, Ordering::Relaxed);
            return;
        }
        // SAFETY: new key, so this mutates the map's structure; the type's
        // contract guarantees no other access is in flight.
        let entries = unsafe { &mut *self.0.get() };
        entries.insert(key, AtomicI32::new(value));
    }

    fn name(&self) -> &'static str {
        "unshared"
    }
}
