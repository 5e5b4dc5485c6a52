use dashmap::DashMap;

use super::{KeyValueStore, ABSENT};

/// Thin wrapper over [`DashMap`], the off-the-shelf concurrent map.
///
/// Each `get` and `put` is atomic on its own and needs no external locking.
/// A `put` on a key is visible to every `get` on that key that starts after
/// it returns; nothing is promised about ordering across different keys.
#[derive(Default)]
pub struct ConcurrentMap(DashMap<i32, i32>);

impl ConcurrentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ConcurrentMap(DashMap::with_capacity(capacity))
    }
}

impl KeyValueStore for ConcurrentMap {
    fn get(&self, key: i32) -> i32 {
        self.0.get(&key).map_or(ABSENT, |v| *v)
    }

    fn put(&self, key: i32, value: i32) {
        self.0.insert(key, value);
    }

    fn name(&self) -> &'static str {
        "concurrent"
    }
}
