use crossbeam::utils::CachePadded;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{KeyValueStore, ABSENT};

const DEFAULT_NUM_SHARDS: usize = 16;

type Shard = HashMap<i32, i32>;

type ProtectedShard = CachePadded<RwLock<Shard>>;

/// A concurrent hashmap striped over a fixed number of reader/writer locked
/// shards.
///
/// The shard count is rounded up to a power of two and a key lives in shard
/// `key & (num_shards - 1)`. Operations on different shards never contend;
/// within a shard the guarantees are those of
/// [`RwLockedMap`](super::RwLockedMap). Shards are padded to separate cache
/// lines so their lock words do not false-share.
pub struct ShardedMap {
    shards: Box<[ProtectedShard]>,
    mask: usize,
}

impl Default for ShardedMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardedMap {
    pub fn new() -> Self {
        ShardedMap::with_num_shards(DEFAULT_NUM_SHARDS)
    }

    pub fn with_num_shards(num_shards: usize) -> Self {
        let num_shards = num_shards.max(1).next_power_of_two();
        let shards = (0..num_shards)
            .map(|_| CachePadded::new(RwLock::new(HashMap::new())))
            .collect();
        ShardedMap {
            shards,
            mask: num_shards - 1,
        }
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    fn read_shard(&self, key: i32) -> RwLockReadGuard<'_, Shard> {
        self.shards[(key as usize) & self.mask]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_shard(&self, key: i32) -> RwLockWriteGuard<'_, Shard> {
        self.shards[(key as usize) & self.mask]
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for ShardedMap {
    fn get(&self, key: i32) -> i32 {
        self.read_shard(key).get(&key).copied().unwrap_or(ABSENT)
    }

    fn put(&self, key: i32, value: i32) {
        self.write_shard(key).insert(key, value);
    }

    fn name(&self) -> &'static str {
        "shard"
    }
}
