//! This module contains the key/value store strategies under comparison.

mod chained_table;
mod channel_map;
mod concurrent_map;
mod rw_locked_map;
mod shared_chained_table;
mod sharded_map;
mod unsync_map;

pub use chained_table::ChainedTable;
pub use channel_map::ChannelMap;
pub use concurrent_map::ConcurrentMap;
pub use rw_locked_map::RwLockedMap;
pub use shared_chained_table::SharedChainedTable;
pub use sharded_map::ShardedMap;
pub use unsync_map::UnsyncMap;

/// Value returned by [`KeyValueStore::get`] for a key that was never put.
pub const ABSENT: i32 = 0;

/// Common functionalities for the integer caches.
///
/// Every implementation must produce the same results for any sequence of
/// operations issued from a single thread. They differ only in what they
/// promise when shared between threads; see each type's documentation.
pub trait KeyValueStore: Send + Sync {
    /// Get the value last associated with `key`, or [`ABSENT`] if there is
    /// none.
    fn get(&self, key: i32) -> i32;

    /// Emplaces a key-value pair into the store.
    ///
    /// If there were a value associated with this key, it will be
    /// overwritten.
    fn put(&self, key: i32, value: i32);

    /// Configuration name of the strategy, used in logs.
    fn name(&self) -> &'static str;
}
