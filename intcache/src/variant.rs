use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::map::{
    ChainedTable, ChannelMap, ConcurrentMap, KeyValueStore, RwLockedMap, SharedChainedTable,
    ShardedMap, UnsyncMap,
};

/// Requested capacity of the `intmap` table: about four keys per bucket.
pub const INTMAP_CAPACITY: usize = 256_000;
/// Requested capacity of the `intmap2` table: about one key per bucket.
pub const INTMAP2_CAPACITY: usize = 1_000_000;
/// Requested capacity of the `sharedintmap` table.
pub const SHARED_INTMAP_CAPACITY: usize = 1_000_000;

/// The store configurations the benchmark can be run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// [`UnsyncMap`]
    Unshared,
    /// [`ConcurrentMap`]
    Concurrent,
    /// [`RwLockedMap`]
    Lock,
    /// [`ChainedTable`] with [`INTMAP_CAPACITY`]
    IntMap,
    /// [`ChainedTable`] with [`INTMAP2_CAPACITY`]
    IntMap2,
    /// [`ShardedMap`]
    Shard,
    /// [`SharedChainedTable`] with [`SHARED_INTMAP_CAPACITY`]
    SharedIntMap,
    /// [`ChannelMap`]
    Channel,
}

impl Variant {
    pub const ALL: [Variant; 8] = [
        Variant::Unshared,
        Variant::Concurrent,
        Variant::Lock,
        Variant::IntMap,
        Variant::IntMap2,
        Variant::Shard,
        Variant::SharedIntMap,
        Variant::Channel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Unshared => "unshared",
            Variant::Concurrent => "concurrent",
            Variant::Lock => "lock",
            Variant::IntMap => "intmap",
            Variant::IntMap2 => "intmap2",
            Variant::Shard => "shard",
            Variant::SharedIntMap => "sharedintmap",
            Variant::Channel => "channel",
        }
    }

    /// Whether concurrent insertion of new keys is undefined behaviour for
    /// this store. See [`ChainedTable`] and [`UnsyncMap`].
    pub fn is_unsynchronized(&self) -> bool {
        matches!(self, Variant::Unshared | Variant::IntMap | Variant::IntMap2)
    }

    /// Build an empty store for this configuration.
    pub fn build(&self) -> Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match self {
            Variant::Unshared => Arc::new(UnsyncMap::new()),
            Variant::Concurrent => Arc::new(ConcurrentMap::new()),
            Variant::Lock => Arc::new(RwLockedMap::new()),
            Variant::IntMap => Arc::new(ChainedTable::with_capacity(INTMAP_CAPACITY)),
            Variant::IntMap2 => {
                Arc::new(ChainedTable::with_capacity(INTMAP2_CAPACITY).named("intmap2"))
            }
            Variant::Shard => Arc::new(ShardedMap::new()),
            Variant::SharedIntMap => {
                Arc::new(SharedChainedTable::with_capacity(SHARED_INTMAP_CAPACITY))
            }
            Variant::Channel => Arc::new(ChannelMap::new()?),
        };
        Ok(store)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Variant::ALL
            .iter()
            .find(|v| v.name() == s)
            .copied()
            .ok_or_else(|| Error::Configuration(format!("unknown variant '{}'", s)))
    }
}
