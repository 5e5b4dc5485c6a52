//! Integer caches with different concurrency strategies, and the workload
//! used to compare their throughput.
//!
//! A run picks a [`Variant`], fills the key domain `[0, KEY_MASK]` with the
//! identity mapping, times [`Operation`] batches against it, and finally
//! verifies that every key still maps to itself:
//!
//! ```no_run
//! use intcache::{BenchConfig, BenchContext, Operation, Variant};
//!
//! let ctx = BenchContext::setup(BenchConfig::new(Variant::IntMap))?;
//! let _sink = ctx.run(Operation::MultiPutGet)?;
//! ctx.tear_down()?;
//! # Ok::<(), intcache::Error>(())
//! ```

mod context;
mod error;
pub mod integrity;
pub mod map;
mod pool;
mod rng;
mod variant;
mod workload;

pub use context::{BenchConfig, BenchContext, DEFAULT_THREADS, KEY_MASK};
pub use error::{Error, Result};
pub use map::{
    ChainedTable, ChannelMap, ConcurrentMap, KeyValueStore, RwLockedMap, SharedChainedTable,
    ShardedMap, UnsyncMap, ABSENT,
};
pub use pool::WorkerPool;
pub use rng::{xorshift31, SeedSource, XorShift31};
pub use variant::{Variant, INTMAP2_CAPACITY, INTMAP_CAPACITY, SHARED_INTMAP_CAPACITY};
pub use workload::{Operation, Workload, ITERATIONS};
