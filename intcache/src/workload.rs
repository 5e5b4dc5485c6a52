//! The operation sequences timed by the benchmark.
//!
//! Every batch draws keys from a [`XorShift31`] stream masked into the key
//! domain. The returned sink is the wrapping sum of everything read; it only
//! exists so the reads cannot be optimised away.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::map::KeyValueStore;
use crate::pool::WorkerPool;
use crate::rng::{SeedSource, XorShift31};

/// Iterations per batch.
pub const ITERATIONS: usize = 1_000_000;

/// Benchmark operations. The `Multi` forms run the single-threaded batch on
/// every pool worker at once. `Rand` only advances the generator, giving the
/// baseline cost that every other batch pays per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Rand,
    Get,
    Put,
    PutGet,
    MultiGet,
    MultiPut,
    MultiPutGet,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Rand,
        Operation::Get,
        Operation::Put,
        Operation::PutGet,
        Operation::MultiGet,
        Operation::MultiPut,
        Operation::MultiPutGet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Rand => "Rand",
            Operation::Get => "Get",
            Operation::Put => "Put",
            Operation::PutGet => "PutGet",
            Operation::MultiGet => "MultiGet",
            Operation::MultiPut => "MultiPut",
            Operation::MultiPutGet => "MultiPutGet",
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Operation::MultiGet | Operation::MultiPut | Operation::MultiPutGet
        )
    }

    /// Whether the batch writes to the store.
    pub fn writes(&self) -> bool {
        !matches!(
            self,
            Operation::Rand | Operation::Get | Operation::MultiGet
        )
    }

    /// The batch each worker runs.
    pub fn single(&self) -> Operation {
        match self {
            Operation::MultiGet => Operation::Get,
            Operation::MultiPut => Operation::Put,
            Operation::MultiPutGet => Operation::PutGet,
            op => *op,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| Error::Configuration(format!("unknown operation '{}'", s)))
    }
}

/// Parameters shared by every batch of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Workload {
    pub iterations: usize,
    pub mask: i32,
    pub seed: SeedSource,
}

impl Workload {
    /// Advance the generator `iterations` times; the sink is the last value.
    pub fn rand(&self, seed: i32) -> i32 {
        let mut rng = XorShift31::new(seed);
        for _ in 0..self.iterations {
            rng.advance();
        }
        rng.state()
    }

    pub fn get(&self, store: &dyn KeyValueStore, seed: i32) -> i32 {
        let mut rng = XorShift31::new(seed);
        let mut sum = 0i32;
        for _ in 0..self.iterations {
            let r = rng.advance();
            sum = sum.wrapping_add(store.get(r & self.mask));
        }
        sum
    }

    pub fn put(&self, store: &dyn KeyValueStore, seed: i32) -> i32 {
        let mut rng = XorShift31::new(seed);
        for _ in 0..self.iterations {
            let r = rng.advance();
            store.put(r & self.mask, r);
        }
        0
    }

    pub fn put_get(&self, store: &dyn KeyValueStore, seed: i32) -> i32 {
        let mut rng = XorShift31::new(seed);
        let mut sum = 0i32;
        for _ in 0..self.iterations {
            let r = rng.advance();
            store.put(r & self.mask, r);
            let r = rng.advance();
            sum = sum.wrapping_add(store.get(r & self.mask));
        }
        sum
    }

    fn batch(&self, op: Operation, store: &dyn KeyValueStore, seed: i32) -> i32 {
        match op.single() {
            Operation::Rand => self.rand(seed),
            Operation::Get => self.get(store, seed),
            Operation::Put => self.put(store, seed),
            _ => self.put_get(store, seed),
        }
    }

    /// Run `op` against `store` and return its sink.
    ///
    /// `Multi` operations run one full batch per pool worker, each with its
    /// own generator, so the total work grows with the pool size. The call
    /// returns only once every worker is done; the sink is the wrapping sum
    /// of the workers' sinks.
    pub fn run(
        &self,
        op: Operation,
        store: &Arc<dyn KeyValueStore>,
        pool: &WorkerPool,
    ) -> Result<i32> {
        if !op.is_multi() {
            return Ok(self.batch(op, store.as_ref(), self.seed.seed_for(0)));
        }

        let workload = *self;
        let store = Arc::clone(store);
        let sinks = pool.run_all(pool.size(), move |worker| {
            workload.batch(op, store.as_ref(), workload.seed.seed_for(worker))
        })?;
        Ok(sinks.into_iter().fold(0i32, i32::wrapping_add))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::RwLockedMap;

    fn small(seed: i32) -> Workload {
        Workload {
            iterations: 1_000,
            mask: 0xFF,
            seed: SeedSource::Fixed(seed),
        }
    }

    #[test]
    fn operation_names_parse_case_insensitively() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
            assert_eq!(op.name().to_lowercase().parse::<Operation>().unwrap(), op);
        }
        assert!(matches!(
            "Delete".parse::<Operation>(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn multi_ops_map_to_their_single_batch() {
        assert_eq!(Operation::MultiPutGet.single(), Operation::PutGet);
        assert_eq!(Operation::Get.single(), Operation::Get);
        assert!(!Operation::MultiGet.writes());
        assert!(Operation::MultiPut.writes());
    }

    #[test]
    fn rand_sink_is_the_last_generator_value() {
        let expected = XorShift31::new(31).nth(999).unwrap();
        assert_eq!(small(31).rand(31), expected);
        assert!(!Operation::Rand.writes());
        assert!(!Operation::Rand.is_multi());
    }

    #[test]
    fn get_sink_sums_identity_values() {
        let store = RwLockedMap::new();
        for k in 0..=0xFF {
            store.put(k, k);
        }
        let workload = small(99);
        let mut rng = XorShift31::new(99);
        let expected = (0..1_000).fold(0i32, |acc, _| acc.wrapping_add(rng.advance() & 0xFF));
        assert_eq!(workload.get(&store, 99), expected);
    }

    #[test]
    fn put_writes_generator_values() {
        let store = RwLockedMap::new();
        small(7).put(&store, 7);
        let mut rng = XorShift31::new(7);
        let mut last = std::collections::HashMap::new();
        for _ in 0..1_000 {
            let r = rng.advance();
            last.insert(r & 0xFF, r);
        }
        for (k, v) in last {
            assert_eq!(store.get(k), v);
        }
    }

    #[test]
    fn multi_get_runs_a_full_batch_per_worker() {
        let store: Arc<dyn KeyValueStore> = Arc::new(RwLockedMap::new());
        for k in 0..=0xFF {
            store.put(k, 1);
        }
        let pool = WorkerPool::new(3).unwrap();
        let sink = small(5).run(Operation::MultiGet, &store, &pool).unwrap();
        assert_eq!(sink, 3 * 1_000);
    }
}
