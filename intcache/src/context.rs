//! Lifecycle of one benchmark configuration.

use std::sync::Arc;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::integrity;
use crate::map::KeyValueStore;
use crate::pool::WorkerPool;
use crate::rng::SeedSource;
use crate::variant::Variant;
use crate::workload::{Operation, Workload, ITERATIONS};

/// Keys are drawn from `[0, KEY_MASK]`.
pub const KEY_MASK: i32 = (1 << 20) - 1;
/// Workers used by the `Multi` operations unless configured otherwise.
pub const DEFAULT_THREADS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    pub variant: Variant,
    pub threads: usize,
    pub iterations: usize,
    pub seed: SeedSource,
    /// Must be of the form `2^n - 1`.
    pub mask: i32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            variant: Variant::Concurrent,
            threads: DEFAULT_THREADS,
            iterations: ITERATIONS,
            seed: SeedSource::Clock,
            mask: KEY_MASK,
        }
    }
}

impl BenchConfig {
    pub fn new(variant: Variant) -> Self {
        BenchConfig {
            variant,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::Configuration("threads must be at least 1".to_string()));
        }
        if self.mask < 0 || !(self.mask as u32 + 1).is_power_of_two() {
            return Err(Error::Configuration(format!(
                "key mask {:#x} is not one less than a power of two",
                self.mask
            )));
        }
        Ok(())
    }
}

/// Owns the store under test and the worker pool for one configuration.
///
/// Created by [`setup`](BenchContext::setup), which fills the whole key
/// domain, exercised through [`run`](BenchContext::run), and consumed by
/// [`tear_down`](BenchContext::tear_down), which verifies the store.
pub struct BenchContext {
    config: BenchConfig,
    store: Arc<dyn KeyValueStore>,
    pool: WorkerPool,
    workload: Workload,
}

impl BenchContext {
    pub fn setup(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        debug!("setting up {:?}", config);

        let store = config.variant.build()?;
        let pool = WorkerPool::new(config.threads)?;
        integrity::populate(store.as_ref(), config.mask);

        Ok(BenchContext {
            config,
            store,
            pool,
            workload: Workload {
                iterations: config.iterations,
                mask: config.mask,
                seed: config.seed,
            },
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Run one batch of `op` and return its sink.
    pub fn run(&self, op: Operation) -> Result<i32> {
        if op.is_multi() && op.writes() && self.config.variant.is_unsynchronized() {
            // the domain is fully populated, so these writes only overwrite
            warn!(
                "{} on unsynchronized store {} relies on the domain being pre-populated",
                op, self.config.variant
            );
        }
        self.workload.run(op, &self.store, &self.pool)
    }

    /// Shut the pool down and verify the whole key domain.
    pub fn tear_down(mut self) -> Result<()> {
        self.pool.shutdown();
        integrity::verify(self.store.as_ref(), self.config.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(variant: Variant) -> BenchConfig {
        BenchConfig {
            variant,
            threads: 2,
            iterations: 10_000,
            seed: SeedSource::Fixed(12345),
            mask: 0xFFF,
        }
    }

    #[test]
    fn default_config_matches_benchmark_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.mask, 0xFFFFF);
        assert_eq!(config.iterations, 1_000_000);
        assert_eq!(config.threads, 2);
    }

    #[test]
    fn rejects_zero_threads() {
        let config = BenchConfig {
            threads: 0,
            ..small(Variant::Lock)
        };
        assert!(matches!(
            BenchContext::setup(config),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn rejects_mask_that_is_not_all_ones() {
        for mask in [0x1000, -1] {
            let config = BenchConfig {
                mask,
                ..small(Variant::Lock)
            };
            assert!(matches!(
                BenchContext::setup(config),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn setup_populates_identity() {
        let ctx = BenchContext::setup(small(Variant::IntMap)).unwrap();
        assert_eq!(ctx.store().get(0xABC), 0xABC);
        ctx.tear_down().unwrap();
    }

    #[test]
    fn every_single_threaded_op_verifies_on_every_variant() {
        for variant in Variant::ALL {
            let ctx = BenchContext::setup(small(variant)).unwrap();
            for op in [Operation::Get, Operation::Put, Operation::PutGet] {
                ctx.run(op).unwrap();
            }
            ctx.tear_down().unwrap();
        }
    }

    #[test]
    fn fixed_seed_gives_same_sink_on_every_variant() {
        let sinks: Vec<i32> = Variant::ALL
            .iter()
            .map(|&variant| {
                let ctx = BenchContext::setup(small(variant)).unwrap();
                let sink = ctx.run(Operation::PutGet).unwrap();
                ctx.tear_down().unwrap();
                sink
            })
            .collect();
        assert!(sinks.windows(2).all(|w| w[0] == w[1]), "{:?}", sinks);
    }
}
