//! Key stream generation for the workload driver.

use std::time::{SystemTime, UNIX_EPOCH};

const SEED_MASK: i32 = 0x7fff_ffff;

/// One step of Marsaglia's "xor" shift generator, truncated to 31 bits.
///
/// Shifts are on `i32`, so `>>` is arithmetic. The output is never negative.
/// Zero is a fixed point.
#[inline]
pub fn xorshift31(mut r: i32) -> i32 {
    r ^= r << 13;
    r ^= r >> 17;
    r ^= r << 5;
    r & SEED_MASK
}

/// A 31-bit xorshift generator.
///
/// As an [`Iterator`] it never ends; each item is the next state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XorShift31(i32);

impl XorShift31 {
    pub fn new(seed: i32) -> Self {
        XorShift31(seed)
    }

    /// Current state, i.e. the last value produced (or the seed).
    pub fn state(&self) -> i32 {
        self.0
    }

    #[inline]
    pub fn advance(&mut self) -> i32 {
        self.0 = xorshift31(self.0);
        self.0
    }
}

impl Iterator for XorShift31 {
    type Item = i32;

    #[inline]
    fn next(&mut self) -> Option<i32> {
        Some(self.advance())
    }
}

/// Where each batch gets its generator seed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedSource {
    /// Sample the wall clock when the batch starts. Not reproducible.
    #[default]
    Clock,
    /// Use this seed. Worker `i` of a multi-threaded batch uses `seed + i`.
    Fixed(i32),
}

impl SeedSource {
    /// Seed for worker `worker` of a batch (0 for single-threaded batches).
    pub fn seed_for(&self, worker: usize) -> i32 {
        match *self {
            SeedSource::Clock => clock_seed(),
            SeedSource::Fixed(seed) => seed.wrapping_add(worker as i32) & SEED_MASK,
        }
    }
}

fn clock_seed() -> i32 {
    // a clock before the epoch still gives a usable, if constant, seed.
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    nanos as i32 & SEED_MASK
}
