//! # RNG Module
//!
//! Tiny deterministic RNG for the simulator's coin flips: I/O blocking,
//! wake-ups and synthetic task generation.
//!
//! **Generator**: XorShift64. Same seed, same sequence, so a run can be
//! replayed from the seed printed at startup.
//!
//! **No `Copy`**: Copying an RNG duplicates the stream. Each actor owns its
//! own generator obtained with [`XorShift64::fork`].

use crate::config::Odds;

/// Deterministic XorShift64 generator.
///
/// NOT thread-safe. Fork one per actor from a master seed.
#[derive(Clone, Debug)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Create a new RNG with the given seed.
    ///
    /// Seed 0 is mapped to a non-zero value to avoid the all-zero lockup state.
    #[inline]
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    /// Seed derived from the wall clock, for runs without an explicit seed
    pub fn seed_from_time() -> u64 {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        splitmix64(nanos)
    }

    /// Generate the next u64 value.
    ///
    /// Shift constants (13, 7, 17) from Marsaglia's "Xorshift RNGs".
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random u32 in `[0, upper)`.
    ///
    /// # Panics
    /// Panics in debug builds if `upper` is 0.
    #[inline]
    pub fn next_u32(&mut self, upper: u32) -> u32 {
        debug_assert!(upper > 0, "upper bound must be > 0");
        if upper.is_power_of_two() {
            // High bits; the low bits of XorShift are weaker.
            return ((self.next_u64() >> 32) as u32) & (upper - 1);
        }
        self.bounded_u64(u64::from(upper)) as u32
    }

    /// Generate a random u64 in the half-open range `[low, high)`.
    ///
    /// Returns `low` when the range is empty.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        low + self.bounded_u64(high - low)
    }

    /// Lemire's nearly-divisionless bounded generation.
    #[inline]
    fn bounded_u64(&mut self, upper: u64) -> u64 {
        let threshold = upper.wrapping_neg() % upper;
        loop {
            let x = self.next_u64();
            let m = (x as u128) * (upper as u128);
            if (m as u64) >= threshold {
                return (m >> 64) as u64;
            }
        }
    }

    /// Returns true with probability `odds.numerator / odds.denominator`.
    ///
    /// Zero odds never draw from the stream; certain odds likewise.
    #[inline]
    pub fn chance(&mut self, odds: Odds) -> bool {
        if odds.numerator == 0 {
            return false;
        }
        if odds.numerator >= odds.denominator {
            return true;
        }
        self.next_u32(odds.denominator) < odds.numerator
    }

    /// Current state, for reproducing a trace.
    #[inline]
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Fork a child generator seeded from this one through splitmix64.
    pub fn fork(&mut self) -> Self {
        let raw_seed = self.next_u64();
        Self::new(splitmix64(raw_seed))
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        Self::new(0)
    }
}

/// SplitMix64 finalizer (Vigna, 2017).
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}
