//! Deterministic Random Number Generators
//!
//! Every random decision in the simulation goes through [`RandomSource`],
//! so systems can be driven by any seeded generator and tests never touch
//! platform randomness.
//!
//! - [`DeterministicRng`]: Xorshift128+ seeded through SplitMix64. Used for
//!   map rotation, pickup placement and spawn-type rolls.
//! - [`Lcg`]: 31-bit linear-congruential generator used by the ghost
//!   controller.

use serde::{Serialize, Deserialize};

// =============================================================================
// RANDOM SOURCE
// =============================================================================

/// A seedable, deterministic source of randomness.
pub trait RandomSource {
    /// Next uniformly distributed value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `[0, len)`. Returns 0 for an empty range.
    #[inline]
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    /// Bernoulli draw: true with probability `p`.
    #[inline]
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

// =============================================================================
// XORSHIFT128+
// =============================================================================

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// Given the same seed, this RNG produces the exact same sequence on any
/// platform.
///
/// # Example
///
/// ```
/// use tag_infinity::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }
}

impl RandomSource for DeterministicRng {
    /// Top 53 bits mapped onto `[0, 1)`.
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

// =============================================================================
// LINEAR CONGRUENTIAL
// =============================================================================

/// 31-bit linear-congruential generator.
///
/// `state = (1103515245 * state + 12345) mod 2^31`, output `state / 2^31`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const MULTIPLIER: u32 = 1_103_515_245;
    const INCREMENT: u32 = 12_345;
    const MASK: u32 = 0x7fff_ffff;

    /// Create a generator from a seed. Only the low 31 bits are kept.
    pub fn new(seed: u32) -> Self {
        Self { state: seed & Self::MASK }
    }

    /// Advance and return the raw 31-bit state.
    #[inline]
    pub fn next_u31(&mut self) -> u32 {
        self.state = Self::MULTIPLIER
            .wrapping_mul(self.state)
            .wrapping_add(Self::INCREMENT)
            & Self::MASK;
        self.state
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(99)
    }
}

impl RandomSource for Lcg {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        self.next_u31() as f64 / 2_147_483_648.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
