//! Uniform random sources used by every sampling routine.
//!
//! All generators produce `f32` in `[0, 1)`. Each traced path owns its own
//! generator; none of them are meant to be shared between threads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stateful uniform sampler on `[0, 1)`.
pub trait UniformRng: Send {
    fn rand(&mut self) -> f32;
}

impl<R: UniformRng + ?Sized> UniformRng for &mut R {
    fn rand(&mut self) -> f32 {
        (**self).rand()
    }
}

/// Two-word multiply-with-carry hash generator.
///
/// Cheap enough for device code; the float is assembled directly from the
/// mantissa bits so every implementation produces the same bit patterns.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    seed0: u32,
    seed1: u32,
}

impl SimpleRng {
    const FALLBACK_SEED0: u32 = 0x2545_f491;
    const FALLBACK_SEED1: u32 = 0x9e37_79b9;

    /// Create a generator from two seed words.
    ///
    /// A zero word would lock its half of the hash at zero, so zero is
    /// replaced by a fixed constant.
    pub fn new(seed0: u32, seed1: u32) -> Self {
        Self {
            seed0: if seed0 == 0 { Self::FALLBACK_SEED0 } else { seed0 },
            seed1: if seed1 == 0 { Self::FALLBACK_SEED1 } else { seed1 },
        }
    }
}

impl UniformRng for SimpleRng {
    fn rand(&mut self) -> f32 {
        self.seed0 = 36969 * (self.seed0 & 65535) + (self.seed0 >> 16);
        self.seed1 = 18000 * (self.seed1 & 65535) + (self.seed1 >> 16);

        let ires = (self.seed0 << 16).wrapping_add(self.seed1);

        // Mantissa bits under the exponent of 2.0 give a float in [2, 4)
        let f = f32::from_bits((ires & 0x007f_ffff) | 0x4000_0000);
        (f - 2.0) / 2.0
    }
}

/// The platform generator (`rand`'s `StdRng`) behind the lumen interface.
#[derive(Debug, Clone)]
pub struct StdRandRng {
    inner: StdRng,
}

impl StdRandRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl UniformRng for StdRandRng {
    fn rand(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }
}

/// 64-bit state permuted congruential generator (PCG-XSH-RR 64/32).
#[derive(Debug, Clone)]
pub struct PcgRng {
    state: u64,
    inc: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6_364_136_223_846_793_005;

    /// Create a generator for `seed` on stream `sequence`.
    ///
    /// Different sequences give independent streams for the same seed,
    /// which is how per-pixel generators are derived from one render seed.
    pub fn new(seed: u64, sequence: u64) -> Self {
        let mut rng = Self {
            state: 0,
            inc: (sequence << 1) | 1,
        };
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng
    }

    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(self.inc);
    }

    /// Next raw 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.step();
        // Output permutation: xorshift high bits, then a data-dependent rotate
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl UniformRng for PcgRng {
    fn rand(&mut self) -> f32 {
        // 24 bits fill an f32 mantissa exactly, so 1.0 is never produced
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }
}
