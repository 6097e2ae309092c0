//! Noise sources for the per-model perturbation.
//!
//! The estimator never touches a global RNG; callers hand it a `NoiseSource`.
//! Seeded sources make CLI runs and batch exports reproducible, and `ZeroNoise`
//! exposes the deterministic component on its own.

use rand::prelude::*;
use rand::rngs::{StdRng, ThreadRng};
use rand_distr::Uniform;

/// Supplies one perturbation per pseudo-model.
pub trait NoiseSource {
    /// Draw a value in `[-amplitude, amplitude)`.
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Always returns 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Uniform noise drawn from an arbitrary RNG.
#[derive(Debug, Clone)]
pub struct UniformNoise<R> {
    rng: R,
}

impl<R: Rng> UniformNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl UniformNoise<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl UniformNoise<ThreadRng> {
    /// Fresh randomness on every draw, like the interactive simulator.
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> NoiseSource for UniformNoise<R> {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if !(amplitude.is_finite() && amplitude > 0.0) {
            return 0.0;
        }
        Uniform::new(-amplitude, amplitude).sample(&mut self.rng)
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn sample(&mut self, amplitude: f64) -> f64 {
        (**self).sample(amplitude)
    }
}

/// Mix a batch seed with a row index so rows get independent, stable streams.
pub fn row_seed(seed: u64, row: usize) -> u64 {
    // SplitMix64 finalizer.
    let mut z = seed ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_noise_stays_in_range() {
        let mut noise = UniformNoise::seeded(7);
        for _ in 0..1000 {
            let v = noise.sample(2500.0);
            assert!((-2500.0..2500.0).contains(&v), "v={v}");
        }
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut a = UniformNoise::seeded(42);
        let mut b = UniformNoise::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.sample(100.0), b.sample(100.0));
        }
    }

    #[test]
    fn zero_amplitude_draws_nothing() {
        let mut noise = UniformNoise::seeded(1);
        assert_eq!(noise.sample(0.0), 0.0);
    }

    #[test]
    fn row_seeds_differ_per_row() {
        assert_ne!(row_seed(42, 0), row_seed(42, 1));
        assert_eq!(row_seed(42, 3), row_seed(42, 3));
    }
}
