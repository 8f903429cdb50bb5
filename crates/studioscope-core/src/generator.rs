//! Deterministic procedural generator.
//!
//! Visual "noise" (bar heights, wave offsets, seed positions) comes from a
//! fixed hash, `frac(sin(n * 12.9898) * 43758.5453)`, keyed by an item index
//! and an animation step. Re-rendering the same step always yields the same
//! values, so re-layouts never flicker, while advancing the step lets values
//! evolve. [`Generator::smooth`] interpolates between integer steps for
//! continuous motion.
//!
//! [`Liveliness`] layers optional, non-reproducible jitter on top for hosts
//! that prefer "live" motion over reproducibility. It is off by default.

use rand::Rng;

use crate::draw::smoothstep;

const K_INDEX: f64 = 12.9898;
const K_STEP: f64 = 78.233;
const K_SEED: f64 = 37.719;
const SCALE: f64 = 43758.5453;

/// `frac(sin(n * 12.9898) * 43758.5453)`, always in `[0, 1)`.
#[inline]
pub fn hash01(n: f64) -> f64 {
    frac((n * K_INDEX).sin() * SCALE)
}

#[inline]
fn frac(v: f64) -> f64 {
    let f = v - v.floor();
    // A tiny negative `v` makes `v - floor(v)` round to exactly 1.0.
    if (0.0..1.0).contains(&f) { f } else { 0.0 }
}

/// Seeded sampler. Copyable so frames can carry it by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Generator {
    seed: u32,
}

impl Generator {
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn key(&self, index: u32, step: u64) -> f64 {
        // Keep the argument of sin() small: fold the step into one period of
        // the hash so long-running loops keep full precision.
        let step = (step % 100_003) as f64;
        let seed = (self.seed % 65_521) as f64;
        index as f64 + step * (K_STEP / K_INDEX) + seed * (K_SEED / K_INDEX)
    }

    /// Reproducible value in `[0, 1)` for `(index, step)`.
    #[inline]
    pub fn sample(&self, index: u32, step: u64) -> f64 {
        hash01(self.key(index, step))
    }

    /// Sample mapped to `[lo, hi)`.
    #[inline]
    pub fn range(&self, index: u32, step: u64, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.sample(index, step)
    }

    /// Sample mapped to `[-1, 1)`.
    #[inline]
    pub fn signed(&self, index: u32, step: u64) -> f64 {
        self.sample(index, step) * 2.0 - 1.0
    }

    /// Smoothly interpolated value at fractional step `t`.
    ///
    /// Equals [`sample`](Self::sample) at integer steps and eases between them.
    pub fn smooth(&self, index: u32, t: f64) -> f64 {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        let base = t.floor();
        let step = base as u64;
        let f = t - base;
        let a = self.sample(index, step);
        let b = self.sample(index, step.wrapping_add(1));
        a + (b - a) * smoothstep(f)
    }

    /// Derive an independent generator, e.g. one per sub-layer.
    pub fn fork(&self, salt: u32) -> Self {
        let mixed = (self.sample(salt, u64::from(salt)) * u32::MAX as f64) as u32;
        Self::new(self.seed.wrapping_mul(31).wrapping_add(mixed))
    }
}

/// Optional non-deterministic jitter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Liveliness {
    amplitude: f64,
}

impl Liveliness {
    /// No jitter at all.
    pub const OFF: Self = Self { amplitude: 0.0 };

    pub fn new(amplitude: f64) -> Self {
        let amplitude = if amplitude.is_finite() {
            amplitude.abs()
        } else {
            0.0
        };
        Self { amplitude }
    }

    pub fn is_enabled(&self) -> bool {
        self.amplitude > 0.0
    }

    /// Random offset in `[-amplitude, amplitude]`, or 0 when disabled.
    pub fn jitter(&self) -> f64 {
        if !self.is_enabled() {
            return 0.0;
        }
        rand::rng().random_range(-self.amplitude..=self.amplitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stays_in_half_open_unit_interval() {
        for i in -5000..5000 {
            let v = hash01(i as f64 * 0.731);
            assert!((0.0..1.0).contains(&v), "hash01 produced {v}");
        }
    }

    #[test]
    fn frac_never_returns_one() {
        assert_eq!(frac(-1e-18), 0.0);
        assert!((frac(2.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn sample_is_deterministic() {
        let g = Generator::new(42);
        for i in 0..200 {
            assert_eq!(g.sample(i, 17), g.sample(i, 17));
        }
    }

    #[test]
    fn seeds_and_steps_change_values() {
        let a = Generator::new(1);
        let b = Generator::new(2);
        let differ = (0..64).filter(|&i| a.sample(i, 0) != b.sample(i, 0)).count();
        assert!(differ > 60);
        let moved = (0..64).filter(|&i| a.sample(i, 0) != a.sample(i, 1)).count();
        assert!(moved > 60);
    }

    #[test]
    fn smooth_hits_samples_at_integer_steps() {
        let g = Generator::new(9);
        for step in 0..20u64 {
            let s = g.smooth(3, step as f64);
            assert!((s - g.sample(3, step)).abs() < 1e-12);
        }
    }

    #[test]
    fn smooth_is_bounded_by_neighbours() {
        let g = Generator::new(5);
        let a = g.sample(1, 4);
        let b = g.sample(1, 5);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        for k in 0..=10 {
            let v = g.smooth(1, 4.0 + k as f64 / 10.0);
            assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
        }
    }

    #[test]
    fn range_and_signed_bounds() {
        let g = Generator::new(3);
        for i in 0..500 {
            let r = g.range(i, 2, 10.0, 20.0);
            assert!((10.0..20.0).contains(&r));
            let s = g.signed(i, 2);
            assert!((-1.0..1.0).contains(&s));
        }
    }

    #[test]
    fn very_large_steps_stay_in_range() {
        let g = Generator::new(u32::MAX);
        let v = g.sample(u32::MAX, u64::MAX);
        assert!((0.0..1.0).contains(&v));
    }

    #[test]
    fn smooth_survives_saturating_steps() {
        let g = Generator::new(1);
        for t in [2.0e19, f64::MAX, u64::MAX as f64] {
            let v = g.smooth(0, t);
            assert!((0.0..1.0).contains(&v), "smooth({t}) = {v}");
        }
    }

    #[test]
    fn liveliness_off_is_silent() {
        assert_eq!(Liveliness::OFF.jitter(), 0.0);
        assert!(!Liveliness::new(f64::NAN).is_enabled());
    }

    #[test]
    fn liveliness_respects_amplitude() {
        let l = Liveliness::new(-0.5);
        for _ in 0..100 {
            assert!(l.jitter().abs() <= 0.5);
        }
    }
}
