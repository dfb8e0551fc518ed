//! 2D sample point generation for camera rays.

use ember_math::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{RenderError, RenderResult};

/// Flat list of uniform points in `[0, 1)^2`.
///
/// Holds `pixel_count * sample_count` points; `sample(i)` wraps around the
/// list, so a list generated for one pixel is shared by every pixel.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
    samples: Vec<Vec2>,
}

impl RandomSampler {
    /// Sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            samples: Vec::new(),
        }
    }

    /// Sampler with a fixed seed, for reproducible renders.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            samples: Vec::new(),
        }
    }

    /// Regenerate the list with `sample_count * pixel_count` points.
    pub fn generate(&mut self, sample_count: usize, pixel_count: usize) -> RenderResult<()> {
        let total = sample_count.saturating_mul(pixel_count);
        if total == 0 {
            return Err(RenderError::EmptySampleSet {
                sample_count,
                pixel_count,
            });
        }
        self.samples.clear();
        self.samples
            .extend((0..total).map(|_| Vec2::new(self.rng.gen(), self.rng.gen())));
        Ok(())
    }

    /// Point `i`, wrapping past the end. The pixel center before `generate`.
    #[inline]
    pub fn sample(&self, i: usize) -> Vec2 {
        if self.samples.is_empty() {
            return Vec2::splat(0.5);
        }
        self.samples[i % self.samples.len()]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}
