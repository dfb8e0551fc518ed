//! Per-render request: output buffer, sample budget and subpixel grid.

use ember_math::UVec2;

use crate::{ImageBuffer, RenderConfig};

/// Output image plus the sample settings a render runs with.
#[derive(Debug, Clone)]
pub struct RenderParameter {
    output: ImageBuffer,
    sample_count: usize,
    super_sampling: UVec2,
}

impl RenderParameter {
    /// Black `width` x `height` output, one sample, no super sampling.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            output: ImageBuffer::new(width, height),
            sample_count: 1,
            super_sampling: UVec2::ONE,
        }
    }

    /// Parameter sized and sampled as the config asks.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.width, config.height)
            .with_sample_count(config.sample_count)
            .with_super_sampling(config.super_sampling)
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Subpixel grid; each component is clamped to at least 1.
    pub fn with_super_sampling(mut self, super_sampling: UVec2) -> Self {
        self.super_sampling = super_sampling.max(UVec2::ONE);
        self
    }

    pub fn output(&self) -> &ImageBuffer {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ImageBuffer {
        &mut self.output
    }

    /// Take the output image, leaving a black one of the same size.
    pub fn take_output(&mut self) -> ImageBuffer {
        let (width, height) = (self.output.width, self.output.height);
        std::mem::replace(&mut self.output, ImageBuffer::new(width, height))
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn super_sampling_count(&self) -> UVec2 {
        self.super_sampling
    }

    /// Output as 8-bit gamma-corrected RGBA, for hosts.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.output.to_rgba8()
    }
}
