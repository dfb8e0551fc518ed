//! RGBA float image used for render output and accumulation.

use ember_math::{Vec3, Vec4};

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA with gamma correction.
pub fn color_to_rgba(color: Vec4) -> [u8; 4] {
    let to_byte = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [
        to_byte(color.x),
        to_byte(color.y),
        to_byte(color.z),
        (255.0 * color.w.clamp(0.0, 1.0)) as u8,
    ]
}

/// Row-major image of `Vec4` pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Vec4) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Set every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(Vec4::ZERO);
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Mean RGB over all pixels.
    pub fn mean_rgb(&self) -> Vec3 {
        if self.pixels.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self.pixels.iter().map(|p| p.truncate()).sum();
        sum / self.pixels.len() as f32
    }

    /// Per-channel variance of RGB over all pixels.
    pub fn variance_rgb(&self) -> Vec3 {
        if self.pixels.is_empty() {
            return Vec3::ZERO;
        }
        let mean = self.mean_rgb();
        let sum: Vec3 = self
            .pixels
            .iter()
            .map(|p| {
                let d = p.truncate() - mean;
                d * d
            })
            .sum();
        sum / self.pixels.len() as f32
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}
