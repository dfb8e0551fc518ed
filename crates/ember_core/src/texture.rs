//! Texture loading and lookup for materials.
//!
//! Textures are decoded once with the `image` crate into linear float RGBA and
//! sampled with nearest-pixel lookup during shading.

use std::path::Path;

use ember_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Texture {path} has {actual} pixels, expected {expected}")]
    SizeMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixel data.
///
/// Stores pixels in linear RGB(A) float format for rendering.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data in RGBA format (linear, 0-1 range)
    /// Stored as [R, G, B, A] per pixel, row-major order
    pub pixels: Vec<[f32; 4]>,

    /// Path the texture was loaded from, if any
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    ///
    /// Fails when the pixel count does not match `width * height`.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<[f32; 4]>,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        let expected = width as usize * height as usize;
        if pixels.len() != expected || expected == 0 {
            return Err(TextureError::SizeMismatch {
                path,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
            path: "<solid>".to_string(),
        }
    }

    /// Load a texture from an image file.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            TextureError::LoadError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        // Convert to RGBA8
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        // Convert to linear float RGBA
        let pixels: Vec<[f32; 4]> = rgba
            .pixels()
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect();

        let texture = Texture::new(width, height, pixels, path.to_string_lossy())?;
        log::debug!(
            "Loaded texture: {} ({}x{})",
            texture.path,
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Nearest-pixel lookup.
    ///
    /// Both coordinates are clipped to [0, 1]; `(0, 0)` is the first stored pixel.
    pub fn sample_nearest(&self, uv: Vec2) -> Vec3 {
        let u = uv.x.clamp(0.0, 1.0);
        let v = uv.y.clamp(0.0, 1.0);

        let x = ((self.width as f32 * u) as u32).min(self.width.saturating_sub(1));
        let y = ((self.height as f32 * v) as u32).min(self.height.saturating_sub(1));

        let [r, g, b, _] = self.get_pixel(x, y);
        Vec3::new(r, g, b)
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .copied()
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // 2x2: red, green / blue, white
        Texture::new(
            2,
            2,
            vec![
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0, 1.0],
            ],
            "checker",
        )
        .unwrap()
    }

    #[test]
    fn test_solid_color_texture() {
        let tex = Texture::solid_color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(tex.width, 1);
        assert_eq!(tex.height, 1);

        let sample = tex.sample_nearest(Vec2::new(0.5, 0.5));
        assert!((sample.x - 1.0).abs() < 0.001);
        assert!((sample.y - 0.5).abs() < 0.001);
        assert!((sample.z - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_nearest_lookup() {
        let tex = checker();
        assert_eq!(tex.sample_nearest(Vec2::new(0.25, 0.25)), Vec3::X);
        assert_eq!(tex.sample_nearest(Vec2::new(0.75, 0.25)), Vec3::Y);
        assert_eq!(tex.sample_nearest(Vec2::new(0.25, 0.75)), Vec3::Z);
    }

    #[test]
    fn test_lookup_clips_uv() {
        let tex = checker();
        // uv = 1 would index one past the last column without the clamp
        assert_eq!(tex.sample_nearest(Vec2::new(1.0, 1.0)), Vec3::ONE);
        assert_eq!(tex.sample_nearest(Vec2::new(7.0, 9.0)), Vec3::ONE);
        assert_eq!(tex.sample_nearest(Vec2::new(-3.0, -1.0)), Vec3::X);
    }

    #[test]
    fn test_size_mismatch() {
        let result = Texture::new(2, 2, vec![[0.0; 4]; 3], "short");
        assert!(matches!(result, Err(TextureError::SizeMismatch { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Texture::load("/definitely/not/here.png");
        assert!(matches!(result, Err(TextureError::LoadError(_))));
    }

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
