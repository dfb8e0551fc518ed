//! Surface materials.
//!
//! A material is immutable once a render starts; primitives and meshes share it
//! through `Arc`.

use std::sync::Arc;

use ember_math::{Vec3, Vec4};

use crate::texture::Texture;

/// Surface description used by the path tracer.
///
/// Only the diffuse color (reflectance) and the emissive term feed the
/// integrator. Ambient and specular colors are carried for hosts that display
/// the scene with a rasterizer.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name
    pub name: String,

    /// Ambient color (RGBA)
    pub ambient: Vec4,

    /// Diffuse/albedo color (RGBA, 0-1)
    pub diffuse: Vec4,

    /// Specular color (RGBA)
    pub specular: Vec4,

    /// Emissive color (RGBA)
    pub emissive: Vec4,

    /// Scale applied to `emissive`
    pub emissive_factor: f32,

    /// How many consecutive faces of the owning mesh use this material
    pub polygon_count: usize,

    /// Texture list. The first texture modulates the diffuse color.
    pub textures: Vec<Arc<Texture>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::new(0.5, 0.5, 0.5, 1.0), // Grey default
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emissive: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emissive_factor: 1.0,
            polygon_count: 0,
            textures: Vec::new(),
        }
    }
}

impl Material {
    /// Create a new material with just a name and diffuse color.
    pub fn diffuse(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse: Vec4::from((color, 1.0)),
            ..Default::default()
        }
    }

    /// Set the emissive color and factor.
    pub fn with_emission(mut self, color: Vec3, factor: f32) -> Self {
        self.emissive = Vec4::from((color, 1.0));
        self.emissive_factor = factor;
        self
    }

    /// Set how many faces of the owning mesh this material covers.
    pub fn with_polygon_count(mut self, polygon_count: usize) -> Self {
        self.polygon_count = polygon_count;
        self
    }

    /// Append a texture.
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.textures.push(texture);
        self
    }

    /// Diffuse reflectance as RGB.
    #[inline]
    pub fn diffuse_rgb(&self) -> Vec3 {
        self.diffuse.truncate()
    }

    /// Emitted radiance as RGB (emissive color times factor).
    #[inline]
    pub fn emission(&self) -> Vec3 {
        self.emissive.truncate() * self.emissive_factor
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.emission().length_squared() > 0.0
    }

    /// First texture, if any.
    pub fn base_texture(&self) -> Option<&Arc<Texture>> {
        self.textures.first()
    }
}
