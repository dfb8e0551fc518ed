//! Transient per-intersection shading data.

use ember_math::Vec3;

/// Result of a nearest-hit query, plus the path state of the ray that made it.
///
/// Primitives only write the hit fields when they report a hit, so a caller's
/// parameter survives a miss untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParameter {
    /// Diffuse reflectance at the hit
    pub color: Vec3,
    /// Emitted radiance at the hit
    pub emissive: Vec3,
    /// Ray parameter of the hit
    pub distance: f32,
    /// Geometric or interpolated normal. Outward facing; the integrator flips it
    /// toward the incoming ray.
    pub normal: Vec3,
    pub intersect_point: Vec3,
    /// Barycentric weights of the hit (triangles only)
    pub uvw: Vec3,
    /// Remaining bounce budget
    pub depth: u32,
    pub max_depth: u32,
    /// Bounces taken so far
    pub bounce: u32,
}

impl ShaderParameter {
    /// Fresh parameter for a path with `depth` bounces left out of `max_depth`.
    pub fn with_depth(depth: u32, max_depth: u32) -> Self {
        Self {
            depth,
            max_depth,
            ..Default::default()
        }
    }
}

impl Default for ShaderParameter {
    fn default() -> Self {
        Self {
            color: Vec3::ZERO,
            emissive: Vec3::ZERO,
            distance: f32::INFINITY,
            normal: Vec3::Y,
            intersect_point: Vec3::ZERO,
            uvw: Vec3::ZERO,
            depth: 32,
            max_depth: 32,
            bounce: 0,
        }
    }
}
