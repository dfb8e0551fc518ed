//! Light sources for direct illumination.
//!
//! Lights are not geometry: camera and bounce rays never hit them. They are
//! only reached through `Light::sample`, which picks a point on the light and
//! returns the radiance it sends toward a shading point.

use ember_math::{Vec2, Vec3};

use crate::ShaderParameter;

/// Distance attenuation `1 / (constant + linear * r + quadratic * r^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Falloff {
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// Divisor at distance `r`.
    #[inline]
    pub fn divisor(&self, r: f32) -> f32 {
        self.constant + self.linear * r + self.quadratic * r * r
    }
}

impl Default for Falloff {
    /// No attenuation beyond the light's own geometry.
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

/// One light sample as seen from a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Radiance arriving at the shading point, before the surface BRDF
    pub intensity: Vec3,
    /// Sampled point on the light
    pub point: Vec3,
    /// Unnormalized vector from the shading point to `point`
    pub direction: Vec3,
}

/// Omnidirectional point light.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub falloff: Falloff,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            falloff: Falloff::default(),
        }
    }

    pub fn with_falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    fn sample(&self, param: &ShaderParameter) -> Option<LightSample> {
        let direction = self.position - param.intersect_point;
        let length = direction.length();
        if length <= 0.0 {
            return None;
        }
        let cos_in = (param.normal.dot(direction) / length).max(0.0);
        let divisor = self.falloff.divisor(length);
        if divisor <= 0.0 {
            return None;
        }
        Some(LightSample {
            intensity: self.color * cos_in / divisor,
            point: self.position,
            direction,
        })
    }
}

/// One-sided parallelogram light spanned by two edges from `position`.
///
/// Emits on the side of `edge1 x edge2`.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaLight {
    position: Vec3,
    edge1: Vec3,
    edge2: Vec3,
    normal: Vec3,
    area: f32,
    pub color: Vec3,
    pub falloff: Falloff,
}

impl AreaLight {
    /// Default emitted color, bright enough to light scenes a few hundred
    /// units across.
    pub const DEFAULT_COLOR: Vec3 = Vec3::splat(13.0);

    pub fn new(position: Vec3, edge1: Vec3, edge2: Vec3) -> Self {
        let cross = edge1.cross(edge2);
        Self {
            position,
            edge1,
            edge2,
            normal: cross.normalize_or_zero(),
            area: cross.length(),
            color: Self::DEFAULT_COLOR,
            falloff: Falloff::default(),
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_falloff(mut self, falloff: Falloff) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    /// Point on the parallelogram for a random pair in `[0, 1)^2`.
    #[inline]
    pub fn point_at(&self, random: Vec2) -> Vec3 {
        self.position + self.edge1 * random.x + self.edge2 * random.y
    }

    fn sample(&self, param: &ShaderParameter, random: Vec2) -> Option<LightSample> {
        let point = self.point_at(random);
        let direction = point - param.intersect_point;
        let length_sq = direction.length_squared();
        if length_sq <= 0.0 {
            return None;
        }
        let length = length_sq.sqrt();
        let cos_in = (param.normal.dot(direction) / length).max(0.0);
        let cos_out = (self.normal.dot(-direction) / length).max(0.0);
        let divisor = self.falloff.divisor(length);
        if divisor <= 0.0 {
            return None;
        }
        Some(LightSample {
            intensity: self.color * (self.area * cos_in * cos_out / length_sq / divisor),
            point,
            direction,
        })
    }
}

/// Closed set of light kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Point(PointLight),
    Area(AreaLight),
}

impl Light {
    /// Representative position: the point light itself or the area light's
    /// center.
    pub fn position(&self) -> Vec3 {
        match self {
            Light::Point(light) => light.position,
            Light::Area(light) => light.point_at(Vec2::splat(0.5)),
        }
    }

    /// Sample the light from the shading point in `param`.
    ///
    /// `random` is a uniform pair in `[0, 1)^2` (ignored by point lights).
    /// Returns `None` when the shading point coincides with the light.
    pub fn sample(&self, param: &ShaderParameter, random: Vec2) -> Option<LightSample> {
        match self {
            Light::Point(light) => light.sample(param),
            Light::Area(light) => light.sample(param, random),
        }
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<AreaLight> for Light {
    fn from(light: AreaLight) -> Self {
        Light::Area(light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shading_point(point: Vec3, normal: Vec3) -> ShaderParameter {
        ShaderParameter {
            intersect_point: point,
            normal,
            ..Default::default()
        }
    }

    #[test]
    fn test_area_light_geometry() {
        let light = AreaLight::new(Vec3::new(-1.0, 5.0, -1.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(light.normal(), Vec3::NEG_Y);
        assert_eq!(light.area(), 4.0);
        assert_eq!(light.point_at(Vec2::new(0.5, 0.5)), Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(Light::from(light).position(), Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(Light::from(PointLight::new(Vec3::ONE, Vec3::ONE)).position(), Vec3::ONE);
    }

    #[test]
    fn test_area_light_sample_straight_below() {
        let light = Light::from(
            AreaLight::new(Vec3::new(-1.0, 5.0, -1.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0))
                .with_color(Vec3::ONE),
        );
        let param = shading_point(Vec3::ZERO, Vec3::Y);
        let sample = light.sample(&param, Vec2::new(0.5, 0.5)).unwrap();

        assert_eq!(sample.point, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(sample.direction, Vec3::new(0.0, 5.0, 0.0));
        // area * cos_in * cos_out / r^2 = 4 / 25
        assert!((sample.intensity.x - 0.16).abs() < 1e-6);
    }

    #[test]
    fn test_area_light_is_one_sided() {
        let light = Light::from(AreaLight::new(Vec3::ZERO, Vec3::X, Vec3::Z));
        // Above the light, which faces -Y
        let param = shading_point(Vec3::new(0.5, 3.0, 0.5), Vec3::NEG_Y);
        let sample = light.sample(&param, Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!(sample.intensity, Vec3::ZERO);
    }

    #[test]
    fn test_falloff() {
        let light = Light::from(
            PointLight::new(Vec3::new(0.0, 2.0, 0.0), Vec3::splat(8.0))
                .with_falloff(Falloff::new(0.0, 0.0, 1.0)),
        );
        let param = shading_point(Vec3::ZERO, Vec3::Y);
        let sample = light.sample(&param, Vec2::ZERO).unwrap();
        assert!((sample.intensity - Vec3::splat(2.0)).length() < 1e-6);

        // Surface facing away receives nothing
        let param = shading_point(Vec3::ZERO, Vec3::NEG_Y);
        let sample = light.sample(&param, Vec2::ZERO).unwrap();
        assert_eq!(sample.intensity, Vec3::ZERO);
    }

    #[test]
    fn test_coincident_point_has_no_sample() {
        let light = Light::from(PointLight::new(Vec3::ONE, Vec3::ONE));
        let param = shading_point(Vec3::ONE, Vec3::Y);
        assert!(light.sample(&param, Vec2::ZERO).is_none());
    }
}
