use crate::Vec3;

/// Default lower bound for hit distances along a ray.
///
/// Keeps secondary rays that start on a surface from hitting that surface again.
pub const DEFAULT_TMIN: f32 = 1e-3;

/// A ray in 3D space with a valid parametric range `[tmin, tmax]`.
///
/// A point on the ray is `origin + t * direction`. Hits are only accepted when
/// their distance `t` lies inside the range, which is how shadow rays are
/// limited to the segment between a surface and a light sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub tmin: f32,
    pub tmax: f32,
}

impl Ray {
    /// Create a ray with the default range `[DEFAULT_TMIN, +inf]`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            tmin: DEFAULT_TMIN,
            tmax: f32::INFINITY,
        }
    }

    /// Create a ray with an explicit parametric range.
    pub fn with_range(origin: Vec3, direction: Vec3, tmin: f32, tmax: f32) -> Self {
        Self {
            origin,
            direction,
            tmin,
            tmax,
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Set the far end of the valid range.
    #[inline]
    pub fn set_tmax(&mut self, tmax: f32) {
        self.tmax = tmax;
    }

    /// Set the near end of the valid range.
    #[inline]
    pub fn set_tmin(&mut self, tmin: f32) {
        self.tmin = tmin;
    }

    /// Returns true if `t` lies inside `[tmin, tmax]`.
    #[inline]
    pub fn in_range(&self, t: f32) -> bool {
        self.tmin <= t && t <= self.tmax
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_creation() {
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let direction = Vec3::new(0.0, 1.0, 0.0);
        let ray = Ray::new(origin, direction);

        assert_eq!(ray.origin, origin);
        assert_eq!(ray.direction, direction);
        assert_eq!(ray.tmin, DEFAULT_TMIN);
        assert_eq!(ray.tmax, f32::INFINITY);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_range() {
        let mut ray = Ray::new(Vec3::ZERO, Vec3::Y);
        assert!(ray.in_range(1e6));
        assert!(!ray.in_range(0.0));

        // Shadow rays clamp tmax to the light sample
        ray.set_tmax(5.0);
        assert!(ray.in_range(5.0));
        assert!(!ray.in_range(5.001));
    }

    #[test]
    fn test_ray_with_range() {
        let ray = Ray::with_range(Vec3::ZERO, Vec3::Z, 0.5, 2.0);
        assert!(ray.in_range(0.5));
        assert!(ray.in_range(2.0));
        assert!(!ray.in_range(0.49));
    }
}
