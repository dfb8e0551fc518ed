// Re-export glam for convenience
pub use glam::*;

// Ember math types
mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::{Ray, DEFAULT_TMIN};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_max_element() {
        let v = Vec3::new(0.2, 0.9, 0.4);
        assert_eq!(v.max_element(), 0.9);
    }

    #[test]
    fn test_vec4_from_vec3() {
        let v = Vec4::from((Vec3::new(1.0, 2.0, 3.0), 1.0));
        assert_eq!(v, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(v.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }
}
