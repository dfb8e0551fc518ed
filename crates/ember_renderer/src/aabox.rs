//! Axis-aligned box primitive.

use std::sync::Arc;

use ember_core::{Material, Mesh, MeshGroup};
use ember_math::{Aabb, Ray, Vec2, Vec3};

use crate::{Shape, ShaderParameter};

/// A solid box between two corners.
#[derive(Clone, Debug)]
pub struct AxisBox {
    bounds: Aabb,
    material: Arc<Material>,
}

impl AxisBox {
    /// Create a box; the corners may be given in any order.
    pub fn new(a: Vec3, b: Vec3, material: Arc<Material>) -> Self {
        Self {
            bounds: Aabb::from_corners(a.min(b), a.max(b)),
            material,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.bounds.min()
    }

    pub fn max(&self) -> Vec3 {
        self.bounds.max()
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Outward normal of the face nearest `point`.
    pub fn normal(&self, point: Vec3) -> Vec3 {
        self.bounds.normal_at(point)
    }

    /// Distance to the first box surface inside the ray range.
    ///
    /// The slab test runs over the whole line so a ray starting inside the box
    /// reports the exit face instead of its own origin.
    fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        let line = Ray::with_range(ray.origin, ray.direction, f32::NEG_INFINITY, f32::INFINITY);
        let (t_near, t_far) = self.bounds.hit_range(&line)?;
        if ray.in_range(t_near) {
            Some(t_near)
        } else if ray.in_range(t_far) {
            Some(t_far)
        } else {
            None
        }
    }

    /// Closed mesh with four vertices per face and flat outward normals.
    pub fn to_mesh(&self) -> Mesh {
        let center = self.bounds.centroid();
        let half = self.bounds.size() * 0.5;
        let axes = [Vec3::X, Vec3::Y, Vec3::Z];

        let mut vertices = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut faces = Vec::with_capacity(12);

        for axis in 0..3 {
            for sign in [1.0f32, -1.0] {
                let face_center = center + axes[axis] * (half[axis] * sign);
                // Cyclic axes give u x v = +axis; swap them for the negative face
                let (mut iu, mut iv) = ((axis + 1) % 3, (axis + 2) % 3);
                if sign < 0.0 {
                    std::mem::swap(&mut iu, &mut iv);
                }
                let hu = axes[iu] * half[iu];
                let hv = axes[iv] * half[iv];
                let normal = self.normal(face_center);

                let base = vertices.len() as u32;
                vertices.extend([
                    face_center - hu - hv,
                    face_center + hu - hv,
                    face_center + hu + hv,
                    face_center - hu + hv,
                ]);
                normals.extend([normal; 4]);
                uvs.extend([Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y]);
                faces.push([base, base + 1, base + 2]);
                faces.push([base, base + 2, base + 3]);
            }
        }

        let mut mesh = Mesh::new(vertices, faces)
            .with_normals(normals)
            .with_uvs(uvs);
        mesh.add_material(Arc::new(Material {
            polygon_count: 12,
            ..(*self.material).clone()
        }));
        mesh
    }
}

impl Shape for AxisBox {
    fn intersects(&self, ray: &Ray, _meshes: &[MeshGroup]) -> bool {
        self.hit_distance(ray).is_some()
    }

    fn intersects_with(
        &self,
        ray: &Ray,
        _meshes: &[MeshGroup],
        param: &mut ShaderParameter,
    ) -> bool {
        let Some(t) = self.hit_distance(ray) else {
            return false;
        };

        let point = ray.at(t);
        param.distance = t;
        param.intersect_point = point;
        param.normal = self.normal(point);
        param.color = self.material.diffuse_rgb();
        param.emissive = self.material.emission();
        param.uvw = Vec3::ZERO;
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> AxisBox {
        AxisBox::new(Vec3::splat(1.0), Vec3::splat(-1.0), Default::default())
    }

    #[test]
    fn test_box_hit_and_normal() {
        let aabox = unit_box();
        let ray = Ray::new(Vec3::new(0.3, -0.2, 5.0), Vec3::NEG_Z);
        let mut param = ShaderParameter::default();

        assert!(aabox.intersects_with(&ray, &[], &mut param));
        assert!((param.distance - 4.0).abs() < 1e-5);
        assert_eq!(param.normal, Vec3::Z);
    }

    #[test]
    fn test_box_from_inside_hits_exit_face() {
        let aabox = unit_box();
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_X);
        let mut param = ShaderParameter::default();

        assert!(aabox.intersects_with(&ray, &[], &mut param));
        assert!((param.distance - 1.0).abs() < 1e-5);
        assert_eq!(param.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_box_parallel_outside_slab() {
        let aabox = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z);
        assert!(!aabox.intersects(&ray, &[]));
    }

    #[test]
    fn test_to_mesh_is_outward() {
        let aabox = AxisBox::new(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0), Default::default());
        let mesh = aabox.to_mesh();
        let center = Vec3::new(1.0, 2.0, 3.0);

        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.face_count(), 12);
        for face in 0..mesh.face_count() {
            let [a, b, c] = mesh.face_vertices(face).unwrap();
            let normal = (b - a).cross(c - a);
            assert!(normal.dot((a + b + c) / 3.0 - center) > 0.0);
        }
        for (v, n) in mesh.vertices().iter().zip(&mesh.normals) {
            assert!(n.dot(*v - center) > 0.0);
        }
    }
}
