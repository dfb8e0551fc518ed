//! Infinite plane primitive.

use std::sync::Arc;

use ember_core::{Material, Mesh, MeshGroup};
use ember_math::{Aabb, Ray, Vec2, Vec3};

use crate::{Shape, ShaderParameter};

/// An infinite plane through `point` with unit `normal`.
///
/// Planes are unbounded; the BVH keeps them outside the tree and tests them on
/// every query.
#[derive(Clone, Debug)]
pub struct Plane {
    point: Vec3,
    normal: Vec3,
    material: Arc<Material>,
}

impl Plane {
    /// Create a plane. The normal is normalized; a zero normal becomes +Y.
    pub fn new(point: Vec3, normal: Vec3, material: Arc<Material>) -> Self {
        Self {
            point,
            normal: normal.try_normalize().unwrap_or(Vec3::Y),
            material,
        }
    }

    pub fn point(&self) -> Vec3 {
        self.point
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let t = self.normal.dot(self.point - ray.origin) / denom;
        if t < f32::EPSILON || !ray.in_range(t) {
            return None;
        }
        Some(t)
    }

    /// Two-triangle quad of `width` x `height` centered on the plane point.
    pub fn to_mesh(&self, width: f32, height: f32) -> Mesh {
        let n = self.normal;
        let u = if n.x.abs() > 0.1 {
            Vec3::Y.cross(n)
        } else {
            Vec3::X.cross(n)
        }
        .normalize();
        let v = n.cross(u);

        let hu = u * (width * 0.5);
        let hv = v * (height * 0.5);
        let vertices = vec![
            self.point - hu - hv,
            self.point + hu - hv,
            self.point + hu + hv,
            self.point - hu + hv,
        ];
        let uvs = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];

        let mut mesh = Mesh::new(vertices, vec![[0, 1, 2], [0, 2, 3]])
            .with_normals(vec![n; 4])
            .with_uvs(uvs);
        mesh.add_material(Arc::new(Material {
            polygon_count: 2,
            ..(*self.material).clone()
        }));
        mesh
    }
}

impl Shape for Plane {
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

        param.distance = t;
        param.intersect_point = ray.at(t);
        param.normal = self.normal;
        param.color = self.material.diffuse_rgb();
        param.emissive = self.material.emission();
        param.uvw = Vec3::ZERO;
        true
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::UNIVERSE
    }
}
