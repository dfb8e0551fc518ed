//! Sphere primitive for ray tracing.

use std::f32::consts::PI;
use std::sync::Arc;

use ember_core::{Material, Mesh, MeshGroup};
use ember_math::{Aabb, Ray, Vec2, Vec3};

use crate::{Shape, ShaderParameter};

/// A sphere primitive.
#[derive(Clone, Debug)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            bbox,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Nearest root of `|O + tD - C|^2 = r^2` inside the ray range.
    ///
    /// The smaller root wins when it is in range, otherwise the larger one
    /// (the ray starts inside the sphere).
    fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        let near = (-h - sqrtd) / a;
        if ray.in_range(near) {
            return Some(near);
        }
        let far = (-h + sqrtd) / a;
        ray.in_range(far).then_some(far)
    }

    /// Tessellate into a UV sphere with `stacks` rings and `slices` segments.
    ///
    /// Faces are wound counter-clockwise seen from outside; the mesh carries
    /// per-vertex normals and uvs and a copy of the sphere's material.
    pub fn to_mesh(&self, stacks: u32, slices: u32) -> Mesh {
        let stacks = stacks.max(2);
        let slices = slices.max(3);

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        let mut normals = Vec::with_capacity(vertices.capacity());
        let mut uvs = Vec::with_capacity(vertices.capacity());
        for i in 0..=stacks {
            let theta = PI * i as f32 / stacks as f32;
            for j in 0..=slices {
                let phi = 2.0 * PI * j as f32 / slices as f32;
                let dir = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                vertices.push(self.center + dir * self.radius);
                normals.push(dir);
                uvs.push(Vec2::new(j as f32 / slices as f32, i as f32 / stacks as f32));
            }
        }

        let row = slices + 1;
        let mut faces = Vec::new();
        for i in 0..stacks {
            for j in 0..slices {
                let a = i * row + j;
                let b = a + row;
                let c = b + 1;
                let d = a + 1;
                // Skip the zero-area halves at the poles
                if i != stacks - 1 {
                    faces.push([a, c, b]);
                }
                if i != 0 {
                    faces.push([a, d, c]);
                }
            }
        }

        let material = Material {
            polygon_count: faces.len(),
            ..(*self.material).clone()
        };
        let mut mesh = Mesh::new(vertices, faces)
            .with_normals(normals)
            .with_uvs(uvs);
        mesh.add_material(Arc::new(material));
        mesh
    }
}

impl Shape for Sphere {
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
        param.normal = (point - self.center) / self.radius;
        param.color = self.material.diffuse_rgb();
        param.emissive = self.material.emission();
        param.uvw = Vec3::ZERO;
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_sphere() -> Sphere {
        Sphere::new(
            Vec3::ZERO,
            100.0,
            Arc::new(Material::diffuse("red", Vec3::X)),
        )
    }

    #[test]
    fn test_sphere_silhouette() {
        let sphere = red_sphere();
        let inside = Ray::new(Vec3::new(100.0 - 0.01, 0.0, 200.0), Vec3::NEG_Z);
        let outside = Ray::new(Vec3::new(100.0 + 0.01, 0.0, 200.0), Vec3::NEG_Z);

        assert!(sphere.intersects(&inside, &[]));
        assert!(!sphere.intersects(&outside, &[]));
    }

    #[test]
    fn test_sphere_shading() {
        let sphere = red_sphere();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 200.0), Vec3::NEG_Z);
        let mut param = ShaderParameter::default();

        assert!(sphere.intersects_with(&ray, &[], &mut param));
        assert!((param.distance - 100.0).abs() < 1e-3);
        assert!((param.normal - Vec3::Z).length() < 1e-4);
        assert_eq!(param.color, Vec3::X);
    }

    #[test]
    fn test_sphere_from_inside_uses_far_root() {
        let sphere = red_sphere();
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let mut param = ShaderParameter::default();

        assert!(sphere.intersects_with(&ray, &[], &mut param));
        assert!((param.distance - 100.0).abs() < 1e-3);
        // Outward normal; the integrator flips it
        assert!(param.normal.dot(ray.direction) > 0.0);
    }

    #[test]
    fn test_sphere_range() {
        let sphere = red_sphere();
        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 200.0), Vec3::NEG_Z);
        ray.set_tmax(99.0);
        assert!(!sphere.intersects(&ray, &[]));

        // Behind the origin
        let ray = Ray::new(Vec3::new(0.0, 0.0, 200.0), Vec3::Z);
        assert!(!sphere.intersects(&ray, &[]));
    }

    #[test]
    fn test_to_mesh_is_closed_and_outward() {
        let sphere = red_sphere();
        let mesh = sphere.to_mesh(8, 12);

        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.face_count(), 2 * 12 * (8 - 1));
        assert_eq!(mesh.material_for_face(0).unwrap().diffuse_rgb(), Vec3::X);
        assert!(mesh.material_for_face(mesh.face_count() - 1).is_some());

        for face in 0..mesh.face_count() {
            let [a, b, c] = mesh.face_vertices(face).unwrap();
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "face {} points inward", face);
        }
    }
}
