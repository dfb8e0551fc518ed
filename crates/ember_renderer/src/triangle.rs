//! Mesh face primitive.
//!
//! A triangle does not copy its vertices: it holds a `MeshId` into the scene's
//! mesh arena and the index of its face, and resolves both on every query.

use ember_core::{Mesh, MeshGroup, MeshId};
use ember_math::{Aabb, Ray, Vec3};

use crate::{Shape, ShaderParameter};

/// Hits closer than this are rejected even when the ray's `tmin` is smaller.
pub const TRIANGLE_EPSILON: f32 = 1e-4;

/// Fallback reflectance for faces no material covers.
const DEFAULT_FACE_COLOR: Vec3 = Vec3::splat(0.5);

/// One face of a mesh.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    mesh: MeshId,
    face: usize,
    bbox: Aabb,
}

/// Raw hit: distance, barycentric weights and unnormalized face normal.
struct FaceHit {
    t: f32,
    uvw: Vec3,
    face_normal: Vec3,
}

impl Triangle {
    /// Create a triangle for `face` of `mesh`, computing its bounds from `meshes`.
    pub fn new(mesh: MeshId, face: usize, meshes: &[MeshGroup]) -> Self {
        let mut triangle = Self {
            mesh,
            face,
            bbox: Aabb::EMPTY,
        };
        triangle.update_box(meshes);
        triangle
    }

    pub fn mesh_id(&self) -> MeshId {
        self.mesh
    }

    pub fn face_index(&self) -> usize {
        self.face
    }

    /// Determinant-form ray/triangle test.
    ///
    /// Only front faces (counter-clockwise seen from the ray origin) are hit.
    fn hit(&self, ray: &Ray, mesh: &Mesh) -> Option<FaceHit> {
        let [a, b, c] = mesh.face_vertices(self.face)?;
        let ab = b - a;
        let ac = c - a;
        let n = ab.cross(ac);

        let qp = -ray.direction;
        let d = qp.dot(n);
        if d <= 0.0 {
            return None;
        }

        let ap = ray.origin - a;
        let t = ap.dot(n) / d;
        if t < ray.tmin.max(TRIANGLE_EPSILON) || t > ray.tmax {
            return None;
        }

        let e = qp.cross(ap);
        let v = ac.dot(e);
        if v < 0.0 || v > d {
            return None;
        }
        let w = -ab.dot(e);
        if w < 0.0 || v + w > d {
            return None;
        }

        let inv_d = 1.0 / d;
        let v = v * inv_d;
        let w = w * inv_d;
        Some(FaceHit {
            t,
            uvw: Vec3::new(1.0 - v - w, v, w),
            face_normal: n,
        })
    }
}

impl Shape for Triangle {
    fn intersects(&self, ray: &Ray, meshes: &[MeshGroup]) -> bool {
        self.mesh
            .resolve(meshes)
            .and_then(|mesh| self.hit(ray, mesh))
            .is_some()
    }

    fn intersects_with(
        &self,
        ray: &Ray,
        meshes: &[MeshGroup],
        param: &mut ShaderParameter,
    ) -> bool {
        let Some(mesh) = self.mesh.resolve(meshes) else {
            return false;
        };
        let Some(hit) = self.hit(ray, mesh) else {
            return false;
        };
        let uvw = hit.uvw;

        let normal = match mesh.face_normals(self.face) {
            Some([n0, n1, n2]) => (n0 * uvw.x + n1 * uvw.y + n2 * uvw.z)
                .try_normalize()
                .unwrap_or_else(|| hit.face_normal.normalize()),
            None => hit.face_normal.normalize(),
        };

        let (mut color, emissive) = match mesh.material_for_face(self.face) {
            Some(material) => (material.diffuse_rgb(), material.emission()),
            None => (DEFAULT_FACE_COLOR, Vec3::ZERO),
        };

        let texture = mesh
            .material_for_face(self.face)
            .and_then(|material| material.base_texture());
        if let (Some(texture), Some([uv0, uv1, uv2])) = (texture, mesh.face_uvs(self.face)) {
            let uv = uv0 * uvw.x + uv1 * uvw.y + uv2 * uvw.z;
            color *= texture.sample_nearest(uv);
        }

        param.distance = hit.t;
        param.intersect_point = ray.at(hit.t);
        param.normal = normal;
        param.uvw = uvw;
        param.color = color;
        param.emissive = emissive;
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn update_box(&mut self, meshes: &[MeshGroup]) {
        self.bbox = match self
            .mesh
            .resolve(meshes)
            .and_then(|mesh| mesh.face_vertices(self.face))
        {
            Some([a, b, c]) => Aabb::from_points(a.min(b).min(c), a.max(b).max(c)),
            None => {
                log::warn!(
                    "Triangle face {} of mesh {:?} is not resolvable",
                    self.face,
                    self.mesh
                );
                Aabb::EMPTY
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{Material, Texture};
    use ember_math::Vec2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn single_triangle() -> Vec<MeshGroup> {
        let mut mesh = Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.add_material(Arc::new(
            Material::diffuse("orange", Vec3::new(1.0, 0.5, 0.0)).with_polygon_count(1),
        ));
        vec![MeshGroup::from_mesh(mesh)]
    }

    #[test]
    fn test_barycentrics_sum_to_one() {
        let meshes = single_triangle();
        let triangle = Triangle::new(MeshId::new(0, 0), 0, &meshes);
        let mut rng = StdRng::seed_from_u64(42);

        let mut hits = 0;
        for _ in 0..1000 {
            let origin = Vec3::new(rng.gen_range(-0.5..1.5), rng.gen_range(-0.5..1.5), 5.0);
            let ray = Ray::new(origin, Vec3::NEG_Z);
            let mut param = ShaderParameter::default();
            if triangle.intersects_with(&ray, &meshes, &mut param) {
                hits += 1;
                let uvw = param.uvw;
                assert!((uvw.x + uvw.y + uvw.z - 1.0).abs() < 1e-5);
                for k in 0..3 {
                    assert!(uvw[k] >= -1e-6 && uvw[k] <= 1.0 + 1e-6);
                }
                // Point reconstructs from the weights
                let p = Vec3::X * uvw.y + Vec3::Y * uvw.z;
                assert!((p - param.intersect_point).length() < 1e-4);
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn test_points_outside_miss() {
        let meshes = single_triangle();
        let triangle = Triangle::new(MeshId::new(0, 0), 0, &meshes);

        for (x, y) in [(0.8, 0.8), (-0.1, 0.5), (0.5, -0.1), (1.1, 0.0), (0.0, 1.1)] {
            let ray = Ray::new(Vec3::new(x, y, 5.0), Vec3::NEG_Z);
            let mut param = ShaderParameter::default();
            assert!(!triangle.intersects(&ray, &meshes), "({}, {})", x, y);
            assert!(!triangle.intersects_with(&ray, &meshes, &mut param), "({}, {})", x, y);
            assert_eq!(param, ShaderParameter::default());
        }

        // Just inside the hypotenuse still hits
        let ray = Ray::new(Vec3::new(0.45, 0.45, 5.0), Vec3::NEG_Z);
        assert!(triangle.intersects(&ray, &meshes));
    }

    #[test]
    fn test_backface_is_rejected() {
        let meshes = single_triangle();
        let triangle = Triangle::new(MeshId::new(0, 0), 0, &meshes);

        let front = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.2, 0.2, -1.0), Vec3::Z);
        assert!(triangle.intersects(&front, &meshes));
        assert!(!triangle.intersects(&back, &meshes));
    }

    #[test]
    fn test_epsilon_applies_to_both_paths() {
        let meshes = single_triangle();
        let triangle = Triangle::new(MeshId::new(0, 0), 0, &meshes);
        // Hit at t = 1e-5, below TRIANGLE_EPSILON even though tmin allows it
        let ray = Ray::with_range(Vec3::new(0.2, 0.2, 1e-5), Vec3::NEG_Z, 0.0, f32::INFINITY);
        let mut param = ShaderParameter::default();

        assert!(!triangle.intersects(&ray, &meshes));
        assert!(!triangle.intersects_with(&ray, &meshes, &mut param));
    }

    #[test]
    fn test_material_and_texture() {
        let mut meshes = single_triangle();
        let texture = Arc::new(Texture::solid_color(Vec3::new(0.5, 1.0, 1.0)));
        let mesh = &mut meshes[0].meshes[0];
        mesh.materials = vec![Arc::new(
            Material::diffuse("tex", Vec3::ONE)
                .with_polygon_count(1)
                .with_texture(texture),
        )];
        mesh.uvs = vec![Vec2::ZERO, Vec2::X, Vec2::Y];

        let triangle = Triangle::new(MeshId::new(0, 0), 0, &meshes);
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z);
        let mut param = ShaderParameter::default();

        assert!(triangle.intersects_with(&ray, &meshes, &mut param));
        assert_eq!(param.color, Vec3::new(0.5, 1.0, 1.0));
        assert_eq!(param.normal, Vec3::Z);
    }

    #[test]
    fn test_interpolated_normals() {
        let mut meshes = single_triangle();
        meshes[0].meshes[0].normals = vec![Vec3::Z, Vec3::X, Vec3::Z];

        let triangle = Triangle::new(MeshId::new(0, 0), 0, &meshes);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 1.0), Vec3::NEG_Z);
        let mut param = ShaderParameter::default();

        assert!(triangle.intersects_with(&ray, &meshes, &mut param));
        // Halfway between vertex 0 and vertex 1
        let expected = (Vec3::Z + Vec3::X).normalize();
        assert!((param.normal - expected).length() < 1e-4);
    }

    #[test]
    fn test_dangling_handle_misses() {
        let meshes = single_triangle();
        let triangle = Triangle::new(MeshId::new(3, 0), 0, &meshes);
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z);
        assert!(!triangle.intersects(&ray, &meshes));
        assert!(triangle.bounding_box().is_empty());
    }
}
