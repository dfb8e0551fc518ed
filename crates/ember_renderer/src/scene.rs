//! Scene: primitives, lights, camera and the mesh arena, plus the BVH over them.

use std::sync::Arc;

use ember_core::{Material, Mesh, MeshGroup, MeshId};
use ember_math::{Ray, Vec3};

use crate::{
    AreaLight, Bvh, Camera, Light, Plane, Primitive, RenderError, RenderResult, Shape,
    ShaderParameter, Sphere, Triangle,
};

/// Radiance of rays that leave the scene, unless the scene sets its own.
pub const DEFAULT_BACKGROUND: Vec3 = Vec3::splat(0.1);

/// Everything a render reads.
///
/// Each mesh face becomes one `Triangle` in the primitive list, so the list
/// always holds the faces of every mesh group plus the analytic shapes added
/// directly. The BVH is a snapshot: any change to the primitive list marks it
/// stale until `update_bvh` runs again.
#[derive(Debug, Clone)]
pub struct Scene {
    width: u32,
    height: u32,
    camera: Option<Camera>,
    primitives: Vec<Primitive>,
    lights: Vec<Light>,
    mesh_groups: Vec<MeshGroup>,
    bvh: Bvh,
    bvh_stale: bool,
    background: Vec3,
}

impl Scene {
    /// Empty scene for a `width` x `height` image, without a camera.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            camera: None,
            primitives: Vec::new(),
            lights: Vec::new(),
            mesh_groups: Vec::new(),
            bvh: Bvh::new(),
            bvh_stale: true,
            background: DEFAULT_BACKGROUND,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Change the image size. The camera is re-initialized for the new aspect.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        if let Some(camera) = &mut self.camera {
            camera.initialize(width, height);
        }
    }

    /// Set the camera and cache its basis for the scene resolution.
    pub fn set_camera(&mut self, mut camera: Camera) {
        camera.initialize(self.width, self.height);
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn background_color(&self) -> Vec3 {
        self.background
    }

    pub fn set_background_color(&mut self, color: Vec3) {
        self.background = color;
    }

    /// Add an analytic primitive (or a prebuilt BVH).
    pub fn add_primitive(&mut self, primitive: impl Into<Primitive>) {
        self.primitives.push(primitive.into());
        self.bvh_stale = true;
    }

    pub fn add_light(&mut self, light: impl Into<Light>) {
        self.lights.push(light.into());
    }

    /// Add a mesh group and one triangle primitive per face.
    ///
    /// Every mesh is validated first; on error nothing is added. Returns the
    /// group index used in the triangles' `MeshId`s.
    pub fn add_mesh_group(&mut self, group: MeshGroup) -> RenderResult<usize> {
        let group_index = self.mesh_groups.len();
        for (mesh_index, mesh) in group.meshes.iter().enumerate() {
            mesh.validate().map_err(|source| RenderError::InvalidMesh {
                group: group_index,
                mesh: mesh_index,
                source,
            })?;
        }

        self.mesh_groups.push(group);
        let group = &self.mesh_groups[group_index];
        let mut face_total = 0;
        for (mesh_index, mesh) in group.meshes.iter().enumerate() {
            let id = MeshId::new(group_index, mesh_index);
            for face in 0..mesh.face_count() {
                self.primitives
                    .push(Triangle::new(id, face, &self.mesh_groups).into());
            }
            face_total += mesh.face_count();
        }
        self.bvh_stale = true;

        log::debug!(
            "Added mesh group {} ({} meshes, {} faces)",
            group_index,
            self.mesh_groups[group_index].len(),
            face_total
        );
        Ok(group_index)
    }

    /// Replace a mesh's vertices and refresh the bounds of its triangles.
    ///
    /// The BVH is stale afterwards. Returns false for an unknown mesh.
    pub fn set_mesh_vertices(&mut self, id: MeshId, vertices: Vec<Vec3>) -> bool {
        let Some(mesh) = self
            .mesh_groups
            .get_mut(id.group)
            .and_then(|group| group.meshes.get_mut(id.mesh))
        else {
            return false;
        };
        mesh.set_vertices(vertices);

        let meshes = &self.mesh_groups;
        for primitive in &mut self.primitives {
            if let Primitive::Triangle(triangle) = primitive {
                if triangle.mesh_id() == id {
                    triangle.update_box(meshes);
                }
            }
        }
        self.bvh_stale = true;
        true
    }

    pub fn primitive_list(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn light_list(&self) -> &[Light] {
        &self.lights
    }

    pub fn mesh_groups(&self) -> &[MeshGroup] {
        &self.mesh_groups
    }

    /// Mesh behind a handle.
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        id.resolve(&self.mesh_groups)
    }

    /// Returns true if the primitive list changed since the last BVH build.
    pub fn is_bvh_stale(&self) -> bool {
        self.bvh_stale
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Rebuild the BVH over the current primitive list.
    ///
    /// Fails on an empty scene, keeping the previous tree.
    pub fn update_bvh(&mut self) -> RenderResult<()> {
        self.bvh.build(&self.primitives)?;
        self.bvh_stale = false;
        Ok(())
    }

    /// Nearest hit through the BVH.
    #[inline]
    pub fn intersect(&self, ray: &Ray, param: &mut ShaderParameter) -> bool {
        self.bvh
            .closest_hit(ray, &self.mesh_groups, param)
            .is_some()
    }

    /// Any hit through the BVH (shadow rays).
    #[inline]
    pub fn occluded(&self, ray: &Ray) -> bool {
        self.bvh.any_hit(ray, &self.mesh_groups)
    }

    /// Nearest hit by scanning every primitive; reference for the BVH.
    pub fn intersect_linear(&self, ray: &Ray, param: &mut ShaderParameter) -> bool {
        let mut ray = *ray;
        let mut hit = false;
        for primitive in &self.primitives {
            if primitive.intersects_with(&ray, &self.mesh_groups, param) {
                ray.set_tmax(param.distance);
                hit = true;
            }
        }
        hit
    }

    /// Two spheres on a ground plane under an area light.
    pub fn sample_spheres(width: u32, height: u32) -> Self {
        let mut scene = Self::new(width, height);

        scene.add_primitive(Sphere::new(
            Vec3::new(-400.0, 0.0, -50.0),
            250.0,
            Arc::new(Material::diffuse("red", Vec3::new(1.0, 0.0, 0.0))),
        ));
        scene.add_primitive(Sphere::new(
            Vec3::new(500.0, 0.0, -200.0),
            200.0,
            Arc::new(Material::diffuse("blue", Vec3::new(0.0, 0.0, 1.0))),
        ));
        scene.add_primitive(Plane::new(
            Vec3::new(0.0, -250.0, 0.0),
            Vec3::Y,
            Arc::new(Material::diffuse("green", Vec3::new(0.0, 1.0, 0.0))),
        ));

        scene.add_light(AreaLight::new(
            Vec3::new(-100.0, 800.0, -100.0),
            Vec3::new(200.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 200.0),
        ));
        scene.set_camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 200.0, 1800.0), Vec3::ZERO, Vec3::Y)
                .with_vfov(45.0),
        );
        scene
    }

    /// Three spheres and a one-triangle mesh on a ground plane.
    pub fn sample_mesh(width: u32, height: u32) -> Self {
        let mut scene = Self::new(width, height);

        let mut mesh = Mesh::new(
            vec![
                Vec3::new(350.0, -100.0, 200.0),
                Vec3::new(650.0, -100.0, 200.0),
                Vec3::new(500.0, 200.0, 200.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.create_normals();
        mesh.add_material(Arc::new(
            Material::diffuse("orange", Vec3::new(1.0, 0.5, 0.0)).with_polygon_count(1),
        ));
        if let Err(err) = scene.add_mesh_group(MeshGroup::from_mesh(mesh)) {
            log::warn!("Sample mesh rejected: {}", err);
        }

        scene.add_primitive(Sphere::new(
            Vec3::new(-200.0, -100.0, 0.0),
            200.0,
            Arc::new(Material::diffuse("green", Vec3::new(0.0, 1.0, 0.0))),
        ));
        scene.add_primitive(Sphere::new(
            Vec3::new(200.0, -100.0, 0.0),
            200.0,
            Arc::new(Material::diffuse("blue", Vec3::new(0.0, 0.0, 1.0))),
        ));
        scene.add_primitive(Sphere::new(
            Vec3::new(0.0, 250.0, 0.0),
            200.0,
            Arc::new(Material::diffuse("red", Vec3::new(1.0, 0.0, 0.0))),
        ));
        scene.add_primitive(Plane::new(
            Vec3::new(0.0, -250.0, 0.0),
            Vec3::Y,
            Arc::new(Material::diffuse("ground", Vec3::new(0.5, 1.0, 0.5))),
        ));

        scene.add_light(AreaLight::new(
            Vec3::new(-100.0, 1000.0, -100.0),
            Vec3::new(200.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 200.0),
        ));
        scene.set_camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 100.0, 1800.0), Vec3::new(0.0, 50.0, 0.0), Vec3::Y)
                .with_vfov(45.0),
        );
        scene
    }
}
