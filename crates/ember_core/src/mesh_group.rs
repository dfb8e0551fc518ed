//! Mesh arena.
//!
//! Meshes live in groups owned by the scene; everything else refers to them by
//! `MeshId`, which stays valid for as long as the groups are not removed.

use ember_math::Aabb;

use crate::mesh::Mesh;

/// An ordered collection of meshes loaded together (one model).
#[derive(Clone, Debug, Default)]
pub struct MeshGroup {
    pub meshes: Vec<Mesh>,
}

impl MeshGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group holding a single mesh.
    pub fn from_mesh(mesh: Mesh) -> Self {
        Self { meshes: vec![mesh] }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Total number of faces across all meshes.
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(Mesh::face_count).sum()
    }

    /// Union of the mesh bounding boxes.
    pub fn bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, mesh| Aabb::surrounding(&acc, &mesh.bounds()))
    }
}

/// Stable handle to a mesh: index of its group in the scene, then of the mesh
/// within the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId {
    pub group: usize,
    pub mesh: usize,
}

impl MeshId {
    pub fn new(group: usize, mesh: usize) -> Self {
        Self { group, mesh }
    }

    /// Look the mesh up in an arena.
    #[inline]
    pub fn resolve<'a>(&self, groups: &'a [MeshGroup]) -> Option<&'a Mesh> {
        groups.get(self.group)?.meshes.get(self.mesh)
    }
}
