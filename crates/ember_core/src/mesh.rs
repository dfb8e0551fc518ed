//! Triangle mesh geometry.
//!
//! A mesh owns vertex, normal, uv and face lists plus the materials that cover
//! its faces. The renderer never copies mesh data: each face becomes a triangle
//! primitive that refers back here through a `MeshId` and a face index.

use std::sync::Arc;

use ember_math::{Aabb, Vec2, Vec3};
use thiserror::Error;

use crate::material::Material;

/// Errors reported by [`Mesh::validate`].
#[derive(Error, Debug, PartialEq)]
pub enum MeshError {
    #[error("Face {face} references vertex {index}, mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Mesh has {actual} normals for {expected} vertices")]
    NormalCountMismatch { expected: usize, actual: usize },

    #[error("Mesh has {actual} uvs, expected {vertices} (per vertex) or {corners} (per face corner)")]
    UvCountMismatch {
        actual: usize,
        vertices: usize,
        corners: usize,
    },
}

/// A mesh consisting of vertex positions, optional normals and uvs, and
/// triangle faces.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Vertex positions. Private so the bounding box stays in sync.
    vertices: Vec<Vec3>,

    /// Vertex normals (empty, or one per vertex)
    pub normals: Vec<Vec3>,

    /// UV coordinates (empty, one per vertex, or one per face corner)
    pub uvs: Vec<Vec2>,

    /// Triangle faces as vertex index triples
    pub faces: Vec<[u32; 3]>,

    /// Materials in face order; each covers `polygon_count` consecutive faces
    pub materials: Vec<Arc<Material>>,

    /// Axis-aligned bounding box of `vertices`
    bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from vertices and faces.
    ///
    /// Normals are NOT computed; call `create_normals()` if the mesh should be
    /// smooth shaded.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        let mut mesh = Self {
            vertices,
            faces,
            ..Default::default()
        };
        mesh.update_box();
        mesh
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    /// Attach uv coordinates (per vertex or per face corner).
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Append a material covering the next `material.polygon_count` faces.
    pub fn add_material(&mut self, material: Arc<Material>) {
        self.materials.push(material);
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Replace the vertex list and refresh the bounding box.
    pub fn set_vertices(&mut self, vertices: Vec<Vec3>) {
        self.vertices = vertices;
        self.update_box();
    }

    /// Bounding box of the current vertices.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Recompute the bounding box by scanning every vertex.
    pub fn update_box(&mut self) {
        self.bounds = self
            .vertices
            .iter()
            .fold(Aabb::EMPTY, |bounds, v| bounds.include_point(*v));
    }

    /// Compute smooth vertex normals by accumulating face normals.
    ///
    /// Each face contributes its unnormalized normal (so larger faces weigh
    /// more) to its three vertices. Faces with out-of-range indices are skipped.
    pub fn create_normals(&mut self) {
        let vertex_count = self.vertices.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in &self.faces {
            let Some([v0, v1, v2]) = self.corner_positions(face) else {
                log::warn!("Skipping face {:?} with out-of-range indices", face);
                continue;
            };
            let face_normal = (v0 - v1).cross(v1 - v2);
            for &i in face {
                normals[i as usize] += face_normal;
            }
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y); // Unreferenced or degenerate
        }

        self.normals = normals;
    }

    /// Check if the mesh has one normal per vertex.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    /// Get the number of faces in the mesh.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Material covering `face_index`.
    ///
    /// Materials cover consecutive face runs in list order, each as long as its
    /// `polygon_count`. Faces past the last run have no material.
    pub fn material_for_face(&self, face_index: usize) -> Option<&Arc<Material>> {
        let mut start = 0;
        for material in &self.materials {
            let end = start + material.polygon_count;
            if face_index >= start && face_index < end {
                return Some(material);
            }
            start = end;
        }
        None
    }

    /// Corner positions of a face, or `None` when the face or an index is out of range.
    pub fn face_vertices(&self, face_index: usize) -> Option<[Vec3; 3]> {
        self.faces
            .get(face_index)
            .and_then(|face| self.corner_positions(face))
    }

    /// Corner normals of a face when the mesh has per-vertex normals.
    pub fn face_normals(&self, face_index: usize) -> Option<[Vec3; 3]> {
        if !self.has_normals() {
            return None;
        }
        let [a, b, c] = *self.faces.get(face_index)?;
        Some([
            *self.normals.get(a as usize)?,
            *self.normals.get(b as usize)?,
            *self.normals.get(c as usize)?,
        ])
    }

    /// Corner uvs of a face.
    ///
    /// A uv list with one entry per face corner (`3 * face_count`) is indexed by
    /// `face * 3 + k`; a list with one entry per vertex is indexed through the face.
    pub fn face_uvs(&self, face_index: usize) -> Option<[Vec2; 3]> {
        if self.uvs.is_empty() {
            return None;
        }
        if self.uvs.len() == self.faces.len() * 3 {
            let base = face_index * 3;
            return Some([
                *self.uvs.get(base)?,
                *self.uvs.get(base + 1)?,
                *self.uvs.get(base + 2)?,
            ]);
        }
        if self.uvs.len() == self.vertices.len() {
            let [a, b, c] = *self.faces.get(face_index)?;
            return Some([
                *self.uvs.get(a as usize)?,
                *self.uvs.get(b as usize)?,
                *self.uvs.get(c as usize)?,
            ]);
        }
        None
    }

    /// Check that faces, normals and uvs are consistent with the vertex list.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        for (face_index, face) in self.faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::FaceIndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count,
                });
            }
        }

        if !self.normals.is_empty() && self.normals.len() != vertex_count {
            return Err(MeshError::NormalCountMismatch {
                expected: vertex_count,
                actual: self.normals.len(),
            });
        }

        let corners = self.faces.len() * 3;
        if !self.uvs.is_empty() && self.uvs.len() != vertex_count && self.uvs.len() != corners {
            return Err(MeshError::UvCountMismatch {
                actual: self.uvs.len(),
                vertices: vertex_count,
                corners,
            });
        }

        Ok(())
    }

    fn corner_positions(&self, face: &[u32; 3]) -> Option<[Vec3; 3]> {
        Some([
            *self.vertices.get(face[0] as usize)?,
            *self.vertices.get(face[1] as usize)?,
            *self.vertices.get(face[2] as usize)?,
        ])
    }
}
