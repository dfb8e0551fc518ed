//! Ember Core - geometry and surface data shared by the renderer and its hosts.
//!
//! This crate provides:
//!
//! - **Geometry**: `Mesh` (vertex/normal/uv/face lists) grouped into `MeshGroup`s
//! - **Handles**: `MeshId`, a stable `(group, mesh)` index into a mesh arena
//! - **Surfaces**: `Material` and `Texture`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ember_core::{Material, Mesh, MeshGroup};
//!
//! let mut mesh = Mesh::new(vertices, faces);
//! mesh.create_normals();
//! mesh.add_material(Arc::new(Material::diffuse("grey", Vec3::splat(0.5))));
//! let group = MeshGroup::from_mesh(mesh);
//! ```

pub mod material;
pub mod mesh;
pub mod mesh_group;
pub mod texture;

// Re-export commonly used types
pub use material::Material;
pub use mesh::{Mesh, MeshError};
pub use mesh_group::{MeshGroup, MeshId};
pub use texture::{Texture, TextureError, TextureResult};
