//! The primitive set and the intersection contract every shape implements.

use ember_core::MeshGroup;
use ember_math::{Aabb, Ray};

use crate::{AxisBox, Bvh, Plane, ShaderParameter, Sphere, Triangle};

/// Ray intersection contract shared by every primitive.
///
/// A hit only counts when its distance lies in the ray's `[tmin, tmax]`. Both
/// queries of a shape go through the same hit computation, so
/// `intersects(r) == intersects_with(r, _)` for every ray.
pub trait Shape: Send + Sync {
    /// Any-hit test without shading.
    fn intersects(&self, ray: &Ray, meshes: &[MeshGroup]) -> bool;

    /// Nearest-hit test. On a hit, fills the shading fields of `param`;
    /// on a miss `param` is left untouched.
    fn intersects_with(&self, ray: &Ray, meshes: &[MeshGroup], param: &mut ShaderParameter)
        -> bool;

    /// Axis-aligned bounds. Unbounded shapes return `Aabb::UNIVERSE`.
    fn bounding_box(&self) -> Aabb;

    /// Refresh any cached bounds after the underlying geometry changed.
    fn update_box(&mut self, _meshes: &[MeshGroup]) {}
}

/// Closed set of primitives.
///
/// Using an enum instead of `Box<dyn Shape>` keeps the primitive list a flat
/// `Vec` and dispatch a `match`.
#[derive(Clone, Debug)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
    Triangle(Triangle),
    Box(AxisBox),
    Bvh(Box<Bvh>),
}

impl Primitive {
    /// Returns true if the bounds are finite on every axis.
    pub fn is_bounded(&self) -> bool {
        self.bounding_box().is_bounded()
    }
}

impl Shape for Primitive {
    #[inline]
    fn intersects(&self, ray: &Ray, meshes: &[MeshGroup]) -> bool {
        match self {
            Primitive::Sphere(s) => s.intersects(ray, meshes),
            Primitive::Plane(p) => p.intersects(ray, meshes),
            Primitive::Triangle(t) => t.intersects(ray, meshes),
            Primitive::Box(b) => b.intersects(ray, meshes),
            Primitive::Bvh(bvh) => bvh.intersects(ray, meshes),
        }
    }

    #[inline]
    fn intersects_with(
        &self,
        ray: &Ray,
        meshes: &[MeshGroup],
        param: &mut ShaderParameter,
    ) -> bool {
        match self {
            Primitive::Sphere(s) => s.intersects_with(ray, meshes, param),
            Primitive::Plane(p) => p.intersects_with(ray, meshes, param),
            Primitive::Triangle(t) => t.intersects_with(ray, meshes, param),
            Primitive::Box(b) => b.intersects_with(ray, meshes, param),
            Primitive::Bvh(bvh) => bvh.intersects_with(ray, meshes, param),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Sphere(s) => s.bounding_box(),
            Primitive::Plane(p) => p.bounding_box(),
            Primitive::Triangle(t) => t.bounding_box(),
            Primitive::Box(b) => b.bounding_box(),
            Primitive::Bvh(bvh) => bvh.bounding_box(),
        }
    }

    fn update_box(&mut self, meshes: &[MeshGroup]) {
        match self {
            Primitive::Sphere(s) => s.update_box(meshes),
            Primitive::Plane(p) => p.update_box(meshes),
            Primitive::Triangle(t) => t.update_box(meshes),
            Primitive::Box(b) => b.update_box(meshes),
            Primitive::Bvh(bvh) => bvh.update_box(meshes),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Plane> for Primitive {
    fn from(plane: Plane) -> Self {
        Primitive::Plane(plane)
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}

impl From<AxisBox> for Primitive {
    fn from(aabox: AxisBox) -> Self {
        Primitive::Box(aabox)
    }
}

impl From<Bvh> for Primitive {
    fn from(bvh: Bvh) -> Self {
        Primitive::Bvh(Box::new(bvh))
    }
}
