//! Ember renderer - CPU path tracing
//!
//! A Monte Carlo path tracer over spheres, planes, boxes and triangle meshes,
//! accelerated by a SAH bounding volume hierarchy. Scenes hold primitives and
//! lights; a [`PathTracer`] renders them either in one shot or progressively,
//! one subpixel pass at a time. [`RayTracer`] is a fast shaded preview.

mod aabox;
mod bvh;
mod camera;
mod config;
mod error;
mod image;
mod light;
mod path_tracer;
mod plane;
mod primitive;
mod progressive;
mod ray_tracer;
mod render_parameter;
mod sampler;
mod scene;
mod shader_parameter;
mod sphere;
mod triangle;

pub use aabox::AxisBox;
pub use bvh::Bvh;
pub use camera::Camera;
pub use config::RenderConfig;
pub use error::{RenderError, RenderResult};
pub use image::{color_to_rgba, linear_to_gamma, ImageBuffer};
pub use light::{AreaLight, Falloff, Light, LightSample, PointLight};
pub use path_tracer::{hemisphere, map_one, PathTracer};
pub use plane::Plane;
pub use primitive::{Primitive, Shape};
pub use progressive::ProgressState;
pub use ray_tracer::RayTracer;
pub use render_parameter::RenderParameter;
pub use sampler::RandomSampler;
pub use scene::{Scene, DEFAULT_BACKGROUND};
pub use shader_parameter::ShaderParameter;
pub use sphere::Sphere;
pub use triangle::{Triangle, TRIANGLE_EPSILON};

/// Re-export the math types used throughout the renderer API
pub use ember_math::{Aabb, Interval, Ray, UVec2, Vec2, Vec3, Vec4};
