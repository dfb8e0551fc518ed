//! Non-stochastic ray caster for quick previews.
//!
//! Shades the nearest hit with a half-strength Lambert term toward the first
//! light. No shadows, no bounces.

use std::time::Instant;

use ember_math::{Ray, Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::path_tracer::check_preconditions;
use crate::{map_one, RandomSampler, RenderParameter, RenderResult, Scene, ShaderParameter};

/// Preview renderer sharing the scene and output types of [`crate::PathTracer`].
#[derive(Debug, Clone)]
pub struct RayTracer {
    sampler: RandomSampler,
}

impl RayTracer {
    pub fn new() -> Self {
        Self {
            sampler: RandomSampler::new(),
        }
    }

    /// Deterministic sample positions.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            sampler: RandomSampler::with_seed(seed),
        }
    }

    /// Color seen along `ray`: background on a miss, otherwise
    /// `map_one(color * max(n.l, 0) * 0.5)`.
    ///
    /// `l` points at the first light; a scene without lights is lit from the
    /// eye.
    pub fn trace(&self, ray: &Ray, scene: &Scene) -> Vec3 {
        let mut param = ShaderParameter::default();
        if !scene.intersect(ray, &mut param) {
            return scene.background_color();
        }

        let to_light = match scene.light_list().first() {
            Some(light) => (light.position() - param.intersect_point).normalize_or_zero(),
            None => -ray.direction.normalize_or_zero(),
        };
        let lambert = param.normal.dot(to_light).max(0.0);
        map_one(param.color * lambert * 0.5).truncate()
    }

    /// Cast `parameter.sample_count()` jittered rays per pixel and write the
    /// mean into the output buffer.
    pub fn render(&mut self, scene: &Scene, parameter: &mut RenderParameter) -> RenderResult<()> {
        let camera = check_preconditions(scene, parameter)?;
        let sample_count = parameter.sample_count();
        self.sampler.generate(sample_count, 1)?;

        let width = scene.width() as usize;
        let start = Instant::now();
        let tracer = &*self;
        let inv_samples = 1.0 / sample_count as f32;

        parameter
            .output_mut()
            .pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let origin = Vec2::new(x as f32, y as f32);
                    let sum: Vec3 = (0..sample_count)
                        .map(|s| {
                            let ray = camera.generate_ray(tracer.sampler.sample(s) + origin);
                            tracer.trace(&ray, scene)
                        })
                        .sum();
                    *pixel = Vec4::from((sum * inv_samples, 1.0));
                }
            });

        log::info!(
            "Ray cast {}x{} at {} spp in {:.2?}",
            scene.width(),
            scene.height(),
            sample_count,
            start.elapsed()
        );
        Ok(())
    }
}

impl Default for RayTracer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ember_core::Material;

    use crate::{Camera, PointLight, RenderError, Sphere};

    fn orange_ball() -> Scene {
        let mut scene = Scene::new(8, 8);
        scene.set_background_color(Vec3::new(0.25, 0.25, 0.5));
        scene.add_primitive(Sphere::new(
            Vec3::ZERO,
            1.0,
            Arc::new(Material::diffuse("orange", Vec3::new(1.0, 0.5, 0.0))),
        ));
        scene.add_light(PointLight::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ONE));
        scene.set_camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
                .with_vfov(40.0),
        );
        scene.update_bvh().unwrap();
        scene
    }

    #[test]
    fn test_trace_miss_and_lit_hit() {
        let scene = orange_ball();
        let tracer = RayTracer::with_seed(1);

        let miss = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Y);
        assert_eq!(tracer.trace(&miss, &scene), Vec3::new(0.25, 0.25, 0.5));

        // Facing the light head on: full Lambert, half strength
        let head_on = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let color = tracer.trace(&head_on, &scene);
        assert!((color - Vec3::new(0.5, 0.25, 0.0)).length() < 1e-5, "{:?}", color);
    }

    #[test]
    fn test_unlit_side_is_black() {
        let mut scene = orange_ball();
        scene.add_primitive(Sphere::new(
            Vec3::new(0.0, 0.0, -20.0),
            1.0,
            Arc::new(Material::diffuse("white", Vec3::ONE)),
        ));
        scene.update_bvh().unwrap();
        let tracer = RayTracer::with_seed(1);

        // Hits the far sphere's back side, which faces away from the light
        let ray = Ray::new(Vec3::new(0.0, 0.0, -30.0), Vec3::Z);
        assert_eq!(tracer.trace(&ray, &scene), Vec3::ZERO);
    }

    #[test]
    fn test_render_background_and_ball() {
        let scene = orange_ball();
        let mut tracer = RayTracer::with_seed(3);
        let mut parameter = RenderParameter::new(8, 8).with_sample_count(4);
        tracer.render(&scene, &mut parameter).unwrap();

        let output = parameter.output();
        assert_eq!(output.get(0, 0), Vec4::new(0.25, 0.25, 0.5, 1.0));

        let center = output.get(4, 4);
        assert!(center.x > 0.0 && center.x > center.y);
        assert_eq!(center.z, 0.0);
        assert_eq!(center.w, 1.0);
    }

    #[test]
    fn test_render_rejects_empty_scene() {
        let mut tracer = RayTracer::new();
        let mut parameter = RenderParameter::new(4, 4);
        assert!(matches!(
            tracer.render(&Scene::new(4, 4), &mut parameter),
            Err(RenderError::EmptyScene)
        ));
    }
}
