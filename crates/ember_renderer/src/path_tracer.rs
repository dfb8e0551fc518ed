//! Monte Carlo path tracing integrator.
//!
//! Each path gathers emission, next-event estimation toward every light and
//! one cosine-weighted indirect bounce, with russian roulette bounding the
//! path length. Rows of the image are traced in parallel with rayon; every
//! row owns an RNG seeded once per pass, so threads never share state.

use std::f32::consts::PI;
use std::time::Instant;

use ember_math::{Ray, Vec2, Vec3, Vec4};
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;

use crate::{
    Camera, RandomSampler, RenderConfig, RenderError, RenderParameter, RenderResult, Scene,
    ShaderParameter,
};

/// Scale a color so its largest channel is at most 1, keeping hue. Alpha is 1.
pub fn map_one(color: Vec3) -> Vec4 {
    let max = color.max_element();
    let mapped = if max > 1.0 { color / max } else { color };
    Vec4::from((mapped, 1.0))
}

/// Cosine-weighted direction in the hemisphere around `normal`.
///
/// `random` is a uniform pair in `[0, 1)^2`. The result is unit length and
/// never points below the surface.
pub fn hemisphere(normal: Vec3, random: Vec2) -> Vec3 {
    let w = normal;
    let u = if w.x.abs() > 0.1 {
        Vec3::Y.cross(w)
    } else {
        Vec3::X.cross(w)
    }
    .normalize();
    let v = w.cross(u);

    let r1 = 2.0 * PI * random.x;
    let r2 = random.y;
    let r2s = r2.sqrt();

    (u * r1.cos() * r2s + v * r1.sin() * r2s + w * (1.0 - r2).sqrt()).normalize()
}

/// CPU path tracer.
#[derive(Debug, Clone)]
pub struct PathTracer {
    config: RenderConfig,
    sampler: RandomSampler,
    /// Source of per-row seeds; OS entropy when `None`
    seeder: Option<StdRng>,
}

impl PathTracer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            sampler: RandomSampler::new(),
            seeder: None,
        }
    }

    /// Deterministic tracer for reproducible renders and tests.
    pub fn with_seed(config: RenderConfig, seed: u64) -> Self {
        Self {
            config,
            sampler: RandomSampler::with_seed(seed),
            seeder: Some(StdRng::seed_from_u64(seed.wrapping_add(0x9e37_79b9_7f4a_7c15))),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Parameter for a camera ray: full bounce budget, no bounces taken.
    pub(crate) fn root_parameter(&self) -> ShaderParameter {
        ShaderParameter::with_depth(self.config.max_depth, self.config.max_depth)
    }

    /// One RNG seed per image row, drawn fresh for every pass.
    pub(crate) fn row_seeds(&mut self, height: u32) -> Vec<u64> {
        match &mut self.seeder {
            Some(seeder) => (0..height).map(|_| seeder.next_u64()).collect(),
            None => (0..height).map(|_| OsRng.next_u64()).collect(),
        }
    }

    /// Radiance arriving along `ray`.
    ///
    /// `param` carries the path's remaining depth in and the hit record out.
    pub fn trace(
        &self,
        ray: &Ray,
        scene: &Scene,
        param: &mut ShaderParameter,
        rng: &mut StdRng,
    ) -> Vec3 {
        if !scene.intersect(ray, param) {
            return scene.background_color();
        }

        // Shade the side the ray arrived from
        if param.normal.dot(ray.direction) >= 0.0 {
            param.normal = -param.normal;
        }

        if param.depth == 0 {
            return param.emissive;
        }

        let mut p = param.color.max_element();
        if param.depth < self.config.roulette_depth {
            p *= 0.5f32.powi((self.config.roulette_depth - param.depth) as i32);
        }
        if param.depth < param.max_depth.saturating_sub(self.config.minimum_path_depth) {
            if rng.gen::<f32>() >= p {
                return param.emissive;
            }
        } else {
            p = 1.0;
        }
        param.depth -= 1;

        let direct = self.illuminate_direct(scene, param, rng);
        let indirect = self.illuminate_indirect(scene, param, rng);

        param.emissive + direct + indirect / p
    }

    /// Next-event estimate: one shadow-tested sample per light.
    pub fn illuminate_direct(
        &self,
        scene: &Scene,
        param: &ShaderParameter,
        rng: &mut StdRng,
    ) -> Vec3 {
        let mut color = Vec3::ZERO;
        for light in scene.light_list() {
            let random = Vec2::new(rng.gen(), rng.gen());
            let Some(sample) = light.sample(param, random) else {
                continue;
            };

            let distance = sample.direction.length();
            if distance <= 0.0 {
                continue;
            }
            let shadow = Ray::with_range(
                param.intersect_point,
                sample.direction / distance,
                self.config.shadow_epsilon,
                distance,
            );
            if scene.occluded(&shadow) {
                continue;
            }

            color += param.color / PI * sample.intensity;
        }
        color
    }

    /// One cosine-weighted bounce, weighted by the surface reflectance.
    pub fn illuminate_indirect(
        &self,
        scene: &Scene,
        param: &ShaderParameter,
        rng: &mut StdRng,
    ) -> Vec3 {
        let direction = hemisphere(param.normal, Vec2::new(rng.gen(), rng.gen()));
        let ray = Ray::with_range(
            param.intersect_point,
            direction,
            self.config.ray_epsilon,
            f32::INFINITY,
        );

        let mut next = ShaderParameter::with_depth(param.depth, param.max_depth);
        next.bounce = param.bounce + 1;

        self.trace(&ray, scene, &mut next, rng) * param.color
    }

    /// Render `parameter.sample_count()` jittered paths per pixel into the
    /// output buffer.
    pub fn render(&mut self, scene: &Scene, parameter: &mut RenderParameter) -> RenderResult<()> {
        let camera = check_preconditions(scene, parameter)?;
        let sample_count = parameter.sample_count();
        self.sampler.generate(sample_count, 1)?;

        let width = scene.width() as usize;
        let seeds = self.row_seeds(scene.height());
        let start = Instant::now();

        let tracer = &*self;
        let inv_samples = 1.0 / sample_count as f32;
        parameter
            .output_mut()
            .pixels
            .par_chunks_mut(width)
            .zip(seeds.par_iter())
            .enumerate()
            .for_each(|(y, (row, &seed))| {
                let mut rng = StdRng::seed_from_u64(seed);
                for (x, pixel) in row.iter_mut().enumerate() {
                    let origin = Vec2::new(x as f32, y as f32);
                    let mut sum = Vec3::ZERO;
                    for s in 0..sample_count {
                        let ray = camera.generate_ray(tracer.sampler.sample(s) + origin);
                        let mut param = tracer.root_parameter();
                        sum += tracer.trace(&ray, scene, &mut param, &mut rng);
                    }
                    *pixel = map_one(sum * inv_samples);
                }
            });

        log::info!(
            "Rendered {}x{} at {} spp in {:.2?}",
            scene.width(),
            scene.height(),
            sample_count,
            start.elapsed()
        );
        Ok(())
    }
}

/// Validate a scene and output buffer before any pixel is touched.
pub(crate) fn check_preconditions<'a>(
    scene: &'a Scene,
    parameter: &RenderParameter,
) -> RenderResult<&'a Camera> {
    let (width, height) = (scene.width(), scene.height());
    if width == 0 || height == 0 {
        return Err(RenderError::ZeroResolution { width, height });
    }
    if scene.primitive_list().is_empty() {
        return Err(RenderError::EmptyScene);
    }
    let camera = scene.camera().ok_or(RenderError::MissingCamera)?;

    let output = parameter.output();
    if output.width != width || output.height != height {
        return Err(RenderError::BufferSizeMismatch {
            width,
            height,
            actual_width: output.width,
            actual_height: output.height,
        });
    }

    if scene.is_bvh_stale() {
        log::warn!("Scene changed since the last BVH build; rendering against the old hierarchy");
    }
    Ok(camera)
}
