//! Progressive rendering, one subpixel pass per call.
//!
//! A round visits every cell of the `ssx x ssy` subpixel grid, tracing one path
//! per pixel through the cell center. The output buffer is refreshed at the end
//! of each round, so a host can display the image while it converges.

use std::time::Instant;

use ember_math::{UVec2, Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::path_tracer::check_preconditions;
use crate::{map_one, ImageBuffer, PathTracer, RenderParameter, RenderResult, Scene};

/// Accumulation and counters carried between progressive passes.
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    current_sample_count: usize,
    subpixel: UVec2,
    max_sample_count: Option<usize>,
    accumulation: ImageBuffer,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all progress; the next pass starts a new image.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Completed rounds.
    pub fn current_sample_count(&self) -> usize {
        self.current_sample_count
    }

    /// Round budget, known once the first pass ran.
    pub fn max_sample_count(&self) -> Option<usize> {
        self.max_sample_count
    }

    /// Subpixel cell the next pass traces through.
    pub fn subpixel(&self) -> UVec2 {
        self.subpixel
    }

    pub fn is_finished(&self) -> bool {
        self.max_sample_count
            .is_some_and(|max| self.current_sample_count >= max)
    }

    /// Unnormalized radiance sums; alpha counts the paths per pixel.
    pub fn accumulation(&self) -> &ImageBuffer {
        &self.accumulation
    }
}

impl PathTracer {
    /// Trace one subpixel pass.
    ///
    /// Returns `Ok(true)` when a pass was traced and `Ok(false)` once all
    /// `sample_count / (ssx * ssy)` rounds are done (at least one round).
    pub fn progress_render(
        &mut self,
        scene: &Scene,
        parameter: &mut RenderParameter,
        state: &mut ProgressState,
    ) -> RenderResult<bool> {
        let camera = check_preconditions(scene, parameter)?;
        let grid = parameter.super_sampling_count();
        let (width, height) = (scene.width(), scene.height());

        // A resized output restarts even a finished run
        let resized = state.accumulation.width != width || state.accumulation.height != height;
        if resized {
            state.max_sample_count = None;
        }

        if state.is_finished() {
            state.subpixel = UVec2::ZERO;
            return Ok(false);
        }

        if state.max_sample_count.is_none() {
            let rounds = parameter.sample_count() / (grid.x * grid.y) as usize;
            state.max_sample_count = Some(rounds.max(1));
            state.current_sample_count = 0;
            state.subpixel = UVec2::ZERO;
            state.accumulation = ImageBuffer::new(width, height);
            log::debug!(
                "Progressive render started: {} rounds of {}x{} subpixels",
                rounds.max(1),
                grid.x,
                grid.y
            );
        }
        if state.subpixel.x >= grid.x || state.subpixel.y >= grid.y {
            state.subpixel = UVec2::ZERO;
        }

        let subpixel = state.subpixel;
        let round_end = subpixel.x == grid.x - 1 && subpixel.y == grid.y - 1;
        let offset = (subpixel.as_vec2() + Vec2::splat(0.5)) / grid.as_vec2();
        let paths = (state.current_sample_count + 1) * (grid.x * grid.y) as usize;
        let inv_paths = 1.0 / paths as f32;

        let seeds = self.row_seeds(height);
        let start = Instant::now();
        let tracer = &*self;
        let row = width as usize;

        state
            .accumulation
            .pixels
            .par_chunks_mut(row)
            .zip(parameter.output_mut().pixels.par_chunks_mut(row))
            .zip(seeds.par_iter())
            .enumerate()
            .for_each(|(y, ((sums, out), &seed))| {
                let mut rng = StdRng::seed_from_u64(seed);
                for (x, (sum, pixel)) in sums.iter_mut().zip(out.iter_mut()).enumerate() {
                    let ray = camera.generate_ray(Vec2::new(x as f32, y as f32) + offset);
                    let mut param = tracer.root_parameter();
                    let color: Vec3 = tracer.trace(&ray, scene, &mut param, &mut rng);
                    *sum += Vec4::from((color, 1.0));
                    if round_end {
                        *pixel = map_one(sum.truncate() * inv_paths);
                    }
                }
            });

        if round_end {
            state.current_sample_count += 1;
            state.subpixel = UVec2::ZERO;
            log::debug!(
                "Progressive round {} done in {:.2?}",
                state.current_sample_count,
                start.elapsed()
            );
        } else if subpixel.x + 1 == grid.x {
            state.subpixel = UVec2::new(0, subpixel.y + 1);
        } else {
            state.subpixel.x += 1;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ember_core::Material;

    use crate::{AreaLight, Camera, Plane, RenderConfig, RenderError, Sphere};

    fn small_scene() -> Scene {
        let mut scene = Scene::new(16, 16);
        scene.set_background_color(Vec3::new(0.25, 0.25, 0.5));
        scene.add_primitive(Sphere::new(
            Vec3::ZERO,
            100.0,
            Arc::new(Material::diffuse("red", Vec3::new(0.9, 0.1, 0.1))),
        ));
        scene.add_primitive(Plane::new(
            Vec3::new(0.0, -50.0, 0.0),
            Vec3::Y,
            Arc::new(Material::diffuse("green", Vec3::new(0.1, 0.8, 0.1))),
        ));
        scene.add_light(AreaLight::new(
            Vec3::new(-25.0, 300.0, -25.0),
            Vec3::new(50.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 50.0),
        ));
        scene.set_camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 200.0, 600.0), Vec3::ZERO, Vec3::Y)
                .with_vfov(40.0),
        );
        scene.update_bvh().unwrap();
        scene
    }

    #[test]
    fn test_pass_count_and_termination() {
        let scene = small_scene();
        let mut tracer = PathTracer::with_seed(RenderConfig::default(), 3);
        let mut parameter = RenderParameter::new(16, 16)
            .with_sample_count(12)
            .with_super_sampling(UVec2::new(2, 2));
        let mut state = ProgressState::new();

        let mut passes = 0;
        while tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap()
        {
            passes += 1;
            assert!(passes <= 12, "progressive render never finished");
        }

        // 12 samples over a 2x2 grid is 3 rounds of 4 passes
        assert_eq!(passes, 12);
        assert_eq!(state.max_sample_count(), Some(3));
        assert_eq!(state.current_sample_count(), 3);
        assert_eq!(state.subpixel(), UVec2::ZERO);
        assert!(state.is_finished());

        // Stays finished
        assert!(!tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap());
        assert_eq!(state.accumulation().get(0, 0).w, 12.0);
    }

    #[test]
    fn test_output_updates_at_round_end() {
        let scene = small_scene();
        let mut tracer = PathTracer::with_seed(RenderConfig::default(), 5);
        let mut parameter = RenderParameter::new(16, 16)
            .with_sample_count(4)
            .with_super_sampling(UVec2::new(2, 2));
        let mut state = ProgressState::new();

        for _ in 0..3 {
            assert!(tracer
                .progress_render(&scene, &mut parameter, &mut state)
                .unwrap());
            assert_eq!(parameter.output().get(0, 0), Vec4::ZERO);
        }
        assert!(tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap());
        assert_eq!(
            parameter.output().get(0, 0),
            Vec4::new(0.25, 0.25, 0.5, 1.0)
        );
    }

    #[test]
    fn test_budget_smaller_than_grid_runs_one_round() {
        let scene = small_scene();
        let mut tracer = PathTracer::with_seed(RenderConfig::default(), 5);
        let mut parameter = RenderParameter::new(16, 16)
            .with_sample_count(1)
            .with_super_sampling(UVec2::new(3, 2));
        let mut state = ProgressState::new();

        let mut passes = 0;
        while tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap()
        {
            passes += 1;
        }
        assert_eq!(passes, 6);
        assert_eq!(state.max_sample_count(), Some(1));
    }

    #[test]
    fn test_reset_starts_over() {
        let scene = small_scene();
        let mut tracer = PathTracer::with_seed(RenderConfig::default(), 5);
        let mut parameter = RenderParameter::new(16, 16).with_sample_count(1);
        let mut state = ProgressState::new();

        assert!(tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap());
        assert!(!tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap());

        state.reset();
        assert_eq!(state.max_sample_count(), None);
        assert!(tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap());
    }

    #[test]
    fn test_progressive_matches_single_shot() {
        let scene = small_scene();
        let config = RenderConfig {
            sample_count: 16,
            ..Default::default()
        };

        let mut tracer = PathTracer::with_seed(config.clone(), 21);
        let mut single = RenderParameter::new(16, 16).with_sample_count(16);
        tracer.render(&scene, &mut single).unwrap();

        let mut progressive = RenderParameter::new(16, 16)
            .with_sample_count(16)
            .with_super_sampling(UVec2::new(2, 2));
        let mut state = ProgressState::new();
        while tracer
            .progress_render(&scene, &mut progressive, &mut state)
            .unwrap()
        {}

        let a = single.output().mean_rgb();
        let b = progressive.output().mean_rgb();
        assert!((a - b).abs().max_element() < 0.05, "{:?} vs {:?}", a, b);

        let var_a = single.output().variance_rgb().element_sum();
        let var_b = progressive.output().variance_rgb().element_sum();
        assert!(var_a > 0.0 && var_b > 0.0);
        assert!(
            (var_a - var_b).abs() < 0.25 * var_a.max(var_b) + 1e-3,
            "variance {} vs {}",
            var_a,
            var_b
        );
    }

    #[test]
    fn test_resized_output_restarts_finished_run() {
        let mut scene = small_scene();
        let mut tracer = PathTracer::with_seed(RenderConfig::default(), 8);
        let mut parameter = RenderParameter::new(16, 16).with_sample_count(1);
        let mut state = ProgressState::new();

        while tracer
            .progress_render(&scene, &mut parameter, &mut state)
            .unwrap()
        {}
        assert!(state.is_finished());

        scene.set_resolution(8, 8);
        let mut smaller = RenderParameter::new(8, 8).with_sample_count(1);
        assert!(tracer
            .progress_render(&scene, &mut smaller, &mut state)
            .unwrap());
        assert_eq!(state.accumulation().width, 8);
        assert_eq!(state.current_sample_count(), 1);
        assert!(!tracer
            .progress_render(&scene, &mut smaller, &mut state)
            .unwrap());
    }

    #[test]
    fn test_progress_render_rejects_empty_scene() {
        let scene = Scene::new(4, 4);
        let mut tracer = PathTracer::with_seed(RenderConfig::default(), 1);
        let mut parameter = RenderParameter::new(4, 4);
        let mut state = ProgressState::new();
        assert!(matches!(
            tracer.progress_render(&scene, &mut parameter, &mut state),
            Err(RenderError::EmptyScene)
        ));
    }
}
