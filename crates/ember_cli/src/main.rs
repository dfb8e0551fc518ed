use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ember_renderer::{PathTracer, ProgressState, RayTracer, RenderConfig, RenderParameter, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SampleScene {
    /// Two spheres over a ground plane
    Spheres,
    /// Triangle mesh and three spheres over a ground plane
    Mesh,
}

#[derive(Debug, Parser)]
#[command(name = "ember", about = "Render a sample scene with the Ember path tracer")]
struct Args {
    /// Scene to render
    #[arg(long, value_enum, default_value = "spheres")]
    scene: SampleScene,

    /// JSON render config; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Paths per pixel
    #[arg(short, long)]
    samples: Option<usize>,

    /// Render in subpixel passes instead of one shot
    #[arg(short, long, conflicts_with = "preview")]
    progressive: bool,

    /// Shaded ray-cast preview instead of path tracing
    #[arg(long)]
    preview: bool,

    /// Output PNG path
    #[arg(short, long, default_value = "ember.png")]
    output: PathBuf,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => RenderConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(samples) = self.samples {
            config.sample_count = samples;
        }
        Ok(config)
    }
}

fn build_scene(kind: SampleScene, config: &RenderConfig) -> Result<Scene> {
    let mut scene = match kind {
        SampleScene::Spheres => Scene::sample_spheres(config.width, config.height),
        SampleScene::Mesh => Scene::sample_mesh(config.width, config.height),
    };
    scene.set_background_color(config.background);
    scene.update_bvh()?;
    Ok(scene)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = args.render_config()?;
    let scene = build_scene(args.scene, &config)?;
    log::info!(
        "Scene {:?}: {} primitives, {} lights",
        args.scene,
        scene.primitive_list().len(),
        scene.light_list().len()
    );

    let mut tracer = PathTracer::new(config.clone());
    let mut parameter = RenderParameter::from_config(&config);
    let start = Instant::now();

    if args.preview {
        RayTracer::new().render(&scene, &mut parameter)?;
    } else if args.progressive {
        let mut state = ProgressState::new();
        let mut last_round = 0;
        while tracer.progress_render(&scene, &mut parameter, &mut state)? {
            if state.current_sample_count() != last_round {
                last_round = state.current_sample_count();
                log::info!(
                    "Round {}/{}",
                    last_round,
                    state.max_sample_count().unwrap_or(last_round)
                );
            }
        }
    } else {
        tracer.render(&scene, &mut parameter)?;
    }
    log::info!("Render finished in {:.2?}", start.elapsed());

    let image = image::RgbaImage::from_raw(config.width, config.height, parameter.to_rgba8())
        .context("output buffer does not match the image size")?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("Wrote {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["ember", "--width", "32", "--samples", "4", "--scene", "mesh"]);
        let config = args.render_config().unwrap();
        assert_eq!(config.width, 32);
        assert_eq!(config.height, RenderConfig::default().height);
        assert_eq!(config.sample_count, 4);
        assert_eq!(args.scene, SampleScene::Mesh);
        assert!(!args.progressive);
        assert!(!args.preview);
    }

    #[test]
    fn test_preview_conflicts_with_progressive() {
        assert!(Args::try_parse_from(["ember", "--preview"]).is_ok());
        assert!(Args::try_parse_from(["ember", "--preview", "--progressive"]).is_err());
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let args = Args::parse_from(["ember", "--config", "/nonexistent/ember.json"]);
        assert!(args.render_config().is_err());
    }

    #[test]
    fn test_sample_scenes_build() {
        let config = RenderConfig {
            width: 8,
            height: 6,
            ..Default::default()
        };
        for kind in [SampleScene::Spheres, SampleScene::Mesh] {
            let scene = build_scene(kind, &config).unwrap();
            assert!(!scene.is_bvh_stale());
            assert_eq!(scene.background_color(), config.background);
            assert_eq!(scene.width(), 8);
        }
    }
}
