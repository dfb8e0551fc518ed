//! Render configuration.
//!
//! Every field has a default, so a JSON file only needs to name what it changes:
//!
//! ```json
//! { "width": 320, "height": 240, "sample_count": 16 }
//! ```

use std::path::Path;

use ember_math::{UVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::RenderResult;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Paths per pixel
    pub sample_count: usize,
    /// Subpixel grid used by progressive rendering
    pub super_sampling: UVec2,
    /// Bounce budget of a path
    pub max_depth: u32,
    /// Bounces taken before russian roulette may end a path
    pub minimum_path_depth: u32,
    /// Below this remaining depth the survival probability is halved per level
    pub roulette_depth: u32,
    /// Near limit of bounce rays
    pub ray_epsilon: f32,
    /// Near limit of shadow rays
    pub shadow_epsilon: f32,
    /// Radiance of rays that leave the scene
    pub background: Vec3,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            sample_count: 64,
            super_sampling: UVec2::new(2, 2),
            max_depth: 32,
            minimum_path_depth: 2,
            roulette_depth: 16,
            ray_epsilon: 1e-3,
            shadow_epsilon: 1e-3,
            background: Vec3::splat(0.1),
        }
    }
}

impl RenderConfig {
    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
