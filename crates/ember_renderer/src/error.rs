//! Errors returned by render entry points and scene setup.

use ember_core::MeshError;
use thiserror::Error;

/// Precondition failures. Geometric misses are never errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Scene has no primitives")]
    EmptyScene,

    #[error("Image resolution must be non-zero, got {width}x{height}")]
    ZeroResolution { width: u32, height: u32 },

    #[error("Scene has no camera")]
    MissingCamera,

    #[error("Output buffer is {actual_width}x{actual_height}, scene is {width}x{height}")]
    BufferSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Sample set is empty ({sample_count} samples x {pixel_count} pixels)")]
    EmptySampleSet {
        sample_count: usize,
        pixel_count: usize,
    },

    #[error("Invalid mesh {mesh} in group {group}: {source}")]
    InvalidMesh {
        group: usize,
        mesh: usize,
        #[source]
        source: MeshError,
    },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
