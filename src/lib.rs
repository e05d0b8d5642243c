//! Procedural planet surface textures.
//!
//! This crate turns a textual seed and a handful of shape parameters into
//! four equal-sized RGBA8 buffers (height, specular, diffuse and a
//! tangent-space normal map) using a seeded multi-octave noise stack and a
//! palette-based color gradient. Generation runs progressively at rising
//! resolutions on a background compute channel.

pub mod export;
pub mod gradient;
pub mod noise;
pub mod pipeline;
pub mod texture;

pub use gradient::{generate_gradient, ColorGradient, ColorStop};
pub use noise::{derive_octaves, evaluate, hash_seed, NoiseSettings, OctaveConfig, ShapeParameters};
pub use pipeline::{PipelineConfig, PipelineEvent, PipelineState, ProgressivePipeline, Regenerate};
pub use texture::{build_normal_map, rasterize, HeightField, TextureSet};
