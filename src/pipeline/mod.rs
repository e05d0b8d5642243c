//! Progressive generation pipeline.
//!
//! Runs the noise, raster and normal-map passes at rising resolutions on
//! a background compute channel, publishing each finished tier and
//! retiring the buffers it replaces after a grace period.

mod compute;
mod config;
mod progressive;
mod retire;

pub use compute::{
    ComputeChannel, ComputeError, ComputeResponse, NoiseTextureWorker, TextureJob, TextureOutput, TextureWorker,
};
pub use config::{ConfigError, PipelineConfig, MAX_RESOLUTION, MAX_TIERS};
pub use progressive::{PipelineError, PipelineEvent, PipelineState, ProgressivePipeline, Regenerate};
pub use retire::RetirementQueue;
