//! Out-of-line texture computation over a message channel.
//!
//! A [`TextureJob`] owns its input buffers; the worker fills them and sends
//! them back inside a [`ComputeResponse`]. Nothing is shared with the caller
//! except the channel itself.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use image::RgbaImage;
use thiserror::Error;

use crate::gradient::ColorGradient;
use crate::noise::NoiseSettings;
use crate::texture::{build_normal_map, rasterize_into, ConvolutionError, HeightField, RasterBuffers, RasterError};

/// Errors produced while computing a tier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
    #[error("Normal map error: {0}")]
    Convolution(#[from] ConvolutionError),
    #[error("Worker failed: {0}")]
    Worker(String),
    #[error("Task timed out after {0:?}")]
    Timeout(Duration),
    #[error("Worker returned {got}px buffers for a {expected}px request")]
    WrongResolution { expected: u32, got: u32 },
}

/// One compute request.
#[derive(Debug, Clone)]
pub struct TextureJob {
    /// Request id, echoed back in the response.
    pub id: u64,
    pub seed: i32,
    pub settings: NoiseSettings,
    pub gradient: ColorGradient,
    /// Buffers to fill; moved into the worker.
    pub buffers: RasterBuffers,
}

impl TextureJob {
    pub fn resolution(&self) -> u32 {
        self.buffers.resolution()
    }
}

/// Filled buffers returned by a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureOutput {
    pub height: RgbaImage,
    pub specular: RgbaImage,
    pub diffuse: RgbaImage,
    pub normal: RgbaImage,
}

impl TextureOutput {
    /// Side length if all four buffers are square and equal, else `None`.
    pub fn uniform_resolution(&self) -> Option<u32> {
        let (w, h) = self.height.dimensions();
        let all_match = w == h
            && [&self.specular, &self.diffuse, &self.normal]
                .iter()
                .all(|img| img.dimensions() == (w, h));
        all_match.then_some(w)
    }
}

/// Response message for a [`TextureJob`].
#[derive(Debug)]
pub struct ComputeResponse {
    pub id: u64,
    pub resolution: u32,
    pub result: Result<TextureOutput, ComputeError>,
}

/// Computes the texture buffers for a job.
pub trait TextureWorker: Send + Sync {
    fn process(&self, job: TextureJob) -> Result<TextureOutput, ComputeError>;
}

/// Evaluates the noise stack, rasterizes it and derives the normal map.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseTextureWorker;

impl TextureWorker for NoiseTextureWorker {
    fn process(&self, job: TextureJob) -> Result<TextureOutput, ComputeError> {
        let resolution = job.resolution();
        let mut buffers = job.buffers;
        buffers.check_dimensions(resolution)?;

        let field = HeightField::generate(resolution, job.seed, &job.settings);
        rasterize_into(&mut buffers, &field, &job.gradient)?;
        let normal = build_normal_map(&buffers.height)?;

        log::debug!(
            "job {}: {}px, land fraction {:.3}",
            job.id,
            resolution,
            field.land_fraction()
        );

        Ok(TextureOutput {
            height: buffers.height,
            specular: buffers.specular,
            diffuse: buffers.diffuse,
            normal,
        })
    }
}

/// Runs jobs on the rayon pool and collects their responses.
pub struct ComputeChannel {
    worker: Arc<dyn TextureWorker>,
    sender: Sender<ComputeResponse>,
    receiver: Receiver<ComputeResponse>,
}

impl ComputeChannel {
    pub fn new(worker: Arc<dyn TextureWorker>) -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            worker,
            sender,
            receiver,
        }
    }

    /// Queues a job. The response arrives later on this channel.
    pub fn submit(&self, job: TextureJob) {
        let worker = Arc::clone(&self.worker);
        let sender = self.sender.clone();
        let id = job.id;
        let resolution = job.resolution();

        rayon::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| worker.process(job)))
                .unwrap_or_else(|_| Err(ComputeError::Worker("worker panicked".to_string())));
            // The receiver lives as long as the channel owner; a send error
            // only means nobody is listening anymore.
            let _ = sender.send(ComputeResponse { id, resolution, result });
        });
    }

    /// Returns a finished response without blocking.
    pub fn try_recv(&self) -> Option<ComputeResponse> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for a response.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ComputeResponse> {
        self.receiver.recv_timeout(timeout).ok()
    }
}
