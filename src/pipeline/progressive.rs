//! Progressive, tiered texture generation for a single planet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use thiserror::Error;

use super::compute::{ComputeChannel, ComputeError, ComputeResponse, NoiseTextureWorker, TextureJob, TextureWorker};
use super::config::{ConfigError, PipelineConfig};
use super::retire::RetirementQueue;
use crate::gradient::{generate_gradient, ColorGradient};
use crate::noise::{derive_octaves, hash_seed, NoiseError, NoiseSettings, ShapeError, ShapeParameters};
use crate::texture::{RasterBuffers, TextureSet};

/// Errors surfaced by the progressive pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid shape parameters: {0}")]
    Shape(#[from] ShapeError),
    #[error("Invalid noise settings: {0}")]
    Noise(#[from] NoiseError),
    #[error("Quality tier must be at least 1, got {0}")]
    InvalidQualityTier(u32),
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("Generation failed at {resolution}px after {attempts} attempt(s): {source}")]
    GenerationFailed {
        resolution: u32,
        attempts: u32,
        source: ComputeError,
    },
    #[error("Timed out after {0:?} waiting for generation to settle")]
    Timeout(Duration),
}

/// Where a pipeline is in its resolution ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Generating { tier: usize, resolution: u32 },
    Settled,
    Failed,
}

/// Notifications for the consumer of the buffers.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A tier finished and `set` is now current.
    TierReady {
        generation: u64,
        tier: usize,
        resolution: u32,
        set: Arc<TextureSet>,
    },
    /// The last tier finished.
    Settled { generation: u64, resolution: u32 },
    /// A tier failed after its retries; the run stopped.
    GenerationFailed {
        generation: u64,
        resolution: u32,
        error: ComputeError,
    },
}

/// A new generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Regenerate {
    /// Re-derive octaves from new shape parameters.
    Shape(ShapeParameters),
    /// Use an explicit octave list.
    Noise(NoiseSettings),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    request_id: u64,
    tier: usize,
    attempt: u32,
    submitted_at: Instant,
}

/// Drives the resolution ladder for one planet.
///
/// At most one compute task is in flight. Starting a new run bumps the
/// generation id; results tagged with an older request id are dropped
/// on arrival.
pub struct ProgressivePipeline {
    seed: String,
    seed_hash: i32,
    shape: ShapeParameters,
    settings: NoiseSettings,
    gradient: ColorGradient,
    config: PipelineConfig,
    channel: ComputeChannel,
    state: PipelineState,
    generation: u64,
    next_request_id: u64,
    in_flight: Option<InFlight>,
    current: Option<Arc<TextureSet>>,
    retiring: RetirementQueue<TextureSet>,
    last_failure: Option<(u32, u32, ComputeError)>,
}

impl ProgressivePipeline {
    /// Creates an idle pipeline backed by [`NoiseTextureWorker`].
    pub fn new(seed: &str, shape: ShapeParameters, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_worker(seed, shape, config, Arc::new(NoiseTextureWorker))
    }

    /// Creates an idle pipeline with a custom worker.
    pub fn with_worker(
        seed: &str,
        shape: ShapeParameters,
        config: PipelineConfig,
        worker: Arc<dyn TextureWorker>,
    ) -> Result<Self, PipelineError> {
        shape.validate()?;
        config.validate()?;
        let seed_hash = hash_seed(seed);

        Ok(Self {
            seed: seed.to_string(),
            seed_hash,
            shape,
            settings: derive_octaves(&shape),
            gradient: generate_gradient(seed_hash),
            config,
            channel: ComputeChannel::new(worker),
            state: PipelineState::Idle,
            generation: 0,
            next_request_id: 1,
            in_flight: None,
            current: None,
            retiring: RetirementQueue::new(),
            last_failure: None,
        })
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn seed_hash(&self) -> i32 {
        self.seed_hash
    }

    pub fn shape(&self) -> &ShapeParameters {
        &self.shape
    }

    pub fn noise_settings(&self) -> &NoiseSettings {
        &self.settings
    }

    pub fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Id of the current run; 0 before the first run.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The most recently published buffer set.
    pub fn current(&self) -> Option<Arc<TextureSet>> {
        self.current.clone()
    }

    pub fn height_buffer(&self) -> Option<&RgbaImage> {
        self.current.as_deref().map(|set| &set.height)
    }

    pub fn diffuse_buffer(&self) -> Option<&RgbaImage> {
        self.current.as_deref().map(|set| &set.diffuse)
    }

    pub fn specular_buffer(&self) -> Option<&RgbaImage> {
        self.current.as_deref().map(|set| &set.specular)
    }

    pub fn normal_buffer(&self) -> Option<&RgbaImage> {
        self.current.as_deref().map(|set| &set.normal)
    }

    /// Number of superseded sets still waiting for their grace period.
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    /// Starts a new run from the bottom of the ladder.
    ///
    /// Any task still in flight is abandoned; its result will be discarded.
    pub fn start(&mut self, now: Instant) {
        self.generation += 1;
        self.last_failure = None;
        log::info!(
            "generation {} for seed '{}' ({} octave(s), palette {})",
            self.generation,
            self.seed,
            self.settings.len(),
            self.gradient.palette_index()
        );
        self.submit(0, 0, now);
    }

    /// Applies a new request and restarts the ladder.
    ///
    /// The request is validated first; on error nothing changes.
    pub fn regenerate(&mut self, request: Regenerate, now: Instant) -> Result<(), PipelineError> {
        match request {
            Regenerate::Shape(shape) => {
                shape.validate()?;
                self.shape = shape;
                self.settings = derive_octaves(&shape);
            }
            Regenerate::Noise(settings) => {
                settings.validate()?;
                self.settings = settings;
            }
        }
        self.start(now);
        Ok(())
    }

    /// Replaces the octave list and restarts the ladder.
    pub fn set_noise_settings(&mut self, settings: NoiseSettings, now: Instant) -> Result<(), PipelineError> {
        self.regenerate(Regenerate::Noise(settings), now)
    }

    /// Re-derives octaves from new shape parameters and restarts the ladder.
    pub fn set_shape(&mut self, shape: ShapeParameters, now: Instant) -> Result<(), PipelineError> {
        self.regenerate(Regenerate::Shape(shape), now)
    }

    /// Changes the resolution multiplier and restarts the ladder.
    pub fn set_quality_tier(&mut self, quality_tier: u32, now: Instant) -> Result<(), PipelineError> {
        if quality_tier == 0 {
            return Err(PipelineError::InvalidQualityTier(quality_tier));
        }
        let config = PipelineConfig {
            quality_tier,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        self.start(now);
        Ok(())
    }

    fn submit(&mut self, tier: usize, attempt: u32, now: Instant) {
        let resolutions = self.config.resolutions();
        let resolution = resolutions[tier];
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        log::debug!(
            "submitting request {} (generation {}, tier {}, {}px, attempt {})",
            request_id,
            self.generation,
            tier,
            resolution,
            attempt + 1
        );

        self.channel.submit(TextureJob {
            id: request_id,
            seed: self.seed_hash,
            settings: self.settings.clone(),
            gradient: self.gradient.clone(),
            buffers: RasterBuffers::allocate(resolution),
        });
        self.in_flight = Some(InFlight {
            request_id,
            tier,
            attempt,
            submitted_at: now,
        });
        self.state = PipelineState::Generating { tier, resolution };
    }

    /// Processes finished work without blocking.
    ///
    /// Releases expired retired sets, handles any responses that have
    /// arrived and checks the in-flight task for a timeout.
    pub fn poll(&mut self, now: Instant) -> Vec<PipelineEvent> {
        let released = self.retiring.collect(now);
        if released > 0 {
            log::debug!("released {} retired buffer set(s)", released);
        }

        let mut events = Vec::new();
        while let Some(response) = self.channel.try_recv() {
            self.handle_response(response, now, &mut events);
        }
        self.check_timeout(now, &mut events);
        events
    }

    /// Blocks until the current run settles or fails, starting one if idle.
    ///
    /// Returns every event observed while waiting.
    pub fn run_until_settled(&mut self, timeout: Duration) -> Result<Vec<PipelineEvent>, PipelineError> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        if self.state == PipelineState::Idle {
            self.start(Instant::now());
        }

        loop {
            match self.state {
                PipelineState::Settled => return Ok(events),
                PipelineState::Failed => {
                    let (resolution, attempts, source) = self
                        .last_failure
                        .clone()
                        .unwrap_or((0, 0, ComputeError::Worker("unknown failure".to_string())));
                    return Err(PipelineError::GenerationFailed {
                        resolution,
                        attempts,
                        source,
                    });
                }
                PipelineState::Idle | PipelineState::Generating { .. } => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PipelineError::Timeout(timeout));
            }

            let wait = (deadline - now).min(Duration::from_millis(50));
            if let Some(response) = self.channel.recv_timeout(wait) {
                self.handle_response(response, Instant::now(), &mut events);
            }
            events.extend(self.poll(Instant::now()));
        }
    }

    fn handle_response(&mut self, response: ComputeResponse, now: Instant, events: &mut Vec<PipelineEvent>) {
        let in_flight = match self.in_flight.take() {
            Some(f) if f.request_id == response.id => f,
            other => {
                self.in_flight = other;
                log::debug!("discarding stale result for request {}", response.id);
                return;
            }
        };

        let expected = self.config.resolutions()[in_flight.tier];
        let output = match response.result {
            Ok(output) => match output.uniform_resolution() {
                Some(got) if got == expected => output,
                Some(got) => {
                    self.fail_or_retry(in_flight, ComputeError::WrongResolution { expected, got }, now, events);
                    return;
                }
                None => {
                    self.fail_or_retry(in_flight, ComputeError::WrongResolution { expected, got: 0 }, now, events);
                    return;
                }
            },
            Err(error) => {
                self.fail_or_retry(in_flight, error, now, events);
                return;
            }
        };

        let set = self.publish(
            TextureSet {
                generation: self.generation,
                resolution: expected,
                height: output.height,
                specular: output.specular,
                diffuse: output.diffuse,
                normal: output.normal,
            },
            now,
        );
        log::info!("tier {} ready at {}px", in_flight.tier, expected);
        events.push(PipelineEvent::TierReady {
            generation: self.generation,
            tier: in_flight.tier,
            resolution: expected,
            set,
        });

        if in_flight.tier + 1 < self.config.tier_count as usize {
            self.submit(in_flight.tier + 1, 0, now);
        } else {
            self.state = PipelineState::Settled;
            log::info!("generation {} settled at {}px", self.generation, expected);
            events.push(PipelineEvent::Settled {
                generation: self.generation,
                resolution: expected,
            });
        }
    }

    fn check_timeout(&mut self, now: Instant, events: &mut Vec<PipelineEvent>) {
        let timed_out = self
            .in_flight
            .map(|f| now.saturating_duration_since(f.submitted_at) >= self.config.task_timeout)
            .unwrap_or(false);
        if !timed_out {
            return;
        }
        if let Some(in_flight) = self.in_flight.take() {
            self.fail_or_retry(in_flight, ComputeError::Timeout(self.config.task_timeout), now, events);
        }
    }

    fn fail_or_retry(&mut self, in_flight: InFlight, error: ComputeError, now: Instant, events: &mut Vec<PipelineEvent>) {
        let resolution = self.config.resolutions()[in_flight.tier];
        if in_flight.attempt < self.config.max_retries {
            log::warn!("tier {} ({}px) failed: {}; retrying", in_flight.tier, resolution, error);
            self.submit(in_flight.tier, in_flight.attempt + 1, now);
            return;
        }

        log::error!(
            "tier {} ({}px) failed after {} attempt(s): {}",
            in_flight.tier,
            resolution,
            in_flight.attempt + 1,
            error
        );
        self.state = PipelineState::Failed;
        self.last_failure = Some((resolution, in_flight.attempt + 1, error.clone()));
        events.push(PipelineEvent::GenerationFailed {
            generation: self.generation,
            resolution,
            error,
        });
    }

    fn publish(&mut self, set: TextureSet, now: Instant) -> Arc<TextureSet> {
        let set = Arc::new(set);
        if let Some(previous) = self.current.replace(Arc::clone(&set)) {
            self.retiring.schedule(previous, now + self.config.retire_delay);
        }
        set
    }
}
