//! Seeded octave-stack evaluation.

use glam::{Quat, Vec3};
use simdnoise::NoiseBuilder;

use super::octave::{NoiseSettings, OctaveConfig};

/// Seed offset between consecutive octaves.
const OCTAVE_SEED_STRIDE: i32 = 31337;
/// Frequency multiplier between passes.
const LACUNARITY: f32 = 2.0;
/// How far each pass displaces the sample point.
const WARP_STRENGTH: f32 = 0.35;
/// Width of the smooth-max blend used by soft thresholds.
const SOFT_BAND: f32 = 0.08;

/// Seeded 3-D simplex noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededNoise {
    seed: i32,
}

impl SeededNoise {
    pub fn new(seed: i32) -> Self {
        Self { seed }
    }

    /// Samples noise at `p`, clamped to [-1, 1].
    pub fn sample(&self, p: Vec3) -> f32 {
        let value = NoiseBuilder::fbm_3d_offset(p.x, 1, p.y, 1, p.z, 1)
            .with_seed(self.seed)
            .with_freq(1.0)
            .with_octaves(1)
            .generate()
            .0[0];
        value.clamp(-1.0, 1.0)
    }
}

/// Runs the fBm passes of a single octave and returns a value in [0, 1].
fn octave_value(noise: &SeededNoise, octave: &OctaveConfig, coordinate: Vec3) -> f32 {
    let rotation = Quat::from_rotation_y(octave.shift_degrees.to_radians());
    let mut p = rotation * coordinate;
    let mut frequency = octave.roughness;
    let mut amplitude = 1.0f32;
    let mut total = 0.0f32;
    let mut max_amplitude = 0.0f32;

    for _ in 0..octave.passes {
        let n = noise.sample(p * frequency);
        total += (n + 1.0) * 0.5 * amplitude;
        max_amplitude += amplitude;
        amplitude *= octave.resistance;
        frequency *= LACUNARITY;
        p += Vec3::splat(n * WARP_STRENGTH);
    }

    if max_amplitude > 0.0 {
        (total / max_amplitude).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Applies an octave's sea-level threshold.
///
/// Hard clamping zeroes everything below `min`. Soft clamping takes a
/// polynomial smooth maximum against zero so values near the threshold
/// fade out instead of being cut.
pub fn apply_threshold(value: f32, min: f32, hard: bool) -> f32 {
    let above = value - min;
    if hard {
        return above.max(0.0);
    }
    let h = (0.5 + 0.5 * above / SOFT_BAND).clamp(0.0, 1.0);
    above * h + SOFT_BAND * h * (1.0 - h)
}

/// Mask the first octave imposes on the ones after it.
fn layer_mask(first: f32, hard: bool) -> f32 {
    if hard {
        if first > 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        let t = (first / SOFT_BAND).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}

/// Evaluates the octave stack at a point on the unit sphere.
///
/// Returns an elevation in [0, 1]; 0 means at or below sea level.
pub fn evaluate(seed: i32, settings: &NoiseSettings, coordinate: Vec3) -> f32 {
    let mut elevation = 0.0f32;
    let mut mask = 1.0f32;

    for (i, octave) in settings.octaves.iter().enumerate() {
        let noise = SeededNoise::new(seed.wrapping_add(i as i32 * OCTAVE_SEED_STRIDE));
        let raw = octave_value(&noise, octave, coordinate);
        let value = apply_threshold(raw, octave.min_threshold, octave.hard_clamp);

        if i == 0 {
            mask = layer_mask(value, octave.hard_clamp);
            elevation += value * octave.strength;
        } else {
            elevation += value * octave.strength * mask;
        }
    }

    elevation.clamp(0.0, 1.0)
}
