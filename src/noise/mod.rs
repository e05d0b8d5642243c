//! Noise generation for planetary height fields.
//!
//! A textual seed is hashed to an `i32`, shape parameters are turned into
//! an ordered octave stack, and the stack is evaluated with seeded
//! simplex noise from simdnoise.

mod octave;
mod seed;
mod stack;

pub use octave::{
    derive_octaves, NoiseError, NoiseSettings, OctaveConfig, ShapeError, ShapeParameters, MAX_OCTAVES,
};
pub use seed::hash_seed;
pub use stack::{apply_threshold, evaluate, SeededNoise};
