//! Shape parameters and the octave list derived from them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of octaves a [`NoiseSettings`] may hold.
pub const MAX_OCTAVES: usize = 3;

/// Errors raised when shape parameters are out of range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("Sea level must be a finite percentage in 0..=100, got {0}")]
    SeaLevel(f32),
    #[error("Land mass size must be a finite percentage in 0..=100, got {0}")]
    LandMass(f32),
}

/// Errors raised when a noise override is malformed.
#[derive(Error, Debug)]
pub enum NoiseError {
    #[error("Noise settings must contain 1..={max} octaves, got {0}", max = MAX_OCTAVES)]
    OctaveCount(usize),
    #[error("Octave {index}: {reason}")]
    InvalidOctave { index: usize, reason: String },
    #[error("Malformed noise settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-facing knobs describing the planet's overall shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeParameters {
    /// Roughness ordinal. Tiers above 1 and 2 add mid and coarse octaves.
    pub roughness_tier: u32,
    /// Sea level as a percentage (0-100). Drives every octave's threshold.
    pub sea_level_percent: f32,
    /// Land mass size as a percentage (0-100). Lowers the fine octave's frequency.
    pub land_mass_size: f32,
}

impl Default for ShapeParameters {
    fn default() -> Self {
        Self {
            roughness_tier: 2,
            sea_level_percent: 25.0,
            land_mass_size: 80.0,
        }
    }
}

impl ShapeParameters {
    /// Creates validated shape parameters.
    pub fn new(roughness_tier: u32, sea_level_percent: f32, land_mass_size: f32) -> Result<Self, ShapeError> {
        let shape = Self {
            roughness_tier,
            sea_level_percent,
            land_mass_size,
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Checks that both percentages are finite and within 0..=100.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if !is_percentage(self.sea_level_percent) {
            return Err(ShapeError::SeaLevel(self.sea_level_percent));
        }
        if !is_percentage(self.land_mass_size) {
            return Err(ShapeError::LandMass(self.land_mass_size));
        }
        Ok(())
    }

    /// Draws a random planet shape for batch generation.
    ///
    /// Any roughness tier up to 3, whole-percent sea level below 50 and
    /// whole-percent land mass below 100.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            roughness_tier: rng.gen_range(0..=3),
            sea_level_percent: rng.gen_range(0..50) as f32,
            land_mass_size: rng.gen_range(0..100) as f32,
        }
    }

    /// Threshold shared by every derived octave.
    pub fn min_threshold(&self) -> f32 {
        self.sea_level_percent * 0.01
    }
}

fn is_percentage(v: f32) -> bool {
    v.is_finite() && (0.0..=100.0).contains(&v)
}

/// One layer of the noise stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctaveConfig {
    /// Rotation of the sample point about the polar axis, in degrees.
    pub shift_degrees: f32,
    /// Number of fBm passes (domain-warp steps).
    pub passes: u32,
    /// Weight of this octave in the final elevation.
    pub strength: f32,
    /// Starting frequency of the first pass.
    pub roughness: f32,
    /// Amplitude falloff per pass.
    pub resistance: f32,
    /// Values below this are treated as sea.
    pub min_threshold: f32,
    /// Cut sub-threshold values to zero instead of fading them out.
    pub hard_clamp: bool,
}

impl OctaveConfig {
    fn validate(&self, index: usize) -> Result<(), NoiseError> {
        let invalid = |reason: &str| NoiseError::InvalidOctave {
            index,
            reason: reason.to_string(),
        };
        if self.passes == 0 {
            return Err(invalid("passes must be at least 1"));
        }
        let fields = [
            ("shift_degrees", self.shift_degrees),
            ("strength", self.strength),
            ("roughness", self.roughness),
            ("resistance", self.resistance),
            ("min_threshold", self.min_threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(invalid(&format!("{} must be finite, got {}", name, value)));
            }
        }
        if self.roughness < 0.0 {
            return Err(invalid("roughness must not be negative"));
        }
        Ok(())
    }
}

/// Ordered octave list, coarse to fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoiseSettings {
    pub octaves: Vec<OctaveConfig>,
}

impl NoiseSettings {
    /// Wraps an octave list after validating it.
    pub fn new(octaves: Vec<OctaveConfig>) -> Result<Self, NoiseError> {
        let settings = Self { octaves };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), NoiseError> {
        if self.octaves.is_empty() || self.octaves.len() > MAX_OCTAVES {
            return Err(NoiseError::OctaveCount(self.octaves.len()));
        }
        for (i, octave) in self.octaves.iter().enumerate() {
            octave.validate(i)?;
        }
        Ok(())
    }

    /// Parses and validates a JSON octave array.
    pub fn from_json(json: &str) -> Result<Self, NoiseError> {
        let settings: NoiseSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, NoiseError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.octaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octaves.is_empty()
    }
}

/// Derives the octave stack for a shape.
///
/// The fine octave is always present. Roughness tier 2 prepends a mid
/// octave and tier 3+ additionally prepends a coarse one, so the list
/// stays ordered coarse to fine.
pub fn derive_octaves(shape: &ShapeParameters) -> NoiseSettings {
    let min_threshold = shape.min_threshold();
    let mut octaves = vec![OctaveConfig {
        shift_degrees: 5.0,
        passes: 14,
        strength: 0.65,
        roughness: 2.1 - shape.land_mass_size * 0.02,
        resistance: 0.6,
        min_threshold,
        hard_clamp: true,
    }];

    if shape.roughness_tier > 1 {
        octaves.insert(
            0,
            OctaveConfig {
                shift_degrees: 18.0,
                passes: 15,
                strength: 0.45,
                roughness: 0.3,
                resistance: 0.65,
                min_threshold,
                hard_clamp: true,
            },
        );
    }

    if shape.roughness_tier > 2 {
        octaves.insert(
            0,
            OctaveConfig {
                shift_degrees: 0.0,
                passes: 10,
                strength: 0.8,
                roughness: 0.6,
                resistance: 0.7,
                min_threshold,
                hard_clamp: true,
            },
        );
    }

    NoiseSettings { octaves }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shape(tier: u32) -> ShapeParameters {
        ShapeParameters::new(tier, 25.0, 80.0).unwrap()
    }

    #[test]
    fn test_octave_count_law() {
        assert_eq!(derive_octaves(&shape(0)).len(), 1);
        assert_eq!(derive_octaves(&shape(1)).len(), 1);
        assert_eq!(derive_octaves(&shape(2)).len(), 2);
        assert_eq!(derive_octaves(&shape(3)).len(), 3);
        assert_eq!(derive_octaves(&shape(7)).len(), 3);
    }

    #[test]
    fn test_octaves_ordered_coarse_to_fine() {
        let settings = derive_octaves(&shape(3));
        let shifts: Vec<f32> = settings.octaves.iter().map(|o| o.shift_degrees).collect();
        assert_eq!(shifts, vec![0.0, 18.0, 5.0]);
        let passes: Vec<u32> = settings.octaves.iter().map(|o| o.passes).collect();
        assert_eq!(passes, vec![10, 15, 14]);
    }

    #[test]
    fn test_fine_octave_values() {
        let settings = derive_octaves(&ShapeParameters::new(0, 40.0, 50.0).unwrap());
        let fine = settings.octaves[0];
        assert_eq!(fine.passes, 14);
        assert_eq!(fine.strength, 0.65);
        assert!((fine.roughness - 1.1).abs() < 1e-6);
        assert_eq!(fine.resistance, 0.6);
        assert!((fine.min_threshold - 0.4).abs() < 1e-6);
        assert!(fine.hard_clamp);
    }

    #[test]
    fn test_sea_level_changes_threshold_not_count() {
        let low = derive_octaves(&ShapeParameters::new(3, 10.0, 80.0).unwrap());
        let high = derive_octaves(&ShapeParameters::new(3, 60.0, 80.0).unwrap());
        assert_eq!(low.len(), high.len());
        for (a, b) in low.octaves.iter().zip(high.octaves.iter()) {
            assert!(a.min_threshold < b.min_threshold);
            assert_eq!(a.roughness, b.roughness);
        }
    }

    #[test]
    fn test_derivation_is_pure() {
        let s = shape(3);
        assert_eq!(derive_octaves(&s), derive_octaves(&s));
    }

    #[test]
    fn test_shape_validation() {
        assert!(ShapeParameters::new(0, 0.0, 100.0).is_ok());
        assert_eq!(ShapeParameters::new(0, 101.0, 50.0), Err(ShapeError::SeaLevel(101.0)));
        assert_eq!(ShapeParameters::new(0, 50.0, -1.0), Err(ShapeError::LandMass(-1.0)));
        assert!(ShapeParameters::new(0, f32::NAN, 50.0).is_err());
        assert!(ShapeParameters::new(0, 50.0, f32::INFINITY).is_err());
    }

    #[test]
    fn test_random_shapes_are_valid() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let shape = ShapeParameters::random(&mut rng);
            assert!(shape.validate().is_ok());
            assert!(shape.roughness_tier <= 3);
            assert!(shape.sea_level_percent < 50.0);
            assert_eq!(shape.sea_level_percent.fract(), 0.0);
            assert!(shape.land_mass_size < 100.0);
        }

        let a = ShapeParameters::random(&mut StdRng::seed_from_u64(5));
        let b = ShapeParameters::random(&mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = derive_octaves(&shape(3));
        let json = settings.to_json().unwrap();
        assert!(json.starts_with('['), "settings serialize as a bare array");
        let parsed = NoiseSettings::from_json(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_rejects_bad_overrides() {
        assert!(matches!(NoiseSettings::from_json("[]"), Err(NoiseError::OctaveCount(0))));
        assert!(matches!(NoiseSettings::from_json("{"), Err(NoiseError::Json(_))));

        let mut octave = derive_octaves(&shape(0)).octaves[0];
        octave.passes = 0;
        assert!(matches!(
            NoiseSettings::new(vec![octave]),
            Err(NoiseError::InvalidOctave { index: 0, .. })
        ));

        let four = vec![derive_octaves(&shape(0)).octaves[0]; 4];
        assert!(matches!(NoiseSettings::new(four), Err(NoiseError::OctaveCount(4))));
    }
}
