//! Scalar height field evaluated from the noise stack.

use rayon::prelude::*;

use super::raster::sphere_direction;
use crate::noise::{evaluate, NoiseSettings};

/// Square grid of elevations in [0, 1], row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    resolution: u32,
    values: Vec<f32>,
}

impl HeightField {
    /// Creates a flat (sea level) field.
    pub fn new(resolution: u32) -> Self {
        let len = (resolution as usize) * (resolution as usize);
        Self {
            resolution,
            values: vec![0.0; len],
        }
    }

    /// Wraps existing values. Returns `None` if the length is not `resolution²`.
    pub fn from_values(resolution: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != (resolution as usize) * (resolution as usize) {
            return None;
        }
        Some(Self { resolution, values })
    }

    /// Evaluates the octave stack for every pixel of an equirectangular grid.
    pub fn generate(resolution: u32, seed: i32, settings: &NoiseSettings) -> Self {
        let mut field = Self::new(resolution);
        field.values.par_iter_mut().enumerate().for_each(|(i, height)| {
            let x = (i as u32) % resolution;
            let y = (i as u32) / resolution;
            *height = evaluate(seed, settings, sphere_direction(x, y, resolution));
        });
        field
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.resolution + x) as usize]
    }

    /// Bilinearly samples the field at normalized pixel-centre coordinates.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        if self.resolution == 0 {
            return 0.0;
        }
        let max = (self.resolution - 1) as f32;
        let fx = (u * self.resolution as f32 - 0.5).clamp(0.0, max);
        let fy = (v * self.resolution as f32 - 0.5).clamp(0.0, max);
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let y1 = (y0 + 1).min(self.resolution - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = self.get(x0, y0) * (1.0 - tx) + self.get(x1, y0) * tx;
        let bottom = self.get(x0, y1) * (1.0 - tx) + self.get(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Fraction of pixels above sea level.
    pub fn land_fraction(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let land = self.values.iter().filter(|&&h| h > 0.0).count();
        land as f32 / self.values.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{derive_octaves, ShapeParameters};

    #[test]
    fn test_generate_is_reproducible() {
        let settings = derive_octaves(&ShapeParameters::new(2, 25.0, 80.0).unwrap());
        let a = HeightField::generate(16, 77, &settings);
        let b = HeightField::generate(16, 77, &settings);
        assert_eq!(a, b);
        assert!(a.values().iter().all(|h| (0.0..=1.0).contains(h)));
    }

    #[test]
    fn test_from_values_checks_length() {
        assert!(HeightField::from_values(2, vec![0.0; 4]).is_some());
        assert!(HeightField::from_values(2, vec![0.0; 3]).is_none());
    }

    #[test]
    fn test_bilinear_hits_pixel_centres() {
        let field = HeightField::from_values(2, vec![0.0, 1.0, 0.5, 0.25]).unwrap();
        assert_eq!(field.sample_bilinear(0.25, 0.25), 0.0);
        assert_eq!(field.sample_bilinear(0.75, 0.25), 1.0);
        assert_eq!(field.sample_bilinear(0.25, 0.75), 0.5);
        // Midpoint of the top row.
        assert!((field.sample_bilinear(0.5, 0.25) - 0.5).abs() < 1e-6);
        // Outside the centres clamps to the edge.
        assert_eq!(field.sample_bilinear(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_land_fraction() {
        let field = HeightField::from_values(2, vec![0.0, 0.3, 0.0, 0.9]).unwrap();
        assert_eq!(field.land_fraction(), 0.5);
    }
}
