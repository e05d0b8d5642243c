//! Seeded gradient selection and sampling.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::palette::{Rgb, PALETTES};
use crate::noise::SeededNoise;

/// Spacing between consecutive palette entries on the 0..=255 axis.
const STOP_SPACING: f32 = 62.2;

/// Fixed sample point used to pick a palette from the seeded noise.
const PALETTE_SAMPLE_POINT: Vec3 = Vec3::new(23.0, 23.0, 23.0);

/// One color stop on the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: u8,
    pub color: Rgb,
}

/// Ordered color stops, strictly increasing by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGradient {
    stops: Vec<ColorStop>,
    palette_index: usize,
}

impl ColorGradient {
    /// Builds a gradient from arbitrary stops.
    ///
    /// Stops are sorted by position; when two land on the same position
    /// the later one wins.
    pub fn from_stops(mut stops: Vec<ColorStop>, palette_index: usize) -> Self {
        stops.sort_by_key(|s| s.position);
        let mut deduped: Vec<ColorStop> = Vec::with_capacity(stops.len());
        for stop in stops {
            match deduped.last_mut() {
                Some(last) if last.position == stop.position => *last = stop,
                _ => deduped.push(stop),
            }
        }
        Self {
            stops: deduped,
            palette_index,
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Index of the palette this gradient was built from.
    pub fn palette_index(&self) -> usize {
        self.palette_index
    }

    /// Resolves the color at `position` (0..=255).
    ///
    /// Interpolates linearly between the bracketing stops and holds the
    /// first/last color outside the stop range.
    pub fn sample(&self, position: f32) -> Rgb {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return [0, 0, 0],
        };
        if position <= first.position as f32 {
            return first.color;
        }
        if position >= last.position as f32 {
            return last.color;
        }

        let upper = self
            .stops
            .iter()
            .position(|s| s.position as f32 >= position)
            .unwrap_or(self.stops.len() - 1);
        let hi = &self.stops[upper];
        let lo = &self.stops[upper.saturating_sub(1)];
        let span = hi.position as f32 - lo.position as f32;
        if span <= 0.0 {
            return hi.color;
        }
        let t = (position - lo.position as f32) / span;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let a = lo.color[c] as f32;
            let b = hi.color[c] as f32;
            out[c] = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

/// Rounds half toward positive infinity.
fn round_half_up(v: f32) -> f32 {
    (v + 0.5).floor()
}

/// Picks a palette index from a noise sample in [-1, 1].
///
/// Extreme samples are clamped onto the table instead of failing.
pub fn select_palette_index(noise_value: f32, palette_count: usize) -> usize {
    if palette_count == 0 {
        return 0;
    }
    let half = (palette_count / 2) as f32;
    let offset = round_half_up(noise_value * palette_count as f32 * 0.5);
    let index = (half + offset).clamp(0.0, (palette_count - 1) as f32);
    index as usize
}

/// Builds the color gradient for a hashed seed.
pub fn generate_gradient(seed: i32) -> ColorGradient {
    let noise = SeededNoise::new(seed);
    let index = select_palette_index(noise.sample(PALETTE_SAMPLE_POINT), PALETTES.len());
    let palette = PALETTES[index];

    let stops = palette
        .iter()
        .enumerate()
        .map(|(i, &color)| ColorStop {
            position: round_half_up(STOP_SPACING * i as f32).clamp(0.0, 255.0) as u8,
            color,
        })
        .collect();

    log::debug!("seed {} selected palette {}", seed, index);
    ColorGradient::from_stops(stops, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_strictly_ascending(gradient: &ColorGradient) {
        for pair in gradient.stops().windows(2) {
            assert!(
                pair[0].position < pair[1].position,
                "stops out of order: {:?}",
                gradient.stops()
            );
        }
    }

    #[test]
    fn test_gradient_stops_ascending_for_many_seeds() {
        for seed in [i32::MIN, -1_000_000, -1, 0, 1, 42, 99162322, i32::MAX] {
            let gradient = generate_gradient(seed);
            assert!(!gradient.stops().is_empty());
            assert_strictly_ascending(&gradient);
            assert_eq!(gradient.stops()[0].position, 0);
        }
    }

    #[test]
    fn test_gradient_is_deterministic() {
        assert_eq!(generate_gradient(1234), generate_gradient(1234));
    }

    #[test]
    fn test_stop_positions_follow_spacing() {
        let gradient = generate_gradient(5);
        let positions: Vec<u8> = gradient.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 62, 124, 187, 249]);
    }

    #[test]
    fn test_palette_index_clamped() {
        assert_eq!(select_palette_index(1.0, 10), 9);
        assert_eq!(select_palette_index(-1.0, 10), 0);
        assert_eq!(select_palette_index(0.0, 10), 5);
        assert_eq!(select_palette_index(5.0, 10), 9);
        assert_eq!(select_palette_index(-5.0, 10), 0);
        assert_eq!(select_palette_index(0.3, 0), 0);
    }

    #[test]
    fn test_unsorted_stops_are_sorted_and_deduped() {
        let gradient = ColorGradient::from_stops(
            vec![
                ColorStop { position: 200, color: [2, 2, 2] },
                ColorStop { position: 0, color: [0, 0, 0] },
                ColorStop { position: 255, color: [3, 3, 3] },
                ColorStop { position: 255, color: [4, 4, 4] },
            ],
            0,
        );
        let positions: Vec<u8> = gradient.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 200, 255]);
        assert_eq!(gradient.stops()[2].color, [4, 4, 4]);
    }

    #[test]
    fn test_sample_interpolates_and_clamps() {
        let gradient = ColorGradient::from_stops(
            vec![
                ColorStop { position: 10, color: [0, 0, 0] },
                ColorStop { position: 110, color: [200, 100, 50] },
            ],
            0,
        );
        assert_eq!(gradient.sample(0.0), [0, 0, 0]);
        assert_eq!(gradient.sample(255.0), [200, 100, 50]);
        assert_eq!(gradient.sample(60.0), [100, 50, 25]);
        assert_eq!(gradient.sample(110.0), [200, 100, 50]);
    }
}
