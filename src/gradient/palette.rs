//! Built-in color palettes.
//!
//! Each palette lists colors from the lowest elevation (sea floor) to the
//! highest (peaks). Entry `i` lands at gradient position `round(62.2 * i)`.

/// An RGB triple.
pub type Rgb = [u8; 3];

/// Fixed palette table, indexed by the seeded palette selection.
pub const PALETTES: &[&[Rgb]] = &[
    // Temperate: deep ocean, shallows, lowland, highland, snow.
    &[[18, 42, 92], [52, 110, 160], [74, 128, 62], [122, 104, 72], [236, 236, 240]],
    // Arid.
    &[[96, 58, 36], [168, 112, 64], [206, 160, 96], [226, 198, 140], [244, 232, 200]],
    // Glacial.
    &[[30, 52, 84], [88, 128, 164], [170, 200, 220], [214, 230, 240], [250, 252, 255]],
    // Volcanic.
    &[[20, 12, 10], [96, 24, 12], [186, 62, 18], [64, 56, 52], [140, 130, 124]],
    // Jungle.
    &[[10, 60, 70], [24, 110, 96], [28, 96, 36], [60, 132, 48], [150, 180, 96]],
    // Toxic.
    &[[40, 52, 16], [98, 120, 20], [162, 184, 44], [112, 86, 30], [210, 220, 150]],
    // Oceanic.
    &[[6, 22, 60], [12, 58, 120], [30, 110, 170], [210, 196, 150], [96, 140, 80]],
    // Martian.
    &[[60, 28, 20], [120, 52, 32], [172, 88, 52], [196, 130, 90], [228, 190, 160]],
    // Crystalline.
    &[[34, 16, 60], [80, 40, 130], [130, 90, 190], [180, 150, 220], [240, 230, 255]],
    // Barren.
    &[[40, 40, 42], [78, 76, 74], [118, 114, 108], [158, 154, 148], [200, 198, 194]],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palettes_fit_in_gradient_range() {
        for palette in PALETTES {
            assert!(!palette.is_empty());
            let last = (62.2 * (palette.len() - 1) as f32).round();
            assert!(last <= 255.0, "palette with {} entries overflows", palette.len());
        }
    }
}
