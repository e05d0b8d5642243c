//! Seeded color gradients for diffuse maps.

mod factory;
mod palette;

pub use factory::{generate_gradient, select_palette_index, ColorGradient, ColorStop};
pub use palette::{Rgb, PALETTES};
