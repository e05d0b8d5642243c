//! The four buffers a generation pass publishes.

use image::RgbaImage;

/// Height, specular, diffuse and normal maps of one pass.
///
/// All four buffers share the same square dimensions. A published set is
/// never mutated; newer passes publish a new set.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSet {
    /// Run that produced this set.
    pub generation: u64,
    pub resolution: u32,
    pub height: RgbaImage,
    pub specular: RgbaImage,
    pub diffuse: RgbaImage,
    pub normal: RgbaImage,
}

impl TextureSet {
    /// Whether all four buffers are `resolution`×`resolution`.
    pub fn is_consistent(&self) -> bool {
        [&self.height, &self.specular, &self.diffuse, &self.normal]
            .iter()
            .all(|img| img.dimensions() == (self.resolution, self.resolution))
    }
}
