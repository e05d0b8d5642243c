//! PNG export of generated texture buffers.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, RgbaImage};
use thiserror::Error;

use crate::texture::TextureSet;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

/// Writes a single RGBA8 buffer as a PNG.
pub fn export_rgba_png(img: &RgbaImage, path: &Path, options: &PngExportOptions) -> Result<(), PngExportError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    encoder.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}

/// Exports all four buffers of a texture set.
///
/// Files are named `{base_name}_{map}.png` where map is one of
/// `height`, `specular`, `diffuse`, `normal`. Returns the written paths.
pub fn export_texture_set_png(
    set: &TextureSet,
    output_dir: &Path,
    base_name: &str,
    options: &PngExportOptions,
) -> Result<Vec<PathBuf>, PngExportError> {
    std::fs::create_dir_all(output_dir)?;

    let maps = [
        ("height", &set.height),
        ("specular", &set.specular),
        ("diffuse", &set.diffuse),
        ("normal", &set.normal),
    ];

    let mut written = Vec::with_capacity(maps.len());
    for (map, img) in maps {
        let path = output_dir.join(format!("{}_{}.png", base_name, map));
        export_rgba_png(img, &path, options)?;
        written.push(path);
    }
    Ok(written)
}
