//! Texture buffers: height field rasterization and normal map derivation.
//!
//! All buffers are RGBA8 `image::RgbaImage`s laid out as equirectangular
//! maps of the planet surface.

mod height_field;
mod normal_map;
mod raster;
mod set;

pub use height_field::HeightField;
pub use normal_map::{
    build_normal_map, convolve, wrap_to_u8, Channel, ConvolutionError, FLAT_NORMAL, SOBEL_X, SOBEL_Y,
};
pub use raster::{
    base_normal_fill, encode_normal, rasterize, rasterize_into, sphere_direction, RasterBuffers, RasterError,
    SPECULAR_FILL,
};
pub use set::TextureSet;
