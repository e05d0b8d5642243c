//! Rasterization of a height field into height, specular and diffuse buffers.

use glam::Vec3;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use thiserror::Error;

use super::height_field::HeightField;
use crate::gradient::ColorGradient;

/// Errors raised when buffers handed to the rasterizer do not line up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("Resolution must be at least 1")]
    ZeroResolution,
    #[error("{name} buffer is {width}x{height}, expected {expected}x{expected}")]
    DimensionMismatch {
        name: &'static str,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Flat specular fill.
pub const SPECULAR_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Height, specular and diffuse buffers for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffers {
    pub height: RgbaImage,
    pub specular: RgbaImage,
    pub diffuse: RgbaImage,
}

impl RasterBuffers {
    /// Allocates the initial buffers a pass hands to the worker: base
    /// normals in the height buffer, flat black specular, empty diffuse.
    pub fn allocate(resolution: u32) -> Self {
        Self {
            height: base_normal_fill(resolution),
            specular: RgbaImage::from_pixel(resolution, resolution, SPECULAR_FILL),
            diffuse: RgbaImage::new(resolution, resolution),
        }
    }

    /// Side length shared by all three buffers.
    pub fn resolution(&self) -> u32 {
        self.height.width()
    }

    /// Checks that every buffer is `resolution`×`resolution`.
    pub fn check_dimensions(&self, resolution: u32) -> Result<(), RasterError> {
        let buffers = [
            ("height", &self.height),
            ("specular", &self.specular),
            ("diffuse", &self.diffuse),
        ];
        for (name, img) in buffers {
            if img.width() != resolution || img.height() != resolution {
                return Err(RasterError::DimensionMismatch {
                    name,
                    width: img.width(),
                    height: img.height(),
                    expected: resolution,
                });
            }
        }
        Ok(())
    }
}

/// Direction on the unit sphere for the centre of pixel `(x, y)` of an
/// equirectangular grid. Longitude 0 faces +Z.
pub fn sphere_direction(x: u32, y: u32, resolution: u32) -> Vec3 {
    let res = resolution.max(1) as f32;
    let u = (x as f32 + 0.5) / res;
    let v = (y as f32 + 0.5) / res;
    let lon = (u * 2.0 - 1.0) * std::f32::consts::PI;
    let lat = (0.5 - v) * std::f32::consts::PI;
    let (slon, clon) = lon.sin_cos();
    let (slat, clat) = lat.sin_cos();
    Vec3::new(clat * slon, slat, clat * clon)
}

/// Encodes a unit vector as an 8-bit object-space normal.
pub fn encode_normal(n: Vec3) -> [u8; 3] {
    let c = n * 0.5 + Vec3::splat(0.5);
    [
        (c.x.clamp(0.0, 1.0) * 255.0) as u8,
        (c.y.clamp(0.0, 1.0) * 255.0) as u8,
        (c.z.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

/// Object-space sphere normals for every pixel, the neutral starting
/// content of a height buffer.
pub fn base_normal_fill(resolution: u32) -> RgbaImage {
    RgbaImage::from_fn(resolution, resolution, |x, y| {
        let [r, g, b] = encode_normal(sphere_direction(x, y, resolution));
        Rgba([r, g, b, 255])
    })
}

/// Writes a height field and its gradient colors into pre-allocated buffers.
///
/// Every height pixel is overwritten with grey `h * 255`; the specular
/// buffer is reset to its flat fill. The field is bilinearly resampled
/// when its resolution differs from the buffers'.
pub fn rasterize_into(
    buffers: &mut RasterBuffers,
    field: &HeightField,
    gradient: &ColorGradient,
) -> Result<(), RasterError> {
    let resolution = buffers.resolution();
    if resolution == 0 {
        return Err(RasterError::ZeroResolution);
    }
    buffers.check_dimensions(resolution)?;

    let row_bytes = resolution as usize * 4;
    let same_size = field.resolution() == resolution;
    let height_at = |x: u32, y: u32| -> f32 {
        if same_size {
            field.get(x, y)
        } else {
            let u = (x as f32 + 0.5) / resolution as f32;
            let v = (y as f32 + 0.5) / resolution as f32;
            field.sample_bilinear(u, v)
        }
    };

    let height_data: &mut [u8] = &mut buffers.height;
    let diffuse_data: &mut [u8] = &mut buffers.diffuse;
    height_data
        .par_chunks_mut(row_bytes)
        .zip(diffuse_data.par_chunks_mut(row_bytes))
        .enumerate()
        .for_each(|(y, (height_row, diffuse_row))| {
            for x in 0..resolution as usize {
                let h = height_at(x as u32, y as u32).clamp(0.0, 1.0);
                let grey = (h * 255.0) as u8;
                let [r, g, b] = gradient.sample(h * 255.0);
                let o = x * 4;
                height_row[o..o + 4].copy_from_slice(&[grey, grey, grey, 255]);
                diffuse_row[o..o + 4].copy_from_slice(&[r, g, b, 255]);
            }
        });

    for pixel in buffers.specular.pixels_mut() {
        *pixel = SPECULAR_FILL;
    }
    Ok(())
}

/// Rasterizes a height field into freshly allocated buffers.
pub fn rasterize(
    resolution: u32,
    field: &HeightField,
    gradient: &ColorGradient,
) -> Result<RasterBuffers, RasterError> {
    if resolution == 0 {
        return Err(RasterError::ZeroResolution);
    }
    let mut buffers = RasterBuffers::allocate(resolution);
    rasterize_into(&mut buffers, field, gradient)?;
    Ok(buffers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{generate_gradient, ColorStop};

    fn ramp_gradient() -> ColorGradient {
        ColorGradient::from_stops(
            vec![
                ColorStop { position: 0, color: [0, 0, 255] },
                ColorStop { position: 255, color: [255, 0, 0] },
            ],
            0,
        )
    }

    #[test]
    fn test_sphere_direction_is_unit() {
        for (x, y) in [(0, 0), (7, 3), (15, 15), (8, 8)] {
            let d = sphere_direction(x, y, 16);
            assert!((d.length() - 1.0).abs() < 1e-5);
        }
        // Top row points up, bottom row points down.
        assert!(sphere_direction(4, 0, 16).y > 0.9);
        assert!(sphere_direction(4, 15, 16).y < -0.9);
    }

    #[test]
    fn test_base_normal_fill() {
        let img = base_normal_fill(8);
        assert_eq!(img.dimensions(), (8, 8));
        assert!(img.pixels().all(|p| p[3] == 255));
        // Near the north pole the green channel is close to 255.
        assert!(img.get_pixel(3, 0)[1] > 240);
    }

    #[test]
    fn test_rasterize_dimensions_and_fills() {
        let field = HeightField::from_values(2, vec![0.0, 1.0, 0.5, 0.0]).unwrap();
        let buffers = rasterize(2, &field, &ramp_gradient()).unwrap();

        assert_eq!(buffers.height.dimensions(), (2, 2));
        assert_eq!(buffers.specular.dimensions(), (2, 2));
        assert_eq!(buffers.diffuse.dimensions(), (2, 2));

        assert_eq!(buffers.height.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(buffers.height.get_pixel(1, 0).0, [255, 255, 255, 255]);
        assert_eq!(buffers.height.get_pixel(0, 1).0, [127, 127, 127, 255]);

        assert!(buffers.specular.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        assert_eq!(buffers.diffuse.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(buffers.diffuse.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(buffers.diffuse.get_pixel(0, 1).0, [128, 0, 128, 255]);
    }

    #[test]
    fn test_rasterize_resamples_field() {
        let field = HeightField::from_values(1, vec![0.6]).unwrap();
        let buffers = rasterize(4, &field, &generate_gradient(1)).unwrap();
        assert_eq!(buffers.height.dimensions(), (4, 4));
        assert!(buffers.height.pixels().all(|p| p[0] == 153));
    }

    #[test]
    fn test_rasterize_rejects_mismatched_buffers() {
        let field = HeightField::new(4);
        let mut buffers = RasterBuffers::allocate(4);
        buffers.diffuse = RgbaImage::new(3, 4);
        let err = rasterize_into(&mut buffers, &field, &ramp_gradient()).unwrap_err();
        assert!(matches!(err, RasterError::DimensionMismatch { name: "diffuse", .. }));
        assert_eq!(rasterize(0, &field, &ramp_gradient()), Err(RasterError::ZeroResolution));
    }

    #[test]
    fn test_rasterize_is_stateless() {
        let field = HeightField::from_values(2, vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let gradient = generate_gradient(9);
        let a = rasterize(2, &field, &gradient).unwrap();
        let b = rasterize(2, &field, &gradient).unwrap();
        assert_eq!(a, b);
    }
}
