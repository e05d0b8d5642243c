//! Tangent-space normal map derivation from a height buffer.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use thiserror::Error;

/// Horizontal gradient kernel, accumulated into red.
pub const SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
/// Vertical gradient kernel, accumulated into green.
pub const SOBEL_Y: [f32; 9] = [1.0, 2.0, 1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -1.0];

/// Flat tangent-space normal.
pub const FLAT_NORMAL: Rgba<u8> = Rgba([128, 128, 255, 255]);

/// Errors raised by [`convolve`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvolutionError {
    #[error("Kernel of {0} weights is not an odd square")]
    InvalidKernel(usize),
    #[error("Source is {0}x{1} but destination is {2}x{3}")]
    DimensionMismatch(u32, u32, u32, u32),
}

/// Color channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn offset(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// Stores a value the way 8-bit unsigned pixel storage does: the
/// fraction is truncated and the result wraps modulo 256.
#[inline]
pub fn wrap_to_u8(value: f64) -> u8 {
    (value.trunc() as i64).rem_euclid(256) as u8
}

/// Convolves `src` with a square kernel and adds the result onto `dst`.
///
/// For every selected channel the weighted sum of the matching source
/// channel is divided by 3 and added to the existing destination value.
/// Taps falling outside the image are skipped. Alpha becomes 255 when
/// `opaque` is set, otherwise the weighted alpha sum.
pub fn convolve(
    src: &RgbaImage,
    dst: &mut RgbaImage,
    weights: &[f32],
    opaque: bool,
    channels: &[Channel],
) -> Result<(), ConvolutionError> {
    let side = (weights.len() as f64).sqrt().round() as usize;
    if side * side != weights.len() || side % 2 == 0 {
        return Err(ConvolutionError::InvalidKernel(weights.len()));
    }
    if src.dimensions() != dst.dimensions() {
        let (sw, sh) = src.dimensions();
        let (dw, dh) = dst.dimensions();
        return Err(ConvolutionError::DimensionMismatch(sw, sh, dw, dh));
    }

    let half = (side / 2) as i64;
    let (w, h) = src.dimensions();
    let (w, h) = (w as i64, h as i64);
    if w == 0 || h == 0 {
        return Ok(());
    }
    let src_data = src.as_raw();
    let selected = [Channel::Red, Channel::Green, Channel::Blue].map(|c| channels.contains(&c));

    let dst_data: &mut [u8] = dst;
    dst_data
        .par_chunks_mut(w as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for x in 0..w {
                let mut sums = [0.0f64; 4];
                for cy in 0..side as i64 {
                    let sy = y + cy - half;
                    if sy < 0 || sy >= h {
                        continue;
                    }
                    for cx in 0..side as i64 {
                        let sx = x + cx - half;
                        if sx < 0 || sx >= w {
                            continue;
                        }
                        let off = ((sy * w + sx) * 4) as usize;
                        let wt = weights[(cy * side as i64 + cx) as usize] as f64;
                        for (c, sum) in sums.iter_mut().enumerate() {
                            *sum += src_data[off + c] as f64 * wt;
                        }
                    }
                }

                let o = x as usize * 4;
                for c in 0..3 {
                    if selected[c] {
                        row[o + c] = wrap_to_u8(row[o + c] as f64 + sums[c] / 3.0);
                    }
                }
                row[o + 3] = if opaque { 255 } else { wrap_to_u8(sums[3]) };
            }
        });

    Ok(())
}

/// Builds a normal map with the same dimensions as `height`.
pub fn build_normal_map(height: &RgbaImage) -> Result<RgbaImage, ConvolutionError> {
    let (w, h) = height.dimensions();
    let mut normal = RgbaImage::from_pixel(w, h, FLAT_NORMAL);
    convolve(height, &mut normal, &SOBEL_X, true, &[Channel::Red])?;
    convolve(height, &mut normal, &SOBEL_Y, true, &[Channel::Green])?;
    Ok(normal)
}
