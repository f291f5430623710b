//! Spatial filters over the quantized RGBA8 image.

use crate::simd;

/// Post-quantization spatial filters. All operate on the gamma-corrected
/// 8-bit buffer with edge-replicated addressing and leave alpha untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageFilter {
    /// 3x3 box blur, uniform weights normalized by 9.
    Blur,

    /// 3x3 sharpen, kernel `{0,-1,0; -1,5,-1; 0,-1,0}`.
    Sharpen,

    /// Rec. 601 luma replicated to all colour channels.
    Grayscale,

    /// `255 - channel` per colour channel.
    Invert,

    /// Per-channel 3x3 median (despeckle).
    Median,
}

impl ImageFilter {
    /// Applies the filter in place.
    ///
    /// * `data`   - Interleaved RGBA8 pixels, row-major.
    /// * `width`  - Image width in pixels.
    /// * `height` - Image height in pixels.
    pub fn apply(&self, data: &mut [u8], width: usize, height: usize) {
        debug_assert_eq!(data.len(), width * height * 4);
        match self {
            Self::Blur => convolve3x3(data, width, height, &[[1; 3]; 3], 9),
            Self::Sharpen => {
                convolve3x3(data, width, height, &[[0, -1, 0], [-1, 5, -1], [0, -1, 0]], 1)
            }
            Self::Grayscale => {
                for px in data.chunks_exact_mut(4) {
                    let luma = (0.299 * px[0] as f32
                        + 0.587 * px[1] as f32
                        + 0.114 * px[2] as f32) as u8;
                    px[0] = luma;
                    px[1] = luma;
                    px[2] = luma;
                }
            }
            Self::Invert => {
                for px in data.chunks_exact_mut(4) {
                    px[0] = 255 - px[0];
                    px[1] = 255 - px[1];
                    px[2] = 255 - px[2];
                }
            }
            Self::Median => {
                let src = data.to_vec();
                simd::median_filter(&src, data, width, height);
            }
        }
    }
}

/// 3x3 integer convolution with clamped addressing. Accumulates in `i32`,
/// divides by `weight_sum` and clamps the result to a byte.
fn convolve3x3(
    data: &mut [u8],
    width: usize,
    height: usize,
    kernel: &[[i32; 3]; 3],
    weight_sum: i32,
) {
    let src = data.to_vec();
    let idx_of = |x: i32, y: i32| {
        let x = x.clamp(0, width as i32 - 1) as usize;
        let y = y.clamp(0, height as i32 - 1) as usize;
        (y * width + x) * 4
    };

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let mut acc = [0i32; 3];
            for ky in -1..=1 {
                for kx in -1..=1 {
                    let w = kernel[(ky + 1) as usize][(kx + 1) as usize];
                    let idx = idx_of(x + kx, y + ky);
                    for ch in 0..3 {
                        acc[ch] += src[idx + ch] as i32 * w;
                    }
                }
            }
            let idx = (y as usize * width + x as usize) * 4;
            for ch in 0..3 {
                data[idx + ch] = (acc[ch] / weight_sum).clamp(0, 255) as u8;
            }
        }
    }
}
