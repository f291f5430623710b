//! HDR to display conversion.

use crate::filters::ImageFilter;
use crate::simd;
use crate::tonemap::ToneMap;
use aurora_core::common::{clamp, Float};
use aurora_core::film::RenderBuffer;

/// Converts a linear HDR `RenderBuffer` snapshot into display-ready RGBA8.
///
/// Per channel: tone map, clamp to `[0, 1]`, gamma correct, quantize with
/// truncation to a byte (alpha 255). The buffer stores rows bottom-up, so
/// the output is flipped to the top-to-bottom order display surfaces and
/// image encoders expect. An optional spatial filter runs on the quantized
/// image.
pub struct PixelPipeline {
    /// Active tone-mapping operator.
    pub tone_map: ToneMap,

    /// Display gamma; must be positive.
    pub gamma: Float,

    /// Optional spatial filter applied after quantization.
    pub filter: Option<ImageFilter>,
}

impl Default for PixelPipeline {
    fn default() -> Self {
        Self {
            tone_map: ToneMap::Clamp,
            gamma: 2.0,
            filter: None,
        }
    }
}

impl PixelPipeline {
    /// Creates a pipeline with no spatial filter.
    ///
    /// * `tone_map` - Tone-mapping operator.
    /// * `gamma`    - Display gamma.
    pub fn new(tone_map: ToneMap, gamma: Float) -> Self {
        Self {
            tone_map,
            gamma,
            filter: None,
        }
    }

    /// Runs the full pipeline into `dst`, resizing it to `width * height * 4`
    /// bytes of row-major, top-to-bottom RGBA8.
    ///
    /// Intended for snapshots: the source lock is held while rows are
    /// converted, so feeding the live render target would stall tile commits
    /// for the conversion's duration.
    ///
    /// * `buffer` - HDR source, typically a `copy_to` snapshot.
    /// * `dst`    - Output RGBA8 buffer.
    pub fn process(&self, buffer: &RenderBuffer, dst: &mut Vec<u8>) {
        let (width, height) = (buffer.width(), buffer.height());
        dst.resize(width * height * 4, 0);
        let inv_gamma = 1.0 / self.gamma;
        trace!("Converting {width}x{height} snapshot ({:?}, gamma {})", self.tone_map, self.gamma);

        buffer.with_planes(|r, g, b| {
            let mut row_r = vec![0.0; width];
            let mut row_g = vec![0.0; width];
            let mut row_b = vec![0.0; width];
            for out_row in 0..height {
                // Row 0 of the buffer is the bottom scanline.
                let src_row = height - 1 - out_row;
                let base = src_row * width;
                for i in 0..width {
                    row_r[i] = self.shade(r[base + i], inv_gamma);
                    row_g[i] = self.shade(g[base + i], inv_gamma);
                    row_b[i] = self.shade(b[base + i], inv_gamma);
                }
                let out = &mut dst[out_row * width * 4..(out_row + 1) * width * 4];
                simd::quantize_row(&row_r, &row_g, &row_b, out);
            }
        });

        if let Some(filter) = self.filter {
            filter.apply(dst, width, height);
        }
    }

    /// Tone maps and gamma corrects one channel value into `[0, 1]`.
    fn shade(&self, v: Float, inv_gamma: Float) -> Float {
        clamp(self.tone_map.apply(v), 0.0, 1.0).powf(inv_gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_core::spectrum::RGBSpectrum;

    fn buffer_with(width: usize, height: usize, pixels: &[(usize, usize, RGBSpectrum)]) -> RenderBuffer {
        let mut buf = RenderBuffer::new(width, height).unwrap();
        for (x, y, c) in pixels {
            buf.set_pixel(*x, *y, c);
        }
        buf
    }

    #[test]
    fn output_rows_are_flipped_top_to_bottom() {
        // Bottom-left pixel of the buffer lands in the output's last row.
        let buf = buffer_with(3, 2, &[(0, 0, RGBSpectrum::ONE)]);
        let pipeline = PixelPipeline::new(ToneMap::Clamp, 1.0);
        let mut out = Vec::new();
        pipeline.process(&buf, &mut out);

        assert_eq!(out.len(), 3 * 2 * 4);
        let last_row = &out[3 * 4..];
        assert_eq!(&last_row[..4], &[255, 255, 255, 255]);
        assert_eq!(&out[..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn gamma_one_quantizes_linearly() {
        let buf = buffer_with(1, 1, &[(0, 0, RGBSpectrum::new(0.5))]);
        let pipeline = PixelPipeline::new(ToneMap::Clamp, 1.0);
        let mut out = Vec::new();
        pipeline.process(&buf, &mut out);
        // 0.5 * 255.999 truncates to 127.
        assert_eq!(&out[..4], &[127, 127, 127, 255]);
    }

    #[test]
    fn gamma_two_brightens_midtones() {
        let buf = buffer_with(1, 1, &[(0, 0, RGBSpectrum::new(0.25))]);
        let pipeline = PixelPipeline::new(ToneMap::Clamp, 2.0);
        let mut out = Vec::new();
        pipeline.process(&buf, &mut out);
        // sqrt(0.25) = 0.5 -> 127.
        assert_eq!(out[0], 127);
    }

    #[test]
    fn reinhard_compresses_hdr_values_into_range() {
        let buf = buffer_with(1, 1, &[(0, 0, RGBSpectrum::new(1.0))]);
        let pipeline = PixelPipeline::new(ToneMap::Reinhard, 1.0);
        let mut out = Vec::new();
        pipeline.process(&buf, &mut out);
        assert_eq!(out[0], 127); // 1 / (1 + 1) = 0.5.
    }

    #[test]
    fn negative_radiance_clamps_to_black() {
        let buf = buffer_with(1, 1, &[(0, 0, RGBSpectrum::new(-4.0))]);
        for tm in [ToneMap::Clamp, ToneMap::Aces] {
            let pipeline = PixelPipeline::new(tm, 2.0);
            let mut out = Vec::new();
            pipeline.process(&buf, &mut out);
            assert_eq!(&out[..4], &[0, 0, 0, 255], "{tm:?}");
        }
    }

    #[test]
    fn filter_stage_runs_after_quantization() {
        let mut pipeline = PixelPipeline::new(ToneMap::Clamp, 1.0);
        pipeline.filter = Some(ImageFilter::Invert);
        let buf = buffer_with(2, 2, &[]);
        let mut out = Vec::new();
        pipeline.process(&buf, &mut out);
        // Black input inverts to white; alpha stays opaque.
        assert_eq!(&out[..4], &[255, 255, 255, 255]);
    }
}
