//! Render buffer: the shared accumulation target for tile workers.

use crate::error::{Error, Result};
use crate::spectrum::RGBSpectrum;
use std::sync::Mutex;

/// Per-channel pixel storage, structure-of-arrays so the pixel pipeline can
/// stream whole channel rows through wide vector loads.
struct Planes {
    r: Vec<f32>,
    g: Vec<f32>,
    b: Vec<f32>,
}

/// Thread-safe accumulation buffer for linear HDR radiance.
///
/// Many short-lived tile workers write through `commit_tile()`, one
/// long-lived consumer reads through `copy_to()` snapshots. A single mutex
/// scoped to this instance protects the channel planes; every lock hold is
/// bounded by a tile or image copy, never by integrator work. Row 0 is the
/// bottom scanline (camera `v` grows upwards); the pixel pipeline performs
/// the Y-flip on output.
pub struct RenderBuffer {
    width: usize,
    height: usize,
    planes: Mutex<Planes>,
}

impl RenderBuffer {
    /// Creates a buffer with all channels cleared to zero.
    ///
    /// * `width`  - Image width in pixels.
    /// * `height` - Image height in pixels.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let n = width * height;
        Ok(Self {
            width,
            height,
            planes: Mutex::new(Planes {
                r: vec![0.0; n],
                g: vec![0.0; n],
                b: vec![0.0; n],
            }),
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Resets all channels to zero. Serializes against concurrent commits
    /// and snapshots; callers must still stop producers first if they need
    /// the buffer to stay cleared.
    pub fn clear(&self) {
        let mut planes = self.planes.lock().unwrap();
        planes.r.fill(0.0);
        planes.g.fill(0.0);
        planes.b.fill(0.0);
    }

    /// Commits a rectangular tile of row-major channel data into the shared
    /// buffer. The region is `[x0, x1) x [y0, y1)`; tile index
    /// `(y - y0) * (x1 - x0) + (x - x0)`.
    ///
    /// A malformed region (empty, out of bounds, or tile slices shorter than
    /// the region) is dropped silently: late or stale tile results must not
    /// crash an otherwise-successful render.
    ///
    /// * `x0`, `y0` - Inclusive lower corner.
    /// * `x1`, `y1` - Exclusive upper corner.
    /// * `tile_r`   - Red channel, row-major.
    /// * `tile_g`   - Green channel, row-major.
    /// * `tile_b`   - Blue channel, row-major.
    pub fn commit_tile(
        &self,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        tile_r: &[f32],
        tile_g: &[f32],
        tile_b: &[f32],
    ) {
        if x1 <= x0 || y1 <= y0 || x1 > self.width || y1 > self.height {
            debug!("Dropping tile commit with malformed region ({x0},{y0})..({x1},{y1})");
            return;
        }
        let tile_w = x1 - x0;
        let tile_n = tile_w * (y1 - y0);
        if tile_r.len() < tile_n || tile_g.len() < tile_n || tile_b.len() < tile_n {
            debug!("Dropping tile commit with short channel data for ({x0},{y0})..({x1},{y1})");
            return;
        }

        let mut planes = self.planes.lock().unwrap();
        for y in y0..y1 {
            let src = (y - y0) * tile_w;
            let dst = y * self.width + x0;
            planes.r[dst..dst + tile_w].copy_from_slice(&tile_r[src..src + tile_w]);
            planes.g[dst..dst + tile_w].copy_from_slice(&tile_g[src..src + tile_w]);
            planes.b[dst..dst + tile_w].copy_from_slice(&tile_b[src..src + tile_w]);
        }
    }

    /// Copies a point-in-time consistent snapshot of all channels into a
    /// destination buffer of matching dimensions; a dimension mismatch is a
    /// no-op. The lock is held only for the memory copy so the reader never
    /// blocks writers for image-processing durations.
    ///
    /// * `dst` - Destination buffer, exclusively owned by the caller.
    pub fn copy_to(&self, dst: &mut RenderBuffer) {
        if dst.width != self.width || dst.height != self.height {
            debug!(
                "Dropping snapshot into mismatched buffer {}x{} (source {}x{})",
                dst.width, dst.height, self.width, self.height
            );
            return;
        }
        let src = self.planes.lock().unwrap();
        let dst_planes = dst.planes.get_mut().unwrap();
        dst_planes.r.copy_from_slice(&src.r);
        dst_planes.g.copy_from_slice(&src.g);
        dst_planes.b.copy_from_slice(&src.b);
    }

    /// Reads a single pixel; out-of-range coordinates read black. Intended
    /// for single-threaded contexts such as tests and tile construction;
    /// takes the lock briefly.
    ///
    /// * `x` - Column.
    /// * `y` - Row (0 = bottom scanline).
    pub fn get_pixel(&self, x: usize, y: usize) -> RGBSpectrum {
        if x >= self.width || y >= self.height {
            return RGBSpectrum::ZERO;
        }
        let planes = self.planes.lock().unwrap();
        let idx = y * self.width + x;
        RGBSpectrum::from_rgb(planes.r[idx], planes.g[idx], planes.b[idx])
    }

    /// Writes a single pixel; out-of-range coordinates are ignored. Requires
    /// exclusive ownership, which rules out concurrent writers at compile
    /// time.
    ///
    /// * `x` - Column.
    /// * `y` - Row (0 = bottom scanline).
    /// * `c` - Linear colour value.
    pub fn set_pixel(&mut self, x: usize, y: usize, c: &RGBSpectrum) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        let planes = self.planes.get_mut().unwrap();
        let rgb = c.to_rgb();
        planes.r[idx] = rgb[0];
        planes.g[idx] = rgb[1];
        planes.b[idx] = rgb[2];
    }

    /// Runs a closure over the three channel planes. Holds the lock for the
    /// duration, so callers should pass snapshots, not the live render
    /// target.
    ///
    /// * `f` - Closure receiving `(r, g, b)` planes.
    pub fn with_planes<R>(&self, f: impl FnOnce(&[f32], &[f32], &[f32]) -> R) -> R {
        let planes = self.planes.lock().unwrap();
        f(&planes.r, &planes.g, &planes.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled_tile(w: usize, h: usize, base: f32) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let n = w * h;
        let r: Vec<f32> = (0..n).map(|i| base + i as f32).collect();
        let g: Vec<f32> = (0..n).map(|i| base + i as f32 + 0.25).collect();
        let b: Vec<f32> = (0..n).map(|i| base + i as f32 + 0.5).collect();
        (r, g, b)
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(
            RenderBuffer::new(0, 10),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(matches!(
            RenderBuffer::new(10, 0),
            Err(Error::InvalidDimension { .. })
        ));
    }

    #[test]
    fn commit_round_trips_through_get_pixel() {
        let buf = RenderBuffer::new(8, 6).unwrap();
        let (r, g, b) = filled_tile(3, 2, 10.0);
        buf.commit_tile(2, 1, 5, 3, &r, &g, &b);

        for y in 1..3 {
            for x in 2..5 {
                let i = (y - 1) * 3 + (x - 2);
                let c = buf.get_pixel(x, y);
                assert_eq!(c.to_rgb(), [r[i], g[i], b[i]]);
            }
        }
        // Pixels outside the tile stay zero.
        assert!(buf.get_pixel(0, 0).is_black());
        assert!(buf.get_pixel(7, 5).is_black());
    }

    #[test]
    fn malformed_commit_is_a_no_op() {
        let buf = RenderBuffer::new(4, 4).unwrap();
        let (r, g, b) = filled_tile(2, 2, 1.0);
        buf.commit_tile(0, 0, 2, 2, &r, &g, &b);
        let before: Vec<_> = (0..4)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .map(|(x, y)| buf.get_pixel(x, y))
            .collect();

        // Short channel slices.
        buf.commit_tile(0, 0, 3, 3, &r, &g, &b);
        // Empty region.
        buf.commit_tile(2, 2, 2, 2, &r, &g, &b);
        // Out of bounds.
        buf.commit_tile(3, 3, 6, 6, &[0.0; 9], &[0.0; 9], &[0.0; 9]);

        let after: Vec<_> = (0..4)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .map(|(x, y)| buf.get_pixel(x, y))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn snapshot_matches_union_of_commits() {
        let buf = RenderBuffer::new(8, 8).unwrap();
        let (r1, g1, b1) = filled_tile(4, 4, 1.0);
        let (r2, g2, b2) = filled_tile(4, 4, 100.0);
        buf.commit_tile(0, 0, 4, 4, &r1, &g1, &b1);
        buf.commit_tile(4, 4, 8, 8, &r2, &g2, &b2);

        let mut snap = RenderBuffer::new(8, 8).unwrap();
        buf.copy_to(&mut snap);

        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(
                    snap.get_pixel(x, y).to_rgb(),
                    buf.get_pixel(x, y).to_rgb(),
                    "pixel ({x},{y})"
                );
            }
        }
        // Un-committed area is still zero in the snapshot.
        assert!(snap.get_pixel(5, 1).is_black());
    }

    #[test]
    fn snapshot_into_mismatched_buffer_is_a_no_op() {
        let buf = RenderBuffer::new(4, 4).unwrap();
        let (r, g, b) = filled_tile(4, 4, 2.0);
        buf.commit_tile(0, 0, 4, 4, &r, &g, &b);

        let mut snap = RenderBuffer::new(3, 4).unwrap();
        buf.copy_to(&mut snap);
        for y in 0..4 {
            for x in 0..3 {
                assert!(snap.get_pixel(x, y).is_black());
            }
        }
    }

    #[test]
    fn out_of_range_pixel_accessors_are_inert() {
        let mut buf = RenderBuffer::new(3, 2).unwrap();
        buf.set_pixel(1, 1, &RGBSpectrum::from_rgb(1.0, 2.0, 3.0));

        // Reads outside the image are black, not panics.
        assert!(buf.get_pixel(3, 0).is_black());
        assert!(buf.get_pixel(0, 2).is_black());
        assert!(buf.get_pixel(usize::MAX, usize::MAX).is_black());

        // Writes outside the image change nothing.
        buf.set_pixel(3, 0, &RGBSpectrum::ONE);
        buf.set_pixel(0, 2, &RGBSpectrum::ONE);
        assert_eq!(buf.get_pixel(1, 1), RGBSpectrum::from_rgb(1.0, 2.0, 3.0));
        assert!(buf.get_pixel(0, 0).is_black());
    }

    #[test]
    fn clear_resets_all_channels() {
        let mut buf = RenderBuffer::new(3, 3).unwrap();
        buf.set_pixel(1, 1, &RGBSpectrum::from_rgb(1.0, 2.0, 3.0));
        buf.clear();
        for y in 0..3 {
            for x in 0..3 {
                assert!(buf.get_pixel(x, y).is_black());
            }
        }
    }

    proptest! {
        #[test]
        fn construction_zero_initializes(width in 1usize..64, height in 1usize..64) {
            let buf = RenderBuffer::new(width, height).unwrap();
            prop_assert_eq!(buf.width(), width);
            prop_assert_eq!(buf.height(), height);
            buf.with_planes(|r, g, b| {
                prop_assert_eq!(r.len(), width * height);
                prop_assert_eq!(g.len(), width * height);
                prop_assert_eq!(b.len(), width * height);
                prop_assert!(r.iter().chain(g).chain(b).all(|v| *v == 0.0));
                Ok(())
            })?;
        }

        #[test]
        fn set_then_get_pixel(
            width in 1usize..32,
            height in 1usize..32,
            px in 0usize..32,
            py in 0usize..32,
            v in -10.0f32..10.0,
        ) {
            prop_assume!(px < width && py < height);
            let mut buf = RenderBuffer::new(width, height).unwrap();
            let c = RGBSpectrum::from_rgb(v, v * 2.0, v * 3.0);
            buf.set_pixel(px, py, &c);
            prop_assert_eq!(buf.get_pixel(px, py), c);
        }
    }
}
