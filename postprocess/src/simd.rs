//! Vectorized pixel kernels with bit-identical scalar fallbacks.
//!
//! The scalar path is the ground truth; the SSE2 and AVX2 paths exist purely
//! for speed and must produce the same bytes for the same inputs. Both sides
//! therefore quantize with truncating float to int conversion and the same
//! `255.999` scale.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// Quantization scale; together with truncation this maps 1.0 to 255 while
/// keeping the 256 levels evenly sized.
const QUANT_SCALE: f32 = 255.999;

/// Quantizes one pixel's channel to a display byte.
#[inline]
fn quantize_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * QUANT_SCALE) as u8
}

/// Converts planar f32 RGB rows into interleaved RGBA8 with alpha 255.
/// Eight-pixel chunks take the widest available vector path; the remainder
/// and non-x86 targets run the scalar loop.
///
/// * `r`, `g`, `b` - Channel rows, all `dst.len() / 4` long.
/// * `dst`         - Interleaved RGBA8 output row.
pub(crate) fn quantize_row(r: &[f32], g: &[f32], b: &[f32], dst: &mut [u8]) {
    let n = dst.len() / 4;
    debug_assert!(r.len() >= n && g.len() >= n && b.len() >= n);

    let mut x = 0;
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            while x + 8 <= n {
                unsafe { quantize8_avx2(&r[x..], &g[x..], &b[x..], &mut dst[x * 4..]) };
                x += 8;
            }
        } else {
            // SSE2 is baseline on x86_64.
            while x + 8 <= n {
                unsafe { quantize8_sse2(&r[x..], &g[x..], &b[x..], &mut dst[x * 4..]) };
                x += 8;
            }
        }
    }
    for k in x..n {
        dst[4 * k] = quantize_channel(r[k]);
        dst[4 * k + 1] = quantize_channel(g[k]);
        dst[4 * k + 2] = quantize_channel(b[k]);
        dst[4 * k + 3] = 255;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn quantize8_sse2(r: &[f32], g: &[f32], b: &[f32], dst: &mut [u8]) {
    let zero = _mm_setzero_ps();
    let one = _mm_set1_ps(1.0);
    let scale = _mm_set1_ps(QUANT_SCALE);

    for half in 0..2 {
        let off = half * 4;
        let mut vr = _mm_loadu_ps(r.as_ptr().add(off));
        let mut vg = _mm_loadu_ps(g.as_ptr().add(off));
        let mut vb = _mm_loadu_ps(b.as_ptr().add(off));
        vr = _mm_mul_ps(_mm_min_ps(one, _mm_max_ps(zero, vr)), scale);
        vg = _mm_mul_ps(_mm_min_ps(one, _mm_max_ps(zero, vg)), scale);
        vb = _mm_mul_ps(_mm_min_ps(one, _mm_max_ps(zero, vb)), scale);

        // Truncating conversion matches the scalar `as u8`.
        let mut ri = [0i32; 4];
        let mut gi = [0i32; 4];
        let mut bi = [0i32; 4];
        _mm_storeu_si128(ri.as_mut_ptr() as *mut __m128i, _mm_cvttps_epi32(vr));
        _mm_storeu_si128(gi.as_mut_ptr() as *mut __m128i, _mm_cvttps_epi32(vg));
        _mm_storeu_si128(bi.as_mut_ptr() as *mut __m128i, _mm_cvttps_epi32(vb));

        for k in 0..4 {
            let d = 4 * (off + k);
            dst[d] = ri[k] as u8;
            dst[d + 1] = gi[k] as u8;
            dst[d + 2] = bi[k] as u8;
            dst[d + 3] = 255;
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn quantize8_avx2(r: &[f32], g: &[f32], b: &[f32], dst: &mut [u8]) {
    let zero = _mm256_setzero_ps();
    let one = _mm256_set1_ps(1.0);
    let scale = _mm256_set1_ps(QUANT_SCALE);

    let mut vr = _mm256_loadu_ps(r.as_ptr());
    let mut vg = _mm256_loadu_ps(g.as_ptr());
    let mut vb = _mm256_loadu_ps(b.as_ptr());
    vr = _mm256_mul_ps(_mm256_min_ps(one, _mm256_max_ps(zero, vr)), scale);
    vg = _mm256_mul_ps(_mm256_min_ps(one, _mm256_max_ps(zero, vg)), scale);
    vb = _mm256_mul_ps(_mm256_min_ps(one, _mm256_max_ps(zero, vb)), scale);

    let mut ri = [0i32; 8];
    let mut gi = [0i32; 8];
    let mut bi = [0i32; 8];
    _mm256_storeu_si256(ri.as_mut_ptr() as *mut __m256i, _mm256_cvttps_epi32(vr));
    _mm256_storeu_si256(gi.as_mut_ptr() as *mut __m256i, _mm256_cvttps_epi32(vg));
    _mm256_storeu_si256(bi.as_mut_ptr() as *mut __m256i, _mm256_cvttps_epi32(vb));

    for k in 0..8 {
        let d = 4 * k;
        dst[d] = ri[k] as u8;
        dst[d + 1] = gi[k] as u8;
        dst[d + 2] = bi[k] as u8;
        dst[d + 3] = 255;
    }
}

/// 3x3 median of each RGB channel over an RGBA8 image with edge-replicated
/// addressing at the borders; alpha passes through. Interior pixels run in
/// vector batches (8 per AVX2 step, 4 per SSE2 step), borders and remainders
/// run the scalar network.
///
/// * `src`    - Source RGBA8 image.
/// * `dst`    - Destination RGBA8 image, same size.
/// * `width`  - Image width in pixels.
/// * `height` - Image height in pixels.
pub(crate) fn median_filter(src: &[u8], dst: &mut [u8], width: usize, height: usize) {
    debug_assert_eq!(src.len(), width * height * 4);
    debug_assert_eq!(dst.len(), src.len());
    if width == 0 || height == 0 {
        return;
    }

    // Borders (and everything, for degenerate sizes) use clamped addressing.
    for x in 0..width {
        median_scalar_at(src, dst, x, 0, width, height);
        median_scalar_at(src, dst, x, height - 1, width, height);
    }
    for y in 0..height {
        median_scalar_at(src, dst, 0, y, width, height);
        median_scalar_at(src, dst, width - 1, y, width, height);
    }
    if width < 3 || height < 3 {
        return;
    }

    for y in 1..height - 1 {
        let mut x = 1;
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                while x + 8 <= width - 1 {
                    unsafe { median8_avx2(src, dst, x, y, width) };
                    x += 8;
                }
            }
            while x + 4 <= width - 1 {
                unsafe { median4_sse2(src, dst, x, y, width) };
                x += 4;
            }
        }
        while x < width - 1 {
            median_scalar_at(src, dst, x, y, width, height);
            x += 1;
        }
    }
}

/// Median of nine bytes via the 19-compare sorting network; leaves the
/// median in slot 4.
pub(crate) fn median9_scalar(v: &mut [u8; 9]) -> u8 {
    macro_rules! minmax {
        ($a:expr, $b:expr) => {
            if v[$a] > v[$b] {
                v.swap($a, $b);
            }
        };
    }
    minmax!(0, 1); minmax!(3, 4); minmax!(6, 7);
    minmax!(1, 2); minmax!(4, 5); minmax!(7, 8);
    minmax!(0, 1); minmax!(3, 4); minmax!(6, 7);
    minmax!(0, 3); minmax!(3, 6); minmax!(0, 3);
    minmax!(1, 4); minmax!(4, 7); minmax!(1, 4);
    minmax!(2, 5); minmax!(5, 8); minmax!(2, 5);
    minmax!(1, 3); minmax!(5, 7); minmax!(2, 6);
    minmax!(2, 3); minmax!(4, 6);
    minmax!(2, 4); minmax!(3, 4); minmax!(5, 6);
    v[4]
}

/// One pixel's 3x3 per-channel median with clamped addressing.
fn median_scalar_at(src: &[u8], dst: &mut [u8], x: usize, y: usize, width: usize, height: usize) {
    let mut rs = [0u8; 9];
    let mut gs = [0u8; 9];
    let mut bs = [0u8; 9];
    let mut k = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let sx = (x as i32 + dx).clamp(0, width as i32 - 1) as usize;
            let sy = (y as i32 + dy).clamp(0, height as i32 - 1) as usize;
            let idx = (sy * width + sx) * 4;
            rs[k] = src[idx];
            gs[k] = src[idx + 1];
            bs[k] = src[idx + 2];
            k += 1;
        }
    }
    let idx = (y * width + x) * 4;
    dst[idx] = median9_scalar(&mut rs);
    dst[idx + 1] = median9_scalar(&mut gs);
    dst[idx + 2] = median9_scalar(&mut bs);
    dst[idx + 3] = src[idx + 3];
}

/// The same 19-compare network over 16 packed unsigned bytes.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn median9_sse2(mut v: [__m128i; 9]) -> __m128i {
    macro_rules! minmax {
        ($a:expr, $b:expr) => {{
            let lo = _mm_min_epu8(v[$a], v[$b]);
            let hi = _mm_max_epu8(v[$a], v[$b]);
            v[$a] = lo;
            v[$b] = hi;
        }};
    }
    minmax!(0, 1); minmax!(3, 4); minmax!(6, 7);
    minmax!(1, 2); minmax!(4, 5); minmax!(7, 8);
    minmax!(0, 1); minmax!(3, 4); minmax!(6, 7);
    minmax!(0, 3); minmax!(3, 6); minmax!(0, 3);
    minmax!(1, 4); minmax!(4, 7); minmax!(1, 4);
    minmax!(2, 5); minmax!(5, 8); minmax!(2, 5);
    minmax!(1, 3); minmax!(5, 7); minmax!(2, 6);
    minmax!(2, 3); minmax!(4, 6);
    minmax!(2, 4); minmax!(3, 4); minmax!(5, 6);
    v[4]
}

/// The same 19-compare network over 32 packed unsigned bytes.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn median9_avx2(mut v: [__m256i; 9]) -> __m256i {
    macro_rules! minmax {
        ($a:expr, $b:expr) => {{
            let lo = _mm256_min_epu8(v[$a], v[$b]);
            let hi = _mm256_max_epu8(v[$a], v[$b]);
            v[$a] = lo;
            v[$b] = hi;
        }};
    }
    minmax!(0, 1); minmax!(3, 4); minmax!(6, 7);
    minmax!(1, 2); minmax!(4, 5); minmax!(7, 8);
    minmax!(0, 1); minmax!(3, 4); minmax!(6, 7);
    minmax!(0, 3); minmax!(3, 6); minmax!(0, 3);
    minmax!(1, 4); minmax!(4, 7); minmax!(1, 4);
    minmax!(2, 5); minmax!(5, 8); minmax!(2, 5);
    minmax!(1, 3); minmax!(5, 7); minmax!(2, 6);
    minmax!(2, 3); minmax!(4, 6);
    minmax!(2, 4); minmax!(3, 4); minmax!(5, 6);
    v[4]
}

/// Medians four interior pixels at `(x..x + 4, y)`. Callers guarantee the
/// full 3x3 neighborhood is in bounds.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn median4_sse2(src: &[u8], dst: &mut [u8], x: usize, y: usize, width: usize) {
    let mut rd = [[0u8; 16]; 9];
    let mut gd = [[0u8; 16]; 9];
    let mut bd = [[0u8; 16]; 9];
    let mut k = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let row = (y as i32 + dy) as usize * width;
            let col = (x as i32 + dx) as usize;
            for i in 0..4 {
                let p = (row + col + i) * 4;
                rd[k][i] = src[p];
                gd[k][i] = src[p + 1];
                bd[k][i] = src[p + 2];
            }
            k += 1;
        }
    }

    let mut vr = [_mm_setzero_si128(); 9];
    let mut vg = [_mm_setzero_si128(); 9];
    let mut vb = [_mm_setzero_si128(); 9];
    for k in 0..9 {
        vr[k] = _mm_loadu_si128(rd[k].as_ptr() as *const __m128i);
        vg[k] = _mm_loadu_si128(gd[k].as_ptr() as *const __m128i);
        vb[k] = _mm_loadu_si128(bd[k].as_ptr() as *const __m128i);
    }
    let med_r = median9_sse2(vr);
    let med_g = median9_sse2(vg);
    let med_b = median9_sse2(vb);

    let mut out_r = [0u8; 16];
    let mut out_g = [0u8; 16];
    let mut out_b = [0u8; 16];
    _mm_storeu_si128(out_r.as_mut_ptr() as *mut __m128i, med_r);
    _mm_storeu_si128(out_g.as_mut_ptr() as *mut __m128i, med_g);
    _mm_storeu_si128(out_b.as_mut_ptr() as *mut __m128i, med_b);

    for i in 0..4 {
        let idx = (y * width + x + i) * 4;
        dst[idx] = out_r[i];
        dst[idx + 1] = out_g[i];
        dst[idx + 2] = out_b[i];
        dst[idx + 3] = src[idx + 3];
    }
}

/// Medians eight interior pixels at `(x..x + 8, y)`.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn median8_avx2(src: &[u8], dst: &mut [u8], x: usize, y: usize, width: usize) {
    let mut rd = [[0u8; 32]; 9];
    let mut gd = [[0u8; 32]; 9];
    let mut bd = [[0u8; 32]; 9];
    let mut k = 0;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let row = (y as i32 + dy) as usize * width;
            let col = (x as i32 + dx) as usize;
            for i in 0..8 {
                let p = (row + col + i) * 4;
                rd[k][i] = src[p];
                gd[k][i] = src[p + 1];
                bd[k][i] = src[p + 2];
            }
            k += 1;
        }
    }

    let mut vr = [_mm256_setzero_si256(); 9];
    let mut vg = [_mm256_setzero_si256(); 9];
    let mut vb = [_mm256_setzero_si256(); 9];
    for k in 0..9 {
        vr[k] = _mm256_loadu_si256(rd[k].as_ptr() as *const __m256i);
        vg[k] = _mm256_loadu_si256(gd[k].as_ptr() as *const __m256i);
        vb[k] = _mm256_loadu_si256(bd[k].as_ptr() as *const __m256i);
    }
    let med_r = median9_avx2(vr);
    let med_g = median9_avx2(vg);
    let med_b = median9_avx2(vb);

    let mut out_r = [0u8; 32];
    let mut out_g = [0u8; 32];
    let mut out_b = [0u8; 32];
    _mm256_storeu_si256(out_r.as_mut_ptr() as *mut __m256i, med_r);
    _mm256_storeu_si256(out_g.as_mut_ptr() as *mut __m256i, med_g);
    _mm256_storeu_si256(out_b.as_mut_ptr() as *mut __m256i, med_b);

    for i in 0..8 {
        let idx = (y * width + x + i) * 4;
        dst[idx] = out_r[i];
        dst[idx + 1] = out_g[i];
        dst[idx + 2] = out_b[i];
        dst[idx + 3] = src[idx + 3];
    }
}
