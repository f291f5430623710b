//! RGB Spectrum

use crate::common::{max, Float};
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Sub};

/// Number of colour channels.
pub const RGB_SAMPLES: usize = 3;

/// Linear HDR radiance as a weighted sum of red, green and blue components.
/// Values are unbounded and not clamped at this layer; display clamping is a
/// pixel-pipeline concern.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RGBSpectrum {
    /// The channel values.
    c: [Float; RGB_SAMPLES],
}

impl RGBSpectrum {
    /// Black.
    pub const ZERO: Self = Self { c: [0.0; RGB_SAMPLES] };

    /// Full white / unit throughput.
    pub const ONE: Self = Self { c: [1.0; RGB_SAMPLES] };

    /// Creates a spectrum with a constant value across all channels.
    ///
    /// * `v` - Constant value.
    pub fn new(v: Float) -> Self {
        Self { c: [v; RGB_SAMPLES] }
    }

    /// Creates a spectrum from individual channel values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Returns the channel values as `[r, g, b]`.
    pub fn to_rgb(&self) -> [Float; RGB_SAMPLES] {
        self.c
    }

    /// Returns true if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0)
    }

    /// Returns true if any channel is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Returns the largest channel value.
    pub fn max_component_value(&self) -> Float {
        max(self.c[0], max(self.c[1], self.c[2]))
    }

    /// Returns the luminance (Rec. 709 luma weights).
    pub fn y(&self) -> Float {
        0.212671 * self.c[0] + 0.715160 * self.c[1] + 0.072169 * self.c[2]
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self {
            c: [
                self.c[0] + other.c[0],
                self.c[1] + other.c[1],
                self.c[2] + other.c[2],
            ],
        }
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self {
            c: [
                self.c[0] - other.c[0],
                self.c[1] - other.c[1],
                self.c[2] - other.c[2],
            ],
        }
    }
}

/// Component-wise product; used for throughput accumulation.
impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self {
            c: [
                self.c[0] * other.c[0],
                self.c[1] * other.c[1],
                self.c[2] * other.c[2],
            ],
        }
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, f: Float) -> Self::Output {
        Self {
            c: [self.c[0] * f, self.c[1] * f, self.c[2] * f],
        }
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, f: Float) {
        *self = *self * f;
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> Self::Output {
        s * self
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, f: Float) -> Self::Output {
        debug_assert!(f != 0.0);
        Self {
            c: [self.c[0] / f, self.c[1] / f, self.c[2] / f],
        }
    }
}

impl DivAssign<Float> for RGBSpectrum {
    fn div_assign(&mut self, f: Float) {
        debug_assert!(f != 0.0);
        *self = *self / f;
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_detection() {
        assert!(RGBSpectrum::ZERO.is_black());
        assert!(!RGBSpectrum::from_rgb(0.0, 1e-8, 0.0).is_black());
    }

    #[test]
    fn nan_detection() {
        assert!(!RGBSpectrum::ONE.has_nans());
        assert!(RGBSpectrum::from_rgb(0.0, Float::NAN, 0.0).has_nans());
    }

    #[test]
    fn component_wise_product() {
        let a = RGBSpectrum::from_rgb(1.0, 2.0, 3.0);
        let b = RGBSpectrum::from_rgb(0.5, 0.5, 2.0);
        assert_eq!(a * b, RGBSpectrum::from_rgb(0.5, 1.0, 6.0));
    }

    #[test]
    fn max_component() {
        let s = RGBSpectrum::from_rgb(0.25, 0.75, 0.5);
        assert_eq!(s.max_component_value(), 0.75);
    }

    #[test]
    fn scalar_ops() {
        let s = RGBSpectrum::new(2.0);
        assert_eq!(s * 0.5, RGBSpectrum::new(1.0));
        assert_eq!(s / 2.0, RGBSpectrum::new(1.0));
        assert_eq!(0.5 * s, RGBSpectrum::new(1.0));
    }
}
