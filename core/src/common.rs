//! Common numeric types and helpers.

use num_traits::Num;

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Default signed integer to 32-bit.
pub type Int = i32;

/// Infinty (∞)
pub const INFINITY: Float = Float::INFINITY;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 1/PI (1/π)
pub const INV_PI: Float = 1.0 / PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// Minimum parametric distance for secondary rays; keeps scattered and
/// shadow rays from re-intersecting the surface they left.
pub const RAY_EPSILON: Float = 1e-3;

/// Sampled directions with a density at or below this are treated as
/// degenerate and contribute zero rather than dividing by a near-zero pdf.
pub const PDF_EPSILON: Float = 1e-6;

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value to the interval `[low, high]`.
///
/// * `val`  - The value.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Linearly interpolates between two values.
///
/// * `t`  - Interpolation parameter.
/// * `v0` - Value at `t == 0`.
/// * `v1` - Value at `t == 1`.
#[inline(always)]
pub fn lerp(t: Float, v0: Float, v1: Float) -> Float {
    (1.0 - t) * v0 + t * v1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(5, 1, 3), 3);
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(0.0, 2.0, 8.0), 2.0);
        assert_eq!(lerp(1.0, 2.0, 8.0), 8.0);
        assert_eq!(lerp(0.5, 2.0, 8.0), 5.0);
    }
}
