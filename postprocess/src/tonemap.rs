//! Tone mapping operators.

use aurora_core::common::{max, Float};

/// Maps unbounded HDR linear radiance into a displayable range. Applied per
/// channel before gamma correction; exactly one operator is active per frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ToneMap {
    /// No compression; negative inputs clamp to zero and the gamma stage
    /// clamps the top end.
    #[default]
    Clamp,

    /// Reinhard `c / (c + 1)`.
    Reinhard,

    /// ACES filmic curve (Narkowicz's rational-polynomial fit).
    Aces,
}

impl ToneMap {
    /// Applies the operator to one linear channel value.
    ///
    /// * `c` - Linear channel value.
    pub fn apply(&self, c: Float) -> Float {
        match self {
            Self::Clamp => max(0.0, c),
            Self::Reinhard => c / (c + 1.0),
            Self::Aces => aces_film(c),
        }
    }
}

/// ACES filmic fit. Negative inputs are clamped before evaluating the
/// rational polynomial.
fn aces_film(x: Float) -> Float {
    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
    let x = max(0.0, x);
    (x * (a * x + b)) / (x * (c * x + d) + e)
}
