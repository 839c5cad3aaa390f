//! Scalar helpers shared by the kernel and the value algebra.
//!
//! Tolerances, tolerant equality, angle-mode conversion and the trig
//! domain guard for plain `f64` arguments.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};

/// Relative tolerance used to classify complex numbers and compare reals.
pub const EPSILON: f64 = 1e-12;

/// Magnitudes below this are logically false.
pub const LOGICAL_ZERO: f64 = 1e-12;

/// Trig arguments beyond this magnitude lose all precision and are rejected.
pub const TRIG_LIMIT: f64 = 1e8;

/// Tolerant equality: exact match, or relative distance within [`EPSILON`].
///
/// Magnitudes below `f64::MIN_POSITIVE` compare absolutely so that values
/// that are both effectively zero compare equal.
#[inline]
pub fn almost_equals(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let d = (a - b).abs();
    let m = a.abs().max(b.abs());
    if m < f64::MIN_POSITIVE {
        return d < f64::MIN_POSITIVE;
    }
    d <= EPSILON * m
}

/// `true` unless the magnitude is below [`LOGICAL_ZERO`].
#[inline]
pub fn is_true(x: f64) -> bool {
    x.abs() >= LOGICAL_ZERO
}

/// Logical value as `1.0` / `0.0`.
#[inline]
pub const fn from_bool(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Sine with the domain guard.
pub fn sin(x: f64) -> MathResult<f64> {
    guard(x, "sin")?;
    Ok(x.sin())
}

/// Cosine with the domain guard.
pub fn cos(x: f64) -> MathResult<f64> {
    guard(x, "cos")?;
    Ok(x.cos())
}

/// Fails when `|x|` exceeds [`TRIG_LIMIT`].
#[inline]
pub fn guard(x: f64, function: &'static str) -> MathResult<()> {
    if x.abs() > TRIG_LIMIT {
        Err(MathError::ArgumentOutOfRange(function))
    } else {
        Ok(())
    }
}

/// `true` when `x` is an integer within [`EPSILON`].
#[inline]
pub fn is_integer(x: f64) -> bool {
    x.is_finite() && almost_equals(x, x.round())
}

// ---------------------------------------------------------------------------
// Angle modes
// ---------------------------------------------------------------------------

/// How unitless trig arguments and inverse-trig results are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    #[default]
    Deg,
    Rad,
    Gra,
}

impl AngleMode {
    /// Radians per one unit of this mode.
    #[must_use]
    pub fn to_radians_factor(self) -> f64 {
        match self {
            Self::Deg => std::f64::consts::PI / 180.0,
            Self::Rad => 1.0,
            Self::Gra => std::f64::consts::PI / 200.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerant_equality() {
        assert!(almost_equals(1.0, 1.0 + 1e-14));
        assert!(!almost_equals(1.0, 1.0 + 1e-9));
        assert!(almost_equals(0.0, 0.0));
        assert!(almost_equals(f64::INFINITY, f64::INFINITY));
        assert!(!almost_equals(f64::NAN, f64::NAN));
    }

    #[test]
    fn trig_guard() {
        assert!(sin(1e8).is_ok());
        assert_eq!(cos(1e9), Err(MathError::ArgumentOutOfRange("cos")));
    }

    #[test]
    fn logical_zero() {
        assert!(!is_true(1e-13));
        assert!(is_true(-1e-12));
    }

    #[test]
    fn angle_factors() {
        assert!((AngleMode::Deg.to_radians_factor() * 180.0 - std::f64::consts::PI).abs() < 1e-15);
        assert_eq!(AngleMode::Rad.to_radians_factor(), 1.0);
        assert!((AngleMode::Gra.to_radians_factor() * 200.0 - std::f64::consts::PI).abs() < 1e-15);
    }
}
