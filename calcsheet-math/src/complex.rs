//! Tolerance-classified complex arithmetic.
//!
//! [`Complex`] is a plain `(re, im)` pair of doubles. Type-dependent
//! dispatch (real fast paths, comparisons, integer division) goes through
//! [`Complex::kind`], which uses a *relative* tolerance so that rounding
//! noise from earlier operations does not turn a real number complex.
//!
//! Undefined results are reported through sentinels ([`Complex::NAN`],
//! [`Complex::COMPLEX_INFINITY`], ...). Only the trig domain guard fails
//! with an error.

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::MathResult;
use crate::math::{self, almost_equals, from_bool, EPSILON};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Result of classifying a complex number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexKind {
    Real,
    Imaginary,
    Complex,
}

/// Classify `(a, b)` with the relative tolerance test.
pub fn classify(a: f64, b: f64) -> ComplexKind {
    if b == 0.0 {
        return ComplexKind::Real;
    }
    if a == 0.0 {
        return ComplexKind::Imaginary;
    }
    let re = a.abs();
    let im = b.abs();
    let d = (re + im) * EPSILON;
    if im < d {
        ComplexKind::Real
    } else if re < d {
        ComplexKind::Imaginary
    } else {
        ComplexKind::Complex
    }
}

// ---------------------------------------------------------------------------
// Complex number
// ---------------------------------------------------------------------------

/// A complex number. `PartialEq` is exact structural equality; use
/// [`Complex::almost_equals`] for tolerant comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 0.0);
    pub const I: Self = Self::new(0.0, 1.0);
    pub const NAN: Self = Self::new(f64::NAN, 0.0);
    pub const POSITIVE_INFINITY: Self = Self::new(f64::INFINITY, 0.0);
    pub const NEGATIVE_INFINITY: Self = Self::new(f64::NEG_INFINITY, 0.0);
    /// Result of dividing a nonzero value by zero.
    pub const COMPLEX_INFINITY: Self = Self::new(f64::INFINITY, f64::INFINITY);

    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[must_use]
    pub const fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    #[must_use]
    pub fn kind(self) -> ComplexKind {
        classify(self.re, self.im)
    }

    #[must_use]
    pub fn is_real(self) -> bool {
        self.kind() == ComplexKind::Real
    }

    #[must_use]
    pub fn is_imaginary(self) -> bool {
        self.kind() == ComplexKind::Imaginary
    }

    #[must_use]
    pub fn is_complex(self) -> bool {
        self.kind() == ComplexKind::Complex
    }

    #[must_use]
    pub fn is_nan(self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    /// Principal argument in `(-pi, pi]`; exact `0` or `pi` on the real axis.
    #[must_use]
    pub fn phase(self) -> f64 {
        if self.im == 0.0 {
            return if self.re >= 0.0 { 0.0 } else { PI };
        }
        self.im.atan2(self.re)
    }

    /// Argument normalised into `[0, 2pi)`.
    #[must_use]
    pub fn normal_phase(self) -> f64 {
        let phi = self.im.atan2(self.re);
        if phi < 0.0 {
            phi + 2.0 * PI
        } else {
            phi
        }
    }

    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self::new(self.re, -self.im)
    }

    /// Modulus, scaled to avoid intermediate overflow.
    #[must_use]
    pub fn abs(self) -> f64 {
        modulus(self.re, self.im)
    }

    /// Sign of a real value, `NaN` otherwise.
    #[must_use]
    pub fn sign(self) -> Self {
        if self.is_real() {
            if self.re == 0.0 {
                Self::ZERO
            } else {
                Self::real(self.re.signum())
            }
        } else {
            Self::NAN
        }
    }

    /// Tolerant, classification-aware equality.
    ///
    /// Two reals compare only their real parts, two imaginaries only their
    /// imaginary parts; anything else compares both components.
    #[must_use]
    pub fn almost_equals(self, other: Self) -> bool {
        match (self.kind(), other.kind()) {
            (ComplexKind::Real, ComplexKind::Real) => almost_equals(self.re, other.re),
            (ComplexKind::Imaginary, ComplexKind::Imaginary) => almost_equals(self.im, other.im),
            _ => almost_equals(self.re, other.re) && almost_equals(self.im, other.im),
        }
    }

    // -- integer division, remainder, comparisons ---------------------------

    /// Truncated division, defined only for a real nonzero divisor.
    #[must_use]
    pub fn int_div(self, rhs: Self) -> Self {
        if rhs.is_real() && rhs.re != 0.0 {
            Self::new((self.re / rhs.re).trunc(), (self.im / rhs.re).trunc())
        } else {
            Self::NAN
        }
    }

    /// Remainder, defined only for a real divisor.
    #[must_use]
    pub fn rem(self, rhs: Self) -> Self {
        if rhs.is_real() {
            Self::new(self.re % rhs.re, self.im % rhs.re)
        } else {
            Self::NAN
        }
    }

    #[must_use]
    pub fn eq_value(self, rhs: Self) -> f64 {
        from_bool(self.almost_equals(rhs))
    }

    #[must_use]
    pub fn ne_value(self, rhs: Self) -> f64 {
        from_bool(!self.almost_equals(rhs))
    }

    #[must_use]
    pub fn lt(self, rhs: Self) -> f64 {
        self.compare(rhs, |a, b| a < b && !almost_equals(a, b))
    }

    #[must_use]
    pub fn gt(self, rhs: Self) -> f64 {
        self.compare(rhs, |a, b| a > b && !almost_equals(a, b))
    }

    #[must_use]
    pub fn le(self, rhs: Self) -> f64 {
        self.compare(rhs, |a, b| a <= b || almost_equals(a, b))
    }

    #[must_use]
    pub fn ge(self, rhs: Self) -> f64 {
        self.compare(rhs, |a, b| a >= b || almost_equals(a, b))
    }

    fn compare(self, rhs: Self, f: impl Fn(f64, f64) -> bool) -> f64 {
        if self.is_real() && rhs.is_real() {
            from_bool(f(self.re, rhs.re))
        } else {
            f64::NAN
        }
    }

    // -- trigonometric -------------------------------------------------------

    pub fn sin(self) -> MathResult<Self> {
        math::guard(self.re, "sin")?;
        let (s, c) = self.re.sin_cos();
        Ok(Self::new(s * self.im.cosh(), c * self.im.sinh()))
    }

    pub fn cos(self) -> MathResult<Self> {
        math::guard(self.re, "cos")?;
        let (s, c) = self.re.sin_cos();
        Ok(Self::new(c * self.im.cosh(), -s * self.im.sinh()))
    }

    #[must_use]
    pub fn tan(self) -> Self {
        let ta = self.re.tan();
        if self.im == 0.0 {
            return Self::real(ta);
        }
        let thb = self.im.tanh();
        Self::new(ta, thb) / Self::new(1.0, -ta * thb)
    }

    #[must_use]
    pub fn cot(self) -> Self {
        let ta = self.re.tan();
        if self.im == 0.0 {
            return Self::real(1.0 / ta);
        }
        let thb = self.im.tanh();
        Self::new(1.0, -ta * thb) / Self::new(ta, thb)
    }

    pub fn sinh(self) -> MathResult<Self> {
        math::guard(self.im, "sinh")?;
        let (s, c) = self.im.sin_cos();
        Ok(Self::new(self.re.sinh() * c, self.re.cosh() * s))
    }

    pub fn cosh(self) -> MathResult<Self> {
        math::guard(self.im, "cosh")?;
        let (s, c) = self.im.sin_cos();
        Ok(Self::new(self.re.cosh() * c, self.re.sinh() * s))
    }

    #[must_use]
    pub fn tanh(self) -> Self {
        let tha = self.re.tanh();
        let tb = self.im.tan();
        if tb == 0.0 {
            Self::real(tha)
        } else {
            Self::new(tha, tb) / Self::new(1.0, tha * tb)
        }
    }

    #[must_use]
    pub fn coth(self) -> Self {
        let tha = self.re.tanh();
        let tb = self.im.tan();
        if tb == 0.0 {
            Self::real(1.0 / tha)
        } else {
            Self::new(1.0, tha * tb) / Self::new(tha, tb)
        }
    }

    // -- inverse trigonometric ----------------------------------------------

    #[must_use]
    pub fn asin(self) -> Self {
        -Self::I * (Self::I * self + (Self::ONE - self * self).sqrt()).ln()
    }

    #[must_use]
    pub fn acos(self) -> Self {
        -Self::I * (self + Self::I * (Self::ONE - self * self).sqrt()).ln()
    }

    /// Arc tangent; `+i` and `-i` map to `+i inf` and `-i inf`.
    #[must_use]
    pub fn atan(self) -> Self {
        if self == Self::I {
            Self::new(0.0, f64::INFINITY)
        } else if self == -Self::I {
            Self::new(0.0, f64::NEG_INFINITY)
        } else {
            -Self::I / 2.0 * ((Self::I - self) / (Self::I + self)).ln()
        }
    }

    /// Arc cotangent; `+i` and `-i` map to `-i inf` and `+i inf`.
    #[must_use]
    pub fn acot(self) -> Self {
        if self == Self::I {
            Self::new(0.0, f64::NEG_INFINITY)
        } else if self == -Self::I {
            Self::new(0.0, f64::INFINITY)
        } else {
            -Self::I / 2.0 * ((self + Self::I) / (self - Self::I)).ln()
        }
    }

    #[must_use]
    pub fn asinh(self) -> Self {
        (self + (self * self + Self::ONE).sqrt()).ln()
    }

    #[must_use]
    pub fn acosh(self) -> Self {
        (self + (self - Self::ONE).sqrt() * (self + Self::ONE).sqrt()).ln()
    }

    #[must_use]
    pub fn atanh(self) -> Self {
        ((Self::ONE + self) / (Self::ONE - self)).ln() / 2.0
    }

    #[must_use]
    pub fn acoth(self) -> Self {
        ((self + Self::ONE) / (self - Self::ONE)).ln() / 2.0
    }

    /// `atan2(self, x)` for real operands, `NaN` otherwise.
    #[must_use]
    pub fn atan2(self, x: Self) -> Self {
        if self.is_real() && x.is_real() {
            Self::real(self.re.atan2(x.re))
        } else {
            Self::NAN
        }
    }

    // -- powers, roots, logarithms ------------------------------------------

    /// Power with a real exponent.
    #[must_use]
    pub fn powf(self, power: f64) -> Self {
        if power == 0.0 {
            return Self::ONE;
        }
        let is_integer = power.fract() == 0.0 && power.is_finite();
        if self.im == 0.0 && (self.re > 0.0 || is_integer) {
            return if self.re == 0.0 {
                Self::ZERO
            } else {
                Self::real(self.re.powf(power))
            };
        }
        if power == 2.0 {
            return self * self;
        }
        if is_integer && power > 0.0 && power < 6.0 {
            let mut result = self;
            for _ in 1..power as i32 {
                result = result * self;
            }
            return result;
        }
        let r = self.abs();
        let theta = power * self.normal_phase();
        let t = r.powf(power);
        Self::new(t * theta.cos(), t * theta.sin())
    }

    /// Power with a complex exponent.
    #[must_use]
    pub fn pow(self, power: Self) -> Self {
        let (c, d) = (power.re, power.im);
        if d == 0.0 {
            return self.powf(c);
        }
        if self.re == 0.0 && self.im == 0.0 {
            return Self::ZERO;
        }
        let r = self.abs();
        let phi = self.normal_phase();
        let theta = c * phi + d * r.ln();
        let t = r.powf(c) * (-d * phi).exp();
        Self::new(t * theta.cos(), t * theta.sin())
    }

    #[must_use]
    pub fn ln(self) -> Self {
        Self::new(self.abs().ln(), self.phase())
    }

    #[must_use]
    pub fn log10(self) -> Self {
        let k = std::f64::consts::LOG10_E;
        Self::new(self.abs().ln() * k, self.phase() * k)
    }

    #[must_use]
    pub fn log2(self) -> Self {
        let k = std::f64::consts::LOG2_E;
        Self::new(self.abs().ln() * k, self.phase() * k)
    }

    #[must_use]
    pub fn exp(self) -> Self {
        let r = self.re.exp();
        Self::new(r * self.im.cos(), r * self.im.sin())
    }

    #[must_use]
    pub fn sqrt(self) -> Self {
        let r = self.abs().sqrt();
        let theta = self.normal_phase() / 2.0;
        Self::new(r * theta.cos(), r * theta.sin())
    }

    #[must_use]
    pub fn cbrt(self) -> Self {
        let r = self.abs().cbrt();
        let theta = self.normal_phase() / 3.0;
        Self::new(r * theta.cos(), r * theta.sin())
    }

    // -- rounding ------------------------------------------------------------

    /// Componentwise rounding, midpoints away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self::new(self.re.round(), self.im.round())
    }

    #[must_use]
    pub fn floor(self) -> Self {
        Self::new(self.re.floor(), self.im.floor())
    }

    #[must_use]
    pub fn ceiling(self) -> Self {
        Self::new(self.re.ceil(), self.im.ceil())
    }

    #[must_use]
    pub fn truncate(self) -> Self {
        Self::new(self.re.trunc(), self.im.trunc())
    }
}

fn modulus(a: f64, b: f64) -> f64 {
    if a.is_infinite() || b.is_infinite() {
        return f64::INFINITY;
    }
    let c = a.abs();
    let d = b.abs();
    if c > d {
        let r = d / c;
        c * (1.0 + r * r).sqrt()
    } else if d == 0.0 {
        c
    } else {
        let r = c / d;
        d * (1.0 + r * r).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

impl From<f64> for Complex {
    fn from(re: f64) -> Self {
        Self::real(re)
    }
}

impl Neg for Complex {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}

impl Add for Complex {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.im * rhs.re + self.re * rhs.im,
        )
    }
}

impl Mul<f64> for Complex {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

impl Div<f64> for Complex {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.re / rhs, self.im / rhs)
    }
}

impl Div for Complex {
    type Output = Self;

    /// Smith's algorithm: the larger divisor component is the pivot.
    fn div(self, rhs: Self) -> Self {
        let (a, b, c, d) = (self.re, self.im, rhs.re, rhs.im);
        if d == 0.0 {
            if c == 0.0 && (a != 0.0 || b != 0.0) {
                return Self::COMPLEX_INFINITY;
            }
            return Self::new(a / c, b / c);
        }
        if (c.is_infinite() || d.is_infinite()) && !(a.is_infinite() || b.is_infinite()) {
            return Self::ZERO;
        }
        if d.abs() < c.abs() {
            let e = d / c;
            let f = 1.0 / (c + d * e);
            Self::new((a + b * e) * f, (b - a * e) * f)
        } else {
            let e = c / d;
            let f = 1.0 / (d + c * e);
            Self::new((b + a * e) * f, (-a + b * e) * f)
        }
    }
}

impl Div<Complex> for f64 {
    type Output = Complex;
    fn div(self, rhs: Complex) -> Complex {
        let (a, b) = (rhs.re, rhs.im);
        if b == 0.0 {
            if a == 0.0 && self != 0.0 {
                return Complex::POSITIVE_INFINITY;
            }
            return Complex::real(self / a);
        }
        if (a.is_infinite() || b.is_infinite()) && !self.is_infinite() {
            return Complex::ZERO;
        }
        if b.abs() < a.abs() {
            let e = b / a;
            let f = 1.0 / (a + b * e);
            Complex::new(self * f, -self * e * f)
        } else {
            let e = a / b;
            let f = 1.0 / (b + a * e);
            Complex::new(self * e * f, -self * f)
        }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ComplexKind::Real => write!(f, "{}", self.re),
            ComplexKind::Imaginary => write!(f, "{}i", self.im),
            ComplexKind::Complex if self.im < 0.0 => write!(f, "{} - {}i", self.re, -self.im),
            ComplexKind::Complex => write!(f, "{} + {}i", self.re, self.im),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MathError;

    fn close(a: Complex, b: Complex) -> bool {
        (a - b).abs() <= 1e-9 * (1.0 + b.abs())
    }

    #[test]
    fn classification_uses_relative_tolerance() {
        assert_eq!(classify(1.0, 0.0), ComplexKind::Real);
        assert_eq!(classify(1e6, 1e-8), ComplexKind::Real);
        assert_eq!(classify(1e-20, 1.0), ComplexKind::Imaginary);
        assert_eq!(classify(0.0, 2.0), ComplexKind::Imaginary);
        assert_eq!(classify(1.0, 1e-6), ComplexKind::Complex);
    }

    #[test]
    fn square_fast_path_matches_product() {
        for z in [
            Complex::new(1.5, -2.0),
            Complex::new(-3.0, 0.0),
            Complex::new(0.0, 4.0),
            Complex::new(1e3, 1e-3),
        ] {
            assert!(close(z.powf(2.0), z * z), "z = {z}");
            assert!(close(z.pow(Complex::real(2.0)), z * z), "z = {z}");
        }
    }

    #[test]
    fn small_integer_powers_and_polar_form() {
        let z = Complex::new(1.0, 1.0);
        assert!(close(z.powf(3.0), z * z * z));
        assert!(close(z.powf(5.0), z * z * z * z * z));
        // Polar path for a fractional exponent
        let r = z.powf(0.5);
        assert!(close(r * r, z));
        assert_eq!(Complex::real(-8.0).powf(3.0), Complex::real(-512.0));
        assert_eq!(Complex::ZERO.powf(2.5), Complex::ZERO);
        assert_eq!(Complex::new(3.0, 4.0).powf(0.0), Complex::ONE);
    }

    #[test]
    fn self_division_is_one() {
        for z in [Complex::new(2.0, 3.0), Complex::new(-1e200, 1e200), Complex::new(1e-300, -1e-300)] {
            assert!((z / z).almost_equals(Complex::ONE), "z = {z}");
        }
    }

    #[test]
    fn division_sentinels() {
        assert_eq!(Complex::new(1.0, 2.0) / Complex::ZERO, Complex::COMPLEX_INFINITY);
        assert!((Complex::ZERO / Complex::ZERO).is_nan());
        assert_eq!(
            Complex::new(1.0, 2.0) / Complex::new(f64::INFINITY, 1.0),
            Complex::ZERO
        );
        assert_eq!(1.0 / Complex::ZERO, Complex::POSITIVE_INFINITY);
    }

    #[test]
    fn int_div_and_rem_need_real_divisor() {
        assert_eq!(Complex::real(7.0).int_div(Complex::real(2.0)), Complex::real(3.0));
        assert_eq!(Complex::real(7.0).rem(Complex::real(4.0)), Complex::real(3.0));
        assert!(Complex::real(7.0).int_div(Complex::I).is_nan());
        assert!(Complex::real(7.0).rem(Complex::new(1.0, 1.0)).is_nan());
    }

    #[test]
    fn comparisons_only_for_reals() {
        assert_eq!(Complex::real(1.0).lt(Complex::real(2.0)), 1.0);
        assert_eq!(Complex::real(2.0).le(Complex::real(2.0 + 1e-14)), 1.0);
        assert_eq!(Complex::real(2.0).gt(Complex::real(2.0 + 1e-14)), 0.0);
        assert!(Complex::I.lt(Complex::real(2.0)).is_nan());
    }

    #[test]
    fn almost_equals_is_classification_aware() {
        assert!(Complex::new(1.0, 1e-20).almost_equals(Complex::real(1.0)));
        assert!(Complex::new(1e-20, 2.0).almost_equals(Complex::new(0.0, 2.0)));
        assert!(!Complex::new(1.0, 1.0).almost_equals(Complex::new(1.0, 1.1)));
        assert_eq!(Complex::real(3.0).eq_value(Complex::real(3.0)), 1.0);
        assert_eq!(Complex::real(3.0).ne_value(Complex::real(3.0)), 0.0);
    }

    #[test]
    fn trig_domain_guard() {
        assert_eq!(
            Complex::real(2e8).sin(),
            Err(MathError::ArgumentOutOfRange("sin"))
        );
        assert_eq!(
            Complex::real(-2e8).cos(),
            Err(MathError::ArgumentOutOfRange("cos"))
        );
        assert_eq!(
            Complex::new(0.0, 2e8).sinh(),
            Err(MathError::ArgumentOutOfRange("sinh"))
        );
        assert_eq!(
            Complex::new(0.0, -2e8).cosh(),
            Err(MathError::ArgumentOutOfRange("cosh"))
        );
        // Huge real part is fine for the hyperbolic functions
        assert!(Complex::new(2e8, 0.0).sinh().is_ok());
    }

    #[test]
    fn inverse_trig_branch_points() {
        assert_eq!(Complex::I.atan(), Complex::new(0.0, f64::INFINITY));
        assert_eq!((-Complex::I).atan(), Complex::new(0.0, f64::NEG_INFINITY));
        assert_eq!(Complex::I.acot(), Complex::new(0.0, f64::NEG_INFINITY));
        let z = Complex::new(0.3, 0.2);
        assert!(close(z.sin().unwrap().asin(), z));
        assert!(close(z.tan().atan(), z));
        assert!(close(z.tanh().atanh(), z));
    }

    #[test]
    fn roots_use_normal_phase() {
        assert!(close(Complex::real(-4.0).sqrt(), Complex::new(0.0, 2.0)));
        let c = Complex::real(-8.0).cbrt();
        assert!(close(c * c * c, Complex::real(-8.0)));
    }

    #[test]
    fn complex_exponent() {
        // i^i = e^(-pi/2)
        let r = Complex::I.pow(Complex::I);
        assert!(close(r, Complex::real((-PI / 2.0).exp())));
        assert_eq!(Complex::ZERO.pow(Complex::new(1.0, 1.0)), Complex::ZERO);
    }

    #[test]
    fn rounding_is_componentwise_away_from_zero() {
        assert_eq!(Complex::new(2.5, -2.5).round(), Complex::new(3.0, -3.0));
        assert_eq!(Complex::new(2.7, -2.2).floor(), Complex::new(2.0, -3.0));
        assert_eq!(Complex::new(2.2, -2.7).ceiling(), Complex::new(3.0, -2.0));
        assert_eq!(Complex::new(2.7, -2.7).truncate(), Complex::new(2.0, -2.0));
    }
}
