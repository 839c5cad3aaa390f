//! Unit-aware scalar values.
//!
//! [`RealValue`] and [`ComplexValue`] wrap a number with an optional shared
//! unit and an `is_unit` flag (the value denotes the unit itself, as in the
//! `m` of `5*m`). Every operator asks [`Unit`] for consistency and a
//! conversion factor, applies the factor to the right operand and then
//! delegates to the number arithmetic.
//!
//! [`Scalar`] is the closed `Real | Complex` pair. Mixed operands widen the
//! real side to complex; a complex result is never narrowed back.

use std::cmp::Ordering;
use std::fmt;

use crate::complex::Complex;
use crate::error::{MathError, MathResult};
use crate::math::{almost_equals, from_bool, is_true};
use crate::unit::{Unit, UnitRef};
use crate::value::Operator;

fn units_text(u: Option<&UnitRef>) -> String {
    u.map_or_else(String::new, |u| u.name().to_owned())
}

/// Dimensionless, non-unit right operands fold into the number.
fn foldable(unit: Option<&UnitRef>, is_unit: bool) -> Option<f64> {
    match unit {
        Some(u) if u.is_dimensionless() && !is_unit => Some(u.dimensionless_factor()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// RealValue
// ---------------------------------------------------------------------------

/// A real number with an optional unit.
#[derive(Debug, Clone, Default)]
pub struct RealValue {
    pub value: f64,
    pub unit: Option<UnitRef>,
    pub is_unit: bool,
}

impl PartialEq for RealValue {
    /// Exact structural equality.
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && match (&self.unit, &other.unit) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}

impl RealValue {
    pub const ZERO: Self = Self::new(0.0);
    pub const ONE: Self = Self::new(1.0);
    pub const NAN: Self = Self::new(f64::NAN);

    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            unit: None,
            is_unit: false,
        }
    }

    #[must_use]
    pub const fn with_unit(value: f64, unit: Option<UnitRef>) -> Self {
        Self {
            value,
            unit,
            is_unit: false,
        }
    }

    /// The unit itself, as a value of 1.
    #[must_use]
    pub const fn unit_value(unit: UnitRef) -> Self {
        Self {
            value: 1.0,
            unit: Some(unit),
            is_unit: true,
        }
    }

    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        Self::new(from_bool(b))
    }

    /// Tolerant equality after converting `other` into this unit.
    #[must_use]
    pub fn almost_equals(&self, other: &Self) -> bool {
        match (&self.unit, &other.unit) {
            (None, None) => almost_equals(self.value, other.value),
            (Some(a), Some(b)) if a.is_consistent(b) => {
                almost_equals(self.value, other.value * b.convert_to(a))
            }
            _ => false,
        }
    }

    /// Ordering after converting `other` into this unit.
    pub fn compare(&self, other: &Self) -> MathResult<Option<Ordering>> {
        let d = Unit::convert(self.unit.as_ref(), other.unit.as_ref(), ',')?;
        Ok(self.value.partial_cmp(&(other.value * d)))
    }

    /// `true` when the value is printed with a separating operator.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        Unit::is_composite(self.value, self.unit.as_ref())
    }

    /// Number with any dimensionless unit folded in.
    #[must_use]
    pub fn folded(&self) -> Option<f64> {
        match &self.unit {
            None => Some(self.value),
            Some(u) if u.is_dimensionless() => Some(self.value * u.dimensionless_factor()),
            Some(_) => None,
        }
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            value: -self.value,
            unit: self.unit.clone(),
            is_unit: self.is_unit,
        }
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        Self::with_unit(self.value.abs(), self.unit.clone())
    }

    /// Square root; a dimensionless unit is folded first.
    #[must_use]
    pub fn sqrt(&self) -> Self {
        match &self.unit {
            Some(u) if u.is_dimensionless() => Self::new((self.value * u.dimensionless_factor()).sqrt()),
            Some(u) => Self::with_unit(self.value.sqrt(), Some(u.pow(0.5).into())),
            None => Self::new(self.value.sqrt()),
        }
    }

    pub fn add(&self, b: &Self) -> MathResult<Self> {
        let d = Unit::convert(self.unit.as_ref(), b.unit.as_ref(), '+')?;
        Ok(Self::with_unit(self.value + b.value * d, self.unit.clone()))
    }

    pub fn sub(&self, b: &Self) -> MathResult<Self> {
        let d = Unit::convert(self.unit.as_ref(), b.unit.as_ref(), '-')?;
        Ok(Self::with_unit(self.value - b.value * d, self.unit.clone()))
    }

    #[must_use]
    pub fn mul(&self, b: &Self) -> Self {
        if self.unit.is_none() {
            if let Some(k) = foldable(b.unit.as_ref(), b.is_unit) {
                return Self::new(self.value * b.value * k);
            }
            return Self::with_unit(self.value * b.value, b.unit.clone());
        }
        let (unit, d) = Unit::multiply(self.unit.as_ref(), b.unit.as_ref(), b.is_unit);
        let is_unit = self.is_unit && b.is_unit && unit.is_some();
        Self {
            value: self.value * b.value * d,
            unit,
            is_unit,
        }
    }

    #[must_use]
    pub fn div(&self, b: &Self) -> Self {
        let (unit, d) = Unit::divide(self.unit.as_ref(), b.unit.as_ref(), b.is_unit);
        let is_unit = self.is_unit && b.is_unit && unit.is_some();
        Self {
            value: self.value / b.value * d,
            unit,
            is_unit,
        }
    }

    pub fn rem(&self, b: &Self) -> MathResult<Self> {
        if b.unit.is_some() {
            return Err(MathError::RemainderUnits(units_text(b.unit.as_ref())));
        }
        Ok(Self::with_unit(self.value % b.value, self.unit.clone()))
    }

    #[must_use]
    pub fn int_div(&self, b: &Self) -> Self {
        let (unit, d) = Unit::divide(self.unit.as_ref(), b.unit.as_ref(), false);
        let is_unit = self.is_unit && b.is_unit && unit.is_some();
        let value = if b.value == 0.0 {
            f64::NAN
        } else {
            (self.value / b.value * d).trunc()
        };
        Self {
            value,
            unit,
            is_unit,
        }
    }

    /// Power with a real exponent; the exponent must be unitless.
    pub fn pow(&self, b: &Self) -> MathResult<Self> {
        let p = b.folded().ok_or(MathError::PowerNotUnitless)?;
        Ok(match &self.unit {
            Some(u) if u.is_dimensionless() => Self::new((self.value * u.dimensionless_factor()).powf(p)),
            Some(u) => Self::with_unit(self.value.powf(p), Some(u.pow(p).into())),
            None => Self::new(self.value.powf(p)),
        })
    }

    fn relation(&self, b: &Self, op: char, f: impl Fn(f64, f64) -> bool) -> MathResult<Self> {
        let d = Unit::convert(self.unit.as_ref(), b.unit.as_ref(), op)?;
        Ok(Self::from_bool(f(self.value, b.value * d)))
    }

    pub fn eq_value(&self, b: &Self) -> MathResult<Self> {
        self.relation(b, '≡', almost_equals)
    }

    pub fn ne_value(&self, b: &Self) -> MathResult<Self> {
        self.relation(b, '≠', |x, y| !almost_equals(x, y))
    }

    pub fn lt(&self, b: &Self) -> MathResult<Self> {
        self.relation(b, '<', |x, y| x < y && !almost_equals(x, y))
    }

    pub fn gt(&self, b: &Self) -> MathResult<Self> {
        self.relation(b, '>', |x, y| x > y && !almost_equals(x, y))
    }

    pub fn le(&self, b: &Self) -> MathResult<Self> {
        self.relation(b, '≤', |x, y| x <= y || almost_equals(x, y))
    }

    pub fn ge(&self, b: &Self) -> MathResult<Self> {
        self.relation(b, '≥', |x, y| x >= y || almost_equals(x, y))
    }

    #[must_use]
    pub fn and(&self, b: &Self) -> Self {
        Self::from_bool(is_true(self.value) && is_true(b.value))
    }

    #[must_use]
    pub fn or(&self, b: &Self) -> Self {
        Self::from_bool(is_true(self.value) || is_true(b.value))
    }

    #[must_use]
    pub fn xor(&self, b: &Self) -> Self {
        Self::from_bool(is_true(self.value) != is_true(b.value))
    }
}

impl fmt::Display for RealValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(u) if self.is_unit => write!(f, "{u}"),
            Some(u) => write!(f, "{}{u}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

// ---------------------------------------------------------------------------
// ComplexValue
// ---------------------------------------------------------------------------

/// A complex number with an optional unit.
#[derive(Debug, Clone, Default)]
pub struct ComplexValue {
    pub number: Complex,
    pub unit: Option<UnitRef>,
    pub is_unit: bool,
}

impl PartialEq for ComplexValue {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && match (&self.unit, &other.unit) {
                (None, None) => true,
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}

impl From<RealValue> for ComplexValue {
    fn from(r: RealValue) -> Self {
        Self {
            number: Complex::real(r.value),
            unit: r.unit,
            is_unit: r.is_unit,
        }
    }
}

impl ComplexValue {
    #[must_use]
    pub const fn new(number: Complex) -> Self {
        Self {
            number,
            unit: None,
            is_unit: false,
        }
    }

    #[must_use]
    pub const fn with_unit(number: Complex, unit: Option<UnitRef>) -> Self {
        Self {
            number,
            unit,
            is_unit: false,
        }
    }

    /// Narrow to a real value; fails unless the number classifies as real.
    pub fn to_real(&self) -> MathResult<RealValue> {
        if self.number.is_real() {
            Ok(RealValue::with_unit(self.number.re, self.unit.clone()))
        } else {
            Err(MathError::MustBeReal("value"))
        }
    }

    #[must_use]
    pub fn almost_equals(&self, other: &Self) -> bool {
        match (&self.unit, &other.unit) {
            (None, None) => self.number.almost_equals(other.number),
            (Some(a), Some(b)) if a.is_consistent(b) => {
                self.number.almost_equals(other.number * b.convert_to(a))
            }
            _ => false,
        }
    }

    /// Lexicographic ordering: real parts, then imaginary parts.
    pub fn compare(&self, other: &Self) -> MathResult<Option<Ordering>> {
        let d = Unit::convert(self.unit.as_ref(), other.unit.as_ref(), ',')?;
        let b = other.number * d;
        Ok(match self.number.re.partial_cmp(&b.re) {
            Some(Ordering::Equal) => self.number.im.partial_cmp(&b.im),
            ord => ord,
        })
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            number: -self.number,
            unit: self.unit.clone(),
            is_unit: self.is_unit,
        }
    }

    pub fn add(&self, b: &Self) -> MathResult<Self> {
        let d = Unit::convert(self.unit.as_ref(), b.unit.as_ref(), '+')?;
        Ok(Self::with_unit(self.number + b.number * d, self.unit.clone()))
    }

    pub fn sub(&self, b: &Self) -> MathResult<Self> {
        let d = Unit::convert(self.unit.as_ref(), b.unit.as_ref(), '-')?;
        Ok(Self::with_unit(self.number - b.number * d, self.unit.clone()))
    }

    #[must_use]
    pub fn mul(&self, b: &Self) -> Self {
        if self.unit.is_none() {
            if let Some(k) = foldable(b.unit.as_ref(), b.is_unit) {
                return Self::new(self.number * b.number * k);
            }
            return Self::with_unit(self.number * b.number, b.unit.clone());
        }
        let (unit, d) = Unit::multiply(self.unit.as_ref(), b.unit.as_ref(), b.is_unit);
        let is_unit = self.is_unit && b.is_unit && unit.is_some();
        Self {
            number: self.number * b.number * d,
            unit,
            is_unit,
        }
    }

    #[must_use]
    pub fn div(&self, b: &Self) -> Self {
        let (unit, d) = Unit::divide(self.unit.as_ref(), b.unit.as_ref(), b.is_unit);
        let is_unit = self.is_unit && b.is_unit && unit.is_some();
        Self {
            number: self.number / b.number * d,
            unit,
            is_unit,
        }
    }

    pub fn rem(&self, b: &Self) -> MathResult<Self> {
        if b.unit.is_some() {
            return Err(MathError::RemainderUnits(units_text(b.unit.as_ref())));
        }
        Ok(Self::with_unit(self.number.rem(b.number), self.unit.clone()))
    }

    #[must_use]
    pub fn int_div(&self, b: &Self) -> Self {
        let (unit, d) = Unit::divide(self.unit.as_ref(), b.unit.as_ref(), false);
        let is_unit = self.is_unit && b.is_unit && unit.is_some();
        Self {
            number: (self.number * d).int_div(b.number),
            unit,
            is_unit,
        }
    }

    /// Complex power. Units may only be raised to a real power.
    pub fn pow(&self, b: &Self) -> MathResult<Self> {
        let k = match &b.unit {
            None => 1.0,
            Some(u) if u.is_dimensionless() => u.dimensionless_factor(),
            Some(_) => return Err(MathError::PowerNotUnitless),
        };
        let p = b.number * k;
        match &self.unit {
            None => Ok(Self::new(self.number.pow(p))),
            Some(u) if u.is_dimensionless() => {
                Ok(Self::new((self.number * u.dimensionless_factor()).pow(p)))
            }
            Some(u) => {
                if !p.is_real() {
                    return Err(MathError::UnitsToComplexPower);
                }
                Ok(Self::with_unit(self.number.powf(p.re), Some(u.pow(p.re).into())))
            }
        }
    }

    fn relation(
        &self,
        b: &Self,
        op: char,
        f: impl Fn(Complex, Complex) -> f64,
    ) -> MathResult<RealValue> {
        let d = Unit::convert(self.unit.as_ref(), b.unit.as_ref(), op)?;
        Ok(RealValue::new(f(self.number, b.number * d)))
    }

    pub fn eq_value(&self, b: &Self) -> MathResult<RealValue> {
        self.relation(b, '≡', Complex::eq_value)
    }

    pub fn ne_value(&self, b: &Self) -> MathResult<RealValue> {
        self.relation(b, '≠', Complex::ne_value)
    }

    pub fn lt(&self, b: &Self) -> MathResult<RealValue> {
        self.relation(b, '<', Complex::lt)
    }

    pub fn gt(&self, b: &Self) -> MathResult<RealValue> {
        self.relation(b, '>', Complex::gt)
    }

    pub fn le(&self, b: &Self) -> MathResult<RealValue> {
        self.relation(b, '≤', Complex::le)
    }

    pub fn ge(&self, b: &Self) -> MathResult<RealValue> {
        self.relation(b, '≥', Complex::ge)
    }

    #[must_use]
    pub fn and(&self, b: &Self) -> RealValue {
        RealValue::from_bool(is_true(self.number.re) && is_true(b.number.re))
    }

    #[must_use]
    pub fn or(&self, b: &Self) -> RealValue {
        RealValue::from_bool(is_true(self.number.re) || is_true(b.number.re))
    }

    #[must_use]
    pub fn xor(&self, b: &Self) -> RealValue {
        RealValue::from_bool(is_true(self.number.re) != is_true(b.number.re))
    }
}

impl fmt::Display for ComplexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(u) = &self.unit {
            write!(f, " {u}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// The scalar sub-algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Real(RealValue),
    Complex(ComplexValue),
}

impl From<RealValue> for Scalar {
    fn from(r: RealValue) -> Self {
        Self::Real(r)
    }
}

impl From<ComplexValue> for Scalar {
    fn from(c: ComplexValue) -> Self {
        Self::Complex(c)
    }
}

impl Scalar {
    #[must_use]
    pub fn unit(&self) -> Option<&UnitRef> {
        match self {
            Self::Real(r) => r.unit.as_ref(),
            Self::Complex(c) => c.unit.as_ref(),
        }
    }

    #[must_use]
    pub fn number(&self) -> Complex {
        match self {
            Self::Real(r) => Complex::real(r.value),
            Self::Complex(c) => c.number,
        }
    }

    /// Widen to a complex value.
    #[must_use]
    pub fn to_complex(&self) -> ComplexValue {
        match self {
            Self::Real(r) => r.clone().into(),
            Self::Complex(c) => c.clone(),
        }
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        match self {
            Self::Real(r) => Self::Real(r.neg()),
            Self::Complex(c) => Self::Complex(c.neg()),
        }
    }

    #[must_use]
    pub fn almost_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a.almost_equals(b),
            _ => self.to_complex().almost_equals(&other.to_complex()),
        }
    }

    /// Apply a binary operator, widening a real operand when the other one
    /// is complex.
    pub fn binary(op: Operator, a: &Self, b: &Self) -> MathResult<Self> {
        match (a, b) {
            (Self::Real(x), Self::Real(y)) => real_binary(op, x, y).map(Self::Real),
            (Self::Real(x), Self::Complex(y)) => {
                complex_binary(op, &x.clone().into(), y)
            }
            (Self::Complex(x), Self::Real(y)) => {
                complex_binary(op, x, &y.clone().into())
            }
            (Self::Complex(x), Self::Complex(y)) => complex_binary(op, x, y),
        }
    }
}

pub(crate) fn real_binary(op: Operator, a: &RealValue, b: &RealValue) -> MathResult<RealValue> {
    Ok(match op {
        Operator::Add => a.add(b)?,
        Operator::Sub => a.sub(b)?,
        Operator::Mul => a.mul(b),
        Operator::Div => a.div(b),
        Operator::IntDiv => a.int_div(b),
        Operator::Rem => a.rem(b)?,
        Operator::Pow => a.pow(b)?,
        Operator::Eq => a.eq_value(b)?,
        Operator::Ne => a.ne_value(b)?,
        Operator::Lt => a.lt(b)?,
        Operator::Gt => a.gt(b)?,
        Operator::Le => a.le(b)?,
        Operator::Ge => a.ge(b)?,
        Operator::And => a.and(b),
        Operator::Or => a.or(b),
        Operator::Xor => a.xor(b),
    })
}

fn complex_binary(op: Operator, a: &ComplexValue, b: &ComplexValue) -> MathResult<Scalar> {
    Ok(match op {
        Operator::Add => Scalar::Complex(a.add(b)?),
        Operator::Sub => Scalar::Complex(a.sub(b)?),
        Operator::Mul => Scalar::Complex(a.mul(b)),
        Operator::Div => Scalar::Complex(a.div(b)),
        Operator::IntDiv => Scalar::Complex(a.int_div(b)),
        Operator::Rem => Scalar::Complex(a.rem(b)?),
        Operator::Pow => Scalar::Complex(a.pow(b)?),
        Operator::Eq => Scalar::Real(a.eq_value(b)?),
        Operator::Ne => Scalar::Real(a.ne_value(b)?),
        Operator::Lt => Scalar::Real(a.lt(b)?),
        Operator::Gt => Scalar::Real(a.gt(b)?),
        Operator::Le => Scalar::Real(a.le(b)?),
        Operator::Ge => Scalar::Real(a.ge(b)?),
        Operator::And => Scalar::Real(a.and(b)),
        Operator::Or => Scalar::Real(a.or(b)),
        Operator::Xor => Scalar::Real(a.xor(b)),
    })
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(r) => r.fmt(f),
            Self::Complex(c) => c.fmt(f),
        }
    }
}
