//! The variant value algebra.
//!
//! [`Value`] is closed over `Real | Complex | Vector | Matrix`. Every binary
//! operator matches on both operand kinds explicitly; combinations without
//! a meaning (a complex scalar with a vector or matrix) fail with
//! [`MathError::InvalidOperand`] instead of falling through to a default.

use std::fmt;

use crate::complex::Complex;
use crate::error::{MathError, MathResult};
use crate::math::almost_equals;
use crate::matrix::Matrix;
use crate::scalar::{real_binary, ComplexValue, RealValue, Scalar};
use crate::vector::Vector;

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    /// `\`, truncated division.
    IntDiv,
    /// `%`, remainder.
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
}

impl Operator {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IntDiv => "\\",
            Self::Rem => "%",
            Self::Pow => "^",
            Self::Eq => "≡",
            Self::Ne => "≠",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "≤",
            Self::Ge => "≥",
            Self::And => "∧",
            Self::Or => "∨",
            Self::Xor => "⊕",
        }
    }

    /// Binding strength; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Pow => 7,
            Self::Mul | Self::Div | Self::IntDiv | Self::Rem => 6,
            Self::Add | Self::Sub => 5,
            Self::Eq | Self::Ne | Self::Lt | Self::Gt | Self::Le | Self::Ge => 4,
            Self::And => 3,
            Self::Xor => 2,
            Self::Or => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(RealValue),
    Complex(ComplexValue),
    Vector(Vector),
    Matrix(Matrix),
}

impl Default for Value {
    fn default() -> Self {
        Self::Real(RealValue::ZERO)
    }
}

impl From<RealValue> for Value {
    fn from(r: RealValue) -> Self {
        Self::Real(r)
    }
}

impl From<ComplexValue> for Value {
    fn from(c: ComplexValue) -> Self {
        Self::Complex(c)
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Real(r) => Self::Real(r),
            Scalar::Complex(c) => Self::Complex(c),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Real(RealValue::new(x))
    }
}

impl Value {
    /// Kind name used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Real(_) => "real",
            Self::Complex(_) => "complex",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Real(_) | Self::Complex(_))
    }

    /// Numeric payload of a scalar; vectors and matrices give `NaN`.
    #[must_use]
    pub fn number(&self) -> Complex {
        match self {
            Self::Real(r) => Complex::real(r.value),
            Self::Complex(c) => c.number,
            Self::Vector(_) | Self::Matrix(_) => Complex::NAN,
        }
    }

    #[must_use]
    pub fn unit(&self) -> Option<&crate::unit::UnitRef> {
        match self {
            Self::Real(r) => r.unit.as_ref(),
            Self::Complex(c) => c.unit.as_ref(),
            Self::Vector(_) | Self::Matrix(_) => None,
        }
    }

    // -- coercions -----------------------------------------------------------

    pub fn as_scalar(&self) -> MathResult<Scalar> {
        match self {
            Self::Real(r) => Ok(Scalar::Real(r.clone())),
            Self::Complex(c) => Ok(Scalar::Complex(c.clone())),
            Self::Vector(_) | Self::Matrix(_) => Err(MathError::MustBeScalar("value")),
        }
    }

    /// A real scalar; a complex value must classify as real.
    pub fn as_real(&self) -> MathResult<RealValue> {
        match self {
            Self::Real(r) => Ok(r.clone()),
            Self::Complex(c) => c.to_real(),
            Self::Vector(_) | Self::Matrix(_) => Err(MathError::MustBeScalar("value")),
        }
    }

    /// A real, unit-less, positive value that is integral within tolerance.
    pub fn as_positive_int(&self, item: &'static str) -> MathResult<usize> {
        let n = match self {
            Self::Real(r) if r.unit.is_none() => Some(r.value),
            Self::Complex(c) if c.unit.is_none() && c.number.is_real() => Some(c.number.re),
            _ => None,
        };
        match n {
            Some(d) if d > 0.0 && d <= f64::from(i32::MAX) && almost_equals(d, d.trunc()) => {
                Ok(d.trunc() as usize)
            }
            _ => Err(MathError::MustBePositiveInteger(item)),
        }
    }

    pub fn as_vector(&self) -> MathResult<Vector> {
        match self {
            Self::Vector(v) => Ok(v.clone()),
            _ => Err(MathError::MustBeVector("value")),
        }
    }

    /// A matrix; a vector widens to a one-column matrix.
    pub fn as_matrix(&self) -> MathResult<Matrix> {
        match self {
            Self::Matrix(m) => Ok(m.clone()),
            Self::Vector(v) => Ok(Matrix::column(v)),
            _ => Err(MathError::MustBeMatrix("value")),
        }
    }

    // -- operators -----------------------------------------------------------

    pub fn negate(&self) -> MathResult<Self> {
        Ok(match self {
            Self::Real(r) => Self::Real(r.neg()),
            Self::Complex(c) => Self::Complex(c.neg()),
            Self::Vector(v) => Self::Vector(v.map(|x| Ok(x.neg()))?),
            Self::Matrix(m) => Self::Matrix(m.map(|x| Ok(x.neg()))?),
        })
    }

    /// Apply a binary operator.
    pub fn binary(op: Operator, a: &Self, b: &Self) -> MathResult<Self> {
        match (a, b) {
            (Self::Real(_) | Self::Complex(_), Self::Real(_) | Self::Complex(_)) => {
                Scalar::binary(op, &a.as_scalar()?, &b.as_scalar()?).map(Self::from)
            }
            (Self::Real(x), Self::Vector(v)) => v.map(|e| real_binary(op, x, e)).map(Self::Vector),
            (Self::Vector(v), Self::Real(y)) => v.map(|e| real_binary(op, e, y)).map(Self::Vector),
            (Self::Vector(u), Self::Vector(v)) => {
                if op == Operator::Mul {
                    u.dot(v).map(Self::Real)
                } else {
                    u.zip_with(v, |x, y| real_binary(op, x, y)).map(Self::Vector)
                }
            }
            (Self::Real(x), Self::Matrix(m)) => m.map(|e| real_binary(op, x, e)).map(Self::Matrix),
            (Self::Matrix(m), Self::Real(y)) => m.map(|e| real_binary(op, e, y)).map(Self::Matrix),
            (Self::Vector(v), Self::Matrix(m)) => matrix_binary(op, &Matrix::column(v), m),
            (Self::Matrix(m), Self::Vector(v)) => {
                let r = matrix_binary(op, m, &Matrix::column(v))?;
                Ok(if op == Operator::Mul { collapse(r) } else { r })
            }
            (Self::Matrix(m), Self::Matrix(n)) => matrix_binary(op, m, n),
            (Self::Complex(_), Self::Vector(_) | Self::Matrix(_))
            | (Self::Vector(_) | Self::Matrix(_), Self::Complex(_)) => Err(MathError::InvalidOperand {
                op: op.symbol(),
                left: a.kind_name(),
                right: b.kind_name(),
            }),
        }
    }

    /// Tolerant equality of two values of the same kind.
    #[must_use]
    pub fn almost_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Real(_) | Self::Complex(_), Self::Real(_) | Self::Complex(_)) => {
                match (self.as_scalar(), other.as_scalar()) {
                    (Ok(a), Ok(b)) => a.almost_equals(&b),
                    _ => false,
                }
            }
            (Self::Vector(u), Self::Vector(v)) => {
                u.len() == v.len() && u.items().iter().zip(v.items()).all(|(a, b)| a.almost_equals(b))
            }
            (Self::Matrix(m), Self::Matrix(n)) => {
                m.rows() == n.rows()
                    && m.cols() == n.cols()
                    && m.items().iter().zip(n.items()).all(|(a, b)| a.almost_equals(b))
            }
            _ => false,
        }
    }
}

fn matrix_binary(op: Operator, a: &Matrix, b: &Matrix) -> MathResult<Value> {
    if op == Operator::Mul {
        a.product(b).map(Value::Matrix)
    } else {
        a.zip_with(b, |x, y| real_binary(op, x, y)).map(Value::Matrix)
    }
}

/// One-row products become scalars, column results become vectors.
fn collapse(value: Value) -> Value {
    match value {
        Value::Matrix(m) if m.rows() == 1 && m.cols() == 1 => Value::Real(m.items()[0].clone()),
        Value::Matrix(m) if m.cols() == 1 => Value::Vector(m.to_vector()),
        other => other,
    }
}

/// Flatten scalars, vectors and matrices into one sequence of scalars.
pub fn expand_values(values: &[Value]) -> Vec<Scalar> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Real(r) => out.push(Scalar::Real(r.clone())),
            Value::Complex(c) => out.push(Scalar::Complex(c.clone())),
            Value::Vector(v) => out.extend(v.items().iter().cloned().map(Scalar::Real)),
            Value::Matrix(m) => out.extend(m.items().iter().cloned().map(Scalar::Real)),
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(r) => r.fmt(f),
            Self::Complex(c) => c.fmt(f),
            Self::Vector(v) => v.fmt(f),
            Self::Matrix(m) => m.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(xs: &[f64]) -> Value {
        Value::Vector(xs.iter().map(|&x| RealValue::new(x)).collect::<Vec<_>>().into())
    }

    fn matrix(rows: &[&[f64]]) -> Value {
        Value::Matrix(
            Matrix::from_rows(
                rows.iter()
                    .map(|r| r.iter().map(|&x| RealValue::new(x)).collect())
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn complex(re: f64, im: f64) -> Value {
        Value::Complex(ComplexValue::new(Complex::new(re, im)))
    }

    #[test]
    fn real_widens_to_complex() {
        let r = Value::binary(Operator::Mul, &Value::from(2.0), &complex(0.0, 1.0)).unwrap();
        assert!(matches!(r, Value::Complex(_)));
        assert_eq!(r.number(), Complex::new(0.0, 2.0));
    }

    #[test]
    fn complex_with_vector_is_invalid() {
        for (a, b) in [
            (complex(1.0, 1.0), vector(&[1.0])),
            (vector(&[1.0]), complex(1.0, 1.0)),
            (complex(1.0, 1.0), matrix(&[&[1.0]])),
            (matrix(&[&[1.0]]), complex(1.0, 1.0)),
        ] {
            let err = Value::binary(Operator::Add, &a, &b).unwrap_err();
            assert!(matches!(err, MathError::InvalidOperand { op: "+", .. }), "got: {err}");
        }
    }

    #[test]
    fn broadcasting_and_elementwise() {
        let r = Value::binary(Operator::Mul, &Value::from(2.0), &vector(&[1.0, 2.0])).unwrap();
        assert_eq!(r, vector(&[2.0, 4.0]));
        let r = Value::binary(Operator::Sub, &vector(&[3.0, 4.0]), &vector(&[1.0, 1.0])).unwrap();
        assert_eq!(r, vector(&[2.0, 3.0]));
        let r = Value::binary(Operator::Mul, &vector(&[1.0, 2.0]), &vector(&[3.0, 4.0])).unwrap();
        assert_eq!(r, Value::from(11.0));
    }

    #[test]
    fn matrix_times_vector_collapses() {
        let m = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let r = Value::binary(Operator::Mul, &m, &vector(&[1.0, 1.0])).unwrap();
        assert_eq!(r, vector(&[3.0, 7.0]));
        let row = matrix(&[&[1.0, 2.0]]);
        let r = Value::binary(Operator::Mul, &row, &vector(&[3.0, 4.0])).unwrap();
        assert_eq!(r, Value::from(11.0));
    }

    #[test]
    fn positive_int_coercion() {
        assert_eq!(Value::from(3.0).as_positive_int("n").unwrap(), 3);
        assert_eq!(Value::from(3.0 + 1e-14).as_positive_int("n").unwrap(), 3);
        assert!(Value::from(0.0).as_positive_int("n").is_err());
        assert!(Value::from(2.5).as_positive_int("n").is_err());
        assert!(complex(2.0, 1.0).as_positive_int("n").is_err());
        let with_unit = Value::Real(RealValue::with_unit(2.0, crate::unit::Unit::get("m")));
        assert!(with_unit.as_positive_int("n").is_err());
    }

    #[test]
    fn vector_widens_to_matrix() {
        let m = vector(&[1.0, 2.0]).as_matrix().unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 1));
        assert!(Value::from(1.0).as_matrix().is_err());
    }

    #[test]
    fn expansion_flattens() {
        let items = expand_values(&[Value::from(1.0), vector(&[2.0, 3.0]), matrix(&[&[4.0, 5.0]])]);
        let xs: Vec<f64> = items.iter().map(|s| s.number().re).collect();
        assert_eq!(xs, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
