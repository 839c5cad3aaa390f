//! Named functions over [`Value`]s.
//!
//! The [`Calculator`] is the entry point the expression engine uses for
//! everything that is not a plain operator: unary functions, two-argument
//! functions, interpolation and aggregates. It carries the angle mode and
//! the real/complex mode; in real mode out-of-domain results are `NaN`,
//! in complex mode real arguments are widened first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::complex::Complex;
use crate::error::{MathError, MathResult};
use crate::math::{self, AngleMode};
use crate::scalar::{ComplexValue, RealValue, Scalar};
use crate::unit::{Unit, UnitRef};
use crate::value::{expand_values, Operator, Value};

/// Aggregates poll the cancel flag every this many items.
const CANCEL_POLL: usize = 4096;

// ---------------------------------------------------------------------------
// Function tables
// ---------------------------------------------------------------------------

/// One-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Coth,
    Asin,
    Acos,
    Atan,
    Acot,
    Asinh,
    Acosh,
    Atanh,
    Acoth,
    Ln,
    Log,
    Log2,
    Exp,
    Sqrt,
    Cbrt,
    Abs,
    Sign,
    Round,
    Floor,
    Ceiling,
    Trunc,
    Re,
    Im,
    Phase,
    Conj,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "cot" => Self::Cot,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "coth" => Self::Coth,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "acot" => Self::Acot,
            "asinh" => Self::Asinh,
            "acosh" => Self::Acosh,
            "atanh" => Self::Atanh,
            "acoth" => Self::Acoth,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "log_2" | "log2" => Self::Log2,
            "exp" => Self::Exp,
            "sqr" | "sqrt" => Self::Sqrt,
            "cbrt" => Self::Cbrt,
            "abs" => Self::Abs,
            "sign" => Self::Sign,
            "round" => Self::Round,
            "floor" => Self::Floor,
            "ceiling" => Self::Ceiling,
            "trunc" => Self::Trunc,
            "re" => Self::Re,
            "im" => Self::Im,
            "phase" => Self::Phase,
            "conj" => Self::Conj,
            _ => return None,
        })
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Cot => "cot",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Coth => "coth",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Acot => "acot",
            Self::Asinh => "asinh",
            Self::Acosh => "acosh",
            Self::Atanh => "atanh",
            Self::Acoth => "acoth",
            Self::Ln => "ln",
            Self::Log => "log",
            Self::Log2 => "log_2",
            Self::Exp => "exp",
            Self::Sqrt => "sqrt",
            Self::Cbrt => "cbrt",
            Self::Abs => "abs",
            Self::Sign => "sign",
            Self::Round => "round",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::Trunc => "trunc",
            Self::Re => "re",
            Self::Im => "im",
            Self::Phase => "phase",
            Self::Conj => "conj",
        }
    }

    const fn takes_angle(self) -> bool {
        matches!(self, Self::Sin | Self::Cos | Self::Tan | Self::Cot)
    }

    const fn returns_angle(self) -> bool {
        matches!(self, Self::Asin | Self::Acos | Self::Atan | Self::Acot | Self::Phase)
    }

    /// Functions whose result carries the argument's unit unchanged.
    const fn keeps_unit(self) -> bool {
        matches!(
            self,
            Self::Abs | Self::Round | Self::Floor | Self::Ceiling | Self::Trunc | Self::Re | Self::Im | Self::Conj
        )
    }
}

/// Two-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function2 {
    /// `atan2(x; y)`: angle of the point `(x, y)`.
    Atan2,
    /// `root(x; n)`: n-th root.
    Root,
}

impl Function2 {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "atan2" => Some(Self::Atan2),
            "root" => Some(Self::Root),
            _ => None,
        }
    }
}

/// Lookup over a list of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// `take(n; a; b; ...)`: the n-th item.
    Take,
    /// `line(x; a; b; ...)`: linear interpolation at position `x`.
    Line,
}

impl Interpolation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "take" => Some(Self::Take),
            "line" => Some(Self::Line),
            _ => None,
        }
    }
}

/// Aggregates over any number of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiFunction {
    Sum,
    Product,
    Min,
    Max,
    Average,
    SumSq,
    Srss,
}

impl MultiFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sum" => Self::Sum,
            "product" => Self::Product,
            "min" => Self::Min,
            "max" => Self::Max,
            "average" => Self::Average,
            "sumsq" => Self::SumSq,
            "srss" => Self::Srss,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Function evaluator configured with the angle and number modes.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    pub angles: AngleMode,
    /// Complex mode: real arguments widen instead of giving `NaN`.
    pub complex: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl Calculator {
    #[must_use]
    pub fn new(angles: AngleMode, complex: bool) -> Self {
        Self {
            angles,
            complex,
            cancel: None,
        }
    }

    /// Share a cancel flag polled by long aggregates.
    #[must_use]
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_canceled(&self, i: usize) -> MathResult<()> {
        if i % CANCEL_POLL == 0 && self.cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed)) {
            Err(MathError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Binary operator; in real mode a negative base to a fractional power
    /// stays real (`NaN`), in complex mode it widens.
    pub fn evaluate_operator(&self, op: Operator, a: &Value, b: &Value) -> MathResult<Value> {
        if self.complex && op == Operator::Pow {
            if let (Value::Real(x), Value::Real(y)) = (a, b) {
                if x.value < 0.0 && !math::is_integer(y.value) {
                    let x: ComplexValue = x.clone().into();
                    return x.pow(&y.clone().into()).map(Value::Complex);
                }
            }
        }
        Value::binary(op, a, b)
    }

    /// One-argument function.
    pub fn evaluate_function(&self, f: Function, a: &Value) -> MathResult<Value> {
        match a {
            Value::Real(r) if !self.complex => self.real_function(f, r).map(Value::Real),
            Value::Real(r) => self.complex_function(f, &r.clone().into()),
            Value::Complex(c) => self.complex_function(f, c),
            Value::Vector(v) => v
                .map(|x| self.real_function(f, x))
                .map(Value::Vector),
            Value::Matrix(m) => m
                .map(|x| self.real_function(f, x))
                .map(Value::Matrix),
        }
    }

    /// Angle in radians from a trig argument.
    fn to_radians(&self, f: Function, value: f64, unit: Option<&UnitRef>) -> MathResult<f64> {
        match unit {
            None => Ok(value * self.angles.to_radians_factor()),
            Some(u) if u.is_angle() => Ok(value * u.factor()),
            Some(u) if u.is_dimensionless() => {
                Ok(value * u.dimensionless_factor() * self.angles.to_radians_factor())
            }
            Some(_) => Err(MathError::UnitsNotAllowed(f.name())),
        }
    }

    fn unitless(f: Function, r: &RealValue) -> MathResult<f64> {
        r.folded().ok_or(MathError::UnitsNotAllowed(f.name()))
    }

    fn real_function(&self, f: Function, r: &RealValue) -> MathResult<RealValue> {
        if f.keeps_unit() {
            let x = r.value;
            let y = match f {
                Function::Abs => x.abs(),
                Function::Round => x.round(),
                Function::Floor => x.floor(),
                Function::Ceiling => x.ceil(),
                Function::Trunc => x.trunc(),
                Function::Im => 0.0,
                _ => x,
            };
            return Ok(RealValue::with_unit(y, r.unit.clone()));
        }
        match f {
            Function::Sqrt => return Ok(r.sqrt()),
            Function::Cbrt => {
                return Ok(match &r.unit {
                    Some(u) if !u.is_dimensionless() => {
                        RealValue::with_unit(r.value.cbrt(), Some(Arc::new(u.pow(1.0 / 3.0))))
                    }
                    _ => RealValue::new(Self::unitless(f, r)?.cbrt()),
                })
            }
            _ => {}
        }
        let x = if f.takes_angle() {
            self.to_radians(f, r.value, r.unit.as_ref())?
        } else {
            Self::unitless(f, r)?
        };
        let y = match f {
            Function::Sin => math::sin(x)?,
            Function::Cos => math::cos(x)?,
            Function::Tan => x.tan(),
            Function::Cot => 1.0 / x.tan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Coth => 1.0 / x.tanh(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Acot => (1.0 / x).atan(),
            Function::Asinh => x.asinh(),
            Function::Acosh => x.acosh(),
            Function::Atanh => x.atanh(),
            Function::Acoth => (1.0 / x).atanh(),
            Function::Ln => x.ln(),
            Function::Log => x.log10(),
            Function::Log2 => x.log2(),
            Function::Exp => x.exp(),
            Function::Sign => {
                if x == 0.0 || x.is_nan() {
                    x
                } else {
                    x.signum()
                }
            }
            Function::Phase => {
                if x >= 0.0 {
                    0.0
                } else {
                    std::f64::consts::PI
                }
            }
            _ => x,
        };
        let y = if f.returns_angle() {
            y / self.angles.to_radians_factor()
        } else {
            y
        };
        Ok(RealValue::new(y))
    }

    fn complex_function(&self, f: Function, c: &ComplexValue) -> MathResult<Value> {
        let z = c.number;
        if f.keeps_unit() {
            let unit = c.unit.clone();
            return Ok(match f {
                Function::Abs => Value::Real(RealValue::with_unit(z.abs(), unit)),
                Function::Re => Value::Real(RealValue::with_unit(z.re, unit)),
                Function::Im => Value::Real(RealValue::with_unit(z.im, unit)),
                Function::Round => Value::Complex(ComplexValue::with_unit(z.round(), unit)),
                Function::Floor => Value::Complex(ComplexValue::with_unit(z.floor(), unit)),
                Function::Ceiling => Value::Complex(ComplexValue::with_unit(z.ceiling(), unit)),
                Function::Trunc => Value::Complex(ComplexValue::with_unit(z.truncate(), unit)),
                _ => Value::Complex(ComplexValue::with_unit(z.conjugate(), unit)),
            });
        }
        if let (Function::Sqrt | Function::Cbrt, Some(u)) = (f, &c.unit) {
            if !u.is_dimensionless() {
                let (p, w) = if f == Function::Sqrt {
                    (0.5, z.sqrt())
                } else {
                    (1.0 / 3.0, z.cbrt())
                };
                return Ok(Value::Complex(ComplexValue::with_unit(w, Some(Arc::new(u.pow(p))))));
            }
        }
        let z = if f.takes_angle() {
            z * self.to_radians(f, 1.0, c.unit.as_ref())?
        } else {
            match &c.unit {
                None => z,
                Some(u) if u.is_dimensionless() => z * u.dimensionless_factor(),
                Some(_) => return Err(MathError::UnitsNotAllowed(f.name())),
            }
        };
        let w = match f {
            Function::Sin => z.sin()?,
            Function::Cos => z.cos()?,
            Function::Tan => z.tan(),
            Function::Cot => z.cot(),
            Function::Sinh => z.sinh()?,
            Function::Cosh => z.cosh()?,
            Function::Tanh => z.tanh(),
            Function::Coth => z.coth(),
            Function::Asin => z.asin(),
            Function::Acos => z.acos(),
            Function::Atan => z.atan(),
            Function::Acot => z.acot(),
            Function::Asinh => z.asinh(),
            Function::Acosh => z.acosh(),
            Function::Atanh => z.atanh(),
            Function::Acoth => z.acoth(),
            Function::Ln => z.ln(),
            Function::Log => z.log10(),
            Function::Log2 => z.log2(),
            Function::Exp => z.exp(),
            Function::Sqrt => z.sqrt(),
            Function::Cbrt => z.cbrt(),
            Function::Sign => z.sign(),
            Function::Phase => Complex::real(z.phase()),
            _ => z,
        };
        let w = if f.returns_angle() {
            w / self.angles.to_radians_factor()
        } else {
            w
        };
        Ok(Value::Complex(ComplexValue::new(w)))
    }

    /// Two-argument function.
    pub fn evaluate_function2(&self, f: Function2, a: &Value, b: &Value) -> MathResult<Value> {
        match f {
            Function2::Atan2 => {
                let x = a.as_real()?;
                let y = b.as_real()?;
                let d = Unit::convert(x.unit.as_ref(), y.unit.as_ref(), ';')?;
                let angle = (y.value * d).atan2(x.value);
                Ok(Value::from(angle / self.angles.to_radians_factor()))
            }
            Function2::Root => {
                let n = b.as_positive_int("root")?;
                let p = 1.0 / n as f64;
                match a {
                    Value::Real(r) if !(self.complex && r.value < 0.0 && n % 2 == 0) => {
                        let (x, unit) = match &r.unit {
                            Some(u) if !u.is_dimensionless() => (r.value, Some(Arc::new(u.pow(p)))),
                            _ => (r.folded().unwrap_or(r.value), None),
                        };
                        let value = if x >= 0.0 {
                            x.powf(p)
                        } else if n % 2 == 1 {
                            -(-x).powf(p)
                        } else {
                            f64::NAN
                        };
                        Ok(Value::Real(RealValue::with_unit(value, unit)))
                    }
                    Value::Real(_) | Value::Complex(_) => {
                        let c = a.as_scalar()?.to_complex();
                        c.pow(&ComplexValue::new(Complex::real(p))).map(Value::Complex)
                    }
                    Value::Vector(_) | Value::Matrix(_) => Err(MathError::MustBeScalar("root")),
                }
            }
        }
    }

    /// `take` and `line` over the expanded argument list.
    pub fn evaluate_interpolation(&self, f: Interpolation, args: &[Value]) -> MathResult<Value> {
        let (first, rest) = args
            .split_first()
            .ok_or_else(|| MathError::InvalidArgument("missing arguments".into()))?;
        let items = expand_values(rest);
        if items.is_empty() {
            return Err(MathError::InvalidArgument("missing values to interpolate".into()));
        }
        match f {
            Interpolation::Take => {
                let n = first.as_positive_int("take")?;
                items
                    .get(n - 1)
                    .cloned()
                    .map(Value::from)
                    .ok_or(MathError::IndexOutOfRange { index: n, len: items.len() })
            }
            Interpolation::Line => {
                let x = first.as_real()?.folded().ok_or(MathError::UnitsNotAllowed("line"))?;
                if x.is_nan() {
                    return Ok(Value::from(f64::NAN));
                }
                let last = items.len() as f64;
                if x <= 1.0 {
                    return Ok(items[0].clone().into());
                }
                if x >= last {
                    return Ok(items[items.len() - 1].clone().into());
                }
                let i = x.floor();
                let t = Value::from(x - i);
                let lo: Value = items[i as usize - 1].clone().into();
                let hi: Value = items[i as usize].clone().into();
                let delta = Value::binary(Operator::Sub, &hi, &lo)?;
                let step = Value::binary(Operator::Mul, &t, &delta)?;
                Value::binary(Operator::Add, &lo, &step)
            }
        }
    }

    /// Aggregate over all arguments, flattening vectors and matrices.
    pub fn evaluate_multi_function(&self, f: MultiFunction, args: &[Value]) -> MathResult<Value> {
        let items = expand_values(args);
        let Some((first, rest)) = items.split_first() else {
            return Err(MathError::InvalidArgument("missing arguments".into()));
        };
        let mut acc = match f {
            MultiFunction::SumSq | MultiFunction::Srss => Scalar::binary(Operator::Mul, first, first)?,
            _ => first.clone(),
        };
        for (i, x) in rest.iter().enumerate() {
            self.check_canceled(i + 1)?;
            acc = match f {
                MultiFunction::Sum | MultiFunction::Average => Scalar::binary(Operator::Add, &acc, x)?,
                MultiFunction::Product => Scalar::binary(Operator::Mul, &acc, x)?,
                MultiFunction::SumSq | MultiFunction::Srss => {
                    let sq = Scalar::binary(Operator::Mul, x, x)?;
                    Scalar::binary(Operator::Add, &acc, &sq)?
                }
                MultiFunction::Min | MultiFunction::Max => {
                    let op = if f == MultiFunction::Min { Operator::Lt } else { Operator::Gt };
                    let better = Scalar::binary(op, x, &acc)?;
                    if math::is_true(better.number().re) {
                        x.clone()
                    } else {
                        acc
                    }
                }
            };
        }
        let n = Scalar::Real(RealValue::new(items.len() as f64));
        let result = match f {
            MultiFunction::Average => Scalar::binary(Operator::Div, &acc, &n)?,
            MultiFunction::Srss => {
                let half = Scalar::Real(RealValue::new(0.5));
                Scalar::binary(Operator::Pow, &acc, &half)?
            }
            _ => acc,
        };
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> Calculator {
        Calculator::new(AngleMode::Deg, false)
    }

    fn real(v: &Value) -> f64 {
        v.number().re
    }

    fn vector(xs: &[f64]) -> Value {
        Value::Vector(xs.iter().map(|&x| RealValue::new(x)).collect::<Vec<_>>().into())
    }

    #[test]
    fn trig_honours_angle_mode() {
        let s = calc().evaluate_function(Function::Sin, &Value::from(30.0)).unwrap();
        assert!((real(&s) - 0.5).abs() < 1e-12);
        let rad = Calculator::new(AngleMode::Rad, false);
        let c = rad.evaluate_function(Function::Cos, &Value::from(0.0)).unwrap();
        assert_eq!(real(&c), 1.0);
        let a = calc().evaluate_function(Function::Atan, &Value::from(1.0)).unwrap();
        assert!((real(&a) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn trig_accepts_angle_units_and_rejects_others() {
        let deg = Value::Real(RealValue::with_unit(90.0, Unit::get("deg")));
        let rad = Calculator::new(AngleMode::Rad, false);
        let s = rad.evaluate_function(Function::Sin, &deg).unwrap();
        assert!((real(&s) - 1.0).abs() < 1e-12);
        let m = Value::Real(RealValue::with_unit(1.0, Unit::get("m")));
        assert_eq!(
            calc().evaluate_function(Function::Sin, &m).unwrap_err(),
            MathError::UnitsNotAllowed("sin")
        );
    }

    #[test]
    fn trig_guard_surfaces_as_error() {
        let rad = Calculator::new(AngleMode::Rad, false);
        assert_eq!(
            rad.evaluate_function(Function::Sin, &Value::from(1e9)).unwrap_err(),
            MathError::ArgumentOutOfRange("sin")
        );
    }

    #[test]
    fn real_mode_gives_nan_complex_mode_widens() {
        let r = calc().evaluate_function(Function::Sqrt, &Value::from(-4.0)).unwrap();
        assert!(real(&r).is_nan());
        let c = Calculator::new(AngleMode::Deg, true);
        let r = c.evaluate_function(Function::Sqrt, &Value::from(-4.0)).unwrap();
        assert!(r.number().almost_equals(Complex::new(0.0, 2.0)));
        let p = c
            .evaluate_operator(Operator::Pow, &Value::from(-8.0), &Value::from(1.0 / 3.0))
            .unwrap();
        assert!(matches!(p, Value::Complex(_)));
    }

    #[test]
    fn functions_map_over_vectors() {
        let r = calc().evaluate_function(Function::Abs, &vector(&[-1.0, 2.0])).unwrap();
        assert_eq!(r, vector(&[1.0, 2.0]));
    }

    #[test]
    fn sqrt_takes_unit_root() {
        let area = Value::Real(RealValue::with_unit(9.0, Some(Arc::new(Unit::get("m").unwrap().pow(2.0)))));
        let r = calc().evaluate_function(Function::Sqrt, &area).unwrap();
        assert_eq!(real(&r), 3.0);
        assert!(r.unit().unwrap().is_consistent(&Unit::get("m").unwrap()));
    }

    #[test]
    fn two_argument_functions() {
        let a = calc()
            .evaluate_function2(Function2::Atan2, &Value::from(1.0), &Value::from(1.0))
            .unwrap();
        assert!((real(&a) - 45.0).abs() < 1e-9);
        let r = calc()
            .evaluate_function2(Function2::Root, &Value::from(-27.0), &Value::from(3.0))
            .unwrap();
        assert!((real(&r) + 3.0).abs() < 1e-12);
        assert!(calc()
            .evaluate_function2(Function2::Root, &Value::from(8.0), &Value::from(0.5))
            .is_err());
    }

    #[test]
    fn interpolation() {
        let args = [Value::from(2.0), vector(&[10.0, 20.0, 30.0])];
        let t = calc().evaluate_interpolation(Interpolation::Take, &args).unwrap();
        assert_eq!(real(&t), 20.0);
        let args = [Value::from(1.5), Value::from(10.0), Value::from(20.0)];
        let l = calc().evaluate_interpolation(Interpolation::Line, &args).unwrap();
        assert_eq!(real(&l), 15.0);
        let args = [Value::from(f64::NAN), Value::from(1.0), Value::from(2.0)];
        let l = calc().evaluate_interpolation(Interpolation::Line, &args).unwrap();
        assert!(real(&l).is_nan());
        let args = [Value::from(5.0), Value::from(10.0)];
        assert!(calc().evaluate_interpolation(Interpolation::Take, &args).is_err());
    }

    #[test]
    fn aggregates() {
        let args = [Value::from(3.0), vector(&[1.0, 4.0]), Value::from(2.0)];
        let c = calc();
        assert_eq!(real(&c.evaluate_multi_function(MultiFunction::Sum, &args).unwrap()), 10.0);
        assert_eq!(real(&c.evaluate_multi_function(MultiFunction::Min, &args).unwrap()), 1.0);
        assert_eq!(real(&c.evaluate_multi_function(MultiFunction::Max, &args).unwrap()), 4.0);
        assert_eq!(real(&c.evaluate_multi_function(MultiFunction::Average, &args).unwrap()), 2.5);
        assert_eq!(real(&c.evaluate_multi_function(MultiFunction::Product, &args).unwrap()), 24.0);
        let srss = c
            .evaluate_multi_function(MultiFunction::Srss, &[Value::from(3.0), Value::from(4.0)])
            .unwrap();
        assert!((real(&srss) - 5.0).abs() < 1e-12);
        assert!(c.evaluate_multi_function(MultiFunction::Sum, &[]).is_err());
    }

    #[test]
    fn aggregates_poll_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let c = calc().with_cancel(Arc::clone(&flag));
        let big = vector(&vec![1.0; CANCEL_POLL + 1]);
        assert_eq!(
            c.evaluate_multi_function(MultiFunction::Sum, &[big]).unwrap_err(),
            MathError::Canceled
        );
    }

    #[test]
    fn names_resolve() {
        assert_eq!(Function::from_name("sqrt"), Some(Function::Sqrt));
        assert_eq!(Function2::from_name("atan2"), Some(Function2::Atan2));
        assert_eq!(Interpolation::from_name("line"), Some(Interpolation::Line));
        assert_eq!(MultiFunction::from_name("srss"), Some(MultiFunction::Srss));
        assert_eq!(Function::from_name("nope"), None);
    }
}
