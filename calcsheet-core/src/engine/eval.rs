//! Expression evaluation over the variable table.
//!
//! Names resolve in this order: variables, custom units, built-in units,
//! then the constants `π`/`pi`, `e` and `i`. Function calls dispatch on
//! arity to the calculator entry points.

use std::collections::HashMap;

use calcsheet_math::calculator::{Calculator, Function, Function2, Interpolation, MultiFunction};
use calcsheet_math::matrix::Matrix;
use calcsheet_math::vector::Vector;
use calcsheet_math::{Complex, ComplexValue, RealValue, Unit, UnitRef, Value};

use super::parser::Expr;
use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::variables::Variables;

/// What a bare name refers to.
#[derive(Debug, Clone)]
pub(crate) enum Resolved {
    Variable(Value),
    Unit(UnitRef),
    Constant(Value),
    Unknown,
}

/// Read-only view of the names an expression can see.
pub(crate) struct Scope<'a> {
    pub variables: &'a Variables,
    pub units: &'a HashMap<String, UnitRef>,
}

impl Scope<'_> {
    pub fn resolve(&self, name: &str) -> Resolved {
        if let Some(v) = self.variables.get(name) {
            return Resolved::Variable(v.clone());
        }
        if let Some(u) = self.units.get(name).cloned().or_else(|| Unit::get(name)) {
            return Resolved::Unit(u);
        }
        match name {
            "π" | "pi" => Resolved::Constant(Value::from(std::f64::consts::PI)),
            "e" => Resolved::Constant(Value::from(std::f64::consts::E)),
            "i" => Resolved::Constant(Value::Complex(ComplexValue::new(Complex::I))),
            _ => Resolved::Unknown,
        }
    }
}

pub(crate) struct Evaluator<'a> {
    pub scope: Scope<'a>,
    pub calc: &'a Calculator,
}

impl Evaluator<'_> {
    pub fn eval(&self, expr: &Expr) -> InterpResult<Value> {
        match expr {
            Expr::Number(x) => Ok(Value::from(*x)),
            Expr::Imaginary(x) => Ok(Value::Complex(ComplexValue::new(Complex::new(0.0, *x)))),
            Expr::Input(v) => Ok(Value::from(v.unwrap_or(0.0))),
            Expr::Name(name) => match self.scope.resolve(name) {
                Resolved::Variable(v) | Resolved::Constant(v) => Ok(v),
                Resolved::Unit(u) => Ok(Value::Real(RealValue::unit_value(u))),
                Resolved::Unknown => Err(InterpreterError::new(
                    ErrorKind::UndefinedVariable,
                    format!("undefined variable or units: \"{name}\""),
                )),
            },
            Expr::Neg(e) => Ok(self.eval(e)?.negate()?),
            Expr::Group(e) => self.eval(e),
            Expr::Binary(op, a, b) => {
                let (a, b) = (self.eval(a)?, self.eval(b)?);
                Ok(self.calc.evaluate_operator(*op, &a, &b)?)
            }
            Expr::Implicit(a, b) => {
                let (a, b) = (self.eval(a)?, self.eval(b)?);
                Ok(self.calc.evaluate_operator(calcsheet_math::Operator::Mul, &a, &b)?)
            }
            Expr::Call(name, args) => self.call(name, args),
            Expr::Vector(items) => {
                let items = items
                    .iter()
                    .map(|e| Ok(self.eval(e)?.as_real()?))
                    .collect::<InterpResult<Vec<_>>>()?;
                Ok(Value::Vector(Vector::from(items)))
            }
            Expr::Matrix(rows) => {
                let rows = rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|e| Ok(self.eval(e)?.as_real()?))
                            .collect::<InterpResult<Vec<_>>>()
                    })
                    .collect::<InterpResult<Vec<_>>>()?;
                Ok(Value::Matrix(Matrix::from_rows(rows)?))
            }
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> InterpResult<Value> {
        let values = args.iter().map(|a| self.eval(a)).collect::<InterpResult<Vec<_>>>()?;
        if let Some(f) = MultiFunction::from_name(name) {
            return Ok(self.calc.evaluate_multi_function(f, &values)?);
        }
        if let Some(f) = Interpolation::from_name(name) {
            return Ok(self.calc.evaluate_interpolation(f, &values)?);
        }
        match values.as_slice() {
            [a] => {
                if let Some(f) = Function::from_name(name) {
                    return Ok(self.calc.evaluate_function(f, a)?);
                }
            }
            [a, b] => {
                if let Some(f) = Function2::from_name(name) {
                    return Ok(self.calc.evaluate_function2(f, a, b)?);
                }
            }
            _ => {}
        }
        Err(InterpreterError::new(
            ErrorKind::UndefinedFunction,
            format!("undefined function \"{name}\" with {} argument(s)", values.len()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use calcsheet_math::math::AngleMode;

    use super::*;
    use crate::engine::parser::{parse, Statement};

    fn eval_with(vars: &Variables, src: &str) -> InterpResult<Value> {
        let units = HashMap::new();
        let calc = Calculator::new(AngleMode::Deg, false);
        let ev = Evaluator {
            scope: Scope {
                variables: vars,
                units: &units,
            },
            calc: &calc,
        };
        let Statement::Expr(e) = parse(src)? else { panic!("not an expression") };
        ev.eval(&e)
    }

    fn eval(src: &str) -> InterpResult<Value> {
        eval_with(&Variables::new(), src)
    }

    #[test]
    fn arithmetic() {
        assert!(eval("1 + 2*3").unwrap().almost_equals(&Value::from(7.0)));
        assert!(eval("-2^2").unwrap().almost_equals(&Value::from(-4.0)));
        assert!(eval("7 \\ 2").unwrap().almost_equals(&Value::from(3.0)));
        assert!(eval("7 % 4").unwrap().almost_equals(&Value::from(3.0)));
    }

    #[test]
    fn variables_shadow_units() {
        let mut vars = Variables::new();
        vars.set("m", Value::from(4.0));
        assert!(eval_with(&vars, "2*m").unwrap().almost_equals(&Value::from(8.0)));
        let v = eval("2*m").unwrap();
        assert_eq!(v.unit().map(|u| u.name().to_owned()), Some("m".into()));
    }

    #[test]
    fn units_convert_on_addition() {
        let v = eval("1m + 50cm").unwrap();
        let r = v.as_real().unwrap();
        assert!((r.value - 1.5).abs() < 1e-12, "got {}", r.value);
        let err = eval("1m + 1s").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Math);
    }

    #[test]
    fn functions_dispatch_on_arity() {
        assert!(eval("sin(30)").unwrap().almost_equals(&Value::from(0.5)));
        assert!(eval("max(1; 5; 3)").unwrap().almost_equals(&Value::from(5.0)));
        let err = eval("sin(1; 2)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedFunction);
    }

    #[test]
    fn undefined_names_fail() {
        let err = eval("qq + 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert!(err.message.contains("qq"));
    }

    #[test]
    fn complex_literals() {
        let v = eval("(3 + 4i)*i").unwrap();
        let c = v.number();
        assert!(c.almost_equals(Complex::new(-4.0, 3.0)), "got {c}");
    }

    #[test]
    fn vectors_and_matrices() {
        let v = eval("[1; 2; 3]*[1; 1; 1]").unwrap();
        assert!(v.almost_equals(&Value::from(6.0)));
        let m = eval("[1; 2 | 3; 4]").unwrap();
        assert_eq!(m.kind_name(), "matrix");
        assert!(eval("[1; 2 | 3]").is_err());
    }
}
