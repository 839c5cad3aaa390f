//! Rendering of numbers, values and expressions.
//!
//! The same walk produces HTML (`<var>`, `<sup>`, unit markup) or plain text;
//! XML output wraps the plain text in `m:oMath` runs.

use calcsheet_math::complex::ComplexKind;
use calcsheet_math::math::AngleMode;
use calcsheet_math::{Complex, Operator, UnitRef, Value};

use super::eval::{Resolved, Scope};
use super::parser::Expr;
use crate::directives::{DirectiveState, NumberFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Markup {
    Html,
    Text,
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub(crate) fn escape_xml(s: &str) -> String {
    escape_html(s).replace('\'', "&apos;")
}

/// Plain text as a single `m:oMath` run.
pub(crate) fn text_to_xml(text: &str) -> String {
    format!("<m:oMath><m:r><m:t>{}</m:t></m:r></m:oMath>", escape_xml(text))
}

fn trim_zeros(s: &mut String) {
    if s.contains('.') {
        let len = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(len);
    }
    if s == "-0" {
        s.remove(0);
    }
}

// ---------------------------------------------------------------------------
// Value style
// ---------------------------------------------------------------------------

/// Number and value formatting in force for one rendering.
#[derive(Debug, Clone)]
pub(crate) struct Style {
    pub decimals: u8,
    pub format: Option<NumberFormat>,
    pub phasor: bool,
    pub angles: AngleMode,
    pub max_count: usize,
    pub markup: Markup,
    /// Mark undefined results.
    pub warnings: bool,
}

impl Style {
    pub fn new(state: &DirectiveState, max_count: usize, markup: Markup, warnings: bool) -> Self {
        Self {
            decimals: state.decimals,
            format: state.format,
            phasor: state.phasor,
            angles: state.angles,
            max_count,
            markup,
            warnings,
        }
    }

    #[must_use]
    pub fn with_markup(&self, markup: Markup) -> Self {
        Self {
            markup,
            ..self.clone()
        }
    }

    const fn html(&self) -> bool {
        matches!(self.markup, Markup::Html)
    }

    pub fn number(&self, x: f64) -> String {
        if x.is_nan() {
            return if self.html() && self.warnings {
                "<span class=\"err\">Undefined</span>".into()
            } else {
                "Undefined".into()
            };
        }
        if x.is_infinite() {
            return if x > 0.0 { "+∞".into() } else { "-∞".into() };
        }
        match self.format {
            Some(NumberFormat::Fixed(n)) => format!("{x:.prec$}", prec = usize::from(n)),
            Some(NumberFormat::Scientific(n)) => self.scientific(x, n, false),
            Some(NumberFormat::General(n)) => self.general(x, n),
            None => self.auto(x),
        }
    }

    fn auto(&self, x: f64) -> String {
        let d = self.decimals;
        let ax = x.abs();
        if ax != 0.0 && (ax >= 1e15 || ax < 10f64.powi(-i32::from(d))) {
            return self.scientific(x, d, true);
        }
        let mut s = format!("{x:.prec$}", prec = usize::from(d));
        trim_zeros(&mut s);
        s
    }

    fn general(&self, x: f64, digits: u8) -> String {
        if x == 0.0 {
            return "0".into();
        }
        let exp = x.abs().log10().floor() as i32;
        let digits = i32::from(digits);
        if (-5..digits).contains(&exp) {
            let mut s = format!("{x:.prec$}", prec = (digits - 1 - exp).max(0) as usize);
            trim_zeros(&mut s);
            s
        } else {
            self.scientific(x, (digits - 1).max(0) as u8, true)
        }
    }

    fn scientific(&self, x: f64, decimals: u8, trim: bool) -> String {
        let s = format!("{x:.prec$e}", prec = usize::from(decimals));
        let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
        let mut mantissa = mantissa.to_owned();
        if trim {
            trim_zeros(&mut mantissa);
        }
        if self.html() {
            format!("{mantissa}×10<sup>{exp}</sup>")
        } else {
            format!("{mantissa}E{exp}")
        }
    }

    pub fn complex(&self, c: Complex) -> String {
        if c.re.is_infinite() && c.im.is_infinite() {
            return "∞".into();
        }
        if self.phasor && !c.is_real() {
            let angle = c.phase() / self.angles.to_radians_factor();
            let mark = match self.angles {
                AngleMode::Deg => "°",
                AngleMode::Rad => "",
                AngleMode::Gra => "ᵍ",
            };
            return format!("{}∠{}{mark}", self.number(c.abs()), self.number(angle));
        }
        match c.kind() {
            ComplexKind::Real => self.number(c.re),
            ComplexKind::Imaginary => format!("{}i", self.number(c.im)),
            ComplexKind::Complex if c.im < 0.0 => {
                format!("{} - {}i", self.number(c.re), self.number(-c.im))
            }
            ComplexKind::Complex => format!("{} + {}i", self.number(c.re), self.number(c.im)),
        }
    }

    pub fn unit(&self, u: &UnitRef) -> String {
        if self.html() {
            u.to_html()
        } else {
            u.name().to_owned()
        }
    }

    pub fn value(&self, v: &Value) -> String {
        match v {
            Value::Real(r) => match &r.unit {
                Some(u) if r.is_unit => self.unit(u),
                Some(u) => format!("{} {}", self.number(r.value), self.unit(u)),
                None => self.number(r.value),
            },
            Value::Complex(c) => {
                let n = self.complex(c.number);
                match &c.unit {
                    Some(u) if c.number.is_real() => format!("{n} {}", self.unit(u)),
                    Some(u) => format!("({n}) {}", self.unit(u)),
                    None => n,
                }
            }
            Value::Vector(v) => {
                let items: Vec<String> = v.items().iter().map(|r| self.value(&Value::Real(r.clone()))).collect();
                format!("[{}]", self.elide(items, "; "))
            }
            Value::Matrix(m) => {
                let rows: Vec<String> = (0..m.rows())
                    .map(|i| {
                        let row = m.items()[i * m.cols()..(i + 1) * m.cols()]
                            .iter()
                            .map(|r| self.value(&Value::Real(r.clone())))
                            .collect();
                        self.elide(row, "; ")
                    })
                    .collect();
                format!("[{}]", self.elide(rows, " | "))
            }
        }
    }

    fn elide(&self, mut items: Vec<String>, sep: &str) -> String {
        let more = items.len() > self.max_count;
        items.truncate(self.max_count);
        let mut s = items.join(sep);
        if more {
            s.push_str(sep);
            s.push_str("...");
        }
        s
    }
}

// ---------------------------------------------------------------------------
// Expression writer
// ---------------------------------------------------------------------------

pub(crate) struct Writer<'a> {
    pub style: &'a Style,
    pub scope: &'a Scope<'a>,
    /// Replace variables with their current values.
    pub substitute: bool,
    /// Render `?` as an HTML input field.
    pub input_form: bool,
}

impl Writer<'_> {
    const fn html(&self) -> bool {
        matches!(self.style.markup, Markup::Html)
    }

    pub fn variable(&self, name: &str) -> String {
        if self.html() {
            format!("<var>{}</var>", escape_html(name))
        } else {
            name.to_owned()
        }
    }

    pub fn expr(&self, e: &Expr) -> String {
        match e {
            Expr::Number(x) => format!("{x}"),
            Expr::Imaginary(x) => format!("{x}i"),
            Expr::Name(name) => self.name(name),
            Expr::Input(v) => self.input(*v),
            Expr::Neg(inner) => {
                let s = self.expr(inner);
                let minus = if self.html() { "−" } else { "-" };
                if matches!(**inner, Expr::Binary(Operator::Add | Operator::Sub, ..)) {
                    format!("{minus}({s})")
                } else {
                    format!("{minus}{s}")
                }
            }
            Expr::Binary(Operator::Pow, a, b) => {
                let base = self.expr(a);
                let base = if matches!(**a, Expr::Neg(_) | Expr::Binary(..) | Expr::Implicit(..)) {
                    format!("({base})")
                } else {
                    base
                };
                if self.html() {
                    format!("{base}<sup>{}</sup>", self.expr(b))
                } else {
                    format!("{base}^{}", self.expr(b))
                }
            }
            Expr::Binary(op, a, b) => {
                format!("{} {} {}", self.expr(a), self.operator(*op), self.expr(b))
            }
            Expr::Implicit(a, b) => {
                if matches!(**b, Expr::Group(_)) {
                    format!("{}{}", self.expr(a), self.expr(b))
                } else {
                    format!("{} {}", self.expr(a), self.expr(b))
                }
            }
            Expr::Call(name, args) => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                if self.html() {
                    format!("<b>{}</b>({})", escape_html(name), args.join("; "))
                } else {
                    format!("{name}({})", args.join("; "))
                }
            }
            Expr::Group(inner) => format!("({})", self.expr(inner)),
            Expr::Vector(items) => {
                let items: Vec<String> = items.iter().map(|a| self.expr(a)).collect();
                format!("[{}]", items.join("; "))
            }
            Expr::Matrix(rows) => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|r| r.iter().map(|a| self.expr(a)).collect::<Vec<_>>().join("; "))
                    .collect();
                format!("[{}]", rows.join(" | "))
            }
        }
    }

    fn operator(&self, op: Operator) -> &'static str {
        match (op, self.html()) {
            (Operator::Sub, true) => "−",
            (Operator::Mul, true) => "·",
            (Operator::Lt, true) => "&lt;",
            (Operator::Gt, true) => "&gt;",
            _ => op.symbol(),
        }
    }

    fn name(&self, name: &str) -> String {
        match self.scope.resolve(name) {
            Resolved::Unit(u) => self.style.unit(&u),
            Resolved::Variable(v) if self.substitute => {
                let s = self.style.value(&v);
                if s.starts_with('-') || s.contains(' ') {
                    format!("({s})")
                } else {
                    s
                }
            }
            Resolved::Variable(_) | Resolved::Constant(_) | Resolved::Unknown => self.variable(name),
        }
    }

    fn input(&self, v: Option<f64>) -> String {
        if self.input_form && self.html() {
            let value = v.map_or_else(String::new, |x| x.to_string());
            return format!("<input type=\"text\" size=\"2\" name=\"Var\" value=\"{value}\">");
        }
        v.map_or_else(|| "?".into(), |x| self.style.number(x))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use calcsheet_math::{RealValue, Unit};

    use super::*;
    use crate::engine::parser::parse;
    use crate::variables::Variables;

    fn style(decimals: u8) -> Style {
        let state = DirectiveState {
            decimals,
            ..DirectiveState::default()
        };
        Style::new(&state, 20, Markup::Html, true)
    }

    #[test]
    fn rounding_trims_trailing_zeros() {
        let s = style(2);
        assert_eq!(s.number(1.0), "1");
        assert_eq!(s.number(1.2345), "1.23");
        assert_eq!(s.number(-0.001), "-1×10<sup>-3</sup>");
        assert_eq!(s.number(-0.0), "0");
        assert_eq!(s.number(2e16), "2×10<sup>16</sup>");
    }

    #[test]
    fn custom_formats() {
        let mut s = style(2).with_markup(Markup::Text);
        s.format = Some(NumberFormat::Fixed(3));
        assert_eq!(s.number(1.5), "1.500");
        s.format = Some(NumberFormat::Scientific(1));
        assert_eq!(s.number(1234.0), "1.2E3");
        s.format = Some(NumberFormat::General(3));
        assert_eq!(s.number(3.14159), "3.14");
    }

    #[test]
    fn undefined_and_infinite() {
        let s = style(2);
        assert!(s.number(f64::NAN).contains("Undefined"));
        assert_eq!(s.number(f64::NEG_INFINITY), "-∞");
        assert_eq!(s.complex(Complex::COMPLEX_INFINITY), "∞");
    }

    #[test]
    fn complex_and_phasor() {
        let mut s = style(2);
        assert_eq!(s.complex(Complex::new(3.0, -4.0)), "3 - 4i");
        s.phasor = true;
        assert_eq!(s.complex(Complex::new(0.0, 2.0)), "2∠90°");
    }

    #[test]
    fn values_with_units() {
        let s = style(2);
        let m = Unit::get("m").unwrap();
        let v = Value::Real(RealValue::with_unit(2.5, Some(m)));
        assert_eq!(s.value(&v), "2.5 <i>m</i>");
    }

    #[test]
    fn long_vectors_are_elided() {
        let mut s = style(0).with_markup(Markup::Text);
        s.max_count = 2;
        let v = Value::Vector(vec![RealValue::new(1.0), RealValue::new(2.0), RealValue::new(3.0)].into());
        assert_eq!(s.value(&v), "[1; 2; ...]");
    }

    #[test]
    fn expressions_render_with_markup() {
        let mut vars = Variables::new();
        vars.set("a", Value::from(-2.0));
        let units = HashMap::new();
        let scope = Scope {
            variables: &vars,
            units: &units,
        };
        let st = style(2);
        let e = parse("a^2 + 3m").unwrap();
        let w = Writer {
            style: &st,
            scope: &scope,
            substitute: false,
            input_form: false,
        };
        assert_eq!(w.expr(e.expr()), "<var>a</var><sup>2</sup> + 3 <i>m</i>");
        let w = Writer {
            substitute: true,
            ..w
        };
        assert_eq!(w.expr(e.expr()), "(-2)<sup>2</sup> + 3 <i>m</i>");
    }

    #[test]
    fn input_fields_in_form_mode() {
        let vars = Variables::new();
        let units = HashMap::new();
        let scope = Scope {
            variables: &vars,
            units: &units,
        };
        let st = style(2);
        let w = Writer {
            style: &st,
            scope: &scope,
            substitute: false,
            input_form: true,
        };
        let e = parse("? {4}").unwrap();
        assert!(w.expr(e.expr()).contains("<input type=\"text\""));
    }

    #[test]
    fn xml_escapes_quotes() {
        assert_eq!(text_to_xml("a<'b'"), "<m:oMath><m:r><m:t>a&lt;&apos;b&apos;</m:t></m:r></m:oMath>");
    }
}
