//! Compact dimensional units.
//!
//! A [`Unit`] is a vector of base-dimension exponents plus the factor that
//! converts one of it into coherent SI, and a display name. Units are
//! immutable once built and shared as [`UnitRef`] (`Arc<Unit>`), so values
//! can carry them cheaply and compare identity with `Arc::ptr_eq`.
//!
//! Dimensionless named units (`%`, `‰`) have no exponents; their factor is
//! the dimensionless scale used when folding them into a number.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{MathError, MathResult};
use crate::math::almost_equals;

/// Shared reference to an immutable unit.
pub type UnitRef = Arc<Unit>;

/// Number of base dimensions.
pub const DIMENSIONS: usize = 8;

/// Base dimensions, in exponent order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass = 0,
    Length = 1,
    Time = 2,
    Current = 3,
    Temperature = 4,
    Substance = 5,
    Luminosity = 6,
    Angle = 7,
}

const COMPOSITE_CHARS: [char; 3] = ['·', '/', '^'];

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A physical unit.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    powers: [f64; DIMENSIONS],
    factor: f64,
}

impl PartialEq for Unit {
    /// Same dimensions and the same SI factor; the name is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.is_consistent(other) && almost_equals(self.factor, other.factor)
    }
}

impl Unit {
    /// Build a unit from a name, exponents and SI factor.
    #[must_use]
    pub fn new(name: impl Into<String>, powers: [f64; DIMENSIONS], factor: f64) -> Self {
        Self {
            name: name.into(),
            powers,
            factor,
        }
    }

    fn base(name: &str, dim: Dimension, factor: f64) -> Self {
        let mut powers = [0.0; DIMENSIONS];
        powers[dim as usize] = 1.0;
        Self::new(name, powers, factor)
    }

    /// A dimensionless named scale such as `%`.
    fn scale(name: &str, factor: f64) -> Self {
        Self::new(name, [0.0; DIMENSIONS], factor)
    }

    /// Look up a unit by name in the built-in table.
    pub fn get(name: &str) -> Option<UnitRef> {
        table().get(name).cloned()
    }

    /// `true` if `name` is a built-in unit.
    pub fn exists(name: &str) -> bool {
        table().contains_key(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    #[must_use]
    pub const fn powers(&self) -> &[f64; DIMENSIONS] {
        &self.powers
    }

    /// `true` when all exponents are zero.
    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.powers.iter().all(|&p| p == 0.0)
    }

    /// Scale that folds a dimensionless unit into a plain number.
    #[must_use]
    pub fn dimensionless_factor(&self) -> f64 {
        self.factor
    }

    /// Pure angle unit (`rad`, `deg`, ...).
    #[must_use]
    pub fn is_angle(&self) -> bool {
        self.powers
            .iter()
            .enumerate()
            .all(|(i, &p)| if i == Dimension::Angle as usize { p == 1.0 } else { p == 0.0 })
    }

    /// Same base-dimension exponents.
    #[must_use]
    pub fn is_consistent(&self, other: &Self) -> bool {
        self.powers
            .iter()
            .zip(&other.powers)
            .all(|(a, b)| almost_equals(*a, *b))
    }

    /// Factor that converts a value in `self` into `target`.
    #[must_use]
    pub fn convert_to(&self, target: &Self) -> f64 {
        self.factor / target.factor
    }

    /// Raise to a real power.
    #[must_use]
    pub fn pow(&self, x: f64) -> Self {
        let mut powers = self.powers;
        for p in &mut powers {
            *p *= x;
        }
        Self::new(
            format!("{}^{}", self.wrapped_name(), format_power(x)),
            powers,
            self.factor.powf(x),
        )
    }

    /// `true` if the name is built from other units.
    #[must_use]
    pub fn is_composite_name(&self) -> bool {
        self.name.contains(COMPOSITE_CHARS)
    }

    fn wrapped_name(&self) -> String {
        if self.is_composite_name() {
            format!("({})", self.name)
        } else {
            self.name.clone()
        }
    }

    /// HTML rendering.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 8);
        out.push_str("<i>");
        let mut chars = self.name.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '^' => {
                    out.push_str("<sup>");
                    while let Some(&d) = chars.peek() {
                        if d.is_ascii_digit() || d == '.' || d == '-' {
                            out.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str("</sup>");
                }
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '&' => out.push_str("&amp;"),
                _ => out.push(c),
            }
        }
        out.push_str("</i>");
        out
    }

    /// Office Math XML rendering.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!("<m:r><m:t>{}</m:t></m:r>", xml_escape(&self.name))
    }

    // -- collaborator operations --------------------------------------------

    /// Conversion factor applied to the right operand of `op`.
    ///
    /// Identical references (or both absent) need no conversion. A missing
    /// unit on one side or inconsistent dimensions fail.
    pub fn convert(a: Option<&UnitRef>, b: Option<&UnitRef>, op: char) -> MathResult<f64> {
        match (a, b) {
            (None, None) => Ok(1.0),
            (Some(ua), Some(ub)) if Arc::ptr_eq(ua, ub) => Ok(1.0),
            (Some(ua), Some(ub)) if ua.is_consistent(ub) => Ok(ub.convert_to(ua)),
            _ => Err(MathError::InconsistentUnits {
                left: unit_text(a),
                right: unit_text(b),
                op,
            }),
        }
    }

    /// Product of two units and the factor to apply to the numeric product.
    ///
    /// When the right unit is consistent with the left one it is converted
    /// into it so that `m*mm` gives `m^2`. With `update_text` (the right
    /// operand denotes a unit itself) the names are always composed.
    pub fn multiply(
        a: Option<&UnitRef>,
        b: Option<&UnitRef>,
        update_text: bool,
    ) -> (Option<UnitRef>, f64) {
        match (a, b) {
            (None, None) => (None, 1.0),
            (Some(ua), None) => (Some(Arc::clone(ua)), 1.0),
            (None, Some(ub)) => (Some(Arc::clone(ub)), 1.0),
            (Some(ua), Some(ub)) => {
                if !update_text && ua.is_consistent(ub) {
                    let d = ub.convert_to(ua);
                    return (Some(Arc::new(ua.pow(2.0))), d);
                }
                let powers = combine(&ua.powers, &ub.powers, 1.0);
                if powers.iter().all(|&p| p == 0.0) {
                    return (None, ua.factor * ub.factor);
                }
                let name = format!("{}·{}", ua.name, ub.wrapped_name());
                (Some(Arc::new(Self::new(name, powers, ua.factor * ub.factor))), 1.0)
            }
        }
    }

    /// Quotient of two units and the factor to apply to the numeric quotient.
    pub fn divide(
        a: Option<&UnitRef>,
        b: Option<&UnitRef>,
        update_text: bool,
    ) -> (Option<UnitRef>, f64) {
        match (a, b) {
            (None, None) => (None, 1.0),
            (Some(ua), None) => (Some(Arc::clone(ua)), 1.0),
            (None, Some(ub)) => (Some(Arc::new(ub.pow(-1.0))), 1.0),
            (Some(ua), Some(ub)) => {
                if ua.is_consistent(ub) && !update_text {
                    return (None, ua.convert_to(ub));
                }
                let powers = combine(&ua.powers, &ub.powers, -1.0);
                if powers.iter().all(|&p| p == 0.0) {
                    return (None, ua.factor / ub.factor);
                }
                let name = format!("{}/{}", ua.name, ub.wrapped_name());
                (Some(Arc::new(Self::new(name, powers, ua.factor / ub.factor))), 1.0)
            }
        }
    }

    /// `true` if `value` shown with `unit` needs a separating operator or
    /// brackets, i.e. the unit is composite or the value is not a bare 1.
    pub fn is_composite(value: f64, unit: Option<&UnitRef>) -> bool {
        unit.is_some_and(|u| value != 1.0 || u.is_composite_name())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn combine(a: &[f64; DIMENSIONS], b: &[f64; DIMENSIONS], sign: f64) -> [f64; DIMENSIONS] {
    let mut out = [0.0; DIMENSIONS];
    for (i, p) in out.iter_mut().enumerate() {
        let v = a[i] + sign * b[i];
        *p = if v.abs() < 1e-12 { 0.0 } else { v };
    }
    out
}

fn unit_text(u: Option<&UnitRef>) -> String {
    u.map_or_else(String::new, |u| u.name.clone())
}

fn format_power(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Built-in table
// ---------------------------------------------------------------------------

fn table() -> &'static HashMap<&'static str, UnitRef> {
    static TABLE: OnceLock<HashMap<&'static str, UnitRef>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn derived(name: &str, mass: f64, length: f64, time: f64, factor: f64) -> Unit {
    let mut powers = [0.0; DIMENSIONS];
    powers[Dimension::Mass as usize] = mass;
    powers[Dimension::Length as usize] = length;
    powers[Dimension::Time as usize] = time;
    Unit::new(name, powers, factor)
}

fn build_table() -> HashMap<&'static str, UnitRef> {
    use Dimension::{Angle, Current, Length, Luminosity, Mass, Substance, Temperature, Time};

    let units = [
        ("mm", Unit::base("mm", Length, 1e-3)),
        ("cm", Unit::base("cm", Length, 1e-2)),
        ("dm", Unit::base("dm", Length, 1e-1)),
        ("m", Unit::base("m", Length, 1.0)),
        ("km", Unit::base("km", Length, 1e3)),
        ("mg", Unit::base("mg", Mass, 1e-6)),
        ("g", Unit::base("g", Mass, 1e-3)),
        ("kg", Unit::base("kg", Mass, 1.0)),
        ("t", Unit::base("t", Mass, 1e3)),
        ("ms", Unit::base("ms", Time, 1e-3)),
        ("s", Unit::base("s", Time, 1.0)),
        ("min", Unit::base("min", Time, 60.0)),
        ("h", Unit::base("h", Time, 3600.0)),
        ("A", Unit::base("A", Current, 1.0)),
        ("K", Unit::base("K", Temperature, 1.0)),
        ("mol", Unit::base("mol", Substance, 1.0)),
        ("cd", Unit::base("cd", Luminosity, 1.0)),
        ("rad", Unit::base("rad", Angle, 1.0)),
        ("deg", Unit::base("deg", Angle, std::f64::consts::PI / 180.0)),
        ("°", Unit::base("°", Angle, std::f64::consts::PI / 180.0)),
        ("grad", Unit::base("grad", Angle, std::f64::consts::PI / 200.0)),
        ("N", derived("N", 1.0, 1.0, -2.0, 1.0)),
        ("kN", derived("kN", 1.0, 1.0, -2.0, 1e3)),
        ("MN", derived("MN", 1.0, 1.0, -2.0, 1e6)),
        ("Pa", derived("Pa", 1.0, -1.0, -2.0, 1.0)),
        ("kPa", derived("kPa", 1.0, -1.0, -2.0, 1e3)),
        ("MPa", derived("MPa", 1.0, -1.0, -2.0, 1e6)),
        ("GPa", derived("GPa", 1.0, -1.0, -2.0, 1e9)),
        ("J", derived("J", 1.0, 2.0, -2.0, 1.0)),
        ("kJ", derived("kJ", 1.0, 2.0, -2.0, 1e3)),
        ("W", derived("W", 1.0, 2.0, -3.0, 1.0)),
        ("kW", derived("kW", 1.0, 2.0, -3.0, 1e3)),
        ("Hz", derived("Hz", 0.0, 0.0, -1.0, 1.0)),
        ("L", derived("L", 0.0, 3.0, 0.0, 1e-3)),
        ("%", Unit::scale("%", 1e-2)),
        ("‰", Unit::scale("‰", 1e-3)),
    ];
    units
        .into_iter()
        .map(|(name, unit)| (name, Arc::new(unit)))
        .collect()
}
