//! Interpreter settings.
//!
//! Loaded from JSON (`Settings::from_json`) or built in code. Out-of-range
//! numeric fields are clamped rather than rejected.

use calcsheet_math::math::AngleMode;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, InterpResult, InterpreterError};

pub const MAX_DECIMALS: u8 = 15;
const OUTPUT_COUNT_RANGE: (usize, usize) = (5, 100);

/// Math formatting and evaluation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathSettings {
    /// Digits after the decimal point in rendered results.
    pub decimals: u8,
    pub angles: AngleMode,
    /// Complex mode: out-of-domain real operations widen to complex.
    pub complex: bool,
    /// Render the substituted form of equations.
    pub substitute: bool,
    /// Attach XML renderings to equations.
    pub format_equations: bool,
    /// Vector and matrix elements shown before eliding.
    pub max_output_count: usize,
}

impl Default for MathSettings {
    fn default() -> Self {
        Self {
            decimals: 2,
            angles: AngleMode::Deg,
            complex: false,
            substitute: true,
            format_equations: true,
            max_output_count: 20,
        }
    }
}

impl MathSettings {
    /// Clamp numeric fields into their valid ranges.
    pub fn normalize(&mut self) {
        self.decimals = self.decimals.min(MAX_DECIMALS);
        self.max_output_count = self
            .max_output_count
            .clamp(OUTPUT_COUNT_RANGE.0, OUTPUT_COUNT_RANGE.1);
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub math: MathSettings,
    /// Length unit substituted for `%u` in the output.
    pub units: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            math: MathSettings::default(),
            units: "m".into(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> InterpResult<Self> {
        let mut settings: Self = serde_json::from_str(text).map_err(|e| {
            InterpreterError::new(ErrorKind::InvalidSettings, format!("invalid settings: {e}"))
        })?;
        settings.math.normalize();
        Ok(settings)
    }

    /// Factor of the configured length unit relative to metres, or 0 when
    /// the unit is not a supported length.
    #[must_use]
    pub fn units_factor(&self) -> f64 {
        match self.units.as_str() {
            "mm" => 1000.0,
            "cm" => 100.0,
            "m" => 1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let s = Settings::from_json(r#"{"units": "cm"}"#).unwrap();
        assert_eq!(s.units, "cm");
        assert_eq!(s.math.decimals, 2);
        assert!(s.math.substitute);
        assert_eq!(s.units_factor(), 100.0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = Settings::from_json(r#"{"math": {"decimals": 40, "max_output_count": 1, "angles": "rad"}}"#)
            .unwrap();
        assert_eq!(s.math.decimals, MAX_DECIMALS);
        assert_eq!(s.math.max_output_count, 5);
        assert_eq!(s.math.angles, AngleMode::Rad);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = Settings::from_json("{ decimals").unwrap_err();
        assert!(err.message.contains("invalid settings"), "got: {}", err.message);
    }

    #[test]
    fn unknown_length_unit_has_no_factor() {
        let s = Settings {
            units: "ft".into(),
            ..Settings::default()
        };
        assert_eq!(s.units_factor(), 0.0);
    }
}
