//! The running directive configuration.
//!
//! Directive keywords (`#hide`, `#val`, `#deg`, `#round`, ...) do not apply
//! to one line only: each one updates a [`DirectiveState`] that persists
//! until another directive changes it. The interpreter owns the state and
//! hands it to the engine after every change.

use calcsheet_math::math::AngleMode;

use crate::settings::{MathSettings, MAX_DECIMALS};

/// What an expression line renders: `#equ`, `#val` or `#noc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Full equation with its result.
    #[default]
    Equations,
    /// Result value only.
    Values,
    /// Equation text without calculating it.
    NoCalc,
}

/// Which forms of an equation are shown: `#varsub`, `#nosub`, `#novar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Substitution {
    #[default]
    VariablesAndSubstitutions,
    VariablesOnly,
    SubstitutionsOnly,
}

/// Custom number format set by `#format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// `F<n>`: fixed point with `n` decimals.
    Fixed(u8),
    /// `E<n>`: scientific with `n` decimals.
    Scientific(u8),
    /// `G<n>`: `n` significant digits.
    General(u8),
}

impl NumberFormat {
    /// Parse `F3`, `e2`, `G5`; a missing digit count means 2.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let rest = chars.as_str();
        let digits = if rest.is_empty() {
            2
        } else {
            rest.parse::<u8>().ok().filter(|&n| n <= MAX_DECIMALS)?
        };
        match letter {
            'F' => Some(Self::Fixed(digits)),
            'E' => Some(Self::Scientific(digits)),
            'G' => Some(Self::General(digits.max(1))),
            _ => None,
        }
    }
}

/// Directive settings in force for the current line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveState {
    /// `#hide` / `#show` / `#pre` / `#post`.
    pub visible: bool,
    pub output: OutputMode,
    pub substitution: Substitution,
    /// `#split`: break long equations after the variable part.
    pub split: bool,
    pub angles: AngleMode,
    pub decimals: u8,
    pub format: Option<NumberFormat>,
    /// `#phasor` / `#complex`.
    pub phasor: bool,
}

impl DirectiveState {
    /// Directive defaults taken from the math settings.
    #[must_use]
    pub fn from_settings(math: &MathSettings) -> Self {
        Self {
            visible: true,
            output: OutputMode::Equations,
            substitution: if math.substitute {
                Substitution::VariablesAndSubstitutions
            } else {
                Substitution::VariablesOnly
            },
            split: false,
            angles: math.angles,
            decimals: math.decimals.min(MAX_DECIMALS),
            format: None,
            phasor: false,
        }
    }

    /// Set decimals, clamped to the supported range.
    pub fn set_decimals(&mut self, n: i64) {
        self.decimals = n.clamp(0, i64::from(MAX_DECIMALS)) as u8;
    }
}

impl Default for DirectiveState {
    fn default() -> Self {
        Self::from_settings(&MathSettings::default())
    }
}
