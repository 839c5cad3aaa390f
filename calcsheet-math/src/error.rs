//! Errors raised by the numeric layer.

use thiserror::Error;

/// Errors returned by kernel, scalar and value operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// Trig argument outside the range where the result is meaningful.
    #[error("argument out of range for {0}")]
    ArgumentOutOfRange(&'static str),
    /// Units of the two operands cannot be converted into one another.
    #[error("inconsistent units for \"{left}\" and \"{right}\" in \"{op}\"")]
    InconsistentUnits {
        left: String,
        right: String,
        op: char,
    },
    /// Remainder with a dimensioned divisor.
    #[error("cannot evaluate remainder with units \"{0}\"")]
    RemainderUnits(String),
    /// Operand combination not supported by an operator.
    #[error("invalid operands for \"{op}\": {left} and {right}")]
    InvalidOperand {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("the argument of {0} must be real")]
    MustBeReal(&'static str),
    #[error("the argument of {0} must be a scalar")]
    MustBeScalar(&'static str),
    #[error("the argument of {0} must be a positive integer")]
    MustBePositiveInteger(&'static str),
    #[error("the argument of {0} must be a vector")]
    MustBeVector(&'static str),
    #[error("the argument of {0} must be a matrix")]
    MustBeMatrix(&'static str),
    /// Element-wise operation on differently shaped operands.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The exponent of a power carries units.
    #[error("the power must be unitless")]
    PowerNotUnitless,
    #[error("units cannot be raised to a complex power")]
    UnitsToComplexPower,
    /// A function that needs a unitless argument got a dimensioned one.
    #[error("the argument of {0} must be unitless")]
    UnitsNotAllowed(&'static str),
    #[error("index {index} is out of range 1..{len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// The evaluation was canceled while a long aggregate was running.
    #[error("evaluation canceled")]
    Canceled,
}

/// Convenience alias.
pub type MathResult<T> = Result<T, MathError>;
