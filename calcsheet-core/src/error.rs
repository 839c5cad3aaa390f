//! Error types for the calcsheet engine and document interpreter.

use std::fmt;

use calcsheet_math::MathError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error severity
// ---------------------------------------------------------------------------

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning (processing continues).
    Warning,
    /// Error rendered in place; processing continues.
    Error,
    /// The pass was aborted.
    Fatal,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// An error produced by the expression engine or the document interpreter.
#[derive(Debug, Clone, Error)]
#[error("{}", self.render())]
pub struct InterpreterError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// 1-based source line, if known.
    pub line: Option<usize>,
    /// Severity.
    pub severity: Severity,
}

impl InterpreterError {
    /// Create a new error.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            severity: Severity::Error,
        }
    }

    /// An error whose message is the kind's description.
    #[must_use]
    pub fn of(kind: ErrorKind) -> Self {
        Self::new(kind, kind.to_string())
    }

    /// Attach a 1-based source line.
    #[must_use]
    pub const fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    fn render(&self) -> String {
        match self.line {
            Some(line) => format!("line {line}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

impl From<MathError> for InterpreterError {
    fn from(e: MathError) -> Self {
        let kind = if e == MathError::Canceled {
            ErrorKind::Canceled
        } else {
            ErrorKind::Math
        };
        Self::new(kind, e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Categories of errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // -- Structural --
    /// `#if` or `#else if` without a guard expression.
    ConditionEmpty,
    /// `#else if`, `#else` or `#end if` with no open `#if`.
    ConditionNotInitialized,
    /// Second `#else` on one level.
    DuplicateElse,
    /// `#else if` after `#else` on one level.
    ElseIfAfterElse,
    /// `#loop` closing a block opened at another condition level.
    EntangledBlocks,
    /// `#loop` with no open loop.
    LoopWithoutRepeat,
    /// `#continue` with no open loop.
    ContinueWithoutRepeat,
    /// A keyword that needs an expression got none.
    ExpressionEmpty,
    /// Malformed keyword arguments.
    InvalidKeyword,
    /// `#if` still open at the end of the document.
    IfNotClosed,
    /// Loop still open at the end of the document.
    LoopNotClosed,

    // -- Evaluation --
    /// Condition guard evaluated to a complex number.
    ConditionComplex,
    /// Condition guard evaluated to `NaN` or an infinity.
    ConditionInvalid,
    /// Failure inside the numeric layer.
    Math,
    /// Expression text could not be parsed.
    Syntax,
    /// Unknown variable or unit name.
    UndefinedVariable,
    /// Unknown function name or wrong arity.
    UndefinedFunction,
    /// Invalid `#format` string.
    InvalidFormat,

    // -- Resource --
    /// Error cap reached; the pass was aborted.
    TooManyErrors,
    /// Condition nesting deeper than the cap.
    NestingTooDeep,
    /// Rendered output exceeded the line cap.
    OutputTooLong,
    /// Requested iteration count above the cap.
    TooManyIterations,

    // -- Engine --
    /// The pass was canceled.
    Canceled,
    /// Unknown equation cache id.
    InvalidCacheId,
    /// Settings could not be loaded.
    InvalidSettings,
}

impl ErrorKind {
    /// Structural errors come from keyword misuse rather than math.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::ConditionEmpty
                | Self::ConditionNotInitialized
                | Self::DuplicateElse
                | Self::ElseIfAfterElse
                | Self::EntangledBlocks
                | Self::LoopWithoutRepeat
                | Self::ContinueWithoutRepeat
                | Self::ExpressionEmpty
                | Self::InvalidKeyword
                | Self::IfNotClosed
                | Self::LoopNotClosed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ConditionEmpty => "condition cannot be empty",
            Self::ConditionNotInitialized => "#else if, #else or #end if without a corresponding #if",
            Self::DuplicateElse => "duplicate #else within one #if block",
            Self::ElseIfAfterElse => "#else if cannot follow #else",
            Self::EntangledBlocks => "entangled #if - #end if and #repeat - #loop blocks",
            Self::LoopWithoutRepeat => "#loop without a corresponding #repeat",
            Self::ContinueWithoutRepeat => "#continue without a corresponding #repeat",
            Self::ExpressionEmpty => "expression cannot be empty",
            Self::InvalidKeyword => "invalid keyword",
            Self::IfNotClosed => "#if block not closed. Missing #end if",
            Self::LoopNotClosed => "iteration block not closed. Missing #loop",
            Self::ConditionComplex => "condition cannot evaluate to a complex number",
            Self::ConditionInvalid => "condition result is invalid",
            Self::Math => "math error",
            Self::Syntax => "syntax error",
            Self::UndefinedVariable => "undefined variable or units",
            Self::UndefinedFunction => "undefined function",
            Self::InvalidFormat => "invalid format string",
            Self::TooManyErrors => "too many errors. Processing stopped",
            Self::NestingTooDeep => "conditional blocks are nested too deep",
            Self::OutputTooLong => "the output is too long. The rest will be skipped",
            Self::TooManyIterations => "number of iterations exceeds the maximum",
            Self::Canceled => "processing canceled",
            Self::InvalidCacheId => "invalid equation cache id",
            Self::InvalidSettings => "invalid settings",
        };
        write!(f, "{s}")
    }
}

/// Result type for engine and interpreter operations.
pub type InterpResult<T> = Result<T, InterpreterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_is_rendered_in_display() {
        let e = InterpreterError::of(ErrorKind::DuplicateElse).with_line(7);
        assert_eq!(e.to_string(), "line 7: duplicate #else within one #if block");
    }

    #[test]
    fn math_errors_convert() {
        let e: InterpreterError = MathError::PowerNotUnitless.into();
        assert_eq!(e.kind, ErrorKind::Math);
        assert!(e.message.contains("unitless"));
        let c: InterpreterError = MathError::Canceled.into();
        assert_eq!(c.kind, ErrorKind::Canceled);
    }

    #[test]
    fn structural_grouping() {
        assert!(ErrorKind::EntangledBlocks.is_structural());
        assert!(!ErrorKind::TooManyErrors.is_structural());
    }
}
