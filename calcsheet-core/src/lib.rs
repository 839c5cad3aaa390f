//! Calculation-sheet document interpreter.
//!
//! A document is plain text: expression lines, quoted headings and comments,
//! and `#` keywords for conditionals, loops and rendering directives. The
//! [`interpreter::Interpreter`] walks it line by line and renders HTML,
//! delegating the math to an [`engine::ExpressionEngine`].

pub mod directives;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod settings;
pub mod variables;

pub use engine::{BasicEngine, ExpressionEngine};
pub use error::{ErrorKind, InterpResult, InterpreterError, Severity};
pub use interpreter::{Interpreter, Session};
pub use settings::{MathSettings, Settings};
