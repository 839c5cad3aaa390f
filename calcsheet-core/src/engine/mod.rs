//! The expression engine seam.
//!
//! The document interpreter never evaluates math itself: it hands each
//! expression token to an [`ExpressionEngine`] and asks it for results and
//! renderings. [`BasicEngine`] is the bundled implementation; hosts can plug
//! in their own through [`crate::interpreter::Interpreter::with_engine`].
//!
//! The equation cache lets the interpreter skip re-parsing inside loops:
//! after [`ExpressionEngine::parse`], [`ExpressionEngine::write_equation_to_cache`]
//! stores the parsed form under an id, and later iterations call
//! [`ExpressionEngine::read_equation_from_cache`] instead of parsing again.

mod basic;
pub(crate) mod eval;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod render;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use calcsheet_math::{Complex, UnitRef, Value};

pub use basic::BasicEngine;

use crate::directives::DirectiveState;
use crate::error::InterpResult;
use crate::settings::MathSettings;
use crate::variables::Variables;

/// Operations the interpreter needs from an expression evaluator.
pub trait ExpressionEngine {
    /// Parse one expression and make it the current equation.
    fn parse(&mut self, text: &str) -> InterpResult<()>;

    /// Evaluate the current equation. `is_output` tells the engine whether
    /// the rendering will be shown, so it can skip building it.
    fn calculate(&mut self, is_output: bool) -> InterpResult<()>;

    /// Numeric result of the last calculation; `NaN` when there is none.
    fn result(&self) -> Complex;

    /// Full result value of the last calculation.
    fn result_value(&self) -> Option<&Value>;

    /// Unit of the last result.
    fn units(&self) -> Option<UnitRef>;

    /// Current equation as HTML, with results if it was calculated.
    fn to_html(&self) -> String;

    /// Current equation as XML.
    fn to_xml(&self) -> String;

    /// Result value alone, as HTML.
    fn result_as_val(&self) -> String;

    fn get_variable(&self, name: &str) -> Option<Value>;

    fn set_variable(&mut self, name: &str, value: Value);

    /// Mutable access to the bindings, e.g. to register change listeners.
    fn variables_mut(&mut self) -> &mut Variables;

    /// Store the current equation and return its cache id. `is_visible`
    /// lets an engine skip preparing renderings for hidden lines.
    fn write_equation_to_cache(&mut self, is_visible: bool) -> Option<usize>;

    /// Make a cached equation current again without parsing it.
    fn read_equation_from_cache(&mut self, id: usize) -> InterpResult<()>;

    /// Drop evaluation state left over from the last calculation.
    fn reset_stack(&mut self);

    /// Shared cancel flag, polled once per line by the interpreter.
    fn cancel_flag(&self) -> Arc<AtomicBool>;

    fn cancel(&self) {
        self.cancel_flag().store(true, Ordering::Relaxed);
    }

    fn is_canceled(&self) -> bool {
        self.cancel_flag().load(Ordering::Relaxed)
    }

    /// Register unit definitions of the current equation without
    /// calculating anything else.
    fn define_custom_units(&mut self) -> InterpResult<()>;

    /// `false` under `#noc`: render equations without results.
    fn set_calculation(&mut self, on: bool);

    /// Input-form rendering: `?` becomes an HTML input field.
    fn set_input_form(&mut self, on: bool);

    /// Whether the current equation contains `?` input fields.
    fn has_input_fields(&self) -> bool;

    fn clear_input_fields(&mut self);

    /// Apply the directive state in force for the following lines.
    fn apply_directives(&mut self, state: &DirectiveState);

    fn set_show_warnings(&mut self, on: bool);

    /// Start a fresh document: clear variables, units and caches.
    fn reset(&mut self, settings: &MathSettings);

    /// Drop cached equations.
    fn clear_cache(&mut self);
}
