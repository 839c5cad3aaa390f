//! The bundled expression engine.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use calcsheet_math::calculator::Calculator;
use calcsheet_math::unit::DIMENSIONS;
use calcsheet_math::{Complex, Unit, UnitRef, Value};

use super::eval::{Evaluator, Scope};
use super::parser::{self, Statement};
use super::render::{escape_html, text_to_xml, Markup, Style, Writer};
use super::ExpressionEngine;
use crate::directives::{DirectiveState, Substitution};
use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::settings::MathSettings;
use crate::variables::Variables;

#[derive(Debug)]
struct Equation {
    statement: Statement,
}

/// Substituted renderings captured before an assignment overwrites the
/// values they show.
#[derive(Debug, Default)]
struct Substituted {
    html: String,
    text: String,
}

/// Expression engine over [`Variables`] and the math crate's calculator.
pub struct BasicEngine {
    variables: Variables,
    units: HashMap<String, UnitRef>,
    calc: Calculator,
    cancel: Arc<AtomicBool>,
    state: DirectiveState,
    max_count: usize,
    cache: Vec<Rc<Equation>>,
    current: Option<Rc<Equation>>,
    result: Option<Value>,
    substituted: Option<Substituted>,
    is_calculation: bool,
    input_form: bool,
    has_input: bool,
    show_warnings: bool,
}

impl std::fmt::Debug for BasicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicEngine")
            .field("variables", &self.variables.len())
            .field("units", &self.units.len())
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Default for BasicEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicEngine {
    #[must_use]
    pub fn new() -> Self {
        let settings = MathSettings::default();
        let cancel = Arc::new(AtomicBool::new(false));
        Self {
            variables: Variables::new(),
            units: HashMap::new(),
            calc: Calculator::new(settings.angles, settings.complex).with_cancel(Arc::clone(&cancel)),
            cancel,
            state: DirectiveState::from_settings(&settings),
            max_count: settings.max_output_count,
            cache: Vec::new(),
            current: None,
            result: None,
            substituted: None,
            is_calculation: true,
            input_form: false,
            has_input: false,
            show_warnings: true,
        }
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            variables: &self.variables,
            units: &self.units,
        }
    }

    fn current(&self) -> InterpResult<Rc<Equation>> {
        self.current
            .clone()
            .ok_or_else(|| InterpreterError::new(ErrorKind::Syntax, "no expression to evaluate"))
    }

    fn evaluate(&self, eq: &Equation) -> InterpResult<Value> {
        let ev = Evaluator {
            scope: self.scope(),
            calc: &self.calc,
        };
        ev.eval(eq.statement.expr())
    }

    fn define_unit(&mut self, name: &str, value: &Value) -> InterpResult<()> {
        let r = value.as_real()?;
        let unit = match &r.unit {
            Some(u) => Unit::new(name, *u.powers(), r.value * u.factor()),
            None => Unit::new(name, [0.0; DIMENSIONS], r.value),
        };
        tracing::debug!(unit = name, "custom unit defined");
        self.units.insert(name.to_owned(), Arc::new(unit));
        Ok(())
    }

    fn wants_substitution(&self, eq: &Equation) -> bool {
        self.is_calculation
            && self.state.substitution != Substitution::VariablesOnly
            && eq.statement.expr().has_names()
    }

    fn substitute(&self, eq: &Equation) -> Substituted {
        let scope = self.scope();
        let html_style = Style::new(&self.state, self.max_count, Markup::Html, self.show_warnings);
        let text_style = html_style.with_markup(Markup::Text);
        let write = |style: &Style| {
            Writer {
                style,
                scope: &scope,
                substitute: true,
                input_form: false,
            }
            .expr(eq.statement.expr())
        };
        Substituted {
            html: write(&html_style),
            text: write(&text_style),
        }
    }

    /// `[name =] expression [= substituted] [= result]` in one markup.
    fn render(&self, markup: Markup) -> String {
        let Some(eq) = &self.current else {
            return String::new();
        };
        let scope = self.scope();
        let style = Style::new(&self.state, self.max_count, markup, self.show_warnings);
        let writer = Writer {
            style: &style,
            scope: &scope,
            substitute: false,
            input_form: self.input_form,
        };
        let lhs = match &eq.statement {
            Statement::Expr(_) => String::new(),
            Statement::Assign(name, _) => format!("{} = ", writer.variable(name)),
            Statement::UnitDef(name, _) if markup == Markup::Html => {
                format!("<i>{}</i> = ", escape_html(name))
            }
            Statement::UnitDef(name, _) => format!("{name} = "),
        };
        let result = self
            .result
            .as_ref()
            .filter(|_| self.is_calculation && !eq.statement.expr().is_literal())
            .map(|v| style.value(v));
        let substituted = self.substituted.as_ref().map(|s| match markup {
            Markup::Html => s.html.clone(),
            Markup::Text => s.text.clone(),
        });

        let mut parts = Vec::with_capacity(3);
        let expression = writer.expr(eq.statement.expr());
        let hide_variables =
            self.state.substitution == Substitution::SubstitutionsOnly && substituted.is_some();
        if !hide_variables {
            parts.push(expression);
        }
        if let Some(s) = substituted {
            if parts.last() != Some(&s) && result.as_ref() != Some(&s) {
                parts.push(s);
            }
        }
        if let Some(r) = result {
            if parts.last() != Some(&r) {
                parts.push(r);
            }
        }
        let sep = if self.state.split && markup == Markup::Html {
            "<br/>= "
        } else {
            " = "
        };
        format!("{lhs}{}", parts.join(sep))
    }
}

impl ExpressionEngine for BasicEngine {
    fn parse(&mut self, text: &str) -> InterpResult<()> {
        let statement = parser::parse(text)?;
        self.has_input |= statement.expr().has_input();
        self.current = Some(Rc::new(Equation { statement }));
        self.reset_stack();
        Ok(())
    }

    fn calculate(&mut self, is_output: bool) -> InterpResult<()> {
        if self.is_canceled() {
            return Err(InterpreterError::of(ErrorKind::Canceled));
        }
        let eq = self.current()?;
        self.reset_stack();
        let value = self.evaluate(&eq)?;
        if is_output && self.wants_substitution(&eq) {
            self.substituted = Some(self.substitute(&eq));
        }
        match &eq.statement {
            Statement::Expr(_) => {}
            Statement::Assign(name, _) => self.variables.set(name, value.clone()),
            Statement::UnitDef(name, _) => self.define_unit(name, &value)?,
        }
        self.result = Some(value);
        Ok(())
    }

    fn result(&self) -> Complex {
        self.result.as_ref().map_or(Complex::NAN, Value::number)
    }

    fn result_value(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    fn units(&self) -> Option<UnitRef> {
        self.result.as_ref().and_then(Value::unit).cloned()
    }

    fn to_html(&self) -> String {
        self.render(Markup::Html)
    }

    fn to_xml(&self) -> String {
        text_to_xml(&self.render(Markup::Text))
    }

    fn result_as_val(&self) -> String {
        let style = Style::new(&self.state, self.max_count, Markup::Html, self.show_warnings);
        self.result.as_ref().map_or_else(String::new, |v| style.value(v))
    }

    fn get_variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.set(name, value);
    }

    fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    fn write_equation_to_cache(&mut self, _is_visible: bool) -> Option<usize> {
        let eq = Rc::clone(self.current.as_ref()?);
        self.cache.push(eq);
        let id = self.cache.len() - 1;
        tracing::trace!(id, "equation cached");
        Some(id)
    }

    fn read_equation_from_cache(&mut self, id: usize) -> InterpResult<()> {
        let eq = self.cache.get(id).cloned().ok_or_else(|| {
            InterpreterError::new(ErrorKind::InvalidCacheId, format!("invalid equation cache id {id}"))
        })?;
        self.current = Some(eq);
        self.reset_stack();
        Ok(())
    }

    fn reset_stack(&mut self) {
        self.result = None;
        self.substituted = None;
    }

    fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn define_custom_units(&mut self) -> InterpResult<()> {
        let eq = self.current()?;
        if let Statement::UnitDef(name, _) = &eq.statement {
            let value = self.evaluate(&eq)?;
            self.define_unit(name, &value)?;
        }
        Ok(())
    }

    fn set_calculation(&mut self, on: bool) {
        self.is_calculation = on;
    }

    fn set_input_form(&mut self, on: bool) {
        self.input_form = on;
    }

    fn has_input_fields(&self) -> bool {
        self.has_input
    }

    fn clear_input_fields(&mut self) {
        self.has_input = false;
    }

    fn apply_directives(&mut self, state: &DirectiveState) {
        self.state = state.clone();
        self.calc.angles = state.angles;
    }

    fn set_show_warnings(&mut self, on: bool) {
        self.show_warnings = on;
    }

    fn reset(&mut self, settings: &MathSettings) {
        self.cancel.store(false, Ordering::Relaxed);
        self.variables.clear();
        self.units.clear();
        self.cache.clear();
        self.current = None;
        self.reset_stack();
        self.has_input = false;
        self.calc = Calculator::new(settings.angles, settings.complex).with_cancel(Arc::clone(&self.cancel));
        self.state = DirectiveState::from_settings(settings);
        self.max_count = settings.max_output_count;
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use calcsheet_math::math::AngleMode;

    use super::*;

    fn calc(engine: &mut BasicEngine, src: &str) -> InterpResult<()> {
        engine.parse(src)?;
        engine.calculate(true)
    }

    #[test]
    fn assignment_renders_substitution_and_result() {
        let mut engine = BasicEngine::new();
        calc(&mut engine, "a = 3").unwrap();
        calc(&mut engine, "b = 2*a").unwrap();
        assert_eq!(engine.to_html(), "<var>b</var> = 2 · <var>a</var> = 2 · 3 = 6");
        assert!(engine.result().almost_equals(Complex::real(6.0)));
        assert!(engine.get_variable("b").is_some());
    }

    #[test]
    fn substitution_uses_values_before_reassignment() {
        let mut engine = BasicEngine::new();
        calc(&mut engine, "n = 1").unwrap();
        calc(&mut engine, "n = n + 1").unwrap();
        assert!(engine.to_html().contains("= 1 + 1 = 2"), "got {}", engine.to_html());
    }

    #[test]
    fn variables_only_mode_skips_substitution() {
        let mut engine = BasicEngine::new();
        let mut state = DirectiveState::default();
        state.substitution = Substitution::VariablesOnly;
        engine.apply_directives(&state);
        calc(&mut engine, "a = 3").unwrap();
        calc(&mut engine, "a + 1").unwrap();
        assert_eq!(engine.to_html(), "<var>a</var> + 1 = 4");
    }

    #[test]
    fn literals_show_once() {
        let mut engine = BasicEngine::new();
        calc(&mut engine, "x = 5").unwrap();
        assert_eq!(engine.to_html(), "<var>x</var> = 5");
        assert_eq!(engine.result_as_val(), "5");
    }

    #[test]
    fn custom_units() {
        let mut engine = BasicEngine::new();
        calc(&mut engine, ".kip = 4448.22N").unwrap();
        calc(&mut engine, "2kip").unwrap();
        assert!(engine.units().is_some());

        let mut engine = BasicEngine::new();
        engine.parse(".dozen = 12").unwrap();
        engine.define_custom_units().unwrap();
        assert!(engine.get_variable("dozen").is_none());
        calc(&mut engine, "2dozen").unwrap();
    }

    #[test]
    fn cache_round_trip() {
        let mut engine = BasicEngine::new();
        engine.parse("k = 7").unwrap();
        let id = engine.write_equation_to_cache(true).unwrap();
        engine.parse("1 + 1").unwrap();
        engine.read_equation_from_cache(id).unwrap();
        engine.calculate(false).unwrap();
        assert!(engine.get_variable("k").is_some());
        let err = engine.read_equation_from_cache(id + 5).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCacheId);
        engine.clear_cache();
        assert!(engine.read_equation_from_cache(id).is_err());
    }

    #[test]
    fn cancel_stops_calculation() {
        let mut engine = BasicEngine::new();
        engine.parse("1 + 1").unwrap();
        engine.cancel();
        let err = engine.calculate(false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Canceled);
        engine.reset(&MathSettings::default());
        assert!(!engine.is_canceled());
        engine.parse("1 + 1").unwrap();
        engine.calculate(false).unwrap();
    }

    #[test]
    fn angle_directive_reaches_calculator() {
        let mut engine = BasicEngine::new();
        let mut state = DirectiveState::default();
        state.angles = AngleMode::Rad;
        engine.apply_directives(&state);
        calc(&mut engine, "cos(0)").unwrap();
        assert!(engine.result().almost_equals(Complex::real(1.0)));
        calc(&mut engine, "sin(90)").unwrap();
        assert!(engine.result().re < 0.9);
    }

    #[test]
    fn input_fields_are_tracked() {
        let mut engine = BasicEngine::new();
        engine.parse("x = ? {2}").unwrap();
        assert!(engine.has_input_fields());
        engine.clear_input_fields();
        engine.parse("y = 2").unwrap();
        assert!(!engine.has_input_fields());
        engine.set_input_form(true);
        engine.parse("z = ?").unwrap();
        assert!(engine.to_html().contains("<input"));
    }

    #[test]
    fn xml_is_plain_text_run() {
        let mut engine = BasicEngine::new();
        calc(&mut engine, "a = 2 + 3").unwrap();
        assert_eq!(engine.to_xml(), "<m:oMath><m:r><m:t>a = 2 + 3 = 5</m:t></m:r></m:oMath>");
    }
}
