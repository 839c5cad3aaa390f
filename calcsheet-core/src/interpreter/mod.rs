//! The document interpreter.
//!
//! A pass walks the document top to bottom, one logical line at a time:
//!
//! 1. Lines already tokenized in this session (loop bodies, lines revisited
//!    after a resume) go straight to evaluation.
//! 2. Keyword lines update directives or the loop stack; some of them end
//!    the line here, `#pause` and `#break` can end the pass.
//! 3. The condition stack decides whether the line runs at all.
//! 4. The line is split into tokens; expression tokens go to the
//!    [`ExpressionEngine`], everything else is copied to the output.
//!
//! Evaluation errors are rendered in place and counted; the pass goes on
//! until [`MAX_ERRORS`] is reached. Structural errors in conditional blocks
//! abort the pass.
//!
//! All state that must survive a `#pause` or `#input` lives in a
//! [`Session`]. A paused session stays inside the interpreter and the next
//! calculating [`Interpreter::parse`] continues it; it can also be taken out
//! and handed back through [`Interpreter::resume`].

mod condition;
mod keywords;
mod loops;
mod tokens;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use calcsheet_math::{Complex, Value};

use crate::directives::{DirectiveState, OutputMode};
use crate::engine::render::escape_html;
use crate::engine::{BasicEngine, ExpressionEngine};
use crate::error::{ErrorKind, InterpResult, InterpreterError, Severity};
use crate::settings::Settings;

use condition::{ConditionKeyword, ConditionStack};
use keywords::{Flow, Keyword};
use loops::Loop;
use tokens::{insert_attribute, join_continuations, split_tokens, LineInfo, Token, TokenKind};

pub use loops::MAX_ITERATIONS;

/// Rendered lines after which output is truncated.
pub const MAX_HTML_LINES: usize = 50_000;
/// Evaluation errors after which the pass is aborted.
pub const MAX_ERRORS: usize = 40;

/// Documents shorter than this get no error summary.
const ERROR_SUMMARY_MIN_LINES: usize = 30;
const ERROR_SUMMARY_MAX_ENTRIES: usize = 20;

const PAUSED_HTML: &str = "<p class=\"paused\">Paused. Run again to continue.</p>";
const UNITS_SELECT: &str = "<select id=\"Units\" name=\"Units\">\
<option value=\"m\"> m </option>\
<option value=\"cm\"> cm </option>\
<option value=\"mm\"> mm </option>\
</select>";

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Resumable state of one document evaluation.
#[derive(Debug)]
pub struct Session {
    /// Where the next pass starts; set while paused.
    resume_line: Option<usize>,
    /// Output length to keep when resuming.
    pause_chars: usize,
    output: String,
    line_cache: Vec<LineInfo>,
    condition: ConditionStack,
    loops: Vec<Loop>,
    directives: DirectiveState,
    emit_xml: bool,
}

impl Session {
    fn new(settings: &Settings) -> Self {
        Self {
            resume_line: None,
            pause_chars: 0,
            output: String::new(),
            line_cache: Vec::new(),
            condition: ConditionStack::new(),
            loops: Vec::new(),
            directives: DirectiveState::from_settings(&settings.math),
            emit_xml: true,
        }
    }

    pub const fn is_paused(&self) -> bool {
        self.resume_line.is_some()
    }

    /// 1-based line where processing continues.
    pub fn resume_line(&self) -> Option<usize> {
        self.resume_line.map(|l| l + 1)
    }

    /// Output rendered so far, before `%u` substitution.
    pub fn output(&self) -> &str {
        &self.output
    }
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// Renders calculation-sheet documents to HTML.
pub struct Interpreter {
    engine: Box<dyn ExpressionEngine>,
    pub settings: Settings,
    /// Line ids and the error summary in the output.
    pub debug: bool,
    /// Mark undefined results in the output.
    pub show_warnings: bool,
    /// Errors of the last pass, with 1-based lines.
    pub errors: Vec<InterpreterError>,
    pause_requested: Arc<AtomicBool>,
    session: Option<Session>,
    html: String,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter backed by [`BasicEngine`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_engine(Box::new(BasicEngine::new()))
    }

    #[must_use]
    pub fn with_engine(engine: Box<dyn ExpressionEngine>) -> Self {
        Self {
            engine,
            settings: Settings::default(),
            debug: false,
            show_warnings: true,
            errors: Vec::new(),
            pause_requested: Arc::new(AtomicBool::new(false)),
            session: None,
            html: String::new(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn engine(&self) -> &dyn ExpressionEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn ExpressionEngine {
        self.engine.as_mut()
    }

    /// HTML rendered by the last pass.
    pub fn html_result(&self) -> &str {
        &self.html
    }

    pub fn is_paused(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_paused)
    }

    pub fn cancel(&self) {
        self.engine.cancel();
    }

    /// Flag that cancels the running pass when set from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.engine.cancel_flag()
    }

    /// Pause before the next line that would run.
    pub fn pause(&self) {
        self.pause_requested.store(true, Ordering::Relaxed);
    }

    pub fn pause_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.pause_requested)
    }

    /// Process a document. With `calculate`, a paused session continues;
    /// without it the document is rendered as an input form.
    ///
    /// Returns an error only when the pass was aborted; the output rendered
    /// up to that point is still available from [`Self::html_result`].
    pub fn parse(&mut self, source: &str, calculate: bool, emit_xml: bool) -> InterpResult<()> {
        let resumed = if calculate {
            self.session.take().filter(Session::is_paused)
        } else {
            None
        };
        self.run(source, calculate, emit_xml, resumed)
    }

    /// Detach the paused session, if any.
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    /// Continue a paused session. The session must come from this
    /// interpreter: variable values live in its engine.
    pub fn resume(&mut self, session: Session, source: &str) -> InterpResult<()> {
        let emit_xml = session.emit_xml;
        let resumed = session.is_paused().then_some(session);
        self.run(source, true, emit_xml, resumed)
    }

    fn run(
        &mut self,
        source: &str,
        calculate: bool,
        emit_xml: bool,
        resumed: Option<Session>,
    ) -> InterpResult<()> {
        let (lines, continued) = join_continuations(source);
        let fresh = resumed.is_none();
        let mut state = match resumed {
            Some(mut session) => {
                session.output.truncate(session.pause_chars);
                session
            }
            None => {
                self.engine.reset(&self.settings.math);
                self.engine.set_variable("Units", Value::from(self.settings.units_factor()));
                Session::new(&self.settings)
            }
        };
        state.line_cache.resize_with(lines.len(), LineInfo::default);
        for (info, &c) in state.line_cache.iter_mut().zip(&continued) {
            info.continued = c;
        }
        state.emit_xml = emit_xml;
        state.directives.visible = true;
        let start = state.resume_line.take().unwrap_or(0);
        tracing::debug!(lines = lines.len(), calculate, resumed = !fresh, start, "document pass started");

        self.engine.set_show_warnings(self.show_warnings);
        self.engine.set_input_form(!calculate);
        let mut pass = Pass {
            engine: self.engine.as_mut(),
            settings: &self.settings,
            debug: self.debug,
            pause_requested: &self.pause_requested,
            lines: &lines,
            state,
            calculate,
            current_line: start,
            next_line: start,
            html_lines: 0,
            error_count: 0,
            input_seen: false,
            errors: Vec::new(),
        };
        pass.apply_directives();
        let outcome = pass.execute();
        let calculate = pass.calculate;
        let Pass { state, errors, .. } = pass;

        self.errors = errors;
        self.html = apply_units(&state.output, calculate, &self.settings.units);
        if state.is_paused() {
            self.session = Some(state);
        } else {
            if calculate {
                self.engine.clear_cache();
            }
            self.session = None;
        }
        outcome
    }
}

/// Replace `%u` with the length unit; in input forms it becomes a field
/// and the unit selector is prepended.
fn apply_units(output: &str, calculate: bool, units: &str) -> String {
    if !output.contains("%u") {
        return output.to_owned();
    }
    if calculate {
        output.replace("%u", units)
    } else {
        let field = format!("<span class=\"Units\">{units}</span>");
        format!("{UNITS_SELECT}{}", output.replace("%u", &field))
    }
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// One walk over the document.
struct Pass<'a> {
    engine: &'a mut dyn ExpressionEngine,
    settings: &'a Settings,
    debug: bool,
    pause_requested: &'a AtomicBool,
    lines: &'a [String],
    state: Session,
    calculate: bool,
    current_line: usize,
    next_line: usize,
    html_lines: usize,
    error_count: usize,
    /// `#input` already fixed the resume point of this pass.
    input_seen: bool,
    errors: Vec<InterpreterError>,
}

impl Pass<'_> {
    fn execute(&mut self) -> InterpResult<()> {
        let outcome = match self.process() {
            Ok(true) => {
                if self.calculate || !self.state.is_paused() {
                    self.check_blocks_closed();
                }
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) if e.kind == ErrorKind::Canceled => {
                tracing::debug!(line = self.current_line + 1, "pass canceled");
                Ok(())
            }
            Err(e) => {
                let e = e.with_line(self.current_line + 1).with_severity(Severity::Fatal);
                tracing::warn!(line = self.current_line + 1, error = %e.message, "pass aborted");
                let html = self.err_paragraph(&escape_html(&e.message));
                self.state.output.push_str(&html);
                self.errors.push(e.clone());
                Err(e)
            }
        };
        if self.state.is_paused() {
            self.state.output.push_str(PAUSED_HTML);
        }
        if self.debug && self.lines.len() > ERROR_SUMMARY_MIN_LINES && !self.errors.is_empty() {
            let summary = self.error_summary();
            self.state.output.push_str(&summary);
        }
        outcome
    }

    /// Returns `true` when the end of the document was reached.
    fn process(&mut self) -> InterpResult<bool> {
        let lines = self.lines;
        while self.next_line < lines.len() {
            let line = self.next_line;
            self.current_line = line;
            self.next_line += 1;
            if self.state.line_cache[line].continued {
                continue;
            }
            if self.engine.is_canceled() {
                return Err(InterpreterError::of(ErrorKind::Canceled));
            }
            if self.calculate && self.line_active() && self.pause_requested.swap(false, Ordering::Relaxed) {
                self.pause(true);
                return Ok(false);
            }

            let info = &self.state.line_cache[line];
            if info.keyword == Keyword::None && info.tokens.is_some() {
                if self.line_active() || !self.calculate {
                    let mut tokens = self.state.line_cache[line].tokens.take().unwrap_or_default();
                    self.state.condition.set(None)?;
                    let result = self.parse_line(Keyword::None, &mut tokens);
                    self.state.line_cache[line].tokens = Some(tokens);
                    result?;
                }
                continue;
            }

            let text = lines[line].as_str();
            if text.is_empty() {
                self.blank_line();
                continue;
            }
            let keyword = Keyword::detect(text);
            match self.parse_keyword(text, keyword)? {
                Flow::Next => {}
                Flow::Skip => continue,
                Flow::Stop => return Ok(false),
            }
            if self.parse_condition(text, keyword)? {
                let values_only = self.state.directives.output == OutputMode::Values;
                let mut tokens = match self.state.line_cache[line].tokens.take() {
                    Some(tokens) => tokens,
                    None => {
                        let body = text.get(self.state.condition.keyword_len()..).unwrap_or("");
                        split_tokens(body, values_only)
                    }
                };
                self.engine.clear_input_fields();
                let result = self.parse_line(keyword, &mut tokens);
                let has_input = self.engine.has_input_fields();
                let info = &mut self.state.line_cache[line];
                info.keyword = keyword;
                info.tokens = (!has_input).then_some(tokens);
                result?;
            }
        }
        Ok(true)
    }

    // =======================================================================
    // Line helpers
    // =======================================================================

    fn top_broken(&self) -> bool {
        self.state.loops.last().is_some_and(Loop::is_broken)
    }

    /// The line runs: its condition holds and no enclosing loop is broken.
    fn line_active(&self) -> bool {
        self.state.condition.is_satisfied() && !self.top_broken()
    }

    fn visible(&self) -> bool {
        self.state.directives.visible
    }

    fn html_id(&self) -> String {
        if self.debug && self.state.loops.last().map_or(true, |l| l.iteration == 1) {
            format!(" id=\"line-{}\" class=\"line\"", self.current_line + 1)
        } else {
            String::new()
        }
    }

    fn line_ref(&self) -> String {
        let n = self.current_line + 1;
        format!("[<a href=\"#0\" data-text=\"{n}\">{n}</a>]")
    }

    fn err_paragraph(&self, text: &str) -> String {
        format!("<p class=\"err\"{}>{text}</p>\n", self.html_id())
    }

    fn record(&mut self, error: InterpreterError) {
        tracing::debug!(line = self.current_line + 1, error = %error.message, "error rendered");
        self.errors.push(error.with_line(self.current_line + 1));
    }

    /// Render a keyword-level error in place and keep going.
    fn append_error(&mut self, text: &str, error: InterpreterError) {
        let html = format!(
            "Error in \"{}\" on line {}: {}",
            escape_html(text),
            self.line_ref(),
            escape_html(&error.message)
        );
        let html = self.err_paragraph(&html);
        self.state.output.push_str(&html);
        self.record(error);
    }

    fn apply_directives(&mut self) {
        self.engine.apply_directives(&self.state.directives);
        self.engine
            .set_calculation(self.state.directives.output != OutputMode::NoCalc);
    }

    fn blank_line(&mut self) {
        if self.visible()
            && self.state.directives.output != OutputMode::Values
            && (self.state.condition.is_satisfied() || !self.calculate)
            && self.html_lines < MAX_HTML_LINES
        {
            let html = format!("<p{}>&nbsp;</p>\n", self.html_id());
            self.state.output.push_str(&html);
        }
    }

    fn check_blocks_closed(&mut self) {
        if self.state.condition.id() > 0 && !self.state.condition.is_loop() {
            let e = InterpreterError::of(ErrorKind::IfNotClosed);
            let html = self.err_paragraph(&e.message);
            self.state.output.push_str(&html);
            self.record(e);
        }
        if !self.state.loops.is_empty() {
            let e = InterpreterError::of(ErrorKind::LoopNotClosed);
            let html = self.err_paragraph(&e.message);
            self.state.output.push_str(&html);
            self.record(e);
        }
    }

    fn error_summary(&self) -> String {
        let mut lines: Vec<usize> = self.errors.iter().filter_map(|e| e.line).collect();
        lines.dedup();
        let mut html = String::from("<div class=\"errorHeader\">");
        if lines.len() == 1 {
            html.push_str("Error found on line");
        } else {
            html.push_str(&format!("Errors found on {} lines:", lines.len()));
        }
        for n in lines.iter().take(ERROR_SUMMARY_MAX_ENTRIES) {
            html.push_str(&format!(" <span class=\"roundBox\" data-line=\"{n}\">{n}</span>"));
        }
        if lines.len() > ERROR_SUMMARY_MAX_ENTRIES {
            html.push_str(" ...");
        }
        html.push_str("</div>\n");
        html
    }

    // =======================================================================
    // Conditions, lines and tokens
    // =======================================================================

    /// Apply the line's condition keyword; `true` when the line should be
    /// rendered and evaluated.
    fn parse_condition(&mut self, text: &str, keyword: Keyword) -> InterpResult<bool> {
        if self.state.is_paused() && !self.calculate {
            self.state.condition.set(None)?;
            return Ok(keyword == Keyword::None);
        }
        self.state.condition.set(keyword.condition())?;
        if self.line_active() || !self.calculate {
            let kw_len = self.state.condition.keyword_len();
            let rest = text.get(kw_len..).unwrap_or("");
            if rest.trim().is_empty() {
                if self.state.condition.is_unchecked() {
                    return Err(InterpreterError::of(ErrorKind::ConditionEmpty));
                }
                if self.visible() && !self.calculate {
                    let html = format!("</div><p{}>{}</p>", self.html_id(), self.state.condition.to_html());
                    self.state.output.push_str(&html);
                    if self.state.condition.keyword() == Some(ConditionKeyword::Else) {
                        self.state.output.push_str("<div class=\"indent\">");
                    }
                    self.state.output.push('\n');
                }
            } else if kw_len > 0
                && self.state.condition.is_found()
                && self.state.condition.is_unchecked()
                && self.calculate
            {
                // An earlier branch fired; this `#else if` is false.
                self.state.condition.check(Complex::ZERO)?;
            } else {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn parse_line(&mut self, keyword: Keyword, tokens: &mut [Token]) -> InterpResult<()> {
        let kw_len = self.state.condition.keyword_len();
        let is_output =
            self.visible() && (!self.calculate || kw_len == 0) && self.html_lines < MAX_HTML_LINES;
        if is_output {
            self.html_lines += 1;
            if self.html_lines == MAX_HTML_LINES {
                tracing::warn!(line = self.current_line + 1, "output truncated");
                let text: String = tokens.iter().map(|t| t.value.as_str()).collect();
                self.append_error(&text, InterpreterError::of(ErrorKind::OutputTooLong));
            } else {
                let values_only = self.state.directives.output == OutputMode::Values;
                let kind = tokens.first().map_or(TokenKind::Text, |t| t.kind);
                let indent = matches!(keyword, Keyword::ElseIf | Keyword::EndIf);
                let id = self.html_id();
                if !values_only {
                    if indent {
                        self.state.output.push_str("</div>");
                    }
                    match kind {
                        TokenKind::Heading => self.state.output.push_str(&format!("<h3{id}>")),
                        TokenKind::Html => {}
                        _ => self.state.output.push_str(&format!("<p{id}>")),
                    }
                }
                if kw_len > 0 {
                    let cond = self.state.condition.to_html();
                    self.state.output.push_str(&cond);
                }
                let attribute = (kind == TokenKind::Html && !values_only && !id.is_empty()).then_some(id);
                self.parse_tokens(tokens, true, attribute.as_deref())?;
                if !values_only {
                    match kind {
                        TokenKind::Heading => self.state.output.push_str("</h3>"),
                        TokenKind::Html => {}
                        _ => self.state.output.push_str("</p>"),
                    }
                    if matches!(keyword, Keyword::If | Keyword::ElseIf) {
                        self.state.output.push_str("<div class=\"indent\">");
                    }
                    self.state.output.push('\n');
                }
            }
        } else {
            self.parse_tokens(tokens, false, None)?;
        }
        if self.state.condition.is_unchecked() {
            if self.calculate {
                let result = self.engine.result();
                self.state.condition.check(result)?;
            } else {
                self.state.condition.mark_checked();
            }
        }
        Ok(())
    }

    /// Evaluate expression tokens and copy the rest. `attribute` goes into
    /// the first tag of a leading markup token.
    fn parse_tokens(&mut self, tokens: &mut [Token], is_output: bool, attribute: Option<&str>) -> InterpResult<()> {
        let in_loop = !self.state.loops.is_empty()
            && self.calculate
            && self.state.directives.output != OutputMode::NoCalc;
        for (i, token) in tokens.iter_mut().enumerate() {
            if token.kind != TokenKind::Expression {
                if is_output {
                    match attribute {
                        Some(attr) if i == 0 && token.kind == TokenKind::Html => {
                            let html = insert_attribute(&token.value, attr);
                            self.state.output.push_str(&html);
                        }
                        _ => self.state.output.push_str(&token.value),
                    }
                }
                continue;
            }
            match self.eval_token(token, is_output, in_loop) {
                Ok(()) => {}
                Err(e) if e.kind == ErrorKind::Canceled => return Err(e),
                Err(e) => {
                    self.engine.reset_stack();
                    let value = token.value.trim();
                    let shown = if !self.calculate && value.contains('?') {
                        escape_html(value).replace('?', "<input type=\"text\" size=\"2\" name=\"Var\">")
                    } else {
                        escape_html(value)
                    };
                    let html = format!(
                        "<span class=\"err\"{}>Error in \"{shown}\" on line {}: {}</span>",
                        self.html_id(),
                        self.line_ref(),
                        escape_html(&e.message)
                    );
                    self.state.output.push_str(&html);
                    self.record(e);
                    self.error_count += 1;
                    if self.error_count == MAX_ERRORS {
                        tracing::warn!(errors = self.error_count, "error limit reached");
                        return Err(InterpreterError::of(ErrorKind::TooManyErrors));
                    }
                }
            }
        }
        Ok(())
    }

    fn eval_token(&mut self, token: &mut Token, is_output: bool, in_loop: bool) -> InterpResult<()> {
        match token.cache_id {
            Some(id) => self.engine.read_equation_from_cache(id)?,
            None => {
                self.engine.parse(token.value.trim())?;
                if in_loop {
                    token.cache_id = self.engine.write_equation_to_cache(is_output);
                }
            }
        }
        if self.calculate && self.state.directives.output != OutputMode::NoCalc {
            self.engine.calculate(is_output)?;
        } else {
            self.engine.define_custom_units()?;
        }
        if is_output {
            let html = if self.state.directives.output == OutputMode::Values && self.calculate {
                self.engine.result_as_val()
            } else {
                let equation = self.engine.to_html();
                if self.state.emit_xml && self.settings.math.format_equations {
                    let xml = self.engine.to_xml().replace('\'', "&apos;");
                    format!("<span class=\"eq\" data-xml='{xml}'>{equation}</span>")
                } else {
                    format!("<span class=\"eq\">{equation}</span>")
                }
            };
            self.state.output.push_str(&html);
        }
        Ok(())
    }

    /// Evaluate a keyword argument to a number.
    fn evaluate(&mut self, expression: &str) -> InterpResult<Complex> {
        self.engine.parse(expression)?;
        self.engine.calculate(false)?;
        Ok(self.engine.result())
    }

    fn evaluate_value(&mut self, expression: &str) -> InterpResult<Value> {
        self.engine.parse(expression)?;
        self.engine.calculate(false)?;
        self.engine
            .result_value()
            .cloned()
            .ok_or_else(|| InterpreterError::new(ErrorKind::Math, format!("\"{expression}\" has no value")))
    }

    /// Render an equation without calculating it.
    fn equation_html(&mut self, expression: &str) -> InterpResult<String> {
        self.engine.parse(expression)?;
        Ok(self.engine.to_html())
    }
}
