//! Keyword detection and the keyword handlers.
//!
//! | Keyword                              | Effect                              |
//! |--------------------------------------|-------------------------------------|
//! | `#hide` `#show` `#pre` `#post`       | visibility of the following lines   |
//! | `#val` `#equ` `#noc`                 | output mode                         |
//! | `#varsub` `#nosub` `#novar`          | substitution mode                   |
//! | `#split` `#wrap`                     | line break after the variable part  |
//! | `#deg` `#rad` `#gra`                 | angle units                         |
//! | `#round` `#format`                   | number formatting                   |
//! | `#phasor` `#complex`                 | complex number display              |
//! | `#if` `#else if` `#else` `#end if`   | conditional blocks                  |
//! | `#repeat` `#for` `#while` `#loop`    | loops                               |
//! | `#break` `#continue`                 | loop control                        |
//! | `#pause` `#input`                    | suspend the pass                    |
//! | `#local` `#global`                   | accepted, no effect                 |

use calcsheet_math::math::AngleMode;
use calcsheet_math::{Operator, Value};

use super::condition::{ConditionKeyword, ConditionStack};
use super::loops::{Loop, LoopKind};
use super::tokens::split_tokens;
use super::Pass;
use crate::directives::{NumberFormat, OutputMode, Substitution};
use crate::error::{ErrorKind, InterpResult, InterpreterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Keyword {
    #[default]
    None,
    Hide,
    Show,
    Pre,
    Post,
    Val,
    Equ,
    Noc,
    VarSub,
    NoSub,
    NoVar,
    Split,
    Wrap,
    Deg,
    Rad,
    Gra,
    Round,
    Format,
    If,
    ElseIf,
    Else,
    EndIf,
    While,
    For,
    Repeat,
    Loop,
    Break,
    Continue,
    Local,
    Global,
    Pause,
    Input,
    Phasor,
    Complex,
}

/// Keyword spellings in match order: `else if` before `else`, `format`
/// before `for`.
const SPELLINGS: [(&str, Keyword); 33] = [
    ("hide", Keyword::Hide),
    ("show", Keyword::Show),
    ("pre", Keyword::Pre),
    ("post", Keyword::Post),
    ("val", Keyword::Val),
    ("equ", Keyword::Equ),
    ("noc", Keyword::Noc),
    ("varsub", Keyword::VarSub),
    ("nosub", Keyword::NoSub),
    ("novar", Keyword::NoVar),
    ("split", Keyword::Split),
    ("wrap", Keyword::Wrap),
    ("deg", Keyword::Deg),
    ("rad", Keyword::Rad),
    ("gra", Keyword::Gra),
    ("round", Keyword::Round),
    ("format", Keyword::Format),
    ("if", Keyword::If),
    ("else if", Keyword::ElseIf),
    ("else", Keyword::Else),
    ("end if", Keyword::EndIf),
    ("while", Keyword::While),
    ("for", Keyword::For),
    ("repeat", Keyword::Repeat),
    ("loop", Keyword::Loop),
    ("break", Keyword::Break),
    ("continue", Keyword::Continue),
    ("local", Keyword::Local),
    ("global", Keyword::Global),
    ("pause", Keyword::Pause),
    ("input", Keyword::Input),
    ("phasor", Keyword::Phasor),
    ("complex", Keyword::Complex),
];

impl Keyword {
    /// Case-insensitive prefix match after `#`.
    pub fn detect(line: &str) -> Self {
        let Some(rest) = line.strip_prefix('#') else {
            return Self::None;
        };
        let lower = rest.to_lowercase();
        SPELLINGS
            .iter()
            .find(|(spelling, _)| lower.starts_with(spelling))
            .map_or(Self::None, |&(_, keyword)| keyword)
    }

    pub const fn condition(self) -> Option<ConditionKeyword> {
        match self {
            Self::If => Some(ConditionKeyword::If),
            Self::ElseIf => Some(ConditionKeyword::ElseIf),
            Self::Else => Some(ConditionKeyword::Else),
            Self::EndIf => Some(ConditionKeyword::EndIf),
            _ => None,
        }
    }
}

/// What the main loop does after a keyword was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Not fully handled: go on with condition and token processing.
    Next,
    /// Line done.
    Skip,
    /// End the pass.
    Stop,
}

/// Text after a keyword prefix.
fn argument<'t>(text: &'t str, keyword: &str) -> &'t str {
    text.get(keyword.len()..).unwrap_or("").trim()
}

/// Split `#for` limits `var = start : end` at the top nesting level.
fn for_loop_limits(s: &str) -> Option<(&str, &str, &str)> {
    let mut depth = 0_i32;
    let mut eq = None;
    let mut colon = None;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            '=' if depth == 0 && eq.is_none() => eq = Some(i),
            ':' if depth == 0 && eq.is_some() => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }
    let (eq, colon) = (eq?, colon?);
    let var = s[..eq].trim();
    let start = s[eq + 1..colon].trim();
    let end = s[colon + 1..].trim();
    let valid_name = var.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && var.chars().all(|c| c.is_alphanumeric() || c == '_');
    (valid_name && !start.is_empty() && !end.is_empty()).then_some((var, start, end))
}

/// Guard and trailing comment of a `#while` line.
fn split_comment(s: &str) -> (&str, Option<&str>) {
    match s.find(['\'', '"']) {
        Some(i) => (s[..i].trim(), Some(&s[i..])),
        None => (s, None),
    }
}

impl Pass<'_> {
    pub(super) fn parse_keyword(&mut self, text: &str, keyword: Keyword) -> InterpResult<Flow> {
        match keyword {
            Keyword::None | Keyword::If | Keyword::ElseIf | Keyword::Else | Keyword::EndIf => Ok(Flow::Next),
            Keyword::Local | Keyword::Global => Ok(Flow::Skip),
            Keyword::Input => Ok(self.parse_input()),
            Keyword::Pause => Ok(self.pause(false)),
            Keyword::Repeat => {
                self.parse_repeat(text);
                Ok(Flow::Skip)
            }
            Keyword::For => {
                self.parse_for(text)?;
                Ok(Flow::Skip)
            }
            Keyword::While => {
                self.parse_while(text)?;
                Ok(Flow::Skip)
            }
            Keyword::Loop => {
                self.parse_loop(text)?;
                Ok(Flow::Skip)
            }
            Keyword::Break => Ok(self.parse_break()),
            Keyword::Continue => {
                self.parse_continue(text)?;
                Ok(Flow::Skip)
            }
            _ => {
                // Directives in skipped branches do not apply.
                if self.line_active() || !self.calculate {
                    self.set_directive(text, keyword);
                }
                Ok(Flow::Skip)
            }
        }
    }

    // =======================================================================
    // Directives
    // =======================================================================

    fn set_directive(&mut self, text: &str, keyword: Keyword) {
        let calculate = self.calculate;
        match keyword {
            Keyword::Round => self.parse_round(text),
            Keyword::Format => self.parse_format(text),
            _ => {
                let d = &mut self.state.directives;
                match keyword {
                    Keyword::Hide => d.visible = false,
                    Keyword::Show => d.visible = true,
                    Keyword::Pre => d.visible = !calculate,
                    Keyword::Post => d.visible = calculate,
                    Keyword::Val => d.output = OutputMode::Values,
                    Keyword::Equ => d.output = OutputMode::Equations,
                    Keyword::Noc => d.output = OutputMode::NoCalc,
                    Keyword::VarSub => d.substitution = Substitution::VariablesAndSubstitutions,
                    Keyword::NoSub => d.substitution = Substitution::VariablesOnly,
                    Keyword::NoVar => d.substitution = Substitution::SubstitutionsOnly,
                    Keyword::Split => d.split = true,
                    Keyword::Wrap => d.split = false,
                    Keyword::Deg => d.angles = AngleMode::Deg,
                    Keyword::Rad => d.angles = AngleMode::Rad,
                    Keyword::Gra => d.angles = AngleMode::Gra,
                    Keyword::Phasor => d.phasor = true,
                    Keyword::Complex => d.phasor = false,
                    _ => {}
                }
            }
        }
        self.apply_directives();
    }

    /// `#round n`, `#round default` or `#round <expression>`.
    fn parse_round(&mut self, text: &str) {
        let arg = argument(text, "#round");
        if arg.is_empty() || arg.eq_ignore_ascii_case("default") {
            self.state.directives.decimals = self.settings.math.decimals;
        } else if let Ok(n) = arg.parse::<i64>() {
            self.state.directives.set_decimals(n);
        } else {
            match self.evaluate(arg) {
                Ok(c) => self.state.directives.set_decimals(c.re.round() as i64),
                Err(e) => self.append_error(text, e),
            }
        }
    }

    /// `#format F3`, `#format default`.
    fn parse_format(&mut self, text: &str) {
        let arg = argument(text, "#format");
        if arg.is_empty() || arg.eq_ignore_ascii_case("default") {
            self.state.directives.format = None;
        } else if let Some(format) = NumberFormat::parse(arg) {
            self.state.directives.format = Some(format);
        } else {
            let e = InterpreterError::new(ErrorKind::InvalidFormat, format!("invalid format string \"{arg}\""));
            self.append_error(text, e);
        }
    }

    // =======================================================================
    // Suspension
    // =======================================================================

    /// `#input`: calculate up to here, then render the rest as an input form.
    fn parse_input(&mut self) -> Flow {
        if self.state.condition.is_satisfied() {
            self.input_seen = true;
            if self.calculate {
                self.state.resume_line = Some(self.current_line + 1);
                self.state.pause_chars = self.state.output.len();
                self.calculate = false;
                self.engine.set_input_form(true);
                tracing::debug!(line = self.current_line + 1, "waiting for input");
                return Flow::Skip;
            }
            return Flow::Stop;
        }
        if self.calculate {
            Flow::Skip
        } else {
            Flow::Stop
        }
    }

    /// `#pause`, or a pause requested by the host (`by_user`), which re-runs
    /// the current line on resume.
    pub(super) fn pause(&mut self, by_user: bool) -> Flow {
        if self.line_active() && (self.calculate || self.state.is_paused()) {
            if self.calculate {
                let line = if by_user { self.current_line } else { self.current_line + 1 };
                self.state.resume_line = Some(line);
            }
            if !self.input_seen {
                self.state.pause_chars = self.state.output.len();
            }
            tracing::debug!(line = self.current_line + 1, by_user, "paused");
            return Flow::Stop;
        }
        if self.visible() && !self.calculate {
            let html = format!("<p{} class=\"cond\">#pause</p>\n", self.html_id());
            self.state.output.push_str(&html);
        }
        Flow::Skip
    }

    // =======================================================================
    // Loops
    // =======================================================================

    fn push_loop(&mut self, lp: Loop) {
        tracing::debug!(line = lp.start_line + 1, iterations = lp.iteration, "loop opened");
        self.state.loops.push(lp);
    }

    fn pop_loop(&mut self) {
        if let Some(lp) = self.state.loops.pop() {
            tracing::debug!(line = lp.start_line + 1, "loop closed");
        }
    }

    /// Loops opened inside a broken loop never run; they are only tracked
    /// so that their `#loop` pairs up. Returns `true` when one was pushed.
    fn push_if_broken(&mut self) -> bool {
        if self.top_broken() {
            let lp = Loop::broken(self.current_line, self.state.condition.id());
            self.push_loop(lp);
            return true;
        }
        false
    }

    fn indent_open(&mut self, body: &str) {
        let html = format!("<p{}>{body}</p><div class=\"indent\">\n", self.html_id());
        self.state.output.push_str(&html);
    }

    /// `#repeat [count]`
    fn parse_repeat(&mut self, text: &str) {
        let arg = argument(text, "#repeat");
        if self.calculate {
            if !self.state.condition.is_satisfied() || self.push_if_broken() {
                return;
            }
            let count = if arg.is_empty() {
                None
            } else {
                match self.evaluate(arg) {
                    Ok(c) => Some(c.re.round()),
                    Err(e) => {
                        self.append_error(text, e);
                        Some(0.0)
                    }
                }
            };
            let lp = Loop::new(LoopKind::Repeat, self.current_line, count, self.state.condition.id());
            self.push_loop(lp);
        } else if self.visible() {
            if arg.is_empty() {
                let html = format!("<p{} class=\"cond\">#repeat</p><div class=\"indent\">\n", self.html_id());
                self.state.output.push_str(&html);
                return;
            }
            match self.equation_html(arg) {
                Ok(eq) => self.indent_open(&format!(
                    "<span class=\"cond\">#repeat</span> <span class=\"eq\">{eq}</span>"
                )),
                Err(e) => {
                    self.append_error(text, e);
                    self.indent_open("<span class=\"cond\">#repeat</span>");
                }
            }
        }
    }

    /// `#for var = start : end`
    fn parse_for(&mut self, text: &str) -> InterpResult<()> {
        let arg = argument(text, "#for");
        if arg.is_empty() {
            return Err(InterpreterError::of(ErrorKind::ExpressionEmpty));
        }
        let Some((var, start, end)) = for_loop_limits(arg) else {
            let e = InterpreterError::new(ErrorKind::Syntax, "expected \"#for variable = start : end\"");
            self.append_error(text, e);
            return Ok(());
        };
        if self.calculate {
            if !self.state.condition.is_satisfied() || self.push_if_broken() {
                return Ok(());
            }
            match self.counting_loop(var, start, end) {
                Ok((lp, first)) => {
                    self.engine.set_variable(var, first);
                    self.push_loop(lp);
                }
                Err(e) => self.append_error(text, e),
            }
        } else if self.visible() {
            let limits = self
                .equation_html(start)
                .and_then(|s| Ok((s, self.equation_html(end)?)));
            match limits {
                Ok((s, e)) => self.indent_open(&format!(
                    "<span class=\"cond\">#for</span> <span class=\"eq\"><var>{var}</var> = {s} : {e}</span>"
                )),
                Err(e) => {
                    self.append_error(text, e);
                    self.indent_open("<span class=\"cond\">#for</span>");
                }
            }
        }
        Ok(())
    }

    fn counting_loop(&mut self, var: &str, start: &str, end: &str) -> InterpResult<(Loop, Value)> {
        let first = Value::from(self.evaluate_value(start)?.as_scalar()?);
        let last = Value::from(self.evaluate_value(end)?.as_scalar()?);
        let first = if last.number().is_real() {
            first
        } else {
            Value::Complex(first.as_scalar()?.to_complex())
        };
        let delta = Value::binary(Operator::Sub, &first, &last)?.negate()?;
        let lp = Loop::counting(var.to_owned(), &first, &delta, self.current_line, self.state.condition.id());
        Ok((lp, first))
    }

    /// `#while guard ['comment]`
    fn parse_while(&mut self, text: &str) -> InterpResult<()> {
        let arg = argument(text, "#while");
        if arg.is_empty() {
            return Err(InterpreterError::of(ErrorKind::ExpressionEmpty));
        }
        if self.calculate {
            if !self.state.condition.is_satisfied() {
                self.state.condition.set(Some(ConditionKeyword::While))?;
                return Ok(());
            }
            if self.push_if_broken() {
                return Ok(());
            }
            let (guard, comment) = split_comment(arg);
            match self.evaluate(guard) {
                Ok(value) => {
                    self.state.condition.set(Some(ConditionKeyword::While))?;
                    self.state.condition.check(value)?;
                    if self.state.condition.is_satisfied() {
                        let kind = LoopKind::While {
                            guard: guard.to_owned(),
                            comment: comment.map(str::to_owned),
                            owns_level: true,
                        };
                        let lp = Loop::new(kind, self.current_line, None, self.state.condition.id());
                        self.push_loop(lp);
                        self.render_comment(comment)?;
                    }
                }
                Err(e) => self.append_error(text, e),
            }
        } else if self.visible() {
            let html = format!("<p{}><span class=\"cond\">#while</span> ", self.html_id());
            self.state.output.push_str(&html);
            let mut tokens = split_tokens(arg, false);
            self.parse_tokens(&mut tokens, true, None)?;
            self.state.output.push_str("</p><div class=\"indent\">\n");
        }
        Ok(())
    }

    /// Show the comment of a `#while` line for the current iteration.
    fn render_comment(&mut self, comment: Option<&str>) -> InterpResult<()> {
        let Some(comment) = comment else {
            return Ok(());
        };
        let mut tokens = split_tokens(comment, false);
        if self.visible() && self.html_lines < super::MAX_HTML_LINES {
            self.html_lines += 1;
            let html = format!("<p{}>", self.html_id());
            self.state.output.push_str(&html);
            self.parse_tokens(&mut tokens, true, None)?;
            self.state.output.push_str("</p>\n");
        } else {
            self.parse_tokens(&mut tokens, false, None)?;
        }
        Ok(())
    }

    /// `#loop`
    fn parse_loop(&mut self, text: &str) -> InterpResult<()> {
        if self.calculate {
            let id = self.state.condition.id();
            if self.state.condition.is_satisfied() {
                match self.state.loops.last() {
                    None => self.append_error(text, InterpreterError::of(ErrorKind::LoopWithoutRepeat)),
                    Some(lp) if lp.id != id => {
                        self.append_error(text, InterpreterError::of(ErrorKind::EntangledBlocks));
                    }
                    Some(_) => {
                        if !self.advance(true)? {
                            self.pop_loop();
                        }
                    }
                }
            } else if self.state.condition.is_loop() {
                self.state.condition.remove();
            }
        } else if self.visible() {
            let html = format!("</div><p{} class=\"cond\">#loop</p>\n", self.html_id());
            self.state.output.push_str(&html);
        }
        Ok(())
    }

    /// `#break`: ends the innermost loop, or the document outside loops.
    fn parse_break(&mut self) -> Flow {
        if self.calculate {
            if self.line_active() {
                match self.state.loops.last_mut() {
                    Some(lp) => lp.break_loop(),
                    None => return Flow::Stop,
                }
            }
        } else if self.visible() {
            let html = format!("<p{} class=\"cond\">#break</p>\n", self.html_id());
            self.state.output.push_str(&html);
        }
        Flow::Skip
    }

    /// `#continue`: starts the next iteration from mid-body.
    fn parse_continue(&mut self, text: &str) -> InterpResult<()> {
        if self.calculate {
            if !self.line_active() {
                return Ok(());
            }
            match self.state.loops.last() {
                None => self.append_error(text, InterpreterError::of(ErrorKind::ContinueWithoutRepeat)),
                Some(lp) if lp.id > self.state.condition.id() => {
                    self.append_error(text, InterpreterError::of(ErrorKind::EntangledBlocks));
                }
                Some(_) => {
                    if !self.advance(false)? {
                        if let Some(lp) = self.state.loops.last_mut() {
                            lp.break_loop();
                        }
                    }
                }
            }
        } else if self.visible() {
            let html = format!("<p{} class=\"cond\">#continue</p>\n", self.html_id());
            self.state.output.push_str(&html);
        }
        Ok(())
    }

    /// Move the innermost loop to its next iteration. `closing` is `true`
    /// at `#loop` and `false` at `#continue`. On `true` the line pointer
    /// was rewound to the loop body.
    fn advance(&mut self, closing: bool) -> InterpResult<bool> {
        let Some(lp) = self.state.loops.last_mut() else {
            return Ok(false);
        };
        if lp.is_broken() {
            if closing && matches!(lp.kind, LoopKind::While { owns_level: true, .. }) {
                self.state.condition.remove();
            }
            return Ok(false);
        }
        if matches!(lp.kind, LoopKind::For { .. }) {
            if let Some((name, value)) = lp.increment() {
                self.engine.set_variable(&name, value);
            }
        }
        let mut comment = None;
        if let LoopKind::While { guard, comment: c, .. } = &lp.kind {
            let (guard, c) = (guard.clone(), c.clone());
            let value = self.evaluate(&guard)?;
            let holds = if closing {
                self.state.condition.check(value)?;
                self.state.condition.is_satisfied()
            } else {
                ConditionStack::truth(value)?
            };
            if !holds {
                if closing {
                    self.state.condition.remove();
                }
                if let Some(lp) = self.state.loops.last_mut() {
                    lp.kind = LoopKind::While {
                        guard,
                        comment: c,
                        owns_level: !closing,
                    };
                    lp.break_loop();
                }
                return Ok(false);
            }
            comment = c;
        }
        let Some(lp) = self.state.loops.last_mut() else {
            return Ok(false);
        };
        let loop_id = lp.id;
        let Some(line) = lp.iterate() else {
            if closing && matches!(lp.kind, LoopKind::While { owns_level: true, .. }) {
                self.state.condition.remove();
            }
            return Ok(false);
        };
        if !closing {
            // Close the blocks opened inside the body.
            while self.state.condition.id() > loop_id {
                self.state.condition.remove();
            }
        }
        self.next_line = line;
        self.engine.reset_stack();
        self.render_comment(comment.as_deref())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_detection() {
        assert_eq!(Keyword::detect("#if a > 1"), Keyword::If);
        assert_eq!(Keyword::detect("#Else If b"), Keyword::ElseIf);
        assert_eq!(Keyword::detect("#else"), Keyword::Else);
        assert_eq!(Keyword::detect("#END IF"), Keyword::EndIf);
        assert_eq!(Keyword::detect("#format F2"), Keyword::Format);
        assert_eq!(Keyword::detect("#for i = 1 : 3"), Keyword::For);
        assert_eq!(Keyword::detect("#md on"), Keyword::None);
        assert_eq!(Keyword::detect("a = 1"), Keyword::None);
    }

    #[test]
    fn for_limits() {
        assert_eq!(for_loop_limits("i = 1 : n"), Some(("i", "1", "n")));
        assert_eq!(for_loop_limits("k = f(a; b) : [1; 2]*c"), Some(("k", "f(a; b)", "[1; 2]*c")));
        assert_eq!(for_loop_limits("i = 1"), None);
        assert_eq!(for_loop_limits("2x = 1 : 3"), None);
    }

    #[test]
    fn while_comments() {
        assert_eq!(split_comment("i < 3 'step'"), ("i < 3", Some("'step'")));
        assert_eq!(split_comment("i < 3"), ("i < 3", None));
    }
}
