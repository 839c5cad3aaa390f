use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::variables::Variables;
use calcsheet_math::UnitRef;

fn run(source: &str) -> Interpreter {
    let mut interp = Interpreter::new();
    interp.parse(source, true, false).unwrap();
    interp
}

fn var(interp: &Interpreter, name: &str) -> f64 {
    interp
        .engine()
        .get_variable(name)
        .unwrap_or_else(|| panic!("{name} is not defined"))
        .number()
        .re
}

fn has_error(interp: &Interpreter, kind: ErrorKind) -> bool {
    interp.errors.iter().any(|e| e.kind == kind)
}

#[test]
fn assignment_lines() {
    let interp = run("a = 2\nb = a + 3");
    assert_eq!(var(&interp, "b"), 5.0);
    let html = interp.html_result();
    assert!(html.contains("<var>b</var> = <var>a</var> + 3 = 2 + 3 = 5"), "expected equation in: {html}");
    assert!(interp.errors.is_empty());
}

#[test]
fn headings_and_comments() {
    let html = run("\"Beam\n'span is 'l = 4' m").html_result().to_owned();
    assert!(html.contains("<h3>Beam </h3>"), "expected heading in: {html}");
    assert!(html.contains("span is "), "expected comment in: {html}");
    assert!(html.contains("<span class=\"eq\"><var>l</var> = 4</span>"), "expected equation in: {html}");
}

#[test]
fn blank_lines_render_spacers() {
    let html = run("a = 1\n\nb = 2").html_result().to_owned();
    assert!(html.contains("<p>&nbsp;</p>"), "expected spacer in: {html}");
}

#[test]
fn continued_lines_are_joined() {
    let interp = run("a = 1 + _\n2 + _\n3");
    assert_eq!(var(&interp, "a"), 6.0);
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

#[test]
fn if_else_takes_one_branch() {
    let src = "#if a > 0\nb = 1\n#else\nb = 2\n#end if";
    let interp = run(&format!("a = 1\n{src}"));
    assert_eq!(var(&interp, "b"), 1.0);
    let interp = run(&format!("a = -1\n{src}"));
    assert_eq!(var(&interp, "b"), 2.0);
}

#[test]
fn else_if_chain_fires_once() {
    let src = "a = 5\n#if a < 0\nb = 1\n#else if a > 2\nb = 2\n#else if a > 1\nb = 3\n#else\nb = 4\n#end if";
    let interp = run(src);
    assert_eq!(var(&interp, "b"), 2.0);
}

#[test]
fn nested_conditions() {
    let src = "a = 1\n#if a\n#if a - 1\nb = 1\n#else\nb = 2\n#end if\n#end if\nc = 3";
    let interp = run(src);
    assert_eq!(var(&interp, "b"), 2.0);
    assert_eq!(var(&interp, "c"), 3.0);
}

#[test]
fn structural_condition_errors_abort() {
    let mut interp = Interpreter::new();
    let err = interp.parse("#if 1\na = 1\n#else\n#else\n#end if", true, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateElse);
    assert_eq!(err.line, Some(4));
    assert!(interp.html_result().contains("class=\"err\""));

    let err = interp.parse("#end if", true, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConditionNotInitialized);

    let err = interp.parse("#if\n#end if", true, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConditionEmpty);
}

#[test]
fn complex_condition_is_rejected() {
    let mut interp = Interpreter::new();
    interp.settings.math.complex = true;
    let err = interp.parse("#if 1 + 1i\n#end if", true, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConditionComplex);
}

#[test]
fn unclosed_blocks_are_reported() {
    let interp = run("#if 1\na = 1");
    assert!(has_error(&interp, ErrorKind::IfNotClosed));
    let interp = run("#repeat 2\na = 1");
    assert!(has_error(&interp, ErrorKind::LoopNotClosed));
}

#[test]
fn directives_in_skipped_branches_are_ignored() {
    let html = run("#if 0\n#hide\n#end if\nb = 1").html_result().to_owned();
    assert!(html.contains("<var>b</var>"), "expected b in: {html}");
}

// ---------------------------------------------------------------------------
// Loops
// ---------------------------------------------------------------------------

#[test]
fn repeat_runs_count_times() {
    let interp = run("n = 0\n#repeat 3\nn = n + 1\n#loop");
    assert_eq!(var(&interp, "n"), 3.0);
}

#[test]
fn repeat_with_negative_count_skips_body() {
    let interp = run("n = 0\n#repeat -1\nn = n + 1\n#loop\nm = 1");
    assert_eq!(var(&interp, "n"), 0.0);
    assert_eq!(var(&interp, "m"), 1.0);
    assert!(interp.errors.is_empty());
}

#[test]
fn for_loop_counts_up_and_down() {
    let interp = run("s = 0\n#for i = 1 : 3\ns = s + i\n#loop");
    assert_eq!(var(&interp, "s"), 6.0);
    assert_eq!(var(&interp, "i"), 3.0);

    let interp = run("s = 0\n#for k = 3 : 1\ns = 10*s + k\n#loop");
    assert_eq!(var(&interp, "s"), 321.0);
}

#[test]
fn for_loop_body_sees_each_value_in_order() {
    let html = run("#for i = 1 : 3\ni\n#loop").html_result().to_owned();
    let one = html.find("<var>i</var> = 1").expect("first iteration");
    let two = html.find("<var>i</var> = 2").expect("second iteration");
    let three = html.find("<var>i</var> = 3").expect("third iteration");
    assert!(one < two && two < three, "in: {html}");
    assert!(!html.contains("<var>i</var> = 4"), "in: {html}");
}

#[test]
fn loops_stop_at_the_iteration_cap() {
    let interp = run("#hide\nn = 0\n#repeat 2000000\nn = n + 1\n#loop");
    assert_eq!(var(&interp, "n"), 1_000_000.0);

    let interp = run("#hide\nn = 0\n#for i = 1 : 2000000\nn = n + 1\n#loop");
    assert_eq!(var(&interp, "n"), 1_000_000.0);

    let interp = run("#hide\nn = 0\n#while 1\nn = n + 1\n#loop");
    assert_eq!(var(&interp, "n"), 1_000_000.0);
}

#[test]
fn for_loop_syntax_error() {
    let interp = run("#for 1 = 2\n#loop");
    assert!(has_error(&interp, ErrorKind::Syntax));
}

#[test]
fn while_loop_runs_until_false() {
    let interp = run("i = 0\n#while i < 5\ni = i + 1\n#loop\nj = i");
    assert_eq!(var(&interp, "j"), 5.0);
    assert!(interp.errors.is_empty());
}

#[test]
fn while_loop_false_at_start() {
    let interp = run("i = 7\n#while i < 5\ni = i + 1\n#loop\nj = 1");
    assert_eq!(var(&interp, "i"), 7.0);
    assert_eq!(var(&interp, "j"), 1.0);
    assert!(interp.errors.is_empty());
}

#[test]
fn nested_while_under_false_guard() {
    let src = "i = 9\n#while i < 5\n#while 1\nk = 1\n#loop\n#loop\nj = 1";
    let interp = run(src);
    assert!(interp.engine().get_variable("k").is_none());
    assert_eq!(var(&interp, "j"), 1.0);
    assert!(interp.errors.is_empty(), "{:?}", interp.errors);
}

#[test]
fn while_comment_shows_every_iteration() {
    let html = run("i = 0\n#while i < 2 'step\ni = i + 1\n#loop").html_result().to_owned();
    assert_eq!(html.matches("step").count(), 2, "in: {html}");
}

#[test]
fn break_leaves_loop() {
    let interp = run("n = 0\n#repeat 10\nn = n + 1\n#if n == 3\n#break\n#end if\n#loop\nm = n");
    assert_eq!(var(&interp, "m"), 3.0);
    assert!(interp.errors.is_empty());
}

#[test]
fn break_outside_loop_ends_document() {
    let interp = run("a = 1\n#break\nb = 2");
    assert!(interp.engine().get_variable("b").is_none());
}

#[test]
fn continue_skips_rest_of_body() {
    let src = "n = 0\nm = 0\n#repeat 4\nn = n + 1\n#if n > 2\n#continue\n#end if\nm = m + 1\n#loop";
    let interp = run(src);
    assert_eq!(var(&interp, "n"), 4.0);
    assert_eq!(var(&interp, "m"), 2.0);
    assert!(interp.errors.is_empty());
}

#[test]
fn misplaced_loop_keywords() {
    let interp = run("#loop");
    assert!(has_error(&interp, ErrorKind::LoopWithoutRepeat));
    let interp = run("#continue");
    assert!(has_error(&interp, ErrorKind::ContinueWithoutRepeat));
    let interp = run("#repeat 2\n#if 1\n#loop\n#end if");
    assert!(has_error(&interp, ErrorKind::EntangledBlocks));
}

/// Delegates to [`BasicEngine`] and counts parse calls.
struct CountingEngine {
    inner: BasicEngine,
    parses: Rc<Cell<usize>>,
}

impl ExpressionEngine for CountingEngine {
    fn parse(&mut self, text: &str) -> InterpResult<()> {
        self.parses.set(self.parses.get() + 1);
        self.inner.parse(text)
    }
    fn calculate(&mut self, is_output: bool) -> InterpResult<()> {
        self.inner.calculate(is_output)
    }
    fn result(&self) -> Complex {
        self.inner.result()
    }
    fn result_value(&self) -> Option<&Value> {
        self.inner.result_value()
    }
    fn units(&self) -> Option<UnitRef> {
        self.inner.units()
    }
    fn to_html(&self) -> String {
        self.inner.to_html()
    }
    fn to_xml(&self) -> String {
        self.inner.to_xml()
    }
    fn result_as_val(&self) -> String {
        self.inner.result_as_val()
    }
    fn get_variable(&self, name: &str) -> Option<Value> {
        self.inner.get_variable(name)
    }
    fn set_variable(&mut self, name: &str, value: Value) {
        self.inner.set_variable(name, value);
    }
    fn variables_mut(&mut self) -> &mut Variables {
        self.inner.variables_mut()
    }
    fn write_equation_to_cache(&mut self, is_visible: bool) -> Option<usize> {
        self.inner.write_equation_to_cache(is_visible)
    }
    fn read_equation_from_cache(&mut self, id: usize) -> InterpResult<()> {
        self.inner.read_equation_from_cache(id)
    }
    fn reset_stack(&mut self) {
        self.inner.reset_stack();
    }
    fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.inner.cancel_flag()
    }
    fn define_custom_units(&mut self) -> InterpResult<()> {
        self.inner.define_custom_units()
    }
    fn set_calculation(&mut self, on: bool) {
        self.inner.set_calculation(on);
    }
    fn set_input_form(&mut self, on: bool) {
        self.inner.set_input_form(on);
    }
    fn has_input_fields(&self) -> bool {
        self.inner.has_input_fields()
    }
    fn clear_input_fields(&mut self) {
        self.inner.clear_input_fields();
    }
    fn apply_directives(&mut self, state: &DirectiveState) {
        self.inner.apply_directives(state);
    }
    fn set_show_warnings(&mut self, on: bool) {
        self.inner.set_show_warnings(on);
    }
    fn reset(&mut self, settings: &crate::settings::MathSettings) {
        self.inner.reset(settings);
    }
    fn clear_cache(&mut self) {
        self.inner.clear_cache();
    }
}

#[test]
fn loop_bodies_are_parsed_once() {
    let parses = Rc::new(Cell::new(0));
    let engine = CountingEngine {
        inner: BasicEngine::new(),
        parses: Rc::clone(&parses),
    };
    let mut interp = Interpreter::with_engine(Box::new(engine));
    interp.parse("s = 0\n#repeat 5\ns = s + 1\n#loop", true, false).unwrap();
    assert_eq!(var(&interp, "s"), 5.0);
    // `s = 0`, the repeat count and the body.
    assert_eq!(parses.get(), 3);
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

#[test]
fn hide_and_show() {
    let html = run("#hide\na = 1\n#show\nb = 2").html_result().to_owned();
    assert!(!html.contains("<var>a</var>"), "a should be hidden in: {html}");
    assert!(html.contains("<var>b</var>"), "expected b in: {html}");
}

#[test]
fn pre_and_post() {
    let html = run("#pre\na = 1\n#post\nb = 2").html_result().to_owned();
    assert!(!html.contains("<var>a</var>"), "a should be hidden in: {html}");
    assert!(html.contains("<var>b</var>"), "expected b in: {html}");
}

#[test]
fn values_only_output() {
    let interp = run("#val\na = 2 + 3");
    assert_eq!(interp.html_result(), "5");
}

#[test]
fn no_calc_renders_without_results() {
    let interp = run("a = 2\n#noc\nb = a + 1");
    let html = interp.html_result();
    assert!(html.contains("<var>b</var> = <var>a</var> + 1</span>"), "in: {html}");
    assert!(interp.engine().get_variable("b").is_none());
}

#[test]
fn round_directive() {
    let html = run("#round 4\na = 1/3").html_result().to_owned();
    assert!(html.contains("0.3333"), "in: {html}");
    assert!(!html.contains("0.33333"), "in: {html}");
}

#[test]
fn invalid_format_is_reported() {
    let interp = run("#format Q\na = 1");
    assert!(has_error(&interp, ErrorKind::InvalidFormat));
    assert_eq!(var(&interp, "a"), 1.0);
}

#[test]
fn units_placeholder() {
    let mut interp = Interpreter::new();
    interp.settings.units = "cm".to_owned();
    interp.parse("'length in %u", true, false).unwrap();
    assert!(interp.html_result().contains("length in cm"));
    assert_eq!(var(&interp, "Units"), 100.0);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn evaluation_errors_are_rendered_in_place() {
    let interp = run("a = (\nb = 2");
    assert_eq!(interp.errors.len(), 1);
    assert_eq!(interp.errors[0].line, Some(1));
    assert_eq!(var(&interp, "b"), 2.0);
    let html = interp.html_result();
    assert!(html.contains("Error in \"a = (\" on line"), "in: {html}");
}

#[test]
fn interpolation_at_nan_position_is_nan() {
    let interp = run("a = line(0/0; 1; 2)");
    assert!(var(&interp, "a").is_nan());
    assert!(interp.errors.is_empty(), "{:?}", interp.errors);
}

#[test]
fn nesting_depth_is_bounded() {
    let src = "#if 1\n".repeat(25);
    let mut interp = Interpreter::new();
    let err = interp.parse(&src, true, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NestingTooDeep);
}

#[test]
fn too_many_errors_abort() {
    let src = vec!["a = ("; MAX_ERRORS + 5].join("\n");
    let mut interp = Interpreter::new();
    let err = interp.parse(&src, true, false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TooManyErrors);
    assert_eq!(err.severity, Severity::Fatal);
}

#[test]
fn error_summary_in_debug_mode() {
    let mut src = vec!["a = 1"; ERROR_SUMMARY_MIN_LINES + 1];
    src[3] = "b = (";
    let mut interp = Interpreter::new();
    interp.debug = true;
    interp.parse(&src.join("\n"), true, false).unwrap();
    let html = interp.html_result();
    assert!(html.contains("errorHeader"), "in: {html}");
    assert!(html.contains("id=\"line-4\""), "in: {html}");
}

// ---------------------------------------------------------------------------
// Pause and input
// ---------------------------------------------------------------------------

#[test]
fn pause_and_resume() {
    let src = "a = 1\nb = a + 1\n#pause\nc = b + 1";
    let mut interp = Interpreter::new();
    interp.parse(src, true, false).unwrap();
    assert!(interp.is_paused());
    assert!(interp.html_result().contains("Paused"));
    assert!(interp.engine().get_variable("c").is_none());

    interp.parse(src, true, false).unwrap();
    assert!(!interp.is_paused());
    assert_eq!(var(&interp, "c"), 3.0);
    let html = interp.html_result();
    assert!(!html.contains("Paused"), "in: {html}");
    assert!(html.contains("<var>a</var> = 1"), "earlier output kept in: {html}");
}

#[test]
fn resumed_output_matches_uninterrupted_run() {
    let plain = run("a = 1\nb = a + 1\n'done").html_result().to_owned();
    let src = "a = 1\n#pause\nb = a + 1\n'done";
    let mut interp = Interpreter::new();
    interp.parse(src, true, false).unwrap();
    interp.parse(src, true, false).unwrap();
    assert_eq!(interp.html_result(), plain);
}

#[test]
fn pause_inside_nested_blocks_resumes() {
    let plain = run("t = 0\n#if 1\n#repeat 3\nt = t + 1\n#loop\n#end if\nu = t").html_result().to_owned();
    let src = "t = 0\n#if 1\n#repeat 3\nt = t + 1\n#pause\n#loop\n#end if\nu = t";
    let mut interp = Interpreter::new();
    let mut passes = 0;
    loop {
        interp.parse(src, true, false).unwrap();
        passes += 1;
        if !interp.is_paused() {
            break;
        }
        assert!(passes < 10, "never finished");
    }
    assert_eq!(passes, 4);
    assert_eq!(var(&interp, "t"), 3.0);
    assert_eq!(var(&interp, "u"), 3.0);
    assert!(interp.errors.is_empty(), "{:?}", interp.errors);
    assert_eq!(interp.html_result(), plain);
}

#[test]
fn cancel_stops_the_pass() {
    let src = "a = 1\n#pause\nb = 2\nc = 3";
    let mut interp = Interpreter::new();
    interp.parse(src, true, false).unwrap();
    assert!(interp.is_paused());

    interp.cancel();
    interp.parse(src, true, false).unwrap();
    assert!(!interp.is_paused());
    assert!(interp.engine().get_variable("b").is_none());
    assert!(interp.errors.is_empty(), "{:?}", interp.errors);
    let html = interp.html_result();
    assert!(html.contains("<var>a</var> = 1"), "earlier output kept in: {html}");
    assert!(!html.contains("<var>b</var>"), "in: {html}");
}

#[test]
fn user_pause_reruns_the_line() {
    let src = "a = 1\n#repeat 3\na = a + 1\n#loop\nb = a";
    let plain = run(src).html_result().to_owned();

    let mut interp = Interpreter::new();
    interp.pause();
    interp.parse(src, true, false).unwrap();
    assert!(interp.is_paused());
    let session = interp.take_session().unwrap();
    assert_eq!(session.resume_line(), Some(1));

    interp.resume(session, src).unwrap();
    assert!(!interp.is_paused());
    assert_eq!(var(&interp, "b"), 4.0);
    assert_eq!(interp.html_result(), plain);
}

#[test]
fn input_stops_calculation() {
    let src = "a = ? {2}\nb = a + 1\n#input\nc = b*2";
    let mut interp = Interpreter::new();
    interp.parse(src, true, false).unwrap();
    assert!(interp.is_paused());
    assert_eq!(var(&interp, "b"), 3.0);
    assert!(interp.engine().get_variable("c").is_none());
    assert!(interp.html_result().contains("<var>c</var>"));

    interp.parse(src, true, false).unwrap();
    assert_eq!(var(&interp, "c"), 6.0);
}

#[test]
fn input_form_renders_keywords() {
    let mut interp = Interpreter::new();
    interp.parse("a = ?\n#for i = 1 : 3\nb = a*i\n#loop", false, false).unwrap();
    let html = interp.html_result();
    assert!(html.contains("<input"), "in: {html}");
    assert!(html.contains("#for"), "in: {html}");
    assert!(html.contains("#loop"), "in: {html}");
}
