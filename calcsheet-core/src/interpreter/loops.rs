//! Loop bookkeeping for `#repeat`, `#for` and `#while`.

use calcsheet_math::{Complex, ComplexValue, RealValue, UnitRef, Value};

/// Iteration cap for every loop.
pub const MAX_ITERATIONS: usize = 1_000_000;

#[derive(Debug, Clone)]
pub(crate) enum LoopKind {
    Repeat,
    For {
        counter: String,
        value: Complex,
        /// Per-component `±1` or `0`.
        step: Complex,
        unit: Option<UnitRef>,
        complex: bool,
    },
    While {
        guard: String,
        /// Inline comment after the guard, re-rendered every iteration.
        comment: Option<String>,
        /// The loop opened a condition level that `#loop` must close.
        owns_level: bool,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Loop {
    pub kind: LoopKind,
    /// Line holding the opening keyword.
    pub start_line: usize,
    /// Iterations left, the current one included; 0 means broken.
    pub iteration: usize,
    /// Condition id at the opening keyword.
    pub id: usize,
}

/// Iteration count clamped to `[0, MAX_ITERATIONS]`; `None` means the cap.
pub(crate) fn clamp_count(count: Option<f64>) -> usize {
    match count {
        None => MAX_ITERATIONS,
        Some(c) if c.is_nan() || c <= 0.0 => 0,
        Some(c) if c >= MAX_ITERATIONS as f64 => MAX_ITERATIONS,
        Some(c) => c as usize,
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Loop {
    pub fn new(kind: LoopKind, start_line: usize, count: Option<f64>, id: usize) -> Self {
        Self {
            kind,
            start_line,
            iteration: clamp_count(count),
            id,
        }
    }

    /// A loop opened inside a broken one: it never runs its body.
    pub fn broken(start_line: usize, id: usize) -> Self {
        Self::new(LoopKind::Repeat, start_line, Some(0.0), id)
    }

    /// `#for` loop from `start` towards `end`; `delta` is `end - start` in
    /// the start value's unit.
    pub fn counting(counter: String, start: &Value, delta: &Value, start_line: usize, id: usize) -> Self {
        let d = delta.number();
        let count = d.re.abs() + 1.0;
        let kind = LoopKind::For {
            counter,
            value: start.number(),
            step: Complex::new(sign(d.re), sign(d.im)),
            unit: start.unit().cloned(),
            complex: matches!(start, Value::Complex(_)),
        };
        Self::new(kind, start_line, Some(count.trunc()), id)
    }

    pub const fn is_broken(&self) -> bool {
        self.iteration == 0
    }

    pub fn break_loop(&mut self) {
        self.iteration = 0;
    }

    /// Step a `#for` counter and return the binding to assign.
    pub fn increment(&mut self) -> Option<(String, Value)> {
        let LoopKind::For {
            counter,
            value,
            step,
            unit,
            complex,
        } = &mut self.kind
        else {
            return None;
        };
        value.re += step.re;
        value.im += step.im;
        let v = if *complex || step.im != 0.0 {
            Value::Complex(ComplexValue::with_unit(*value, unit.clone()))
        } else {
            Value::Real(RealValue::with_unit(value.re, unit.clone()))
        };
        Some((counter.clone(), v))
    }

    /// Count one iteration down; `Some(line)` gives where the next one starts.
    pub fn iterate(&mut self) -> Option<usize> {
        if self.iteration <= 1 {
            return None;
        }
        self.iteration -= 1;
        Some(self.start_line + 1)
    }
}
