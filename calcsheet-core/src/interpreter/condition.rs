//! The `#if` / `#else if` / `#else` / `#end if` / `#while` condition stack.
//!
//! Levels are pushed by `#if` and `#while` and popped by `#end if` or the
//! paired `#loop`. `count` is the index of the deepest level whose parents
//! are all satisfied: a level pushed below an unsatisfied one never becomes
//! reachable, so its guard is skipped entirely.

use calcsheet_math::Complex;

use crate::error::{ErrorKind, InterpResult, InterpreterError};

/// Maximum number of nested condition levels, the root included.
pub(crate) const MAX_DEPTH: usize = 20;

/// Guard magnitude below which a condition is false.
const TRUE_THRESHOLD: f64 = 1e-12;

/// What opened a condition level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// The document itself, always satisfied.
    Root,
    /// `#if`, also kept after `#else if`.
    If,
    /// `#else`; a second `#else` on the same level is an error.
    Else,
    /// `#while`, closed by its `#loop`.
    While,
}

/// Keywords that act on the condition stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConditionKeyword {
    /// Opens a level guarded by the line's expression.
    If,
    /// Replaces the guard of the innermost `#if` level.
    ElseIf,
    /// Fires when no earlier branch did.
    Else,
    /// Closes the innermost `#if` level.
    EndIf,
    /// Opens a level that its `#loop` closes.
    While,
}

impl ConditionKeyword {
    /// Keyword as written in the source, lowercase.
    pub const fn text(self) -> &'static str {
        match self {
            Self::If => "#if",
            Self::ElseIf => "#else if",
            Self::Else => "#else",
            Self::EndIf => "#end if",
            Self::While => "#while",
        }
    }

    /// Length of the keyword prefix on the source line.
    pub const fn prefix_len(self) -> usize {
        self.text().len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Level {
    satisfied: bool,
    kind: BlockKind,
}

#[derive(Debug, Clone)]
pub(crate) struct ConditionStack {
    levels: Vec<Level>,
    count: usize,
    keyword: Option<ConditionKeyword>,
    /// A branch of the current `#if` block has already fired.
    is_found: bool,
    /// The current line's guard still needs evaluating.
    is_unchecked: bool,
}

impl Default for ConditionStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionStack {
    /// A stack holding only the satisfied root level.
    pub fn new() -> Self {
        Self {
            levels: vec![Level {
                satisfied: true,
                kind: BlockKind::Root,
            }],
            count: 0,
            keyword: None,
            is_found: false,
            is_unchecked: false,
        }
    }

    /// Id of the innermost level; the root is 0.
    pub fn id(&self) -> usize {
        self.levels.len() - 1
    }

    /// Whether lines at the current depth run.
    pub fn is_satisfied(&self) -> bool {
        self.levels[self.count].satisfied
    }

    /// A branch of the innermost `#if` block has fired.
    pub const fn is_found(&self) -> bool {
        self.is_found
    }

    /// The keyword on this line opened or replaced a guard that is
    /// not evaluated yet.
    pub const fn is_unchecked(&self) -> bool {
        self.is_unchecked
    }

    /// Whether the innermost level belongs to a `#while` loop.
    pub fn is_loop(&self) -> bool {
        self.top_kind() == BlockKind::While
    }

    /// Condition keyword of the current line, if any.
    pub const fn keyword(&self) -> Option<ConditionKeyword> {
        self.keyword
    }

    /// Prefix length of the condition keyword on the current line.
    pub fn keyword_len(&self) -> usize {
        self.keyword.map_or(0, ConditionKeyword::prefix_len)
    }

    fn top_kind(&self) -> BlockKind {
        self.levels[self.id()].kind
    }

    /// Apply the condition keyword of the current line, or clear it.
    pub fn set(&mut self, keyword: Option<ConditionKeyword>) -> InterpResult<()> {
        self.keyword = keyword;
        let Some(keyword) = keyword else {
            return Ok(());
        };
        self.is_unchecked = matches!(keyword, ConditionKeyword::If | ConditionKeyword::ElseIf);
        if self.count == 0
            && matches!(
                keyword,
                ConditionKeyword::ElseIf | ConditionKeyword::Else | ConditionKeyword::EndIf
            )
        {
            return Err(InterpreterError::of(ErrorKind::ConditionNotInitialized));
        }
        if self.top_kind() == BlockKind::Else {
            match keyword {
                ConditionKeyword::Else => return Err(InterpreterError::of(ErrorKind::DuplicateElse)),
                ConditionKeyword::ElseIf => return Err(InterpreterError::of(ErrorKind::ElseIfAfterElse)),
                _ => {}
            }
        }
        match keyword {
            ConditionKeyword::If => self.add()?,
            ConditionKeyword::While => self.push_while()?,
            ConditionKeyword::ElseIf => self.change(true, BlockKind::If),
            ConditionKeyword::Else => self.change(!self.is_found, BlockKind::Else),
            ConditionKeyword::EndIf => self.remove(),
        }
        Ok(())
    }

    fn push(&mut self, kind: BlockKind) -> InterpResult<()> {
        if self.levels.len() >= MAX_DEPTH {
            return Err(InterpreterError::of(ErrorKind::NestingTooDeep));
        }
        self.levels.push(Level {
            satisfied: true,
            kind,
        });
        Ok(())
    }

    fn add(&mut self) -> InterpResult<()> {
        self.push(BlockKind::If)?;
        if self.is_satisfied() {
            self.count += 1;
            self.is_found = false;
        }
        Ok(())
    }

    /// A `#while` under an unsatisfied level is pushed unreachable, so
    /// that its `#loop` has a level to close.
    fn push_while(&mut self) -> InterpResult<()> {
        self.push(BlockKind::While)?;
        if self.is_satisfied() {
            self.count += 1;
        }
        Ok(())
    }

    /// Pop the innermost level.
    pub fn remove(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
        if self.count > self.id() {
            self.count -= 1;
            self.is_found = true;
        }
    }

    fn change(&mut self, satisfied: bool, kind: BlockKind) {
        let id = self.id();
        self.levels[id] = Level { satisfied, kind };
    }

    /// Truth value of a guard result.
    pub fn truth(value: Complex) -> InterpResult<bool> {
        if !value.is_real() {
            return Err(InterpreterError::of(ErrorKind::ConditionComplex));
        }
        let d = value.re;
        if !d.is_finite() {
            return Err(InterpreterError::new(
                ErrorKind::ConditionInvalid,
                format!("condition result is invalid: {d}"),
            ));
        }
        Ok(d.abs() > TRUE_THRESHOLD)
    }

    /// Evaluate a guard result against the innermost level.
    pub fn check(&mut self, value: Complex) -> InterpResult<()> {
        let result = Self::truth(value)?;
        if result {
            self.is_found = true;
        }
        self.change(result, self.top_kind());
        self.is_unchecked = false;
        Ok(())
    }

    /// The guard is rendered but not evaluated, as in an input form.
    pub fn mark_checked(&mut self) {
        self.is_unchecked = false;
    }

    /// The keyword as a styled span, or nothing.
    pub fn to_html(&self) -> String {
        self.keyword
            .map(|k| format!("<span class=\"cond\">{}</span>", k.text()))
            .unwrap_or_default()
    }
}
