//! Lexical scanner for single expressions.
//!
//! | Input                | Token                          |
//! |----------------------|--------------------------------|
//! | `12`, `3.5`, `1e-3`  | `Number`                       |
//! | `2i`, `0.5i`         | `Imaginary`                    |
//! | `x`, `a_1`, `kN`, `°` | `Name`                        |
//! | `.kip`               | `UnitName("kip")`              |
//! | `?`, `? {5}`         | `Input(None)`, `Input(Some(5))` |
//! | `+ - * / \ % ^`      | `Op`                           |
//! | `== != < > <= >=`    | `Op` (also `≡ ≠ ≤ ≥`)          |
//! | `&& \|\| xor`        | `Op` (also `∧ ∨ ⊕`)            |
//! | `=`                  | `Assign`                       |
//! | `( ) [ ] ; \|`       | punctuation                    |

use calcsheet_math::Operator;

use crate::error::{ErrorKind, InterpResult, InterpreterError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Number(f64),
    Imaginary(f64),
    Name(String),
    UnitName(String),
    Input(Option<f64>),
    Op(Operator),
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Bar,
}

/// A token and whether whitespace came right before it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub tok: Tok,
    pub spaced: bool,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '°' | '‰')
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '′' | '″')
}

fn syntax(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::Syntax, message)
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(i, _)| i)
    }

    fn skip_space(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
            skipped = true;
        }
        skipped
    }

    fn number(&mut self) -> InterpResult<f64> {
        let start = self.pos();
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.bump();
        }
        // Exponent only when a digit follows, so `2e` stays `2 * e`.
        if matches!(self.peek(), Some('e' | 'E')) {
            let rest = &self.src[self.pos() + 1..];
            let mut it = rest.chars();
            let next = it.next();
            let digit_follows = match next {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => it.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if digit_follows {
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = &self.src[start..self.pos()];
        text.parse::<f64>()
            .map_err(|_| syntax(format!("invalid number \"{text}\"")))
    }

    fn name(&mut self) -> String {
        let start = self.pos();
        self.bump();
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        self.src[start..self.pos()].to_owned()
    }

    /// Optional `{value}` after `?`.
    fn input_value(&mut self) -> InterpResult<Option<f64>> {
        self.skip_space();
        if !self.eat('{') {
            return Ok(None);
        }
        let start = self.pos();
        while self.peek().is_some_and(|c| c != '}') {
            self.bump();
        }
        let text = self.src[start..self.pos()].trim().to_owned();
        if !self.eat('}') {
            return Err(syntax("missing \"}\" after input value"));
        }
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| syntax(format!("invalid input value \"{text}\"")))
    }
}

/// Split an expression into tokens.
pub(crate) fn tokenize(src: &str) -> InterpResult<Vec<Lexeme>> {
    let mut s = Scanner::new(src);
    let mut out = Vec::new();
    loop {
        let spaced = s.skip_space();
        let Some(c) = s.peek() else { break };
        let tok = match c {
            '0'..='9' => {
                let x = s.number()?;
                if s.peek() == Some('i') {
                    let rest = &src[s.pos() + 'i'.len_utf8()..];
                    if !rest.chars().next().is_some_and(is_name_char) {
                        s.bump();
                        out.push(Lexeme {
                            tok: Tok::Imaginary(x),
                            spaced,
                        });
                        continue;
                    }
                }
                Tok::Number(x)
            }
            '.' if src[s.pos() + 1..].starts_with(|c: char| c.is_ascii_digit()) => {
                Tok::Number(s.number()?)
            }
            '.' => {
                s.bump();
                if !s.peek().is_some_and(is_name_start) {
                    return Err(syntax("expected a unit name after \".\""));
                }
                Tok::UnitName(s.name())
            }
            c if is_name_start(c) => {
                let name = s.name();
                if name == "xor" {
                    Tok::Op(Operator::Xor)
                } else {
                    Tok::Name(name)
                }
            }
            _ => {
                s.bump();
                match c {
                    '+' => Tok::Op(Operator::Add),
                    '-' | '−' => Tok::Op(Operator::Sub),
                    '*' | '·' => Tok::Op(Operator::Mul),
                    '/' | '÷' => Tok::Op(Operator::Div),
                    '\\' => Tok::Op(Operator::IntDiv),
                    '%' => Tok::Op(Operator::Rem),
                    '^' => Tok::Op(Operator::Pow),
                    '≡' => Tok::Op(Operator::Eq),
                    '≠' => Tok::Op(Operator::Ne),
                    '≤' => Tok::Op(Operator::Le),
                    '≥' => Tok::Op(Operator::Ge),
                    '∧' => Tok::Op(Operator::And),
                    '∨' => Tok::Op(Operator::Or),
                    '⊕' => Tok::Op(Operator::Xor),
                    '=' if s.eat('=') => Tok::Op(Operator::Eq),
                    '=' => Tok::Assign,
                    '!' if s.eat('=') => Tok::Op(Operator::Ne),
                    '<' if s.eat('=') => Tok::Op(Operator::Le),
                    '<' => Tok::Op(Operator::Lt),
                    '>' if s.eat('=') => Tok::Op(Operator::Ge),
                    '>' => Tok::Op(Operator::Gt),
                    '&' if s.eat('&') => Tok::Op(Operator::And),
                    '|' if s.eat('|') => Tok::Op(Operator::Or),
                    '|' => Tok::Bar,
                    '(' => Tok::LParen,
                    ')' => Tok::RParen,
                    '[' => Tok::LBracket,
                    ']' => Tok::RBracket,
                    ';' => Tok::Semicolon,
                    '?' => Tok::Input(s.input_value()?),
                    _ => return Err(syntax(format!("invalid character \"{c}\""))),
                }
            }
        };
        out.push(Lexeme { tok, spaced });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src).unwrap().into_iter().map(|l| l.tok).collect()
    }

    #[test]
    fn numbers_and_names() {
        assert_eq!(
            toks("a_1 = 2.5e3*kN"),
            vec![
                Tok::Name("a_1".into()),
                Tok::Assign,
                Tok::Number(2500.0),
                Tok::Op(Operator::Mul),
                Tok::Name("kN".into()),
            ]
        );
    }

    #[test]
    fn exponent_needs_digits() {
        assert_eq!(toks("2e"), vec![Tok::Number(2.0), Tok::Name("e".into())]);
        assert_eq!(toks("2e-1"), vec![Tok::Number(0.2)]);
    }

    #[test]
    fn imaginary_suffix() {
        assert_eq!(toks("3 + 2i"), vec![Tok::Number(3.0), Tok::Op(Operator::Add), Tok::Imaginary(2.0)]);
        // `2in` is a number times a name, not an imaginary literal.
        assert_eq!(toks("2in"), vec![Tok::Number(2.0), Tok::Name("in".into())]);
    }

    #[test]
    fn relational_operators() {
        assert_eq!(
            toks("a <= b != c == d || e"),
            vec![
                Tok::Name("a".into()),
                Tok::Op(Operator::Le),
                Tok::Name("b".into()),
                Tok::Op(Operator::Ne),
                Tok::Name("c".into()),
                Tok::Op(Operator::Eq),
                Tok::Name("d".into()),
                Tok::Op(Operator::Or),
                Tok::Name("e".into()),
            ]
        );
    }

    #[test]
    fn input_fields() {
        assert_eq!(toks("x = ? {4.5}"), vec![Tok::Name("x".into()), Tok::Assign, Tok::Input(Some(4.5))]);
        assert_eq!(toks("?"), vec![Tok::Input(None)]);
        assert!(tokenize("? {abc}").is_err());
    }

    #[test]
    fn spacing_is_recorded() {
        let lx = tokenize("5m 5 m").unwrap();
        assert!(!lx[1].spaced);
        assert!(lx[3].spaced);
    }

    #[test]
    fn unit_definition_name() {
        assert_eq!(toks(".kip"), vec![Tok::UnitName("kip".into())]);
        assert_eq!(toks(".5"), vec![Tok::Number(0.5)]);
        assert!(tokenize("$").is_err());
    }
}
