//! Recursive-descent parser for single expressions.
//!
//! Binary operators are parsed by precedence climbing over
//! [`Operator::precedence`]; `^` is right-associative, everything else
//! left-associative. Unary minus binds looser than `^`, so `-2^2` is `-4`.
//!
//! A number written directly against a name or an opening parenthesis
//! (`5m`, `2(a + b)`) is an implicit product.

use calcsheet_math::Operator;

use super::lexer::{tokenize, Lexeme, Tok};
use crate::error::{ErrorKind, InterpResult, InterpreterError};

// ---------------------------------------------------------------------------
// Syntax tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Imaginary(f64),
    Name(String),
    /// `?` input field with its optional `{value}`.
    Input(Option<f64>),
    Neg(Box<Expr>),
    Binary(Operator, Box<Expr>, Box<Expr>),
    /// `5m`: product written without an operator.
    Implicit(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    /// Parenthesized sub-expression, kept for rendering.
    Group(Box<Expr>),
    Vector(Vec<Expr>),
    Matrix(Vec<Vec<Expr>>),
}

impl Expr {
    /// Whether a variable (not a unit or a literal) may occur.
    pub fn has_names(&self) -> bool {
        match self {
            Self::Name(_) => true,
            Self::Number(_) | Self::Imaginary(_) | Self::Input(_) => false,
            Self::Neg(e) | Self::Group(e) => e.has_names(),
            Self::Binary(_, a, b) | Self::Implicit(a, b) => a.has_names() || b.has_names(),
            Self::Call(_, args) | Self::Vector(args) => args.iter().any(Self::has_names),
            Self::Matrix(rows) => rows.iter().flatten().any(Self::has_names),
        }
    }

    pub fn has_input(&self) -> bool {
        match self {
            Self::Input(_) => true,
            Self::Number(_) | Self::Imaginary(_) | Self::Name(_) => false,
            Self::Neg(e) | Self::Group(e) => e.has_input(),
            Self::Binary(_, a, b) | Self::Implicit(a, b) => a.has_input() || b.has_input(),
            Self::Call(_, args) | Self::Vector(args) => args.iter().any(Self::has_input),
            Self::Matrix(rows) => rows.iter().flatten().any(Self::has_input),
        }
    }

    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Imaginary(_))
    }
}

/// One parsed line of math.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    Expr(Expr),
    /// `name = expr`
    Assign(String, Expr),
    /// `.name = expr` defines a custom unit.
    UnitDef(String, Expr),
}

impl Statement {
    pub const fn expr(&self) -> &Expr {
        match self {
            Self::Expr(e) | Self::Assign(_, e) | Self::UnitDef(_, e) => e,
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

fn syntax(message: impl Into<String>) -> InterpreterError {
    InterpreterError::new(ErrorKind::Syntax, message)
}

struct Parser {
    toks: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|l| &l.tok)
    }

    fn peek_unspaced(&self) -> Option<&Tok> {
        self.toks.get(self.pos).filter(|l| !l.spaced).map(|l| &l.tok)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).map(|l| l.tok.clone());
        self.pos += 1;
        tok
    }

    fn expect(&mut self, want: &Tok, what: &str) -> InterpResult<()> {
        match self.next() {
            Some(ref t) if t == want => Ok(()),
            Some(t) => Err(syntax(format!("expected {what}, found {}", describe(&t)))),
            None => Err(syntax(format!("expected {what} at the end of the expression"))),
        }
    }

    fn statement(&mut self) -> InterpResult<Statement> {
        let target = match (self.toks.first().map(|l| &l.tok), self.toks.get(1).map(|l| &l.tok)) {
            (Some(Tok::Name(n)), Some(Tok::Assign)) => Some((n.clone(), false)),
            (Some(Tok::UnitName(n)), Some(Tok::Assign)) => Some((n.clone(), true)),
            _ => None,
        };
        if target.is_some() {
            self.pos = 2;
        }
        if self.peek().is_none() {
            return Err(syntax("expression is empty"));
        }
        let expr = self.expression(0)?;
        if let Some(t) = self.peek() {
            return Err(syntax(format!("unexpected {}", describe(t))));
        }
        Ok(match target {
            Some((name, false)) => Statement::Assign(name, expr),
            Some((name, true)) => Statement::UnitDef(name, expr),
            None => Statement::Expr(expr),
        })
    }

    fn expression(&mut self, min_prec: u8) -> InterpResult<Expr> {
        let mut lhs = self.unary()?;
        while let Some(&Tok::Op(op)) = self.peek() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let next_min = if op == Operator::Pow { prec } else { prec + 1 };
            let rhs = self.expression(next_min)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> InterpResult<Expr> {
        match self.peek() {
            Some(Tok::Op(Operator::Sub)) => {
                self.pos += 1;
                let operand = self.expression(Operator::Pow.precedence())?;
                Ok(Expr::Neg(Box::new(operand)))
            }
            Some(Tok::Op(Operator::Add)) => {
                self.pos += 1;
                self.expression(Operator::Pow.precedence())
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> InterpResult<Expr> {
        let Some(tok) = self.next() else {
            return Err(syntax("missing operand at the end of the expression"));
        };
        match tok {
            Tok::Number(x) => {
                let lhs = Expr::Number(x);
                match self.peek_unspaced() {
                    Some(Tok::Name(_) | Tok::LParen) => {
                        let rhs = self.primary()?;
                        Ok(Expr::Implicit(Box::new(lhs), Box::new(rhs)))
                    }
                    _ => Ok(lhs),
                }
            }
            Tok::Imaginary(x) => Ok(Expr::Imaginary(x)),
            Tok::Input(v) => Ok(Expr::Input(v)),
            Tok::Name(name) => {
                if self.peek() == Some(&Tok::LParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Tok::LParen => {
                let inner = self.expression(0)?;
                self.expect(&Tok::RParen, "\")\"")?;
                Ok(Expr::Group(Box::new(inner)))
            }
            Tok::LBracket => self.brackets(),
            other => Err(syntax(format!("unexpected {}", describe(&other)))),
        }
    }

    /// `;`-separated arguments after `(`, through the closing `)`.
    fn arguments(&mut self) -> InterpResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Tok::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression(0)?);
            match self.next() {
                Some(Tok::Semicolon) => {}
                Some(Tok::RParen) => return Ok(args),
                Some(t) => return Err(syntax(format!("expected \";\" or \")\", found {}", describe(&t)))),
                None => return Err(syntax("missing \")\"")),
            }
        }
    }

    /// `[a; b]` vector or `[a; b | c; d]` matrix after `[`.
    fn brackets(&mut self) -> InterpResult<Expr> {
        let mut rows: Vec<Vec<Expr>> = vec![Vec::new()];
        let mut is_matrix = false;
        if self.peek() == Some(&Tok::RBracket) {
            self.pos += 1;
            return Ok(Expr::Vector(Vec::new()));
        }
        loop {
            let item = self.expression(0)?;
            if let Some(row) = rows.last_mut() {
                row.push(item);
            }
            match self.next() {
                Some(Tok::Semicolon) => {}
                Some(Tok::Bar) => {
                    is_matrix = true;
                    rows.push(Vec::new());
                }
                Some(Tok::RBracket) => break,
                Some(t) => return Err(syntax(format!("expected \";\", \"|\" or \"]\", found {}", describe(&t)))),
                None => return Err(syntax("missing \"]\"")),
            }
        }
        if is_matrix {
            Ok(Expr::Matrix(rows))
        } else {
            Ok(Expr::Vector(rows.into_iter().flatten().collect()))
        }
    }
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Number(x) => format!("number {x}"),
        Tok::Imaginary(x) => format!("number {x}i"),
        Tok::Name(n) => format!("\"{n}\""),
        Tok::UnitName(n) => format!("\".{n}\""),
        Tok::Input(_) => "\"?\"".into(),
        Tok::Op(op) => format!("\"{}\"", op.symbol()),
        Tok::Assign => "\"=\"".into(),
        Tok::LParen => "\"(\"".into(),
        Tok::RParen => "\")\"".into(),
        Tok::LBracket => "\"[\"".into(),
        Tok::RBracket => "\"]\"".into(),
        Tok::Semicolon => "\";\"".into(),
        Tok::Bar => "\"|\"".into(),
    }
}

/// Parse one expression line.
pub(crate) fn parse(src: &str) -> InterpResult<Statement> {
    let toks = tokenize(src)?;
    Parser { toks, pos: 0 }.statement()
}
