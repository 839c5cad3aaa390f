//! Splitting document lines into tokens, and the per-line cache.
//!
//! Double quotes open a heading, single quotes a comment; everything
//! outside quotes is math. A quote of one kind inside the other is literal
//! text. A closing quote is optional at the end of a line.

use super::keywords::Keyword;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Expression,
    Heading,
    Text,
    /// A comment that starts with a tag is passed through as markup.
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub value: String,
    pub kind: TokenKind,
    /// Engine cache id, set once the expression was parsed inside a loop.
    pub cache_id: Option<usize>,
}

impl Token {
    fn new(value: String, kind: TokenKind) -> Self {
        Self {
            value,
            kind,
            cache_id: None,
        }
    }
}

/// Split one line. In values-only mode, text tokens are not padded.
pub(crate) fn split_tokens(line: &str, values_only: bool) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut separator = ' ';
    for c in line.chars() {
        if matches!(c, '"' | '\'') && (separator == ' ' || separator == c) {
            push_token(&mut tokens, std::mem::take(&mut current), separator, values_only);
            separator = if separator == c { ' ' } else { c };
        } else {
            current.push(c);
        }
    }
    push_token(&mut tokens, current, separator, values_only);
    tokens
}

fn push_token(tokens: &mut Vec<Token>, value: String, separator: char, values_only: bool) {
    if value.is_empty() {
        return;
    }
    let kind = match separator {
        '"' => TokenKind::Heading,
        '\'' if value.trim_start().starts_with('<') => TokenKind::Html,
        '\'' => TokenKind::Text,
        _ => TokenKind::Expression,
    };
    if kind == TokenKind::Expression {
        if !value.trim().is_empty() {
            tokens.push(Token::new(value, kind));
        }
        return;
    }
    let value = if values_only {
        value
    } else if tokens.is_empty() {
        format!("{value} ")
    } else {
        format!(" {value} ")
    };
    tokens.push(Token::new(value, kind));
}

/// Insert an attribute string into the first tag of an HTML fragment.
pub(crate) fn insert_attribute(html: &str, attribute: &str) -> String {
    let Some(start) = html.find('<') else {
        return html.to_owned();
    };
    let rest = &html[start + 1..];
    let name_len = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    let at = start + 1 + name_len;
    format!("{}{attribute}{}", &html[..at], &html[at..])
}

/// What the interpreter remembers about one source line between passes
/// and loop iterations.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineInfo {
    /// Part of a `_` continuation; its text was joined to the line above.
    pub continued: bool,
    pub keyword: Keyword,
    /// Tokens from the last evaluation; `None` until cached.
    pub tokens: Option<Vec<Token>>,
}

/// Join `_`-continued lines. Returns the logical lines, one per source
/// line, with continued lines left empty and flagged.
pub(crate) fn join_continuations(source: &str) -> (Vec<String>, Vec<bool>) {
    let mut lines: Vec<String> = Vec::new();
    let mut continued = Vec::new();
    let mut open: Option<usize> = None;
    for raw in source.lines() {
        let text = raw.trim();
        let (body, continues) = match text.strip_suffix(" _") {
            Some(body) => (body.trim_end(), true),
            None => (text, false),
        };
        if let Some(head) = open {
            lines[head].push(' ');
            lines[head].push_str(body);
            lines.push(String::new());
            continued.push(true);
        } else {
            lines.push(body.to_owned());
            continued.push(false);
        }
        open = if continues { open.or(Some(lines.len() - 1)) } else { None };
    }
    (lines, continued)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn splits_on_quotes() {
        let tokens = split_tokens("\"Title\" a = 1 'note", false);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Heading, TokenKind::Expression, TokenKind::Text]
        );
        assert_eq!(tokens[0].value, "Title ");
        assert_eq!(tokens[1].value, " a = 1 ");
        assert_eq!(tokens[2].value, " note ");
    }

    #[test]
    fn nested_quote_is_literal() {
        let tokens = split_tokens("'it\"s' x", true);
        assert_eq!(tokens[0].value, "it\"s");
        assert_eq!(tokens[1].kind, TokenKind::Expression);
    }

    #[test]
    fn blank_expressions_are_dropped() {
        let tokens = split_tokens("'a'   'b'", true);
        assert_eq!(kinds(&tokens), vec![TokenKind::Text, TokenKind::Text]);
    }

    #[test]
    fn markup_comments() {
        let tokens = split_tokens("'<b>bold</b>", true);
        assert_eq!(tokens[0].kind, TokenKind::Html);
        assert_eq!(
            insert_attribute("<p>x</p>", " id=\"line-1\""),
            "<p id=\"line-1\">x</p>"
        );
    }

    #[test]
    fn continuation_lines() {
        let (lines, continued) = join_continuations("a = 1 + _\n2 + _\n3\nb");
        assert_eq!(lines, vec!["a = 1 + 2 + 3", "", "", "b"]);
        assert_eq!(continued, vec![false, true, true, false]);
    }
}
