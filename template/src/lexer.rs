//! The tokenizer of URI templates.

use {
    crate::error::{Error, Result},
    lazy_static::lazy_static,
    regex::Regex,
    std::{fmt, ops::Deref},
};

/// The maximum number of characters in a variable name.
pub const MAX_VARIABLE_NAME_LENGTH: usize = 32;

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("should be a valid pattern");
    static ref NUMBER: Regex =
        Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?").expect("should be a valid pattern");
}

/// The kind of a token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text, a default value, a rule slug or a bare identifier argument.
    Text,
    /// A numeric rule argument.
    Number,
    /// A quoted rule argument, without its delimiters.
    QuotedString,
    /// The name of a variable, without the leading colon.
    VariableName,
    /// One of `( ) [ ] , =`.
    Punctuation,
    /// The end of the template.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Text => "text",
            TokenKind::Number => "number",
            TokenKind::QuotedString => "quoted string",
            TokenKind::VariableName => "variable name",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Eof => "end of template",
        })
    }
}

/// A numeric literal which appears in the argument list of a rule.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Number {
    /// An integer literal.
    Int(i64),
    /// A decimal literal.
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => fmt::Display::fmt(n, f),
            Number::Float(n) => fmt::Display::fmt(n, f),
        }
    }
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// A text value.
    Text(String),
    /// A numeric value.
    Number(Number),
    /// A punctuation character.
    Punctuation(char),
    /// No value.
    None,
}

/// A token with its position in the template.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of this token.
    pub kind: TokenKind,
    /// The value of this token.
    pub value: TokenValue,
    /// The 0-based character offset of this token in the source template.
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, value: TokenValue, position: usize) -> Self {
        Self {
            kind,
            value,
            position,
        }
    }

    /// Returns whether this token is the punctuation character.
    pub fn is_punctuation(&self, c: char) -> bool {
        self.value == TokenValue::Punctuation(c)
    }

    /// Returns the value of this token if it is text.
    pub fn text(&self) -> Option<&str> {
        match self.value {
            TokenValue::Text(ref s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            TokenValue::Text(ref s) => write!(f, "{} \"{}\"", self.kind, s),
            TokenValue::Number(n) => write!(f, "{} {}", self.kind, n),
            TokenValue::Punctuation(c) => write!(f, "\"{}\"", c),
            TokenValue::None => fmt::Display::fmt(&self.kind, f),
        }
    }
}

/// The sequence of tokens generated from a template, terminated by an `Eof` token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStream {
    template: String,
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Returns the source template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Consumes the stream, returning its tokens.
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl Deref for TokenStream {
    type Target = [Token];

    fn deref(&self) -> &Self::Target {
        &self.tokens[..]
    }
}

/// Tokenizes a URI template.
pub fn lex(template: &str) -> Result<TokenStream> {
    let tokens = Lexer {
        template,
        cursor: 0,
        position: 0,
        tokens: vec![],
    }
    .lex()?;

    Ok(TokenStream {
        template: template.into(),
        tokens,
    })
}

fn is_punctuation(c: char) -> bool {
    match c {
        '(' | ')' | '[' | ']' | ',' | '=' => true,
        _ => false,
    }
}

fn terminates_default_value(c: char) -> bool {
    match c {
        '(' | ')' | '[' | ']' | '/' | '.' | ':' | ',' => true,
        _ => false,
    }
}

#[derive(Debug)]
struct Lexer<'a> {
    template: &'a str,
    cursor: usize,
    position: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn lex(mut self) -> Result<Vec<Token>> {
        let mut text = String::new();
        let mut text_start = 0;

        while let Some(c) = self.peek() {
            match c {
                ':' => {
                    self.flush_text(&mut text, text_start);
                    self.advance(c);
                    self.lex_variable()?;
                }
                '[' | ']' => {
                    self.flush_text(&mut text, text_start);
                    self.push_punctuation(c);
                }
                c => {
                    if text.is_empty() {
                        text_start = self.position;
                    }
                    text.push(c);
                    self.advance(c);
                }
            }
        }
        self.flush_text(&mut text, text_start);

        let position = self.position;
        self.tokens
            .push(Token::new(TokenKind::Eof, TokenValue::None, position));
        Ok(self.tokens)
    }

    fn rest(&self) -> &'a str {
        &self.template[self.cursor..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self, c: char) {
        self.cursor += c.len_utf8();
        self.position += 1;
    }

    fn advance_str(&mut self, s: &str) {
        self.cursor += s.len();
        self.position += s.chars().count();
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance(c);
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::lex(self.template, self.position, message)
    }

    fn flush_text(&mut self, text: &mut String, start: usize) {
        if !text.is_empty() {
            let value = std::mem::replace(text, String::new());
            self.tokens
                .push(Token::new(TokenKind::Text, TokenValue::Text(value), start));
        }
    }

    fn push_punctuation(&mut self, c: char) {
        let position = self.position;
        self.tokens.push(Token::new(
            TokenKind::Punctuation,
            TokenValue::Punctuation(c),
            position,
        ));
        self.advance(c);
    }

    fn push_str(&mut self, kind: TokenKind, s: &str) {
        let position = self.position;
        self.tokens
            .push(Token::new(kind, TokenValue::Text(s.into()), position));
        self.advance_str(s);
    }

    fn lex_variable(&mut self) -> Result<()> {
        let name = match IDENTIFIER.find(self.rest()) {
            Some(m) => m.as_str(),
            None => {
                return Err(match self.peek() {
                    Some(c) if is_punctuation(c) => {
                        self.error(format!("expected a variable name, found \"{}\"", c))
                    }
                    Some(c) => self.error(format!("invalid variable name starting with \"{}\"", c)),
                    None => self.error("expected a variable name, found end of template"),
                });
            }
        };

        if name.len() > MAX_VARIABLE_NAME_LENGTH {
            return Err(self.error(format!(
                "variable name \"{}\" exceeds the maximum length of {} characters",
                name, MAX_VARIABLE_NAME_LENGTH
            )));
        }

        self.push_str(TokenKind::VariableName, name);

        // the default value and the rule list may be written in either order.
        let mut has_default = false;
        let mut has_rules = false;
        loop {
            match self.peek() {
                Some('=') if !has_default => {
                    self.lex_default_value();
                    has_default = true;
                }
                Some('(') if !has_rules => {
                    self.lex_rules(name)?;
                    has_rules = true;
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_default_value(&mut self) {
        self.push_punctuation('=');

        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| terminates_default_value(c))
            .map_or(rest.len(), |(i, _)| i);
        self.push_str(TokenKind::Text, &rest[..end]);
    }

    fn lex_rules(&mut self, variable: &str) -> Result<()> {
        self.push_punctuation('(');

        loop {
            self.skip_whitespace();

            let slug = match IDENTIFIER.find(self.rest()) {
                Some(m) => m.as_str(),
                None => {
                    return Err(match self.peek() {
                        Some(c) => self.error(format!(
                            "expected a rule name for variable \"{}\", found \"{}\"",
                            variable, c
                        )),
                        None => self.error(format!(
                            "unterminated rule list for variable \"{}\"",
                            variable
                        )),
                    });
                }
            };
            self.push_str(TokenKind::Text, slug);

            self.skip_whitespace();
            if self.peek() == Some('(') {
                self.lex_rule_arguments(slug)?;
                self.skip_whitespace();
            }

            match self.peek() {
                Some(',') => self.push_punctuation(','),
                Some(')') => {
                    self.push_punctuation(')');
                    return Ok(());
                }
                Some(c) => {
                    return Err(self.error(format!(
                        "unexpected character \"{}\" after rule \"{}\"",
                        c, slug
                    )));
                }
                None => {
                    return Err(self.error(format!(
                        "unbalanced parenthesis in rule \"{}\" of variable \"{}\"",
                        slug, variable
                    )));
                }
            }
        }
    }

    fn lex_rule_arguments(&mut self, slug: &str) -> Result<()> {
        self.push_punctuation('(');

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(self.error(format!("unbalanced parenthesis in rule \"{}\"", slug)));
                }
                Some(')') => {
                    self.push_punctuation(')');
                    return Ok(());
                }
                Some(',') => self.push_punctuation(','),
                Some(q @ '"') | Some(q @ '\'') => self.lex_quoted_string(q)?,
                Some(c) if c == '-' || c.is_ascii_digit() => self.lex_number()?,
                Some(c) => match IDENTIFIER.find(self.rest()) {
                    Some(m) if self.rest()[m.end()..].starts_with('(') => {
                        self.lex_nested_call(slug)?
                    }
                    Some(m) => self.push_str(TokenKind::Text, m.as_str()),
                    None => {
                        return Err(self.error(format!(
                            "unexpected character \"{}\" in the arguments of rule \"{}\"",
                            c, slug
                        )));
                    }
                },
            }
        }
    }

    /// Lexes a rule call nested in an argument list, e.g. `foo(1)`, as a single text token.
    fn lex_nested_call(&mut self, slug: &str) -> Result<()> {
        let rest = self.rest();
        let mut depth = 0usize;
        let end = rest.char_indices().find_map(|(i, c)| match c {
            '(' => {
                depth += 1;
                None
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    Some(i + 1)
                } else {
                    None
                }
            }
            _ => None,
        });
        match end {
            Some(end) => {
                self.push_str(TokenKind::Text, &rest[..end]);
                Ok(())
            }
            None => Err(self.error(format!("unbalanced parenthesis in rule \"{}\"", slug))),
        }
    }

    fn lex_quoted_string(&mut self, delimiter: char) -> Result<()> {
        let start = self.position;
        self.advance(delimiter);

        let mut value = String::new();
        loop {
            let mut chars = self.rest().chars();
            match (chars.next(), chars.next()) {
                (None, _) => {
                    return Err(Error::lex(
                        self.template,
                        start,
                        "unterminated quoted string",
                    ));
                }
                (Some('\\'), Some(next)) if next == delimiter || next == '\\' => {
                    value.push(next);
                    self.advance('\\');
                    self.advance(next);
                }
                (Some(c), _) if c == delimiter => {
                    self.advance(c);
                    break;
                }
                (Some(c), _) => {
                    value.push(c);
                    self.advance(c);
                }
            }
        }

        self.tokens.push(Token::new(
            TokenKind::QuotedString,
            TokenValue::Text(value),
            start,
        ));
        Ok(())
    }

    fn lex_number(&mut self) -> Result<()> {
        let literal = match NUMBER.find(self.rest()) {
            Some(m) => m.as_str(),
            None => return Err(self.error("invalid numeric literal")),
        };

        let number = if literal.contains('.') {
            literal.parse().map(Number::Float).ok()
        } else {
            literal.parse().map(Number::Int).ok()
        };
        let number = match number {
            Some(number) => number,
            None => {
                return Err(self.error(format!("numeric literal \"{}\" is out of range", literal)));
            }
        };

        let position = self.position;
        self.tokens.push(Token::new(
            TokenKind::Number,
            TokenValue::Number(number),
            position,
        ));
        self.advance_str(literal);
        Ok(())
    }
}
