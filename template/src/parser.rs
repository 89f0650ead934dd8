//! The recursive-descent parser which builds an `Ast` from a token stream.

#[cfg(test)]
#[path = "tests_parser.rs"]
mod tests;

use crate::{
    ast::{Ast, NodeId, NodeKind, NodeValue},
    error::{Error, Result},
    lexer::{Token, TokenKind, TokenStream, TokenValue},
};

/// Parses a stream of tokens generated by `lex`.
pub fn parse(tokens: &TokenStream) -> Result<Ast> {
    match tokens.last() {
        Some(token) if token.kind == TokenKind::Eof => {}
        _ => {
            return Err(Error::parse(
                tokens.template(),
                tokens.template().chars().count(),
                "the token stream is not terminated",
            ));
        }
    }

    Parser {
        template: tokens.template(),
        tokens: &**tokens,
        cursor: 0,
        ast: Ast::default(),
        current: NodeId::root(),
    }
    .parse()
}

#[derive(Debug)]
struct Parser<'a> {
    template: &'a str,
    tokens: &'a [Token],
    cursor: usize,
    ast: Ast,
    current: NodeId,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<Ast> {
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Text => {
                    let value = NodeValue::Text(token.text().unwrap_or_default().into());
                    self.ast.add_child(self.current, NodeKind::Text, value);
                }
                TokenKind::Number => {
                    if let TokenValue::Number(n) = token.value {
                        self.ast
                            .add_child(self.current, NodeKind::Number, NodeValue::Number(n));
                    }
                }
                TokenKind::VariableName => self.parse_variable(token)?,
                TokenKind::Punctuation if token.is_punctuation('[') => {
                    self.open_optional_part(token)?
                }
                TokenKind::Punctuation if token.is_punctuation(']') => self.close_optional_part(),
                _ => {
                    return Err(self.unexpected(token, "text, a variable or an optional route part"));
                }
            }
        }

        if self.current != NodeId::root() {
            let position = self.template.chars().count();
            return Err(Error::parse(
                self.template,
                position,
                "found an unclosed optional route part",
            ));
        }

        Ok(self.ast)
    }

    fn peek(&self) -> &'a Token {
        &self.tokens[self.cursor]
    }

    fn advance(&mut self) -> &'a Token {
        let token = &self.tokens[self.cursor];
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'a Token> {
        let token = self.advance();
        if token.kind != kind {
            return Err(self.unexpected(token, expected));
        }
        Ok(token)
    }

    fn unexpected(&self, token: &Token, expected: &str) -> Error {
        Error::parse(
            self.template,
            token.position,
            format!("expected {}, found {}", expected, token),
        )
    }

    fn open_optional_part(&mut self, token: &Token) -> Result<()> {
        match self.ast[self.current].kind() {
            NodeKind::Root | NodeKind::OptionalRoutePart => {}
            kind => {
                return Err(Error::parse(
                    self.template,
                    token.position,
                    format!("an optional route part cannot be nested in {}", kind),
                ));
            }
        }
        self.current = self
            .ast
            .add_child(self.current, NodeKind::OptionalRoutePart, NodeValue::None);
        Ok(())
    }

    fn close_optional_part(&mut self) {
        match self.ast[self.current].kind() {
            NodeKind::OptionalRoutePart => {
                self.current = self.ast[self.current]
                    .parent()
                    .unwrap_or_else(NodeId::root);
            }
            _ => {
                self.ast
                    .add_child(self.current, NodeKind::Text, NodeValue::Text("]".into()));
            }
        }
    }

    fn parse_variable(&mut self, token: &Token) -> Result<()> {
        let name = token.text().unwrap_or_default();
        let variable =
            self.ast
                .add_child(self.current, NodeKind::Variable, NodeValue::Text(name.into()));

        let mut has_default = false;
        let mut has_rules = false;
        loop {
            let next = self.peek();
            if next.is_punctuation('=') && !has_default {
                self.advance();
                let value = self.expect(TokenKind::Text, "a default value")?;
                self.ast.add_child(
                    variable,
                    NodeKind::VariableDefaultValue,
                    NodeValue::Text(value.text().unwrap_or_default().into()),
                );
                has_default = true;
            } else if next.is_punctuation('(') && !has_rules {
                self.advance();
                self.parse_rules(variable)?;
                has_rules = true;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_rules(&mut self, variable: NodeId) -> Result<()> {
        loop {
            let slug = self.expect(TokenKind::Text, "a rule name")?;
            let rule = self.ast.add_child(
                variable,
                NodeKind::VariableRule,
                NodeValue::Text(slug.text().unwrap_or_default().into()),
            );

            if self.peek().is_punctuation('(') {
                self.advance();
                self.parse_rule_parameters(rule)?;
            }

            let token = self.advance();
            if token.is_punctuation(',') {
                continue;
            }
            if token.is_punctuation(')') {
                return Ok(());
            }
            return Err(self.unexpected(token, "\",\" or \")\""));
        }
    }

    fn parse_rule_parameters(&mut self, rule: NodeId) -> Result<()> {
        let parameters =
            self.ast
                .add_child(rule, NodeKind::VariableRuleParameters, NodeValue::None);

        let mut expects_value = true;
        loop {
            let token = self.advance();
            match (token.kind, &token.value) {
                (TokenKind::Number, TokenValue::Number(n)) if expects_value => {
                    self.ast
                        .add_child(parameters, NodeKind::Number, NodeValue::Number(*n));
                    expects_value = false;
                }
                (TokenKind::QuotedString, TokenValue::Text(s))
                | (TokenKind::Text, TokenValue::Text(s))
                    if expects_value =>
                {
                    self.ast
                        .add_child(parameters, NodeKind::Text, NodeValue::Text(s.clone()));
                    expects_value = false;
                }
                (TokenKind::Punctuation, TokenValue::Punctuation(',')) if !expects_value => {
                    expects_value = true;
                }
                (TokenKind::Punctuation, TokenValue::Punctuation(')'))
                    if !expects_value || self.ast[parameters].children().is_empty() =>
                {
                    return Ok(());
                }
                (TokenKind::Eof, _) => {
                    return Err(Error::parse(
                        self.template,
                        token.position,
                        "unterminated rule parameter list",
                    ));
                }
                _ => {
                    let expected = if expects_value {
                        "a rule parameter"
                    } else {
                        "\",\" or \")\""
                    };
                    return Err(self.unexpected(token, expected));
                }
            }
        }
    }
}
