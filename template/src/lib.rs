//! The lexer and parser of URI templates used by `uri-router`.
//!
//! A template is a sequence of literal text, variables (`:name`), optional
//! route parts (`[...]`), default values (`:page=1`) and rule lists
//! (`:id(int, between(1, 100))`).

#![warn(
    missing_docs,
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    rust_2018_compatibility,
    unused
)]

pub mod ast;
mod error;
pub mod lexer;
pub mod parser;

pub use crate::{
    ast::{Ast, Node, NodeId, NodeKind, NodeValue},
    error::{Error, ErrorKind, Result},
    lexer::{lex, Number, Token, TokenKind, TokenStream, TokenValue},
};

/// Lexes and parses a URI template.
pub fn parse(template: &str) -> Result<Ast> {
    let tokens = lexer::lex(template)?;
    parser::parse(&tokens)
}
