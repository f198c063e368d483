//! P language front end
//!
//! Lexing and parsing produce a [`Program`] whose expression nodes carry
//! empty type slots for the analyzer to fill in.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::common::CompileResult;

/// Parse P source text into a program tree
pub fn parse(source: &str) -> CompileResult<Program> {
    Parser::new(source)?.parse()
}
