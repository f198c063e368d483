//! Lexer module for tokenizing P source code

mod scanner;
mod token;

pub use scanner::Lexer;
pub use token::{Token, TokenKind};
