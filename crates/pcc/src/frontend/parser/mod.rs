//! Parser module for P source code

mod parser;

pub use parser::Parser;
