//! Type model shared by the analyzer and the code generator
//!
//! A type is a primitive kind plus an ordered list of array dimensions.
//! Scalars have no dimensions.

mod ptype;

pub use ptype::{PType, PrimitiveType, WORD_SIZE};
