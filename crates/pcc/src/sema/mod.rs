//! Semantic analysis
//!
//! Scope resolution, type checking and the symbol tables consumed by the
//! code generator.

mod analyzer;
mod scope;

pub use analyzer::{constant_int, Analysis, ErrorKind, SemanticAnalyzer, SemanticDiagnostic};
pub use scope::{
    Attribute, DeclareError, FrameLayout, Location, Scope, ScopeManager, SymbolEntry, SymbolKind,
    SymbolTables, MIN_FRAME_SIZE, SAVED_REGISTER_BYTES,
};
