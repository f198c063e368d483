//! Common infrastructure shared by the front end, analyzer and backend

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter, DiagnosticStyle, SourceLocation};
pub use span::Span;
