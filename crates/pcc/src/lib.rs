//! P Compiler - semantic analysis and RISC-V code generation for P
//!
//! P is a small typed imperative language with scalar and array
//! variables, functions, `if`/`while`/`for` and `print`/`read`.
//!
//! ## Architecture
//!
//! - **Common** (`common/`): errors, spans and diagnostic rendering
//! - **Types** (`types/`): the type model shared by every phase
//! - **Frontend** (`frontend/`): lexer, parser and AST
//! - **Sema** (`sema/`): scope manager and semantic analyzer
//! - **Backends** (`backend/`): stack-machine code generation (RISC-V)
//! - **Driver** (`driver/`): pipeline orchestration

pub mod backend;
pub mod common;
pub mod driver;
pub mod frontend;
pub mod sema;
pub mod types;

// Re-exports for convenience
pub use backend::{Backend, BackendConfig, BackendOutput};
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use driver::{FrontendConfig, Pipeline};
