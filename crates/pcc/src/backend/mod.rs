//! Backend trait and implementations
//!
//! A backend turns an analyzed program and its symbol tables into target
//! output. Generation only runs on programs without semantic errors.

pub mod riscv;

use crate::common::CompileResult;
use crate::frontend::ast::Program;
use crate::sema::SymbolTables;
use std::path::Path;

pub use riscv::RiscvBackend;

/// Configuration options for backends
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Name recorded in the output's file directive
    pub source_name: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            source_name: String::from("main.p"),
        }
    }
}

/// Output from a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutput {
    /// Assembly text
    Text(String),
}

impl BackendOutput {
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        match self {
            BackendOutput::Text(s) => std::fs::write(path, s),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BackendOutput::Text(s) => Some(s),
        }
    }
}

/// Trait for code generation backends
pub trait Backend: Send + Sync {
    /// The name of this backend (e.g., "riscv")
    fn name(&self) -> &'static str;

    /// Target architecture description
    fn target(&self) -> &'static str;

    /// Generate output from an analyzed program
    fn generate(
        &self,
        program: &Program,
        tables: &SymbolTables,
        config: &BackendConfig,
    ) -> CompileResult<BackendOutput>;
}
