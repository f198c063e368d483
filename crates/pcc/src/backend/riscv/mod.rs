//! RISC-V code generation backend
//!
//! Lowers an analyzed P program to RV32IF assembly in GNU `as` syntax.

mod emit;
mod riscv;

pub use emit::CodeGenerator;
pub use riscv::*;

use crate::backend::{Backend, BackendConfig, BackendOutput};
use crate::common::CompileResult;
use crate::frontend::ast::Program;
use crate::sema::SymbolTables;

/// RISC-V assembly backend
pub struct RiscvBackend;

impl RiscvBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RiscvBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for RiscvBackend {
    fn name(&self) -> &'static str {
        "riscv"
    }

    fn target(&self) -> &'static str {
        "RISC-V RV32IF"
    }

    fn generate(
        &self,
        program: &Program,
        tables: &SymbolTables,
        config: &BackendConfig,
    ) -> CompileResult<BackendOutput> {
        log::info!("generating RISC-V assembly");

        let mut codegen = CodeGenerator::new(tables).with_file_name(config.source_name.clone());
        let asm = codegen.generate(program)?;

        Ok(BackendOutput::Text(asm))
    }
}
