//! Compilation driver and pipeline orchestration

use crate::backend::{Backend, BackendConfig, BackendOutput, RiscvBackend};
use crate::common::{CompileError, CompileResult, DiagnosticReporter};
use crate::frontend::{parse, Lexer, Program};
use crate::sema::{Analysis, SemanticAnalyzer};
use std::path::{Path, PathBuf};

/// Extension of generated assembly files
pub const OUTPUT_EXTENSION: &str = "S";

/// Front end and analysis options
#[derive(Debug, Clone, Default)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    /// Print each scope's symbol table when it is closed
    pub dump_symbols: bool,
}

/// Compilation pipeline: parse, analyze, then generate
pub struct Pipeline {
    backend: Box<dyn Backend>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_backend(Box::new(RiscvBackend::new()))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Parse and analyze `source`, reporting every semantic error
    ///
    /// Fails with [`CompileError::Semantic`] when any error was found, so
    /// that generation never runs on an erroneous program.
    pub fn check(
        &self,
        source: &str,
        config: &FrontendConfig,
        reporter: &DiagnosticReporter,
    ) -> CompileResult<(Program, Analysis)> {
        if config.dump_tokens {
            let tokens = Lexer::new(source).tokenize_all()?;
            eprintln!("=== Tokens ===");
            for token in &tokens {
                eprintln!("{:>5}..{:<5} {}", token.span.start, token.span.end, token.kind);
            }
            eprintln!("=== End Tokens ===\n");
        }

        log::info!("parsing");
        let mut program = parse(source)?;

        if config.dump_ast {
            eprintln!("=== AST ===");
            eprintln!("{:#?}", program);
            eprintln!("=== End AST ===\n");
        }

        log::info!("running semantic analysis");
        let analysis = SemanticAnalyzer::new()
            .with_symbol_dump(config.dump_symbols)
            .analyze(&mut program);

        for dump in &analysis.symbol_dumps {
            eprint!("{}", dump);
        }
        for diagnostic in &analysis.diagnostics {
            reporter.report(&diagnostic.message, diagnostic.span);
        }
        if analysis.has_errors() {
            return Err(CompileError::semantic(analysis.diagnostics.len()));
        }

        Ok((program, analysis))
    }

    /// Compile `source` all the way to backend output
    pub fn compile(
        &self,
        source: &str,
        frontend: &FrontendConfig,
        backend: &BackendConfig,
        reporter: &DiagnosticReporter,
    ) -> CompileResult<BackendOutput> {
        let (program, analysis) = self.check(source, frontend, reporter)?;
        log::info!("generating code with the {} backend", self.backend.name());
        self.backend.generate(&program, &analysis.tables, backend)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// `<output_dir>/<input stem>.S`
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("out"));
    output_dir.join(format!("{}.{}", stem, OUTPUT_EXTENSION))
}
