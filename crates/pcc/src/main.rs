//! P Compiler - RISC-V compiler for the P language
//!
//! Usage: pcc [OPTIONS] <input>

use anyhow::Context;
use clap::Parser as ClapParser;
use p_compiler::backend::BackendConfig;
use p_compiler::common::{DiagnosticReporter, DiagnosticStyle};
use p_compiler::driver::{output_path, FrontendConfig, Pipeline};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "pcc")]
#[command(author = "P Compiler Team")]
#[command(version)]
#[command(about = "Compiler for the P language targeting RISC-V (RV32IF)", long_about = None)]
struct Args {
    /// Input source file
    #[arg(required = true)]
    input: PathBuf,

    /// Directory for the generated `.S` file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print each scope's symbol table when it is closed
    #[arg(long)]
    dump_symbols: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Render diagnostics with source snippets and colors
    #[arg(long)]
    pretty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let style = if args.pretty {
        DiagnosticStyle::Pretty
    } else {
        DiagnosticStyle::Classic
    };
    let reporter = DiagnosticReporter::new(filename.clone(), source.clone()).with_style(style);

    let output_path = output_path(&args.input, &args.output_dir);
    log::info!("compiling {} -> {}", filename, output_path.display());

    let frontend_config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        dump_symbols: args.dump_symbols,
    };
    let source_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.clone());
    let backend_config = BackendConfig { source_name };

    let pipeline = Pipeline::new();
    let output = match pipeline.compile(&source, &frontend_config, &backend_config, &reporter) {
        Ok(output) => output,
        Err(e) => {
            reporter.report_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    output
        .write_to(&output_path)
        .with_context(|| format!("cannot write {}", output_path.display()))?;
    log::info!("successfully compiled to {}", output_path.display());

    Ok(ExitCode::SUCCESS)
}
