//! Error types and diagnostic reporting

use std::io::Write;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{Files, SimpleFile};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use super::Span;

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    /// Semantic errors are reported one by one while the analyzer runs;
    /// this variant only carries the tally back to the driver.
    #[error("{count} semantic error(s) found")]
    Semantic { count: usize },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(count: usize) -> Self {
        Self::Semantic { count }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// 1-based line and column of a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// How diagnostics are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticStyle {
    /// `<Error> Found in line L, column C: ...` followed by the line and a caret
    #[default]
    Classic,
    /// Labelled, colored output from codespan-reporting
    Pretty,
}

/// Diagnostic reporter bound to one source file
pub struct DiagnosticReporter {
    file: SimpleFile<String, String>,
    writer: StandardStream,
    config: term::Config,
    style: DiagnosticStyle,
}

impl DiagnosticReporter {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            file: SimpleFile::new(name.into(), source.into()),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
            style: DiagnosticStyle::Classic,
        }
    }

    pub fn with_style(mut self, style: DiagnosticStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> DiagnosticStyle {
        self.style
    }

    /// Line and column (both 1-based) of the start of `span`
    pub fn location(&self, span: Span) -> SourceLocation {
        let byte = span.start.min(self.file.source().len());
        let line_index = self.file.line_index((), byte).unwrap_or(0);
        let column = self.file.column_number((), line_index, byte).unwrap_or(1);
        SourceLocation {
            line: line_index + 1,
            column,
        }
    }

    /// Text of a 1-based source line, without its line terminator
    pub fn source_line(&self, line: usize) -> &str {
        let Some(line_index) = line.checked_sub(1) else {
            return "";
        };
        match self.file.line_range((), line_index) {
            Ok(range) => self.file.source()[range].trim_end_matches(['\n', '\r']),
            Err(_) => "",
        }
    }

    /// Render one error in the classic three-line format
    pub fn format_error(&self, message: &str, span: Span) -> String {
        let loc = self.location(span);
        format!(
            "<Error> Found in line {}, column {}: {}\n    {}\n    {}^\n",
            loc.line,
            loc.column,
            message,
            self.source_line(loc.line),
            " ".repeat(loc.column.saturating_sub(1)),
        )
    }

    /// Report an error located at `span`
    pub fn report(&self, message: &str, span: Span) {
        match self.style {
            DiagnosticStyle::Classic => {
                let text = self.format_error(message, span);
                let _ = self.writer.lock().write_all(text.as_bytes());
            }
            DiagnosticStyle::Pretty => {
                let diagnostic = Diagnostic::error()
                    .with_message(message)
                    .with_labels(vec![Label::primary((), span.start..span.end)]);
                self.emit(&diagnostic);
            }
        }
    }

    /// Report a pipeline error
    pub fn report_error(&self, error: &CompileError) {
        match error {
            CompileError::Lexer { message, span } | CompileError::Parser { message, span } => {
                if self.style == DiagnosticStyle::Classic {
                    self.report(message, *span);
                    return;
                }
                let title = if matches!(error, CompileError::Lexer { .. }) {
                    "Lexer error"
                } else {
                    "Syntax error"
                };
                let diagnostic = Diagnostic::error()
                    .with_message(title)
                    .with_labels(vec![
                        Label::primary((), span.start..span.end).with_message(message)
                    ]);
                self.emit(&diagnostic);
            }

            CompileError::Semantic { .. } => {
                self.emit(&Diagnostic::error().with_message(error.to_string()));
            }

            CompileError::Codegen { message } => {
                self.emit(&Diagnostic::error().with_message(format!("Code generation error: {}", message)));
            }

            CompileError::Backend { message } => {
                self.emit(&Diagnostic::error().with_message(format!("Backend error: {}", message)));
            }

            CompileError::Io(err) => {
                self.emit(&Diagnostic::error().with_message(format!("IO error: {}", err)));
            }
        }
    }

    fn emit(&self, diagnostic: &Diagnostic<()>) {
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.file, diagnostic);
    }
}
