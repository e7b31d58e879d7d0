//! Compiler for the glint shading language.
//!
//! Source text flows through a fixed pipeline: the parser builds an AST, the
//! analyzer types and validates it into the IR, the optimizer simplifies the
//! IR and the WGSL backend emits shader text. Problems in the source are
//! reported as [`Diagnostic`] values at every stage; an `Err` from this crate
//! always means a compiler bug.
//!
//! [`compile`] runs the whole pipeline. The staged API starting at
//! [`Compiler::parse`] exposes each intermediate result.

pub mod analyzer;
pub mod ast;
pub mod builtins;
pub mod constant_folding;
pub mod dead_code;
pub mod diagnostics;
pub mod error;
pub mod inference;
pub mod ir;
pub mod lexer;
pub mod metadata;
pub mod optimize;
pub mod options;
pub mod parser;
pub mod scope;
pub mod source;
pub mod types;
pub mod wgsl;

#[cfg(test)]
mod analyzer_tests;



pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticRenderer, OutputFormat, Severity};
pub use error::{CompilerError, Result};
pub use metadata::{AnalysisMetadata, Metadata};
pub use options::{CompileOptions, OptimizationOptions};
pub use source::SourceFile;
pub use wgsl::SourceMap;

use log::debug;
use serde::Serialize;

/// Output of a full compilation.
///
/// `code` is produced even when the program has errors, but it should only
/// be used when [`CompileResult::has_errors`] is false.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMap>,
    pub metadata: Metadata,
    /// Parse and analysis diagnostics followed by hints.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compile `source` to WGSL.
pub fn compile(source: &str, filename: &str, options: &CompileOptions) -> Result<CompileResult> {
    Compiler::parse(source, filename)
        .analyze(options)
        .optimize(options)
        .generate(options)
}

/// Entry point of the staged pipeline.
pub struct Compiler;

impl Compiler {
    pub fn parse(source: &str, filename: &str) -> Parsed {
        let source = SourceFile::new(filename, source);
        let (program, diagnostics) = parser::parse(&source);
        debug!(
            "parsed {}: {} declaration(s), {} diagnostic(s)",
            filename,
            program.declarations.len(),
            diagnostics.len()
        );
        Parsed {
            source,
            program,
            diagnostics,
        }
    }
}

/// A parsed program, possibly partial if the source had syntax errors.
pub struct Parsed {
    source: SourceFile,
    program: ast::Program,
    diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn program(&self) -> &ast::Program {
        &self.program
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn analyze(self, options: &CompileOptions) -> Analyzed {
        let analysis = analyzer::analyze(&self.program);
        let mut diagnostics = self.diagnostics;
        diagnostics.extend(analysis.diagnostics);
        if options.strict_mode {
            diagnostics = promote_warnings(diagnostics);
        }
        Analyzed {
            source: self.source,
            ir: analysis.ir,
            diagnostics,
            hints: analysis.hints,
            metadata: analysis.metadata,
        }
    }
}

/// Every warning becomes an error; other severities are unchanged.
pub fn promote_warnings(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| match d.severity {
            Severity::Warning => d.with_severity(Severity::Error),
            _ => d,
        })
        .collect()
}

/// A typed and validated program.
pub struct Analyzed {
    source: SourceFile,
    ir: ir::Program,
    diagnostics: Vec<Diagnostic>,
    hints: Vec<Diagnostic>,
    metadata: AnalysisMetadata,
}

impl Analyzed {
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn ir(&self) -> &ir::Program {
        &self.ir
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Parse and analysis errors and warnings.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn hints(&self) -> &[Diagnostic] {
        &self.hints
    }

    pub fn metadata(&self) -> &AnalysisMetadata {
        &self.metadata
    }

    pub fn optimize(self, options: &CompileOptions) -> Optimized {
        let ir = optimize::optimize(self.ir, &options.optimizations);
        Optimized {
            source: self.source,
            ir,
            diagnostics: self.diagnostics,
            hints: self.hints,
        }
    }
}

/// An optimized program, ready for code generation.
pub struct Optimized {
    source: SourceFile,
    ir: ir::Program,
    diagnostics: Vec<Diagnostic>,
    hints: Vec<Diagnostic>,
}

impl Optimized {
    pub fn ir(&self) -> &ir::Program {
        &self.ir
    }

    pub fn generate(self, options: &CompileOptions) -> Result<CompileResult> {
        let output = wgsl::lower(&self.ir, self.source.name(), options.source_maps)?;
        let mut diagnostics = self.diagnostics;
        diagnostics.extend(self.hints);
        Ok(CompileResult {
            code: output.code,
            source_map: output.source_map,
            metadata: Metadata::from_program(&self.ir),
            diagnostics,
        })
    }
}
