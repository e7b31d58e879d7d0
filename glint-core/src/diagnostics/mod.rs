//! Diagnostic types shared by every compiler stage.
//!
//! Stages only ever append to a [`Diagnostics`] collection; a [`Diagnostic`]
//! is never edited after it has been pushed.

pub mod codes;
pub mod render;
pub mod suggest;

pub use codes::DiagnosticCode;
pub use render::{DiagnosticRenderer, OutputFormat};
pub use suggest::{find_similar_names, DEFAULT_MAX_DISTANCE};

use crate::ast::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Syntax,
    Type,
    Scope,
    Semantic,
    Performance,
    Style,
    Unclassified,
}

/// A secondary location that helps explain a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedInformation {
    pub message: String,
    pub location: Option<Span>,
}

/// A mechanical edit that resolves a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fix {
    pub description: String,
    pub location: Span,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub category: Category,
    pub message: String,
    pub location: Option<Span>,
    pub suggestions: Vec<String>,
    pub related_information: Vec<RelatedInformation>,
    pub fixes: Vec<Fix>,
    pub doc_url: Option<String>,
}

impl Diagnostic {
    /// A diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: code.default_severity(),
            code,
            category: code.category(),
            message: message.into(),
            location: None,
            suggestions: Vec::new(),
            related_information: Vec::new(),
            fixes: Vec::new(),
            doc_url: Some(code.doc_url()),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(code, message).with_severity(Severity::Error)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(code, message).with_severity(Severity::Warning)
    }

    pub fn hint(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(code, message).with_severity(Severity::Hint)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.location = Some(span);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(suggestions.into_iter().map(Into::into));
        self
    }

    pub fn with_related(mut self, message: impl Into<String>, location: Option<Span>) -> Self {
        self.related_information.push(RelatedInformation {
            message: message.into(),
            location,
        });
        self
    }

    pub fn with_fix(mut self, description: impl Into<String>, location: Span, replacement: impl Into<String>) -> Self {
        self.fixes.push(Fix {
            description: description.into(),
            location,
            replacement: replacement.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(span) = self.location {
            write!(f, " at {}:{}", span.line, span.column)?;
        }
        Ok(())
    }
}

/// An append-only collection of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diags);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
