//! The stable enumeration of diagnostic codes.
//!
//! Codes render as `GL` plus four digits. The leading digit is the category
//! band, so consumers can classify a diagnostic from its code prefix alone.

use super::{Category, Severity};
use serde::{Serialize, Serializer};
use std::fmt;

/// Relative location of the diagnostic reference documentation.
pub const DOCS_BASE: &str = "docs/diagnostics.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // syntax
    UnexpectedToken,
    InvalidCharacter,
    InvalidNumber,
    ExpectedItem,
    UnknownDecorator,
    InvalidDecoratorArgument,
    // type
    TypeMismatch,
    InvalidSwizzle,
    VectorSizeMismatch,
    WrongArgumentCount,
    InvalidOperandTypes,
    ConstructorComponentMismatch,
    UnknownField,
    NotIndexable,
    ReturnTypeMismatch,
    MatrixDimensionMismatch,
    // scope
    UndefinedVariable,
    UndefinedFunction,
    DuplicateDeclaration,
    UseBeforeDeclaration,
    UnknownStruct,
    // semantic
    MissingReturn,
    NoEntryPoints,
    BindingConflict,
    EmptyStruct,
    DuplicateField,
    FragmentReturnsVoid,
    UnrecognizedType,
    AssignToImmutable,
    InvalidEntryPoint,
    ComplementaryStage,
    // performance
    DivisionInBody,
    SmallIntegerPow,
    UniformPacking,
    // style
    UnusedFunction,
    /// Instrumentation fallback; no call site relies on it.
    Unclassified,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        use DiagnosticCode::*;
        match self {
            UnexpectedToken => "GL1001",
            InvalidCharacter => "GL1002",
            InvalidNumber => "GL1003",
            ExpectedItem => "GL1004",
            UnknownDecorator => "GL1005",
            InvalidDecoratorArgument => "GL1006",
            TypeMismatch => "GL2001",
            InvalidSwizzle => "GL2002",
            VectorSizeMismatch => "GL2003",
            WrongArgumentCount => "GL2004",
            InvalidOperandTypes => "GL2005",
            ConstructorComponentMismatch => "GL2006",
            UnknownField => "GL2007",
            NotIndexable => "GL2008",
            ReturnTypeMismatch => "GL2009",
            MatrixDimensionMismatch => "GL2010",
            UndefinedVariable => "GL3001",
            UndefinedFunction => "GL3002",
            DuplicateDeclaration => "GL3003",
            UseBeforeDeclaration => "GL3004",
            UnknownStruct => "GL3005",
            MissingReturn => "GL4001",
            NoEntryPoints => "GL4002",
            BindingConflict => "GL4003",
            EmptyStruct => "GL4004",
            DuplicateField => "GL4005",
            FragmentReturnsVoid => "GL4006",
            UnrecognizedType => "GL4007",
            AssignToImmutable => "GL4008",
            InvalidEntryPoint => "GL4009",
            ComplementaryStage => "GL4010",
            DivisionInBody => "GL5001",
            SmallIntegerPow => "GL5002",
            UniformPacking => "GL5003",
            UnusedFunction => "GL6001",
            Unclassified => "GL0000",
        }
    }

    pub fn category(&self) -> Category {
        match self.as_str().as_bytes()[2] {
            b'1' => Category::Syntax,
            b'2' => Category::Type,
            b'3' => Category::Scope,
            b'4' => Category::Semantic,
            b'5' => Category::Performance,
            b'6' => Category::Style,
            _ => Category::Unclassified,
        }
    }

    pub fn default_severity(&self) -> Severity {
        use DiagnosticCode::*;
        match self {
            MissingReturn | EmptyStruct | FragmentReturnsVoid | UnrecognizedType => Severity::Warning,
            ComplementaryStage | DivisionInBody | SmallIntegerPow | UniformPacking | UnusedFunction => {
                Severity::Hint
            }
            Unclassified => Severity::Info,
            _ => Severity::Error,
        }
    }

    pub fn doc_url(&self) -> String {
        format!("{}#{}", DOCS_BASE, self.as_str().to_ascii_lowercase())
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_match_categories() {
        assert_eq!(DiagnosticCode::InvalidCharacter.category(), Category::Syntax);
        assert_eq!(DiagnosticCode::InvalidSwizzle.category(), Category::Type);
        assert_eq!(DiagnosticCode::UndefinedVariable.category(), Category::Scope);
        assert_eq!(DiagnosticCode::BindingConflict.category(), Category::Semantic);
        assert_eq!(DiagnosticCode::SmallIntegerPow.category(), Category::Performance);
        assert_eq!(DiagnosticCode::UnusedFunction.category(), Category::Style);
        assert_eq!(DiagnosticCode::Unclassified.category(), Category::Unclassified);
    }

    #[test]
    fn test_doc_url() {
        assert_eq!(DiagnosticCode::TypeMismatch.doc_url(), "docs/diagnostics.md#gl2001");
    }
}
