//! Mapping from generated WGSL positions back to the source.

use crate::ast::Span;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_line: u32,
    pub source_column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    pub file: String,
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new(file: impl Into<String>) -> Self {
        SourceMap {
            file: file.into(),
            mappings: Vec::new(),
        }
    }

    pub fn add(&mut self, generated_line: u32, generated_column: u32, source: Span, name: Option<&str>) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_line: source.line,
            source_column: source.column,
            name: name.map(str::to_string),
        });
    }

    /// The source position of the closest mapping at or before a generated line.
    pub fn lookup(&self, generated_line: u32) -> Option<&Mapping> {
        self.mappings
            .iter()
            .filter(|m| m.generated_line <= generated_line)
            .max_by_key(|m| (m.generated_line, m.generated_column))
    }
}
