//! Summaries of a program handed to callers alongside generated code.

use crate::ast::Stage;
use crate::ir::{self, EntryPoint};
use serde::Serialize;
use std::collections::BTreeSet;

/// Derived facts about an analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub uniform_count: usize,
    pub function_count: usize,
    pub entry_point_count: usize,
    pub has_vertex: bool,
    pub has_fragment: bool,
    pub has_compute: bool,
    /// Rough estimate: four per uniform, plus two per parameter and one per
    /// four body lines of every function.
    pub register_pressure: usize,
    pub builtins_used: BTreeSet<String>,
}

impl AnalysisMetadata {
    pub fn from_program(program: &ir::Program, builtins_used: BTreeSet<String>) -> Self {
        let has_stage = |stage: Stage| program.entry_points.iter().any(|e| e.stage == stage);
        let function_pressure: usize = program
            .functions
            .iter()
            .map(|f| {
                let body_lines = f.body.end.line.saturating_sub(f.body.span.line) as usize + 1;
                f.params.len() * 2 + body_lines / 4
            })
            .sum();
        AnalysisMetadata {
            uniform_count: program.uniforms.len(),
            function_count: program.functions.len(),
            entry_point_count: program.entry_points.len(),
            has_vertex: has_stage(Stage::Vertex),
            has_fragment: has_stage(Stage::Fragment),
            has_compute: has_stage(Stage::Compute),
            register_pressure: program.uniforms.len() * 4 + function_pressure,
            builtins_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub group: u32,
    pub binding: u32,
    pub visibility: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
}

/// What a runtime needs to build pipelines without re-parsing the shader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub entry_points: Vec<EntryPoint>,
    pub uniforms: Vec<UniformInfo>,
    pub structs: Vec<StructInfo>,
}

impl Metadata {
    pub fn from_program(program: &ir::Program) -> Self {
        Metadata {
            entry_points: program.entry_points.clone(),
            uniforms: program
                .uniforms
                .iter()
                .map(|u| UniformInfo {
                    name: u.name.clone(),
                    ty: u.ty.to_string(),
                    group: u.group,
                    binding: u.binding,
                    visibility: u.visibility.clone(),
                })
                .collect(),
            structs: program
                .structs
                .iter()
                .map(|s| StructInfo {
                    name: s.name.clone(),
                    fields: s
                        .fields
                        .iter()
                        .map(|f| FieldInfo {
                            name: f.name.clone(),
                            ty: f.ty.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
