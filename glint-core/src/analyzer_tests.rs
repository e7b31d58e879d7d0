#![cfg(test)]

use crate::analyzer::{analyze, Analysis};
use crate::ast::{Literal, NumberKind, Stage};
use crate::diagnostics::{Category, Diagnostic, DiagnosticCode, Severity};
use crate::ir::{ExprKind, StmtKind};
use crate::parser::parse;
use crate::source::SourceFile;
use crate::types::{Primitive, Type};

fn analyze_src(src: &str) -> Analysis {
    let (program, diagnostics) = parse(&SourceFile::new("test.glint", src));
    assert!(diagnostics.is_empty(), "parse failed: {:#?}", diagnostics);
    analyze(&program)
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn errors(analysis: &Analysis) -> Vec<&Diagnostic> {
    analysis.diagnostics.iter().filter(|d| d.is_error()).collect()
}

#[test]
fn test_fragment_only_program_gets_vertex_hint() {
    let analysis = analyze_src(
        "@fragment fn a() -> vec4<f32> { return vec4(1.0); }\n\
         @fragment fn b() -> vec4<f32> { return vec4(0.0); }\n",
    );
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
    assert_eq!(codes(&analysis.hints), vec![DiagnosticCode::ComplementaryStage]);
    assert!(analysis.hints[0].message.contains("vertex"));
    let entries: Vec<_> = analysis.ir.entry_points.iter().map(|e| (e.name.as_str(), e.stage)).collect();
    assert_eq!(entries, vec![("a", Stage::Fragment), ("b", Stage::Fragment)]);
}

#[test]
fn test_constructor_assigned_to_narrower_binding() {
    let analysis = analyze_src(
        "@compute fn main() {\n  let v: vec2<f32> = vec3(1.0, 2.0, 3.0);\n}\n",
    );
    let errors = errors(&analysis);
    assert_eq!(errors.len(), 1, "{:#?}", errors);
    assert_eq!(errors[0].category, Category::Type);
    assert!(errors[0].message.contains("vec2"));
    assert!(errors[0].message.contains("vec3"));
    assert_eq!(errors[0].location.map(|s| s.line), Some(2));
}

#[test]
fn test_misspelled_variable_suggests_closest_name() {
    let analysis = analyze_src(
        "@compute fn main() {\n  let position = vec3(1.0);\n  let p = positon * 2.0;\n}\n",
    );
    let diag = &analysis.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::UndefinedVariable);
    assert_eq!(diag.suggestions.first().map(String::as_str), Some("position"));
    assert_eq!(diag.fixes[0].replacement, "position");
    assert_eq!(analysis.diagnostics.len(), 1);
}

#[test]
fn test_binding_conflict_reported_once_with_both_names() {
    let analysis = analyze_src(
        "@group(0) @binding(0) uniform first: f32;\n\
         @group(0) @binding(0) uniform second: f32;\n\
         @group(0) @binding(1) uniform third: f32;\n\
         @compute fn main() { let x = first + second + third; }\n",
    );
    let conflicts: Vec<_> = analysis
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::BindingConflict)
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].message.contains("`first`"));
    assert!(conflicts[0].message.contains("`second`"));
    assert_eq!(conflicts[0].location.map(|s| s.line), Some(2));
    assert_eq!(conflicts[0].related_information[0].location.map(|s| s.line), Some(1));
}

#[test]
fn test_struct_checks() {
    let analysis = analyze_src(
        "struct Empty {}\n\
         struct Twice { a: f32, a: f32 }\n\
         @compute fn main() {}\n",
    );
    let found = codes(&analysis.diagnostics);
    assert_eq!(found, vec![DiagnosticCode::EmptyStruct, DiagnosticCode::DuplicateField]);
    assert_eq!(analysis.diagnostics[0].severity, Severity::Warning);
    assert_eq!(analysis.diagnostics[1].severity, Severity::Error);
}

#[test]
fn test_structs_resolve_in_any_order() {
    let analysis = analyze_src(
        "struct A { b: B }\n\
         struct B { x: f32 }\n\
         @compute fn main() {\n  let a = A(B(1.0));\n  let x: f32 = a.b.x;\n}\n",
    );
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
    let a = &analysis.ir.structs[0];
    assert_eq!(a.fields[0].ty.to_string(), "B");
    assert!(matches!(&a.fields[0].ty.resolved, Some(Type::Struct { name, .. }) if name == "B"));
}

#[test]
fn test_recursive_struct_is_rejected() {
    let analysis = analyze_src("struct Node { value: f32, next: Node }\n@compute fn main() {}\n");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::UnknownStruct]);
}

#[test]
fn test_unknown_type_names() {
    let analysis = analyze_src(
        "struct Light { c: f32 }\n\
         @compute fn main() {\n  let a: Lihgt = Light(1.0);\n  let b: flaot = 2.0;\n}\n",
    );
    let found = codes(&analysis.diagnostics);
    assert_eq!(found, vec![DiagnosticCode::UnknownStruct, DiagnosticCode::UnrecognizedType]);
    assert_eq!(analysis.diagnostics[0].suggestions, vec!["Light".to_string()]);
    assert_eq!(analysis.diagnostics[1].severity, Severity::Warning);
}

#[test]
fn test_missing_return_is_a_warning() {
    let analysis = analyze_src(
        "fn helper() -> f32 { let x = 1.0; }\n\
         @compute fn main() { let y = helper(); }\n",
    );
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::MissingReturn]);
    assert_eq!(analysis.diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_return_in_nested_block_counts() {
    let analysis = analyze_src(
        "fn helper() -> f32 { { return 1.0; } }\n\
         @compute fn main() { let y = helper(); }\n",
    );
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
}

#[test]
fn test_return_type_mismatch() {
    let analysis = analyze_src("@fragment fn main() -> vec4<f32> { return vec3(1.0); }");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::ReturnTypeMismatch]);
}

#[test]
fn test_entry_point_checks() {
    let analysis = analyze_src("@fragment fn main() {}");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::FragmentReturnsVoid]);
    assert!(analysis.diagnostics[0].message.contains("did you forget to return a color"));

    let analysis = analyze_src("@compute fn main() -> f32 { return 1.0; }");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::InvalidEntryPoint]);

    let analysis = analyze_src("fn helper() {}");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::NoEntryPoints]);
    assert_eq!(codes(&analysis.hints), vec![DiagnosticCode::UnusedFunction]);
}

#[test]
fn test_use_before_declaration() {
    let analysis = analyze_src("@compute fn main() {\n  let a = b;\n  let b = 1.0;\n}\n");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::UseBeforeDeclaration]);
    assert_eq!(
        analysis.diagnostics[0].related_information[0].location.map(|s| s.line),
        Some(3)
    );
}

#[test]
fn test_assignment_requires_var() {
    let analysis = analyze_src("@compute fn main() {\n  let a = 1.0;\n  var b = 2.0;\n  b = a;\n  a = b;\n}\n");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::AssignToImmutable]);
    assert_eq!(analysis.diagnostics[0].location.map(|s| s.line), Some(5));
}

#[test]
fn test_duplicate_local_in_same_scope() {
    let analysis = analyze_src("@compute fn main() {\n  let a = 1.0;\n  { let a = 2.0; }\n  let a = 3.0;\n}\n");
    assert_eq!(codes(&analysis.diagnostics), vec![DiagnosticCode::DuplicateDeclaration]);
    assert_eq!(analysis.diagnostics[0].location.map(|s| s.line), Some(4));
}

#[test]
fn test_undefined_function_suggests_builtin() {
    let analysis = analyze_src("@compute fn main() {\n  let n = normalise(vec3(1.0));\n}\n");
    let diag = &analysis.diagnostics[0];
    assert_eq!(diag.code, DiagnosticCode::UndefinedFunction);
    assert_eq!(diag.suggestions.first().map(String::as_str), Some("normalize"));
    assert_eq!(diag.fixes[0].location.len, "normalise".len());
}

#[test]
fn test_unused_helper_hint() {
    let analysis = analyze_src(
        "fn used() -> f32 { return 1.0; }\n\
         fn unused() -> f32 { return unused(); }\n\
         @compute fn main() { let x = used(); }\n",
    );
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
    assert_eq!(codes(&analysis.hints), vec![DiagnosticCode::UnusedFunction]);
    assert!(analysis.hints[0].message.contains("`unused`"));
}

#[test]
fn test_performance_hints() {
    let analysis = analyze_src(
        "@compute fn main() {\n  let x = 2.0 / 3.0;\n  let y = pow(x, 2) / 4.0;\n  let z = pow(x, 2.5);\n  let w = pow(x, 3.0);\n}\n",
    );
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
    assert_eq!(
        codes(&analysis.hints),
        vec![
            DiagnosticCode::DivisionInBody,
            DiagnosticCode::SmallIntegerPow,
            DiagnosticCode::SmallIntegerPow
        ]
    );
    assert!(analysis.hints[0].message.contains("2 division(s)"));
    assert!(analysis.hints[2].message.contains("exponent 3"));
    assert_eq!(analysis.hints[2].location.map(|s| s.line), Some(5));
}

#[test]
fn test_uniform_packing_hint() {
    let mut src = String::new();
    for i in 0..17 {
        src.push_str(&format!("@group(0) @binding({}) uniform u{}: f32;\n", i, i));
    }
    src.push_str("@compute fn main() {}\n");
    let analysis = analyze_src(&src);
    assert_eq!(codes(&analysis.hints), vec![DiagnosticCode::UniformPacking]);
    assert_eq!(analysis.metadata.uniform_count, 17);
}

#[test]
fn test_metadata() {
    let analysis = analyze_src(
        "@group(0) @binding(0) uniform t: f32;\n\
         fn helper(a: f32, b: f32) -> f32 { return max(a, b); }\n\
         @vertex fn vs() -> vec4<f32> { return vec4(sin(t), helper(t, 1.0), 0.0, 1.0); }\n\
         @fragment fn fs() -> vec4<f32> { return vec4(1.0); }\n",
    );
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
    assert!(analysis.hints.is_empty(), "{:#?}", analysis.hints);
    let meta = &analysis.metadata;
    assert_eq!((meta.uniform_count, meta.function_count, meta.entry_point_count), (1, 3, 2));
    assert!(meta.has_vertex && meta.has_fragment && !meta.has_compute);
    assert_eq!(meta.register_pressure, 8);
    let builtins: Vec<_> = meta.builtins_used.iter().map(String::as_str).collect();
    assert_eq!(builtins, vec!["max", "sin"]);
}

#[test]
fn test_declared_type_coerces_literal() {
    let analysis = analyze_src("@compute fn main() {\n  let i: i32 = 2;\n  var u: u32 = 7;\n}\n");
    assert!(analysis.diagnostics.is_empty(), "{:#?}", analysis.diagnostics);
    let stmts = &analysis.ir.functions[0].body.stmts;
    match &stmts[0].kind {
        StmtKind::Let { value, .. } => {
            assert_eq!(value.ty, Some(Type::Primitive(Primitive::I32)));
            assert!(matches!(&value.kind, ExprKind::Literal(Literal::Number(n)) if n.kind == NumberKind::I32));
        }
        other => panic!("expected let, got {:?}", other),
    }
    match &stmts[1].kind {
        StmtKind::Var { value: Some(value), .. } => assert_eq!(value.ty, Some(Type::Primitive(Primitive::U32))),
        other => panic!("expected var, got {:?}", other),
    }
}
