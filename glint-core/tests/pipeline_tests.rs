use glint_core::ast::Stage;
use glint_core::ir::StmtKind;
use glint_core::{compile, CompileOptions, Compiler, DiagnosticCode, OptimizationOptions, Severity};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn compile_ok(src: &str) -> glint_core::CompileResult {
    init();
    let result = compile(src, "test.glint", &CompileOptions::default()).expect("no internal error");
    assert!(!result.has_errors(), "{:#?}", result.diagnostics);
    result
}

fn codes(result: &glint_core::CompileResult) -> Vec<DiagnosticCode> {
    result.diagnostics.iter().map(|d| d.code).collect()
}

const ROUND_TRIP: &str = r#"
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@group(0) @binding(0) uniform time: f32;
@group(0) @binding(1) @visibility(fragment) uniform tex: texture_2d<f32>;
@group(1) @binding(0) @visibility(fragment) uniform samp: sampler;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOut {
    let x = f32(index) * 0.5 - 1.0;
    return VertexOut(vec4(x, sin(time), 0.0, 1.0), vec2(x, 0.0));
}

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> vec4<f32> {
    let color = textureSample(tex, samp, uv);
    return color * (2.0 * 0.5);
}
"#;

#[test]
fn test_fragment_only_program() {
    let result = compile_ok(
        "@fragment fn a() -> vec4<f32> { return vec4(1.0); }\n\
         @fragment fn b() -> vec4<f32> { return vec4(0.5); }\n",
    );
    assert_eq!(codes(&result), vec![DiagnosticCode::ComplementaryStage]);
    assert_eq!(result.diagnostics[0].severity, Severity::Hint);
    let names: Vec<_> = result.metadata.entry_points.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(result.code.contains("@fragment fn a() -> @location(0) vec4<f32> {"));
}

#[test]
fn test_type_error_blocks_trust_in_output() {
    init();
    let result = compile(
        "@compute fn main() {\n  let v: vec2<f32> = vec3(1.0, 2.0, 3.0);\n}\n",
        "test.glint",
        &CompileOptions::default(),
    )
    .expect("no internal error");
    assert!(result.has_errors());
    let errors: Vec<_> = result.diagnostics.iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("vec2") && errors[0].message.contains("vec3"));
}

#[test]
fn test_binding_conflict_through_compile() {
    init();
    let result = compile(
        "@group(0) @binding(0) uniform a: f32;\n\
         @group(0) @binding(0) uniform b: f32;\n\
         @compute fn main() { let x = a * b; }\n",
        "test.glint",
        &CompileOptions::default(),
    )
    .expect("no internal error");
    assert_eq!(codes(&result), vec![DiagnosticCode::BindingConflict]);
}

#[test]
fn test_dead_code_after_return_is_removed() {
    init();
    let options = CompileOptions::default();
    let src = "fn f() -> f32 { return 1.0; let x = 2.0; }\n@compute fn main() { let y = f(); }\n";
    let optimized = Compiler::parse(src, "test.glint").analyze(&options).optimize(&options);
    let body = &optimized.ir().function("f").expect("f exists").body;
    assert_eq!(body.stmts.len(), 1);
    assert!(matches!(body.stmts[0].kind, StmtKind::Return(Some(_))));

    let result = optimized.generate(&options).expect("no internal error");
    assert!(result.code.contains("return 1.0;"));
    assert!(!result.code.contains("let x"));
}

#[test]
fn test_optimizations_can_be_disabled() {
    init();
    let options = CompileOptions {
        optimizations: OptimizationOptions::none(),
        ..CompileOptions::default()
    };
    let src = "@compute fn main() { let x = 2.0 * 3.0; return; let y = x; }";
    let result = compile(src, "test.glint", &options).expect("no internal error");
    assert!(result.code.contains("let x = 2.0 * 3.0;"));
    assert!(result.code.contains("let y = x;"));

    let result = compile_ok(src);
    assert!(result.code.contains("let x = 6.0;"));
    assert!(!result.code.contains("let y"));
}

#[test]
fn test_round_trip_preserves_interface() {
    let first = compile_ok(ROUND_TRIP);
    assert!(first.code.contains("@group(0) @binding(0) var<uniform> time: f32;"));
    assert!(first.code.contains("@group(0) @binding(1) var tex: texture_2d<f32>;"));
    assert!(first.code.contains("// visibility: fragment"));
    assert!(first.code.contains("return color * 1.0;"));

    let second = compile_ok(&first.code);
    assert_eq!(second.metadata.entry_points, first.metadata.entry_points);
    assert_eq!(second.metadata.structs, first.metadata.structs);
    let interface = |r: &glint_core::CompileResult| -> Vec<(String, String, u32, u32, Vec<Stage>)> {
        r.metadata
            .uniforms
            .iter()
            .map(|u| (u.name.clone(), u.ty.clone(), u.group, u.binding, u.visibility.clone()))
            .collect()
    };
    assert_eq!(interface(&second), interface(&first));

    let samp = &first.metadata.uniforms[2];
    assert_eq!((samp.group, samp.binding), (1, 0));
    assert_eq!(samp.visibility, vec![Stage::Fragment]);
    assert_eq!(second.metadata.uniforms[2].visibility, vec![Stage::Fragment]);
}

#[test]
fn test_entry_point_decorations() {
    let result = compile_ok(
        "@vertex fn vs() -> vec4<f32> { return vec4(0.0, 0.0, 0.0, 1.0); }\n\
         @fragment fn fs() -> vec4<f32> { return vec4(1.0); }\n\
         @compute fn cs() { var a = 1.0; a = a + 2.0; }\n",
    );
    assert!(result
        .code
        .contains("@vertex fn vs(@builtin(vertex_index) vertex_index: u32) -> @builtin(position) vec4<f32> {"));
    assert!(result.code.contains("@fragment fn fs() -> @location(0) vec4<f32> {"));
    assert!(result
        .code
        .contains("@compute @workgroup_size(64) fn cs(@builtin(global_invocation_id) global_id: vec3<u32>) {"));
}

#[test]
fn test_explicit_workgroup_size_kept() {
    let result = compile_ok("@compute @workgroup_size(8, 8) fn cs(@builtin(global_invocation_id) id: vec3<u32>) {}");
    assert!(result
        .code
        .contains("@compute @workgroup_size(8, 8) fn cs(@builtin(global_invocation_id) id: vec3<u32>) {"));
}

#[test]
fn test_literals_spelled_for_their_type() {
    let result = compile_ok(
        "@compute fn main() {\n  let i: i32 = 2;\n  let u: u32 = 3;\n  let h: f16 = 1.5;\n  let v = vec3(1.0);\n  let c = v[1];\n}\n",
    );
    assert!(result.code.contains("let i: i32 = 2i;"));
    assert!(result.code.contains("let u: u32 = 3u;"));
    assert!(result.code.contains("let h: f16 = 1.5h;"));
    assert!(result.code.contains("let c = v[1i];"));
}

#[test]
fn test_strict_mode_promotes_warnings() {
    init();
    let src = "fn helper() -> f32 { let x = 1.0; }\n@compute fn main() { let y = helper(); }\n";
    let relaxed = compile(src, "test.glint", &CompileOptions::default()).expect("no internal error");
    assert!(!relaxed.has_errors());
    assert_eq!(codes(&relaxed), vec![DiagnosticCode::MissingReturn]);

    let strict = CompileOptions {
        strict_mode: true,
        ..CompileOptions::default()
    };
    let result = compile(src, "test.glint", &strict).expect("no internal error");
    assert!(result.has_errors());
    assert_eq!(result.diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_source_map() {
    init();
    let options = CompileOptions {
        source_maps: true,
        ..CompileOptions::default()
    };
    let result = compile(ROUND_TRIP, "shader.glint", &options).expect("no internal error");
    let map = result.source_map.expect("source map requested");
    assert_eq!(map.file, "shader.glint");
    let vs = map
        .mappings
        .iter()
        .find(|m| m.name.as_deref() == Some("vs_main"))
        .expect("function mapped");
    assert_eq!(vs.source_line, 12);
    let generated = result.code.lines().nth(vs.generated_line as usize - 1).unwrap_or_default();
    assert!(generated.contains("fn vs_main("));

    let plain = compile_ok(ROUND_TRIP);
    assert!(plain.source_map.is_none());
}

#[test]
fn test_unrecoverable_parse_error() {
    init();
    let result = compile("fn broken() {\n  let x = 1.0;\n", "test.glint", &CompileOptions::default())
        .expect("no internal error");
    assert!(result.has_errors());
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::UnexpectedToken);
}

#[test]
fn test_staged_api_exposes_analysis() {
    init();
    let options = CompileOptions::default();
    let analyzed = Compiler::parse(ROUND_TRIP, "test.glint").analyze(&options);
    assert!(!analyzed.has_errors(), "{:#?}", analyzed.diagnostics());
    assert!(analyzed.hints().is_empty());
    let meta = analyzed.metadata();
    assert_eq!(meta.uniform_count, 3);
    assert!(meta.has_vertex && meta.has_fragment);
    assert!(meta.builtins_used.contains("textureSample"));
    assert!(meta.builtins_used.contains("sin"));
}

#[test]
fn test_result_serializes_to_json() {
    let result = compile_ok("@fragment fn main() -> vec4<f32> { return vec4(1.0); }");
    let json = serde_json::to_value(&result).expect("serializable");
    assert_eq!(json["metadata"]["entryPoints"][0]["name"], "main");
    assert_eq!(json["metadata"]["entryPoints"][0]["stage"], "fragment");
    assert_eq!(json["diagnostics"][0]["code"], "GL4010");
    assert_eq!(json["diagnostics"][0]["severity"], "hint");
    assert!(json.get("sourceMap").is_none());
}

#[test]
fn test_deep_nesting_is_a_diagnostic() {
    init();
    let depth = 20_000;
    let src = format!(
        "@compute fn main() {{ let x = {}1.0{}; }}\n@compute fn other() {{ let y = 1.0; }}\n",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let result = compile(&src, "test.glint", &CompileOptions::default()).expect("no internal error");
    assert!(result.has_errors());
    assert_eq!(result.diagnostics[0].code, DiagnosticCode::UnexpectedToken);
    assert!(result.diagnostics[0].message.contains("nested too deeply"));
    assert_eq!(result.metadata.entry_points.len(), 1);
}

#[test]
fn test_nesting_at_limit_compiles() {
    let depth = glint_core::parser::MAX_NESTING_DEPTH - 1;
    let src = format!(
        "@compute fn main() {{ let x = {}1.0{}; }}\n",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let result = compile_ok(&src);
    assert!(result.code.contains("let x = 1.0;"));
}
