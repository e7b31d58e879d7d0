use super::*;

/// Parse and require that no diagnostics were produced.
fn expect_parse(input: &str) -> Program {
    let (program, diagnostics) = parse(&SourceFile::new("test.glint", input));
    if !diagnostics.is_empty() {
        println!("Parsed AST: {:#?}", program);
        panic!("unexpected diagnostics: {:#?}", diagnostics);
    }
    program
}

fn parse_with_diagnostics(input: &str) -> (Program, Vec<Diagnostic>) {
    parse(&SourceFile::new("test.glint", input))
}

fn only_function(program: &Program) -> &FunctionDecl {
    match program.declarations.as_slice() {
        [Declaration::Function(f)] => f,
        other => panic!("expected a single function, got {:#?}", other),
    }
}

fn parse_expr(input: &str) -> Expr {
    let program = expect_parse(&format!("fn f() {{ {}; }}", input));
    match &only_function(&program).body.stmts[0].kind {
        StmtKind::Expr(e) => e.clone(),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

/// Render an expression with explicit parentheses for precedence checks.
fn sexpr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Number(n)) => n.value.to_string(),
        ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::Binary { op, lhs, rhs } => format!("({} {} {})", sexpr(lhs), op, sexpr(rhs)),
        ExprKind::Unary { op, operand } => format!("({}{})", op.as_str(), sexpr(operand)),
        ExprKind::Call { callee, args, .. } => {
            let args: Vec<_> = args.iter().map(sexpr).collect();
            format!("{}({})", callee, args.join(", "))
        }
        ExprKind::Member { base, member } => format!("{}.{}", sexpr(base), member),
        ExprKind::Index { base, index } => format!("{}[{}]", sexpr(base), sexpr(index)),
    }
}

#[test]
fn test_parse_entry_point() {
    let program = expect_parse(
        "@fragment\nfn main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {\n    return vec4<f32>(uv, 0.0, 1.0);\n}\n",
    );
    let f = only_function(&program);
    assert_eq!(f.name, "main");
    assert_eq!(f.stage(), Some(Stage::Fragment));
    assert_eq!(f.params.len(), 1);
    assert_eq!(f.params[0].attributes, vec![Attribute::Location(0)]);
    assert_eq!(f.params[0].ty.to_string(), "vec2<f32>");
    assert_eq!(f.return_attributes, vec![Attribute::Location(0)]);
    assert_eq!(f.return_type.as_ref().map(|t| t.to_string()), Some("vec4<f32>".to_string()));
    assert_eq!((f.span.line, f.span.column), (2, 4));
    assert_eq!(f.body.end.line, 4);

    match &f.body.stmts[0].kind {
        StmtKind::Return(Some(Expr {
            kind: ExprKind::Call { callee, type_args, args },
            ..
        })) => {
            assert_eq!(callee, "vec4");
            assert_eq!(type_args.len(), 1);
            assert_eq!(args.len(), 3);
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_parse_struct_and_uniforms() {
    let program = expect_parse(
        "struct Light { position: vec3<f32>, color: vec3f; intensity: f32 }\n\
         @group(0) @binding(1) @visibility(fragment) uniform light: Light;\n\
         @group(1) @binding(0) var<uniform> time: f32;\n",
    );
    assert_eq!(program.declarations.len(), 3);
    match &program.declarations[0] {
        Declaration::Struct(s) => {
            let names: Vec<_> = s.fields.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, vec!["position", "color", "intensity"]);
        }
        other => panic!("expected struct, got {:?}", other),
    }
    match &program.declarations[1] {
        Declaration::Uniform(u) => {
            assert_eq!((u.group, u.binding), (0, 1));
            assert_eq!(u.visibility, vec![Stage::Fragment]);
            assert_eq!(u.ty.name, "Light");
        }
        other => panic!("expected uniform, got {:?}", other),
    }
    match &program.declarations[2] {
        Declaration::Uniform(u) => {
            assert_eq!(u.name, "time");
            assert_eq!((u.group, u.binding), (1, 0));
            assert_eq!(u.visibility, vec![Stage::Vertex, Stage::Fragment]);
        }
        other => panic!("expected uniform, got {:?}", other),
    }
}

#[test]
fn test_missing_binding_defaults_to_zero() {
    let (program, diagnostics) = parse_with_diagnostics("@group(2) uniform scale: f32;");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::InvalidDecoratorArgument);
    match &program.declarations[0] {
        Declaration::Uniform(u) => assert_eq!((u.group, u.binding), (2, 0)),
        other => panic!("expected uniform, got {:?}", other),
    }
}

#[test]
fn test_unknown_decorator_is_reported_and_skipped() {
    let (program, diagnostics) = parse_with_diagnostics("@fragmnet fn main() -> vec4<f32> { return vec4(1.0); }");
    assert_eq!(program.declarations.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::UnknownDecorator);
    assert_eq!(diagnostics[0].suggestions.first().map(String::as_str), Some("fragment"));
    assert_eq!(only_function(&program).stage(), None);
}

#[test]
fn test_workgroup_size() {
    let program = expect_parse("@compute @workgroup_size(8, 8) fn cs() {}");
    let f = only_function(&program);
    assert_eq!(f.attributes.workgroup_size(), Some(&[8, 8][..]));
    assert_eq!(f.stage(), Some(Stage::Compute));
}

#[test]
fn test_statements() {
    let program = expect_parse(
        "fn f(a: f32) -> f32 {\n  let x: f32 = a;\n  var y = 1.0;\n  var z: i32;\n  y = y + x;\n  { return y; }\n}",
    );
    let stmts = &only_function(&program).body.stmts;
    assert!(matches!(&stmts[0].kind, StmtKind::Let { name, ty: Some(_), .. } if name == "x"));
    assert!(matches!(&stmts[1].kind, StmtKind::Var { name, ty: None, value: Some(_) } if name == "y"));
    assert!(matches!(&stmts[2].kind, StmtKind::Var { ty: Some(_), value: None, .. }));
    assert!(matches!(&stmts[3].kind, StmtKind::Assign { .. }));
    assert!(matches!(&stmts[4].kind, StmtKind::Block(b) if b.stmts.len() == 1));
    assert_eq!(stmts[1].span.line, 3);
}

#[test]
fn test_operator_precedence_and_associativity() {
    assert_eq!(sexpr(&parse_expr("a + b * c")), "(a + (b * c))");
    assert_eq!(sexpr(&parse_expr("a - b - c")), "((a - b) - c)");
    assert_eq!(sexpr(&parse_expr("a < b && c || d")), "(((a < b) && c) || d)");
    assert_eq!(sexpr(&parse_expr("-a * b")), "((-a) * b)");
    assert_eq!(sexpr(&parse_expr("(a + b) % 2")), "((a + b) % 2)");
    assert_eq!(sexpr(&parse_expr("a == b != c")), "((a == b) != c)");
}

#[test]
fn test_postfix_chains() {
    assert_eq!(sexpr(&parse_expr("lights[i].color.rgb")), "lights[i].color.rgb");
    assert_eq!(sexpr(&parse_expr("normalize(n).xy")), "normalize(n).xy");
}

#[test]
fn test_typed_constructor_versus_comparison() {
    let e = parse_expr("vec3<f32>(1.0)");
    assert!(matches!(&e.kind, ExprKind::Call { type_args, .. } if type_args.len() == 1));

    let e = parse_expr("array<f32, 2>(1.0, 2.0)");
    assert!(matches!(&e.kind, ExprKind::Call { type_args, .. } if type_args.len() == 2));

    assert_eq!(sexpr(&parse_expr("a < b")), "(a < b)");
}

#[test]
fn test_recovers_at_next_item() {
    let (program, diagnostics) = parse_with_diagnostics(
        "fn broken() { let = 1.0; }\nstruct S { a: f32 }\nfn ok() {}\n",
    );
    let names: Vec<_> = program.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["S", "ok"]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::UnexpectedToken);
    assert_eq!(diagnostics[0].location.map(|s| (s.line, s.column)), Some((1, 19)));
}

#[test]
fn test_stray_token_is_expected_item() {
    let (program, diagnostics) = parse_with_diagnostics("let x = 1.0;\nfn ok() {}");
    assert_eq!(program.declarations.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::ExpectedItem);
}

#[test]
fn test_unterminated_item_yields_empty_program() {
    let (program, diagnostics) = parse_with_diagnostics("struct A { x: f32 }\nfn main() {\n  let x = 1.0;\n");
    assert!(program.declarations.is_empty());
    assert!(diagnostics.iter().any(|d| d.code == DiagnosticCode::UnexpectedToken));
}

#[test]
fn test_unterminated_after_inner_error_yields_empty_program() {
    let (program, diagnostics) = parse_with_diagnostics("fn main() {\n  let = ;\n");
    assert!(program.declarations.is_empty());
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.code == DiagnosticCode::UnexpectedToken));
}

#[test]
fn test_lexer_errors_are_forwarded() {
    let (program, diagnostics) = parse_with_diagnostics("fn f() { let a = 1.0 $; }");
    assert_eq!(program.declarations.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, DiagnosticCode::InvalidCharacter);
}

#[test]
fn test_runtime_array_storage_variable() {
    let program = expect_parse("@group(0) @binding(2) var<storage, read> data: array<f32>;");
    match &program.declarations[0] {
        Declaration::Uniform(u) => {
            assert_eq!(u.ty.to_string(), "array<f32>");
            assert_eq!(u.binding, 2);
        }
        other => panic!("expected uniform, got {:?}", other),
    }
}

#[test]
fn test_deeply_nested_parentheses_are_rejected() {
    let depth = 10_000;
    let src = format!(
        "@compute fn main() {{ let x = {}1.0{}; }}\nfn ok() {{}}\n",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let (program, diagnostics) = parse_with_diagnostics(&src);
    assert_eq!(diagnostics.len(), 1, "{:#?}", diagnostics);
    assert_eq!(diagnostics[0].code, DiagnosticCode::UnexpectedToken);
    assert!(diagnostics[0].message.contains("nested too deeply"));
    let names: Vec<_> = program.declarations.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["ok"]);
}

#[test]
fn test_nesting_below_limit_parses() {
    let depth = MAX_NESTING_DEPTH / 2;
    let src = format!("fn f() {{ let x = {}1.0{}; }}", "(".repeat(depth), ")".repeat(depth));
    expect_parse(&src);
}

#[test]
fn test_deep_unary_blocks_and_chains_are_rejected() {
    let sources = [
        format!("fn f() {{ let x = {}1.0; }}", "-".repeat(10_000)),
        format!("fn f() {}{}", "{".repeat(10_000), "}".repeat(10_000)),
        format!("fn f() {{ let x = 1.0{}; }}", " + 1.0".repeat(10_000)),
        format!("fn f() {{ let x = v{}; }}", ".x".repeat(10_000)),
        format!("fn f() {{ let x: {}f32{} = 1.0; }}", "array<".repeat(10_000), ">".repeat(10_000)),
    ];
    for src in &sources {
        let (_, diagnostics) = parse_with_diagnostics(src);
        assert!(
            diagnostics.iter().any(|d| d.message.contains("nested too deeply")),
            "{:#?}",
            diagnostics
        );
    }
}

fn uniform_visibility(program: &Program) -> Vec<Vec<Stage>> {
    program
        .declarations
        .iter()
        .filter_map(|d| match d {
            Declaration::Uniform(u) => Some(u.visibility.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_visibility_comment_sets_uniform_visibility() {
    let program = expect_parse(
        "// visibility: fragment\n\
         @group(0) @binding(1) var tex: texture_2d<f32>;\n\
         // visibility: compute\n\
         @group(0) @binding(2) @visibility(vertex) uniform a: f32;\n\
         @group(0) @binding(3) uniform b: f32;\n",
    );
    assert_eq!(
        uniform_visibility(&program),
        vec![vec![Stage::Fragment], vec![Stage::Vertex], vec![Stage::Vertex, Stage::Fragment]]
    );
}

#[test]
fn test_visibility_comment_elsewhere_is_ignored() {
    let program = expect_parse(
        "// visibility: compute\n\
         struct S { a: f32 }\n\
         fn f() {\n  // visibility: vertex\n  var x = 1.0;\n}\n\
         @group(0) @binding(0) uniform u: f32;\n",
    );
    assert_eq!(program.declarations.len(), 3);
    assert_eq!(uniform_visibility(&program), vec![vec![Stage::Vertex, Stage::Fragment]]);
}
