//! Semantic analysis.
//!
//! Resolves every declared type, types every expression through the
//! inference engine and validates the program, lowering it to the typed IR.
//! Every problem becomes a diagnostic and analysis carries on, so a single
//! run reports as much as possible.

use crate::ast::{self, AttrExt, Declaration, Span, Stage, TypeExpr};
use crate::builtins::Builtin;
use crate::diagnostics::{find_similar_names, Diagnostic, DiagnosticCode, Diagnostics, Severity, DEFAULT_MAX_DISTANCE};
use crate::inference::{Binding, FunctionSignature, Inferencer, TypeContext, TypeIssue};
use crate::ir::visitor::{walk_exprs, Visitor};
use crate::ir::{self, Callee, DeclaredType, EntryPoint, ExprKind};
use crate::metadata::AnalysisMetadata;
use crate::types::{resolve_builtin, Primitive, Type, BUILTIN_TYPE_NAMES};
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::convert::Infallible;
use std::ops::ControlFlow;

/// More uniforms than this earn a packing hint.
const UNIFORM_PACKING_THRESHOLD: usize = 16;

/// Result of analyzing a program.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub ir: ir::Program,
    /// Errors and warnings.
    pub diagnostics: Vec<Diagnostic>,
    /// Advisory diagnostics (hint severity).
    pub hints: Vec<Diagnostic>,
    pub metadata: AnalysisMetadata,
}

pub fn analyze(program: &ast::Program) -> Analysis {
    Analyzer::new().analyze(program)
}

enum Resolution {
    Resolved(Type),
    /// Refers to a struct whose own fields are not resolved yet.
    Pending,
    Unknown(Vec<String>),
    Invalid(String),
}

struct CurrentFunction {
    name: String,
    /// `None` for functions without a return type.
    return_type: Option<Option<Type>>,
}

struct Analyzer {
    ctx: TypeContext,
    diagnostics: Diagnostics,
    /// Per enclosing block, the `let`/`var` names declared further down.
    upcoming: Vec<Vec<(String, Span)>>,
    current: Option<CurrentFunction>,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            ctx: TypeContext::new(),
            diagnostics: Diagnostics::new(),
            upcoming: Vec::new(),
            current: None,
        }
    }

    fn analyze(mut self, program: &ast::Program) -> Analysis {
        debug!("analyzing {} declaration(s)", program.declarations.len());

        self.check_global_names(program);
        let structs = self.collect_structs(program);
        let uniforms = self.collect_uniforms(program);
        let signatures = self.collect_signatures(program);

        let functions: Vec<ir::Function> = program
            .declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::Function(f) => Some(f),
                _ => None,
            })
            .zip(signatures)
            .map(|(f, (params, ret))| self.lower_function(f, params, ret))
            .collect();

        let entry_points = self.check_entry_points(&functions);
        let calls = CallCollector::collect(&functions);
        self.check_unused_functions(&functions, &calls.users);
        self.check_performance(&functions);

        let ir = ir::Program {
            functions,
            structs,
            uniforms,
            entry_points,
        };
        let builtins_used = calls.builtins.iter().map(|b| b.name().to_string()).collect();
        let metadata = AnalysisMetadata::from_program(&ir, builtins_used);

        let (hints, diagnostics): (Vec<_>, Vec<_>) =
            self.diagnostics.into_iter().partition(|d| d.severity == Severity::Hint);
        debug!(
            "analysis finished: {} diagnostic(s), {} hint(s)",
            diagnostics.len(),
            hints.len()
        );
        Analysis {
            ir,
            diagnostics,
            hints,
            metadata,
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // -----------------------------------------------------------------------
    // Declarations

    fn check_global_names(&mut self, program: &ast::Program) {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        for decl in &program.declarations {
            match seen.get(decl.name()) {
                Some(first) => {
                    let diag = Diagnostic::error(
                        DiagnosticCode::DuplicateDeclaration,
                        format!("`{}` is already declared", decl.name()),
                    )
                    .at(decl.span())
                    .with_related(format!("`{}` is first declared here", decl.name()), Some(*first));
                    self.push(diag);
                }
                None => {
                    seen.insert(decl.name(), decl.span());
                }
            }
        }
    }

    fn collect_structs(&mut self, program: &ast::Program) -> Vec<ir::Struct> {
        let mut seen = HashSet::new();
        let decls: Vec<&ast::StructDecl> = program
            .declarations
            .iter()
            .filter_map(|d| match d {
                Declaration::Struct(s) if seen.insert(s.name.as_str()) => Some(s),
                _ => None,
            })
            .collect();

        for decl in &decls {
            self.check_struct_fields(decl);
        }

        // Structs may refer to structs declared after them, so resolve in
        // rounds until nothing is waiting on an unresolved struct.
        let mut pending = decls.clone();
        while !pending.is_empty() {
            let waiting: HashSet<&str> = pending.iter().map(|d| d.name.as_str()).collect();
            let before = pending.len();
            let mut blocked = Vec::new();
            for decl in pending.iter().copied() {
                let resolutions: Vec<Resolution> =
                    decl.fields.iter().map(|f| self.try_resolve(&f.ty, &waiting)).collect();
                if resolutions.iter().any(|r| matches!(r, Resolution::Pending)) {
                    blocked.push(decl);
                } else {
                    self.define_struct(decl, resolutions, true);
                }
            }
            if blocked.len() == before {
                for decl in &blocked {
                    self.push(
                        Diagnostic::error(
                            DiagnosticCode::UnknownStruct,
                            format!("struct `{}` contains itself through its fields", decl.name),
                        )
                        .at(decl.span),
                    );
                    let resolutions = decl.fields.iter().map(|f| self.try_resolve(&f.ty, &waiting)).collect();
                    self.define_struct(decl, resolutions, false);
                }
                break;
            }
            pending = blocked;
        }

        decls
            .iter()
            .map(|decl| ir::Struct {
                name: decl.name.clone(),
                fields: decl
                    .fields
                    .iter()
                    .map(|f| ir::StructField {
                        attributes: f.attributes.clone(),
                        name: f.name.clone(),
                        ty: self.declared_silently(&f.ty),
                        span: f.span,
                    })
                    .collect(),
                span: decl.span,
            })
            .collect()
    }

    fn check_struct_fields(&mut self, decl: &ast::StructDecl) {
        if decl.fields.is_empty() {
            self.push(
                Diagnostic::new(DiagnosticCode::EmptyStruct, format!("struct `{}` has no fields", decl.name))
                    .at(decl.span),
            );
        }
        let mut names: HashMap<&str, Span> = HashMap::new();
        for field in &decl.fields {
            if let Some(first) = names.get(field.name.as_str()) {
                let diag = Diagnostic::new(
                    DiagnosticCode::DuplicateField,
                    format!("duplicate field `{}` in struct `{}`", field.name, decl.name),
                )
                .at(field.span)
                .with_related(format!("`{}` is first declared here", field.name), Some(*first));
                self.push(diag);
            } else {
                names.insert(&field.name, field.span);
            }
        }
    }

    fn define_struct(&mut self, decl: &ast::StructDecl, resolutions: Vec<Resolution>, report: bool) {
        let mut fields: Vec<(String, Type)> = Vec::new();
        for (field, resolution) in decl.fields.iter().zip(resolutions) {
            match resolution {
                Resolution::Resolved(ty) => {
                    if !fields.iter().any(|(n, _)| *n == field.name) {
                        fields.push((field.name.clone(), ty));
                    }
                }
                other if report => self.report_unresolved(&field.ty, other),
                _ => {}
            }
        }
        self.ctx.define_struct(
            decl.name.clone(),
            Type::Struct {
                name: decl.name.clone(),
                fields,
            },
        );
    }

    fn collect_uniforms(&mut self, program: &ast::Program) -> Vec<ir::Uniform> {
        let mut uniforms: Vec<ir::Uniform> = Vec::new();
        for decl in &program.declarations {
            let Declaration::Uniform(u) = decl else { continue };
            let ty = self.resolve_declared(&u.ty);

            let conflicts: Vec<(String, Span)> = uniforms
                .iter()
                .filter(|earlier| earlier.group == u.group && earlier.binding == u.binding)
                .map(|earlier| (earlier.name.clone(), earlier.span))
                .collect();
            for (earlier, earlier_span) in conflicts {
                let diag = Diagnostic::new(
                    DiagnosticCode::BindingConflict,
                    format!(
                        "binding conflict: `{}` and `{}` both use @group({}) @binding({})",
                        earlier, u.name, u.group, u.binding
                    ),
                )
                .at(u.span)
                .with_related(format!("`{}` is bound here", earlier), Some(earlier_span));
                self.push(diag);
            }

            self.ctx.set_type(
                u.name.clone(),
                Binding {
                    ty: ty.resolved.clone(),
                    mutable: false,
                    span: u.span,
                },
            );
            uniforms.push(ir::Uniform {
                name: u.name.clone(),
                ty,
                group: u.group,
                binding: u.binding,
                visibility: u.visibility.clone(),
                span: u.span,
            });
        }

        if uniforms.len() > UNIFORM_PACKING_THRESHOLD {
            self.push(
                Diagnostic::new(
                    DiagnosticCode::UniformPacking,
                    format!(
                        "{} uniforms declared; consider packing related values into a struct",
                        uniforms.len()
                    ),
                )
                .at(uniforms[UNIFORM_PACKING_THRESHOLD].span),
            );
        }
        uniforms
    }

    /// Resolve parameter and return types of every function, in declaration
    /// order, and register their signatures.
    fn collect_signatures(&mut self, program: &ast::Program) -> Vec<(Vec<DeclaredType>, Option<DeclaredType>)> {
        let mut signatures = Vec::new();
        for decl in &program.declarations {
            let Declaration::Function(f) = decl else { continue };

            if f.attributes.stages().len() > 1 {
                self.push(
                    Diagnostic::new(
                        DiagnosticCode::InvalidEntryPoint,
                        format!("function `{}` has more than one stage decorator", f.name),
                    )
                    .at(f.span),
                );
            }

            let mut seen: HashMap<&str, Span> = HashMap::new();
            let mut params = Vec::new();
            for param in &f.params {
                if let Some(first) = seen.get(param.name.as_str()) {
                    let diag = Diagnostic::new(
                        DiagnosticCode::DuplicateDeclaration,
                        format!("parameter `{}` is declared twice", param.name),
                    )
                    .at(param.span)
                    .with_related("first declared here", Some(*first));
                    self.push(diag);
                } else {
                    seen.insert(&param.name, param.span);
                }
                params.push(self.resolve_declared(&param.ty));
            }
            let ret = f.return_type.as_ref().map(|t| self.resolve_declared(t));

            if self.ctx.function(&f.name).is_none() {
                self.ctx.define_function(
                    f.name.clone(),
                    FunctionSignature {
                        params: params.iter().map(|p| p.resolved.clone()).collect(),
                        return_type: ret.as_ref().and_then(|r| r.resolved.clone()),
                        returns_value: ret.is_some(),
                    },
                );
            }
            signatures.push((params, ret));
        }
        signatures
    }

    // -----------------------------------------------------------------------
    // Type names

    fn try_resolve(&self, ty: &TypeExpr, waiting: &HashSet<&str>) -> Resolution {
        let ctx = &self.ctx;
        let mut missing: Vec<String> = Vec::new();
        let mut blocked = false;
        let mut named = |t: &TypeExpr| -> Option<Type> {
            if t.args.is_empty() {
                if let Some(s) = ctx.struct_type(&t.name) {
                    return Some(s.clone());
                }
                if waiting.contains(t.name.as_str()) {
                    blocked = true;
                    return None;
                }
            }
            missing.push(t.name.clone());
            None
        };
        let resolved = match resolve_builtin(ty, &mut named) {
            Ok(Some(t)) => Ok(t),
            Ok(None) => named(ty).ok_or_else(String::new),
            Err(message) => Err(message),
        };
        match resolved {
            Ok(t) => Resolution::Resolved(t),
            Err(_) if blocked => Resolution::Pending,
            Err(_) if !missing.is_empty() => Resolution::Unknown(missing),
            Err(message) => Resolution::Invalid(message),
        }
    }

    fn resolve_declared(&mut self, ty: &TypeExpr) -> DeclaredType {
        let resolved = match self.try_resolve(ty, &HashSet::new()) {
            Resolution::Resolved(t) => Some(t),
            other => {
                self.report_unresolved(ty, other);
                None
            }
        };
        DeclaredType {
            resolved,
            written: ty.to_string(),
        }
    }

    fn declared_silently(&self, ty: &TypeExpr) -> DeclaredType {
        DeclaredType {
            resolved: self.ctx.resolve_type(ty),
            written: ty.to_string(),
        }
    }

    fn report_unresolved(&mut self, ty: &TypeExpr, resolution: Resolution) {
        match resolution {
            Resolution::Unknown(names) => {
                for name in names {
                    self.report_unknown_type(&name, ty.span);
                }
            }
            Resolution::Invalid(message) => {
                self.push(
                    Diagnostic::error(DiagnosticCode::UnrecognizedType, format!("invalid type `{}`: {}", ty, message))
                        .at(ty.span),
                );
            }
            Resolution::Resolved(_) | Resolution::Pending => {}
        }
    }

    fn report_unknown_type(&mut self, name: &str, span: Span) {
        let structs = self.ctx.struct_names();
        let diag = if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            let suggestions = find_similar_names(name, &structs, DEFAULT_MAX_DISTANCE);
            Diagnostic::new(DiagnosticCode::UnknownStruct, format!("unknown struct type `{}`", name))
                .with_suggestions(suggestions)
        } else {
            let mut candidates: Vec<String> = BUILTIN_TYPE_NAMES.iter().map(|s| s.to_string()).collect();
            candidates.extend(structs);
            let suggestions = find_similar_names(name, &candidates, DEFAULT_MAX_DISTANCE);
            Diagnostic::new(DiagnosticCode::UnrecognizedType, format!("unrecognized type `{}`", name))
                .with_suggestions(suggestions)
        };
        self.push(diag.at(span));
    }

    // -----------------------------------------------------------------------
    // Function bodies

    fn lower_function(
        &mut self,
        f: &ast::FunctionDecl,
        params: Vec<DeclaredType>,
        return_type: Option<DeclaredType>,
    ) -> ir::Function {
        debug!("analyzing function `{}`", f.name);
        self.ctx.push_scope();
        for (param, ty) in f.params.iter().zip(&params) {
            self.ctx.set_type(
                param.name.clone(),
                Binding {
                    ty: ty.resolved.clone(),
                    mutable: false,
                    span: param.span,
                },
            );
        }
        self.current = Some(CurrentFunction {
            name: f.name.clone(),
            return_type: return_type.as_ref().map(|r| r.resolved.clone()),
        });
        let body = self.lower_block(&f.body);
        self.current = None;
        self.ctx.pop_scope();

        if return_type.is_some() && !contains_return(&f.body) {
            self.push(
                Diagnostic::new(
                    DiagnosticCode::MissingReturn,
                    format!("function `{}` declares a return type but never returns a value", f.name),
                )
                .at(f.span),
            );
        }

        ir::Function {
            name: f.name.clone(),
            attributes: f.attributes.clone(),
            stage: f.stage(),
            params: f
                .params
                .iter()
                .zip(params)
                .map(|(p, ty)| ir::Param {
                    attributes: p.attributes.clone(),
                    name: p.name.clone(),
                    ty,
                    span: p.span,
                })
                .collect(),
            return_type,
            return_attributes: f.return_attributes.clone(),
            body,
            span: f.span,
        }
    }

    fn lower_block(&mut self, block: &ast::Block) -> ir::Block {
        self.ctx.push_scope();
        let declared = block
            .stmts
            .iter()
            .filter_map(|s| match &s.kind {
                ast::StmtKind::Let { name, .. } | ast::StmtKind::Var { name, .. } => Some((name.clone(), s.span)),
                _ => None,
            })
            .collect();
        self.upcoming.push(declared);

        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            stmts.push(self.lower_stmt(stmt));
        }

        self.upcoming.pop();
        self.ctx.pop_scope();
        ir::Block {
            stmts,
            span: block.span,
            end: block.end,
        }
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) -> ir::Stmt {
        let kind = match &stmt.kind {
            ast::StmtKind::Let { name, ty, value } => {
                let declared = ty.as_ref().map(|t| self.resolve_declared(t));
                let expected = declared.as_ref().and_then(|d| d.resolved.clone());
                let value = self.lower_expr(value, scalar_of(expected.as_ref()));
                self.check_assignable(expected.as_ref(), &value);
                let ty_for_binding = expected.or_else(|| value.ty.clone());
                self.declare(name, ty_for_binding, false, stmt.span);
                ir::StmtKind::Let {
                    name: name.clone(),
                    ty: declared,
                    value,
                }
            }
            ast::StmtKind::Var { name, ty, value } => {
                let declared = ty.as_ref().map(|t| self.resolve_declared(t));
                let expected = declared.as_ref().and_then(|d| d.resolved.clone());
                let value = value.as_ref().map(|v| self.lower_expr(v, scalar_of(expected.as_ref())));
                if let Some(v) = &value {
                    self.check_assignable(expected.as_ref(), v);
                }
                if declared.is_none() && value.is_none() {
                    self.push(
                        Diagnostic::error(
                            DiagnosticCode::TypeMismatch,
                            format!("`var {}` needs a type annotation or an initializer", name),
                        )
                        .at(stmt.span),
                    );
                }
                let ty_for_binding = expected.or_else(|| value.as_ref().and_then(|v| v.ty.clone()));
                self.declare(name, ty_for_binding, true, stmt.span);
                ir::StmtKind::Var {
                    name: name.clone(),
                    ty: declared,
                    value,
                }
            }
            ast::StmtKind::Assign { target, value } => {
                let target = self.lower_expr(target, None);
                let value = self.lower_expr(value, scalar_of(target.ty.as_ref()));
                self.check_assignment_target(&target);
                self.check_assignable(target.ty.as_ref(), &value);
                ir::StmtKind::Assign { target, value }
            }
            ast::StmtKind::Return(value) => ir::StmtKind::Return(self.lower_return(value.as_ref(), stmt.span)),
            ast::StmtKind::Expr(e) => ir::StmtKind::Expr(self.lower_expr(e, None)),
            ast::StmtKind::Block(b) => ir::StmtKind::Block(self.lower_block(b)),
        };
        if let ast::StmtKind::Let { name, .. } | ast::StmtKind::Var { name, .. } = &stmt.kind {
            if let Some(level) = self.upcoming.last_mut() {
                if let Some(pos) = level.iter().position(|(n, _)| n == name) {
                    level.remove(pos);
                }
            }
        }
        ir::Stmt { kind, span: stmt.span }
    }

    fn lower_return(&mut self, value: Option<&ast::Expr>, span: Span) -> Option<ir::Expr> {
        let (function, expected) = match &self.current {
            Some(current) => (current.name.clone(), current.return_type.clone()),
            None => (String::new(), None),
        };
        match (expected, value) {
            (Some(expected), Some(value)) => {
                let value = self.lower_expr(value, scalar_of(expected.as_ref()));
                if let (Some(expected), Some(found)) = (&expected, &value.ty) {
                    if expected != found {
                        self.push(
                            Diagnostic::error(
                                DiagnosticCode::ReturnTypeMismatch,
                                format!("function `{}` returns `{}`, found `{}`", function, expected, found),
                            )
                            .at(value.span),
                        );
                    }
                }
                Some(value)
            }
            (Some(expected), None) => {
                let message = match expected {
                    Some(ty) => format!("function `{}` must return a value of type `{}`", function, ty),
                    None => format!("function `{}` must return a value", function),
                };
                self.push(Diagnostic::error(DiagnosticCode::ReturnTypeMismatch, message).at(span));
                None
            }
            (None, Some(value)) => {
                let value = self.lower_expr(value, None);
                self.push(
                    Diagnostic::error(
                        DiagnosticCode::ReturnTypeMismatch,
                        format!("function `{}` has no return type but returns a value", function),
                    )
                    .at(value.span),
                );
                Some(value)
            }
            (None, None) => None,
        }
    }

    fn lower_expr(&mut self, expr: &ast::Expr, hint: Option<Primitive>) -> ir::Expr {
        let mut issues = Vec::new();
        let lowered = Inferencer::new(&self.ctx, &mut issues).lower(expr, hint);
        for issue in issues {
            self.report_issue(issue);
        }
        lowered
    }

    fn report_issue(&mut self, issue: TypeIssue) {
        match issue {
            TypeIssue::Diagnostic(diag) => self.push(diag),
            TypeIssue::Unresolved { name, span } => {
                let later = self
                    .upcoming
                    .iter()
                    .rev()
                    .find_map(|level| level.iter().find(|(n, _)| *n == name).map(|(_, s)| *s));
                if let Some(declared_at) = later {
                    let diag = Diagnostic::error(
                        DiagnosticCode::UseBeforeDeclaration,
                        format!("`{}` is used before its declaration", name),
                    )
                    .at(span)
                    .with_related(format!("`{}` is declared here", name), Some(declared_at));
                    self.push(diag);
                    return;
                }
                let candidates = self.ctx.visible_names();
                let suggestions = find_similar_names(&name, &candidates, DEFAULT_MAX_DISTANCE);
                self.push(undefined(
                    DiagnosticCode::UndefinedVariable,
                    format!("undefined variable `{}`", name),
                    span,
                    suggestions,
                ));
            }
            TypeIssue::UndefinedFunction { name, span } => {
                let mut candidates = self.ctx.function_names();
                candidates.extend(self.ctx.struct_names());
                candidates.extend(Builtin::ALL.iter().map(|b| b.name().to_string()));
                let suggestions = find_similar_names(&name, &candidates, DEFAULT_MAX_DISTANCE);
                let name_span = Span::new(span.line, span.column, span.offset, name.len());
                self.push(undefined(
                    DiagnosticCode::UndefinedFunction,
                    format!("undefined function `{}`", name),
                    name_span,
                    suggestions,
                ));
            }
        }
    }

    fn declare(&mut self, name: &str, ty: Option<Type>, mutable: bool, span: Span) {
        if self.ctx.is_defined_in_current_scope(name) {
            let previous = self.ctx.lookup(name).map(|b| b.span);
            let diag = Diagnostic::error(
                DiagnosticCode::DuplicateDeclaration,
                format!("`{}` is already declared in this scope", name),
            )
            .at(span)
            .with_related("previous declaration", previous);
            self.push(diag);
        }
        self.ctx.set_type(name, Binding { ty, mutable, span });
    }

    fn check_assignable(&mut self, expected: Option<&Type>, value: &ir::Expr) {
        if let (Some(expected), Some(found)) = (expected, &value.ty) {
            if expected != found {
                self.push(
                    Diagnostic::error(
                        DiagnosticCode::TypeMismatch,
                        format!("type mismatch: expected `{}`, found `{}`", expected, found),
                    )
                    .at(value.span),
                );
            }
        }
    }

    fn check_assignment_target(&mut self, target: &ir::Expr) {
        let Some(name) = root_identifier(target) else {
            self.push(
                Diagnostic::new(DiagnosticCode::AssignToImmutable, "invalid assignment target").at(target.span),
            );
            return;
        };
        if let Some(binding) = self.ctx.lookup(name) {
            if !binding.mutable {
                let declared_at = binding.span;
                let diag = Diagnostic::new(
                    DiagnosticCode::AssignToImmutable,
                    format!("cannot assign to `{}`: it is not declared with `var`", name),
                )
                .at(target.span)
                .with_related(format!("`{}` is declared here", name), Some(declared_at));
                self.push(diag);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Whole-program checks

    fn check_entry_points(&mut self, functions: &[ir::Function]) -> Vec<EntryPoint> {
        let mut entry_points = Vec::new();
        for f in functions {
            let Some(stage) = f.stage else { continue };
            entry_points.push(EntryPoint {
                name: f.name.clone(),
                stage,
            });
            let problem = match (stage, &f.return_type) {
                (Stage::Fragment, None) => Some(Diagnostic::new(
                    DiagnosticCode::FragmentReturnsVoid,
                    format!(
                        "fragment entry point `{}` returns nothing; did you forget to return a color?",
                        f.name
                    ),
                )),
                (Stage::Vertex, None) => Some(Diagnostic::new(
                    DiagnosticCode::InvalidEntryPoint,
                    format!("vertex entry point `{}` must return a position", f.name),
                )),
                (Stage::Compute, Some(_)) => Some(Diagnostic::new(
                    DiagnosticCode::InvalidEntryPoint,
                    format!("compute entry point `{}` cannot return a value", f.name),
                )),
                _ => None,
            };
            if let Some(diag) = problem {
                self.push(diag.at(f.span));
            }
        }

        if entry_points.is_empty() {
            self.push(
                Diagnostic::new(DiagnosticCode::NoEntryPoints, "no entry points found")
                    .with_suggestion("mark a function with @vertex, @fragment or @compute"),
            );
            return entry_points;
        }

        let first = |stage: Stage| {
            functions
                .iter()
                .find(|f| f.stage == Some(stage))
                .map(|f| f.span)
        };
        match (first(Stage::Vertex), first(Stage::Fragment)) {
            (Some(span), None) => self.push(
                Diagnostic::new(
                    DiagnosticCode::ComplementaryStage,
                    "program has a vertex stage but no fragment stage; consider adding a @fragment entry point",
                )
                .at(span),
            ),
            (None, Some(span)) => self.push(
                Diagnostic::new(
                    DiagnosticCode::ComplementaryStage,
                    "program has a fragment stage but no vertex stage; consider adding a @vertex entry point",
                )
                .at(span),
            ),
            _ => {}
        }
        entry_points
    }

    fn check_unused_functions(&mut self, functions: &[ir::Function], called: &HashSet<String>) {
        for f in functions {
            if f.stage.is_none() && !called.contains(&f.name) {
                self.push(
                    Diagnostic::new(
                        DiagnosticCode::UnusedFunction,
                        format!("function `{}` is never called", f.name),
                    )
                    .at(f.span)
                    .with_suggestion("remove it if it is no longer needed"),
                );
            }
        }
    }

    fn check_performance(&mut self, functions: &[ir::Function]) {
        for f in functions {
            let mut scan = PerformanceScan::default();
            let _ = scan.visit_function(f);
            if let Some(first) = scan.divisions.first() {
                self.push(
                    Diagnostic::new(
                        DiagnosticCode::DivisionInBody,
                        format!(
                            "function `{}` performs {} division(s); multiplying by a precomputed reciprocal is usually cheaper",
                            f.name,
                            scan.divisions.len()
                        ),
                    )
                    .at(*first),
                );
            }
            for (span, exponent) in scan.small_pows {
                self.push(
                    Diagnostic::new(
                        DiagnosticCode::SmallIntegerPow,
                        format!("`pow` with exponent {} can be written as repeated multiplication", exponent),
                    )
                    .at(span),
                );
            }
        }
    }
}

fn undefined(code: DiagnosticCode, message: String, span: Span, suggestions: Vec<String>) -> Diagnostic {
    let mut diag = Diagnostic::error(code, message).at(span);
    if let Some(best) = suggestions.first() {
        diag = diag.with_fix(format!("replace with `{}`", best), span, best.clone());
    }
    diag.with_suggestions(suggestions)
}

fn scalar_of(ty: Option<&Type>) -> Option<Primitive> {
    match ty {
        Some(Type::Primitive(p)) => Some(*p),
        _ => None,
    }
}

fn root_identifier(expr: &ir::Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Identifier(name) => Some(name),
        ExprKind::Member { base, .. } | ExprKind::Index { base, .. } => root_identifier(base),
        _ => None,
    }
}

/// Whether a `return` statement appears anywhere in the block, including
/// nested blocks. Reachability is not considered.
fn contains_return(block: &ast::Block) -> bool {
    block.stmts.iter().any(|s| match &s.kind {
        ast::StmtKind::Return(_) => true,
        ast::StmtKind::Block(inner) => contains_return(inner),
        _ => false,
    })
}

/// Names called from each function body, other than the function itself.
#[derive(Default)]
struct CallCollector {
    current: String,
    users: HashSet<String>,
    builtins: BTreeSet<Builtin>,
}

impl CallCollector {
    fn collect(functions: &[ir::Function]) -> Self {
        let mut collector = CallCollector::default();
        for f in functions {
            collector.current = f.name.clone();
            let _ = collector.visit_function(f);
        }
        collector
    }
}

impl Visitor for CallCollector {
    type Break = Infallible;

    fn visit_expr_call(&mut self, _e: &ir::Expr, callee: &Callee, args: &[ir::Expr]) -> ControlFlow<Infallible> {
        match callee {
            Callee::User(name) if *name != self.current => {
                self.users.insert(name.clone());
            }
            Callee::Builtin(builtin) => {
                self.builtins.insert(*builtin);
            }
            _ => {}
        }
        walk_exprs(self, args)
    }
}

#[derive(Default)]
struct PerformanceScan {
    divisions: Vec<Span>,
    small_pows: Vec<(Span, u32)>,
}

impl Visitor for PerformanceScan {
    type Break = Infallible;

    fn visit_expr_binary(
        &mut self,
        e: &ir::Expr,
        op: ast::BinaryOp,
        lhs: &ir::Expr,
        rhs: &ir::Expr,
    ) -> ControlFlow<Infallible> {
        if op == ast::BinaryOp::Div {
            self.divisions.push(e.span);
        }
        self.visit_expr(lhs)?;
        self.visit_expr(rhs)
    }

    fn visit_expr_call(&mut self, e: &ir::Expr, callee: &Callee, args: &[ir::Expr]) -> ControlFlow<Infallible> {
        if let (Callee::Builtin(Builtin::Pow), [_, exponent]) = (callee, args) {
            if let ExprKind::Literal(ast::Literal::Number(n)) = &exponent.kind {
                if n.value.fract() == 0.0 && (2.0..=4.0).contains(&n.value) {
                    self.small_pows.push((e.span, n.value as u32));
                }
            }
        }
        walk_exprs(self, args)
    }
}
