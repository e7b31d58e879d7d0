//! Expression typing.
//!
//! [`Inferencer`] lowers an AST expression into a typed IR expression. The
//! typing rules themselves are plain functions over [`Type`] so they can be
//! used and tested without any surrounding program.
//!
//! Untyped expressions (`ty: None`) never produce follow-up errors: once an
//! operand fails to type, everything built on it is silently untyped too.

use crate::ast::{self, BinaryOp, Literal, Number, NumberKind, Span, TypeArg, TypeExpr, UnaryOp};
use crate::builtins::{Builtin, BuiltinError};
use crate::diagnostics::{find_similar_names, Diagnostic, DiagnosticCode, DEFAULT_MAX_DISTANCE};
use crate::ir::{self, Callee, ExprKind, MemberKind};
use crate::scope::ScopeStack;
use crate::types::{parse_shape_name, resolve_builtin, Primitive, ShapeName, Type};
use log::trace;

/// What a name in scope is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// `None` if the declaration itself failed to type.
    pub ty: Option<Type>,
    pub mutable: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub params: Vec<Option<Type>>,
    pub return_type: Option<Type>,
    pub returns_value: bool,
}

/// Everything expression typing needs to know about the program: bindings
/// in scope, declared structs and function signatures.
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    scopes: ScopeStack<Binding>,
    structs: Vec<(String, Type)>,
    functions: Vec<(String, FunctionSignature)>,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push_scope();
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop_scope();
    }

    pub fn set_type(&mut self, name: impl Into<String>, binding: Binding) {
        self.scopes.insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.lookup(name)
    }

    pub fn is_defined_in_current_scope(&self, name: &str) -> bool {
        self.scopes.is_defined_in_current_scope(name)
    }

    pub fn visible_names(&self) -> Vec<String> {
        self.scopes.visible_names()
    }

    pub fn define_struct(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        self.structs.retain(|(n, _)| *n != name);
        self.structs.push((name, ty));
    }

    pub fn struct_type(&self, name: &str) -> Option<&Type> {
        self.structs.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn struct_names(&self) -> Vec<String> {
        self.structs.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn define_function(&mut self, name: impl Into<String>, signature: FunctionSignature) {
        let name = name.into();
        self.functions.retain(|(n, _)| *n != name);
        self.functions.push((name, signature));
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Resolve a written type against builtin types and declared structs.
    /// Unresolvable spellings yield `None`; reporting is up to the caller.
    pub fn resolve_type(&self, ty: &TypeExpr) -> Option<Type> {
        let mut structs = |t: &TypeExpr| {
            if t.args.is_empty() {
                self.struct_type(&t.name).cloned()
            } else {
                None
            }
        };
        match resolve_builtin(ty, &mut structs) {
            Ok(Some(resolved)) => Some(resolved),
            Ok(None) => structs(ty),
            Err(_) => None,
        }
    }
}

/// A problem found while typing an expression.
///
/// Name resolution failures are returned raw so the caller can decide how
/// to report them (with suggestions drawn from its own view of scope).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeIssue {
    Unresolved { name: String, span: Span },
    UndefinedFunction { name: String, span: Span },
    Diagnostic(Diagnostic),
}

/// Failure of a typing rule, located by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub code: DiagnosticCode,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl TypeError {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        TypeError {
            code,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        Diagnostic::error(self.code, self.message)
            .at(span)
            .with_suggestions(self.suggestions)
    }
}

pub type RuleResult = std::result::Result<Type, TypeError>;

// ---------------------------------------------------------------------------
// Typing rules

pub fn infer_binary(op: BinaryOp, lhs: &Type, rhs: &Type) -> RuleResult {
    let invalid = || {
        TypeError::new(
            DiagnosticCode::InvalidOperandTypes,
            format!("cannot apply `{}` to `{}` and `{}`", op, lhs, rhs),
        )
    };

    if op.is_logical() {
        return if *lhs == Type::bool() && *rhs == Type::bool() {
            Ok(Type::bool())
        } else {
            Err(invalid())
        };
    }

    if op.is_comparison() {
        let ordered = !matches!(op, BinaryOp::Eq | BinaryOp::Ne);
        let comparable = match lhs {
            Type::Primitive(p) => !ordered || p.is_numeric(),
            Type::Vector { element, .. } => !ordered || element.is_numeric(),
            _ => false,
        };
        return if lhs == rhs && comparable {
            Ok(Type::bool())
        } else {
            Err(invalid())
        };
    }

    if !lhs.is_numeric() || !rhs.is_numeric() || lhs.element() != rhs.element() {
        return Err(invalid());
    }

    let dimension_mismatch = || {
        TypeError::new(
            DiagnosticCode::MatrixDimensionMismatch,
            format!("dimension mismatch: `{}` {} `{}`", lhs, op, rhs),
        )
    };

    match (lhs, rhs) {
        (Type::Primitive(_), Type::Primitive(_)) => Ok(lhs.clone()),
        (Type::Vector { size: a, .. }, Type::Vector { size: b, .. }) => {
            if a == b {
                Ok(lhs.clone())
            } else {
                Err(TypeError::new(
                    DiagnosticCode::VectorSizeMismatch,
                    format!("vector size mismatch: `{}` {} `{}`", lhs, op, rhs),
                ))
            }
        }
        (Type::Vector { .. }, Type::Primitive(_)) => Ok(lhs.clone()),
        (Type::Primitive(_), Type::Vector { .. }) => Ok(rhs.clone()),
        (Type::Matrix { rows, cols, element }, Type::Vector { size, .. }) if op == BinaryOp::Mul => {
            if size == cols {
                Ok(Type::vec(*rows, *element))
            } else {
                Err(dimension_mismatch())
            }
        }
        (Type::Vector { size, .. }, Type::Matrix { rows, cols, element }) if op == BinaryOp::Mul => {
            if size == rows {
                Ok(Type::vec(*cols, *element))
            } else {
                Err(dimension_mismatch())
            }
        }
        (
            Type::Matrix {
                rows: r1,
                cols: c1,
                element,
            },
            Type::Matrix { rows: r2, cols: c2, .. },
        ) => match op {
            BinaryOp::Mul if c1 == r2 => Ok(Type::mat(*c2, *r1, *element)),
            BinaryOp::Add | BinaryOp::Sub if r1 == r2 && c1 == c2 => Ok(lhs.clone()),
            BinaryOp::Mul | BinaryOp::Add | BinaryOp::Sub => Err(dimension_mismatch()),
            _ => Err(invalid()),
        },
        (Type::Matrix { .. }, Type::Primitive(_)) if op == BinaryOp::Mul => Ok(lhs.clone()),
        (Type::Primitive(_), Type::Matrix { .. }) if op == BinaryOp::Mul => Ok(rhs.clone()),
        _ => Err(invalid()),
    }
}

pub fn infer_unary(op: UnaryOp, operand: &Type) -> RuleResult {
    let ok = match op {
        UnaryOp::Neg => operand.is_numeric() && operand.element() != Some(Primitive::U32),
        UnaryOp::Not => *operand == Type::bool(),
    };
    if ok {
        Ok(operand.clone())
    } else {
        Err(TypeError::new(
            DiagnosticCode::InvalidOperandTypes,
            format!("cannot apply unary `{}` to `{}`", op.as_str(), operand),
        ))
    }
}

const SWIZZLE_SETS: [&str; 2] = ["xyzw", "rgba"];

/// Component indices named by a swizzle, if it is valid for a vector of `size`.
pub fn swizzle_indices(member: &str, size: u8) -> Option<Vec<usize>> {
    if member.is_empty() || member.len() > 4 {
        return None;
    }
    let first = member.chars().next()?;
    let set = SWIZZLE_SETS.iter().find(|s| s.contains(first))?;
    member
        .chars()
        .map(|c| set.find(c).filter(|&i| i < size as usize))
        .collect()
}

/// Valid swizzles close to an invalid one, shortest first.
fn swizzle_suggestions(member: &str, size: u8) -> Vec<String> {
    let set = member
        .chars()
        .find_map(|c| SWIZZLE_SETS.iter().find(|s| s.contains(c)))
        .unwrap_or(&SWIZZLE_SETS[0]);
    let components: Vec<char> = set.chars().take(size as usize).collect();

    let mut candidates: Vec<String> = Vec::new();
    let mut frontier = vec![String::new()];
    for _ in 0..member.len().clamp(1, 4) {
        let mut next = Vec::new();
        for prefix in &frontier {
            for c in &components {
                let mut s = prefix.clone();
                s.push(*c);
                next.push(s);
            }
        }
        candidates.extend(next.iter().cloned());
        frontier = next;
    }

    let mut similar = find_similar_names(member, &candidates, 1);
    similar.truncate(3);
    similar
}

/// Type of `base.member`: a swizzle on vectors, a field access on structs.
pub fn infer_member(base: &Type, member: &str) -> std::result::Result<(Type, MemberKind), TypeError> {
    match base {
        Type::Vector { size, element } => match swizzle_indices(member, *size) {
            Some(indices) if indices.len() == 1 => Ok((Type::Primitive(*element), MemberKind::Swizzle)),
            Some(indices) => Ok((Type::vec(indices.len() as u8, *element), MemberKind::Swizzle)),
            None => Err(TypeError::new(
                DiagnosticCode::InvalidSwizzle,
                format!("invalid swizzle `.{}` on `{}`", member, base),
            )
            .with_suggestions(swizzle_suggestions(member, *size))),
        },
        Type::Struct { name, fields } => match base.struct_field(member) {
            Some(ty) => Ok((ty.clone(), MemberKind::Field)),
            None => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                Err(TypeError::new(
                    DiagnosticCode::UnknownField,
                    format!("struct `{}` has no field `{}`", name, member),
                )
                .with_suggestions(find_similar_names(member, &names, DEFAULT_MAX_DISTANCE)))
            }
        },
        other => Err(TypeError::new(
            DiagnosticCode::UnknownField,
            format!("type `{}` has no member `{}`", other, member),
        )),
    }
}

pub fn infer_index(base: &Type, index: &Type) -> RuleResult {
    if !matches!(index, Type::Primitive(Primitive::I32 | Primitive::U32)) {
        return Err(TypeError::new(
            DiagnosticCode::TypeMismatch,
            format!("index must be `i32` or `u32`, found `{}`", index),
        ));
    }
    match base {
        Type::Vector { element, .. } => Ok(Type::Primitive(*element)),
        Type::Matrix { rows, element, .. } => Ok(Type::vec(*rows, *element)),
        Type::Array { element, .. } => Ok((**element).clone()),
        other => Err(TypeError::new(
            DiagnosticCode::NotIndexable,
            format!("type `{}` cannot be indexed", other),
        )),
    }
}

fn constructor_error(target: &Type, message: impl Into<String>) -> TypeError {
    TypeError::new(
        DiagnosticCode::ConstructorComponentMismatch,
        format!("invalid `{}` constructor: {}", target, message.into()),
    )
}

/// Check the arguments of a vector or matrix constructor producing `target`.
pub fn infer_shape_constructor(target: &Type, args: &[Type]) -> RuleResult {
    let element = target.element().unwrap_or(Primitive::F32);
    match target {
        Type::Vector { size, .. } => {
            if args.is_empty() {
                return Ok(target.clone());
            }
            if let [Type::Vector { size: n, .. }] = args {
                return if n == size {
                    Ok(target.clone())
                } else {
                    Err(constructor_error(target, format!("cannot convert `{}`", args[0])))
                };
            }
            if let [Type::Primitive(p)] = args {
                return if *p == element {
                    Ok(target.clone())
                } else {
                    Err(constructor_error(target, format!("cannot splat `{}`", p.as_str())))
                };
            }
            let mut components = 0;
            for arg in args {
                match (arg.component_count(), arg.element()) {
                    (Some(n), Some(e)) if e == element => components += n,
                    _ => {
                        return Err(constructor_error(
                            target,
                            format!("component `{}` does not have element type `{}`", arg, element.as_str()),
                        ))
                    }
                }
            }
            if components == *size as u32 {
                Ok(target.clone())
            } else {
                Err(constructor_error(
                    target,
                    format!("expected {} components, found {}", size, components),
                ))
            }
        }
        Type::Matrix { rows, cols, .. } => {
            if args.is_empty() {
                return Ok(target.clone());
            }
            if let [Type::Matrix { rows: r, cols: c, .. }] = args {
                return if r == rows && c == cols {
                    Ok(target.clone())
                } else {
                    Err(constructor_error(target, format!("cannot convert `{}`", args[0])))
                };
            }
            let column = Type::vec(*rows, element);
            let scalar = Type::Primitive(element);
            let by_columns = args.len() == *cols as usize && args.iter().all(|a| *a == column);
            let by_scalars = args.len() == (*rows as usize) * (*cols as usize) && args.iter().all(|a| *a == scalar);
            if by_columns || by_scalars {
                Ok(target.clone())
            } else {
                Err(constructor_error(
                    target,
                    format!("expected {} `{}` columns or {} scalars", cols, column, rows * cols),
                ))
            }
        }
        other => Err(constructor_error(other, "not a vector or matrix type")),
    }
}

/// Check an `array(...)` or `array<T, N>(...)` constructor. Without an
/// explicit type the element type is taken from the first argument.
pub fn infer_array_constructor(explicit: Option<&Type>, args: &[Type]) -> RuleResult {
    let (element, size) = match explicit {
        Some(Type::Array { element, size }) => ((**element).clone(), *size),
        Some(other) => return Err(constructor_error(other, "not an array type")),
        None => match args.first() {
            Some(first) => (first.clone(), None),
            None => {
                return Err(TypeError::new(
                    DiagnosticCode::ConstructorComponentMismatch,
                    "cannot infer the element type of an empty `array()`",
                ))
            }
        },
    };
    let target = Type::Array {
        element: Box::new(element.clone()),
        size: Some(size.unwrap_or(args.len() as u32)),
    };
    if let Some(bad) = args.iter().find(|a| **a != element) {
        return Err(constructor_error(
            &target,
            format!("element `{}` is not `{}`", bad, element),
        ));
    }
    if let Some(n) = size {
        if n as usize != args.len() {
            return Err(TypeError::new(
                DiagnosticCode::WrongArgumentCount,
                format!("`{}` expects {} elements, found {}", target, n, args.len()),
            ));
        }
    }
    Ok(target)
}

/// Conversion of one scalar or zero-value construction of a primitive.
pub fn infer_primitive_constructor(target: Primitive, args: &[Type]) -> RuleResult {
    match args {
        [] | [Type::Primitive(_)] => Ok(Type::Primitive(target)),
        [other] => Err(constructor_error(
            &Type::Primitive(target),
            format!("cannot convert `{}`", other),
        )),
        _ => Err(TypeError::new(
            DiagnosticCode::WrongArgumentCount,
            format!("`{}` expects 1 argument, found {}", target.as_str(), args.len()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Abstract literal coercion

fn representable(value: f64, integral: bool, target: Primitive) -> bool {
    match target {
        Primitive::F32 => true,
        Primitive::F16 => value.is_finite() && value.abs() <= 65504.0,
        Primitive::I32 => integral && value >= i32::MIN as f64 && value <= i32::MAX as f64,
        Primitive::U32 => integral && value >= 0.0 && value <= u32::MAX as f64,
        Primitive::Bool => false,
    }
}

fn literal_value(expr: &ir::Expr) -> Option<(f64, bool)> {
    match &expr.kind {
        ExprKind::Literal(Literal::Number(n)) => Some((n.value, n.integral)),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => literal_value(operand).map(|(v, i)| (-v, i)),
        _ => None,
    }
}

fn retype(expr: ir::Expr, target: Primitive) -> ir::Expr {
    let ty = Some(Type::Primitive(target));
    match expr.kind {
        ExprKind::Literal(Literal::Number(n)) => {
            let kind = match target {
                Primitive::F16 => NumberKind::F16,
                Primitive::I32 => NumberKind::I32,
                Primitive::U32 => NumberKind::U32,
                _ => n.kind,
            };
            ir::Expr::new(ExprKind::Literal(Literal::Number(Number { kind, ..n })), ty, expr.span)
        }
        ExprKind::Unary { op, operand } => {
            let operand = Box::new(retype(*operand, target));
            ir::Expr::new(ExprKind::Unary { op, operand }, ty, expr.span)
        }
        kind => ir::Expr { kind, ..expr },
    }
}

/// Give an unsuffixed literal the scalar type its context expects, when the
/// value is representable in it. Anything else is returned unchanged.
pub fn coerce_literal(expr: ir::Expr, target: Primitive) -> ir::Expr {
    if target == Primitive::F32 || !target.is_numeric() || !expr.is_abstract_literal() {
        return expr;
    }
    match literal_value(&expr) {
        Some((value, integral)) if representable(value, integral, target) => retype(expr, target),
        _ => expr,
    }
}

/// Coerce every abstract literal in `exprs` to the element type of the
/// first concretely typed one.
fn unify_literals(exprs: Vec<ir::Expr>) -> Vec<ir::Expr> {
    let target = exprs
        .iter()
        .filter(|e| !e.is_abstract_literal())
        .find_map(|e| e.ty.as_ref().and_then(Type::element));
    match target {
        Some(p) => exprs.into_iter().map(|e| coerce_literal(e, p)).collect(),
        None => exprs,
    }
}

fn scalar_hint(ty: Option<&Type>) -> Option<Primitive> {
    match ty {
        Some(Type::Primitive(p)) => Some(*p),
        _ => None,
    }
}

fn all_typed(exprs: &[ir::Expr]) -> Option<Vec<Type>> {
    exprs.iter().map(|e| e.ty.clone()).collect()
}

// ---------------------------------------------------------------------------
// Lowering

/// Lowers AST expressions to typed IR against a [`TypeContext`], appending
/// every problem it finds to `issues`.
pub struct Inferencer<'a> {
    ctx: &'a TypeContext,
    issues: &'a mut Vec<TypeIssue>,
}

impl<'a> Inferencer<'a> {
    pub fn new(ctx: &'a TypeContext, issues: &'a mut Vec<TypeIssue>) -> Self {
        Inferencer { ctx, issues }
    }

    fn report(&mut self, error: TypeError, span: Span) {
        self.issues.push(TypeIssue::Diagnostic(error.into_diagnostic(span)));
    }

    fn check<T>(&mut self, result: std::result::Result<T, TypeError>, span: Span) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error, span);
                None
            }
        }
    }

    /// Lower `expr`. `hint` is the scalar type the surrounding context
    /// expects, used to type unsuffixed literals.
    pub fn lower(&mut self, expr: &ast::Expr, hint: Option<Primitive>) -> ir::Expr {
        let span = expr.span;
        match &expr.kind {
            ast::ExprKind::Literal(Literal::Bool(b)) => {
                ir::Expr::new(ExprKind::Literal(Literal::Bool(*b)), Some(Type::bool()), span)
            }
            ast::ExprKind::Literal(Literal::Number(n)) => {
                let ty = match n.kind {
                    NumberKind::Abstract | NumberKind::F32 => Primitive::F32,
                    NumberKind::F16 => Primitive::F16,
                    NumberKind::I32 => Primitive::I32,
                    NumberKind::U32 => Primitive::U32,
                };
                let lit = ir::Expr::new(ExprKind::Literal(Literal::Number(*n)), Some(Type::Primitive(ty)), span);
                match hint {
                    Some(target) => coerce_literal(lit, target),
                    None => lit,
                }
            }
            ast::ExprKind::Identifier(name) => {
                let ty = match self.ctx.lookup(name) {
                    Some(binding) => binding.ty.clone(),
                    None => {
                        self.issues.push(TypeIssue::Unresolved {
                            name: name.clone(),
                            span,
                        });
                        None
                    }
                };
                ir::Expr::new(ExprKind::Identifier(name.clone()), ty, span)
            }
            ast::ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, hint, span),
            ast::ExprKind::Unary { op, operand } => {
                let literal_operand = matches!(
                    operand.kind,
                    ast::ExprKind::Literal(Literal::Number(Number {
                        kind: NumberKind::Abstract,
                        ..
                    }))
                );
                // a negated literal is coerced as a whole so its sign is checked
                let operand = self.lower(operand, if literal_operand { None } else { hint });
                let ty = match &operand.ty {
                    Some(t) => self.check(infer_unary(*op, t), span),
                    None => None,
                };
                let expr = ir::Expr::new(
                    ExprKind::Unary {
                        op: *op,
                        operand: Box::new(operand),
                    },
                    ty,
                    span,
                );
                match hint {
                    Some(target) => coerce_literal(expr, target),
                    None => expr,
                }
            }
            ast::ExprKind::Call {
                callee,
                type_args,
                args,
            } => self.lower_call(callee, type_args, args, hint, span),
            ast::ExprKind::Member { base, member } => {
                let base = self.lower(base, None);
                let (ty, kind) = match &base.ty {
                    Some(t) => match infer_member(t, member) {
                        Ok((ty, kind)) => (Some(ty), kind),
                        Err(error) => {
                            self.report(error, span);
                            let kind = if t.is_vector() { MemberKind::Swizzle } else { MemberKind::Field };
                            (None, kind)
                        }
                    },
                    None => (None, MemberKind::Field),
                };
                ir::Expr::new(
                    ExprKind::Member {
                        base: Box::new(base),
                        member: member.clone(),
                        kind,
                    },
                    ty,
                    span,
                )
            }
            ast::ExprKind::Index { base, index } => {
                let base = self.lower(base, None);
                let index = self.lower(index, Some(Primitive::I32));
                let ty = match (&base.ty, &index.ty) {
                    (Some(b), Some(i)) => self.check(infer_index(b, i), span),
                    _ => None,
                };
                ir::Expr::new(
                    ExprKind::Index {
                        base: Box::new(base),
                        index: Box::new(index),
                    },
                    ty,
                    span,
                )
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &ast::Expr,
        rhs: &ast::Expr,
        hint: Option<Primitive>,
        span: Span,
    ) -> ir::Expr {
        let operand_hint = if op.is_arithmetic() { hint } else { None };
        let lhs = self.lower(lhs, operand_hint);
        let rhs = self.lower(rhs, operand_hint);
        let (lhs, rhs) = match (lhs.is_abstract_literal(), rhs.is_abstract_literal()) {
            (true, false) => match rhs.ty.as_ref().and_then(Type::element) {
                Some(p) => (coerce_literal(lhs, p), rhs),
                None => (lhs, rhs),
            },
            (false, true) => match lhs.ty.as_ref().and_then(Type::element) {
                Some(p) => {
                    let rhs = coerce_literal(rhs, p);
                    (lhs, rhs)
                }
                None => (lhs, rhs),
            },
            _ => (lhs, rhs),
        };
        let ty = match (&lhs.ty, &rhs.ty) {
            (Some(l), Some(r)) => self.check(infer_binary(op, l, r), span),
            _ => None,
        };
        ir::Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        )
    }

    fn lower_call(
        &mut self,
        name: &str,
        type_args: &[TypeArg],
        args: &[ast::Expr],
        hint: Option<Primitive>,
        span: Span,
    ) -> ir::Expr {
        trace!("typing call to `{}` with {} argument(s)", name, args.len());
        let ctx = self.ctx;

        if let Some(signature) = ctx.function(name) {
            let lowered: Vec<ir::Expr> = args
                .iter()
                .enumerate()
                .map(|(i, arg)| {
                    let param = signature.params.get(i).and_then(Option::as_ref);
                    self.lower(arg, scalar_hint(param))
                })
                .collect();
            self.check_user_call(name, signature, &lowered, span);
            let ty = if signature.returns_value {
                signature.return_type.clone()
            } else {
                None
            };
            return call(Callee::User(name.to_string()), lowered, ty, span);
        }

        if let Some(struct_ty) = ctx.struct_type(name) {
            let fields: Vec<Type> = match struct_ty {
                Type::Struct { fields, .. } => fields.iter().map(|(_, t)| t.clone()).collect(),
                _ => Vec::new(),
            };
            let lowered: Vec<ir::Expr> = args
                .iter()
                .enumerate()
                .map(|(i, arg)| self.lower(arg, scalar_hint(fields.get(i))))
                .collect();
            let ty = struct_ty.clone();
            self.check_struct_constructor(&ty, &fields, &lowered, span);
            return call(Callee::Struct(name.to_string()), lowered, Some(ty), span);
        }

        if let Some(builtin) = Builtin::from_name(name) {
            let mut lowered: Vec<ir::Expr> = args.iter().map(|arg| self.lower(arg, None)).collect();
            if builtin.unifies_arguments() {
                lowered = unify_literals(lowered);
            }
            let ty = match all_typed(&lowered) {
                Some(types) => self.check(builtin.result_type(&types).map_err(|e| builtin_error(builtin, e)), span),
                None => None,
            };
            return call(Callee::Builtin(builtin), lowered, ty, span);
        }

        if name == "array" || Primitive::from_name(name).is_some() || parse_shape_name(name).is_some() {
            return self.lower_constructor(name, type_args, args, hint, span);
        }

        self.issues.push(TypeIssue::UndefinedFunction {
            name: name.to_string(),
            span,
        });
        let lowered = args.iter().map(|arg| self.lower(arg, None)).collect();
        call(Callee::User(name.to_string()), lowered, None, span)
    }

    fn check_user_call(&mut self, name: &str, signature: &FunctionSignature, args: &[ir::Expr], span: Span) {
        if args.len() != signature.params.len() {
            self.report(
                TypeError::new(
                    DiagnosticCode::WrongArgumentCount,
                    format!(
                        "function `{}` expects {} argument(s), found {}",
                        name,
                        signature.params.len(),
                        args.len()
                    ),
                ),
                span,
            );
            return;
        }
        for (i, (arg, param)) in args.iter().zip(&signature.params).enumerate() {
            if let (Some(found), Some(expected)) = (&arg.ty, param) {
                if found != expected {
                    self.report(
                        TypeError::new(
                            DiagnosticCode::TypeMismatch,
                            format!(
                                "argument {} of `{}`: expected `{}`, found `{}`",
                                i + 1,
                                name,
                                expected,
                                found
                            ),
                        ),
                        arg.span,
                    );
                }
            }
        }
    }

    fn check_struct_constructor(&mut self, ty: &Type, fields: &[Type], args: &[ir::Expr], span: Span) {
        if args.is_empty() {
            return;
        }
        if args.len() != fields.len() {
            self.report(
                TypeError::new(
                    DiagnosticCode::WrongArgumentCount,
                    format!("`{}` has {} field(s), found {} argument(s)", ty, fields.len(), args.len()),
                ),
                span,
            );
            return;
        }
        for (arg, field) in args.iter().zip(fields) {
            if let Some(found) = &arg.ty {
                if found != field {
                    self.report(
                        TypeError::new(
                            DiagnosticCode::TypeMismatch,
                            format!("expected `{}`, found `{}`", field, found),
                        ),
                        arg.span,
                    );
                }
            }
        }
    }

    fn lower_constructor(
        &mut self,
        name: &str,
        type_args: &[TypeArg],
        args: &[ast::Expr],
        hint: Option<Primitive>,
        span: Span,
    ) -> ir::Expr {
        let written = TypeExpr {
            name: name.to_string(),
            args: type_args.to_vec(),
            span,
        };
        let callee = Callee::Constructor(written.to_string());

        let explicit = if type_args.is_empty() {
            None
        } else {
            match self.ctx.resolve_type(&written) {
                Some(ty) => Some(ty),
                None => {
                    self.report(
                        TypeError::new(
                            DiagnosticCode::ConstructorComponentMismatch,
                            format!("invalid constructor type `{}`", written),
                        ),
                        span,
                    );
                    let lowered = args.iter().map(|arg| self.lower(arg, None)).collect();
                    return call(callee, lowered, None, span);
                }
            }
        };

        if let Some(target) = Primitive::from_name(name) {
            let lowered: Vec<ir::Expr> = args.iter().map(|arg| self.lower(arg, Some(target))).collect();
            let ty = match all_typed(&lowered) {
                Some(types) => self.check(infer_primitive_constructor(target, &types), span),
                None => None,
            };
            return call(callee, lowered, ty, span);
        }

        if name == "array" {
            let element_hint = match &explicit {
                Some(Type::Array { element, .. }) => scalar_hint(Some(element)),
                _ => None,
            };
            let mut lowered: Vec<ir::Expr> = args.iter().map(|arg| self.lower(arg, element_hint)).collect();
            if explicit.is_none() {
                lowered = unify_literals(lowered);
            }
            let ty = match all_typed(&lowered) {
                Some(types) => self.check(infer_array_constructor(explicit.as_ref(), &types), span),
                None => None,
            };
            return call(callee, lowered, ty, span);
        }

        let shape = match parse_shape_name(name) {
            Some(shape) => shape,
            None => {
                let lowered = args.iter().map(|arg| self.lower(arg, None)).collect();
                return call(callee, lowered, None, span);
            }
        };
        let written_element = match shape {
            ShapeName::Vector { element, .. } | ShapeName::Matrix { element, .. } => element,
        };
        let explicit_element = explicit.as_ref().and_then(Type::element).or(written_element);

        let mut lowered: Vec<ir::Expr> = args
            .iter()
            .map(|arg| self.lower(arg, explicit_element.or(hint)))
            .collect();
        let element = match explicit_element {
            Some(e) => e,
            None => {
                lowered = unify_literals(lowered);
                lowered
                    .iter()
                    .filter(|e| !e.is_abstract_literal())
                    .find_map(|e| e.ty.as_ref().and_then(Type::element))
                    .or(hint.filter(|h| h.is_numeric()))
                    .unwrap_or(Primitive::F32)
            }
        };
        let target = shape.with_element(element);
        let ty = match all_typed(&lowered) {
            Some(types) => self.check(infer_shape_constructor(&target, &types), span),
            None => None,
        };
        call(callee, lowered, ty, span)
    }
}

fn call(callee: Callee, args: Vec<ir::Expr>, ty: Option<Type>, span: Span) -> ir::Expr {
    ir::Expr::new(ExprKind::Call { callee, args }, ty, span)
}

fn builtin_error(builtin: Builtin, error: BuiltinError) -> TypeError {
    match error {
        BuiltinError::ArgumentCount { .. } => {
            TypeError::new(DiagnosticCode::WrongArgumentCount, format!("`{}`: {}", builtin, error))
        }
        BuiltinError::InvalidArgument(message) => TypeError::new(
            DiagnosticCode::InvalidOperandTypes,
            format!("invalid arguments to `{}`: {}", builtin, message),
        ),
    }
}

/// Type of a standalone expression, discarding any problems found.
pub fn infer_type(expr: &ast::Expr, ctx: &TypeContext) -> Option<Type> {
    let mut issues = Vec::new();
    Inferencer::new(ctx, &mut issues).lower(expr, None).ty
}
