//! WGSL Lowering
//!
//! Converts the typed IR to WGSL source text. Declarations are emitted in
//! order: structs, uniforms, then functions, each in declaration order.
//! Entry points get the stage decorations WGSL requires when the source
//! left them implicit.

use super::source_map::SourceMap;
use crate::ast::{AttrExt, Attribute, BinaryOp, Literal, Number, NumberKind, Span, Stage, UnaryOp};
use crate::bail_internal;
use crate::error::Result;
use crate::ir::{Block, Callee, Expr, ExprKind, Function, Program, Stmt, StmtKind, Struct, Uniform};
use crate::types::{Primitive, Type};
use log::debug;
use std::fmt::Write;

/// Workgroup size given to compute entries that do not declare one.
pub const DEFAULT_WORKGROUP_SIZE: u32 = 64;

const INDENT: &str = "    ";

/// Output from WGSL lowering.
#[derive(Debug, Clone)]
pub struct WgslOutput {
    pub code: String,
    pub source_map: Option<SourceMap>,
}

/// Lower an IR program to WGSL. `file` names the source in the source map,
/// which is only built when `source_maps` is set.
pub fn lower(program: &Program, file: &str, source_maps: bool) -> Result<WgslOutput> {
    for entry in &program.entry_points {
        if program.function(&entry.name).is_none() {
            bail_internal!("entry point `{}` has no function", entry.name);
        }
    }
    let mut ctx = LowerCtx {
        out: String::new(),
        line: 1,
        indent: 0,
        source_map: source_maps.then(|| SourceMap::new(file)),
    };
    ctx.lower_program(program)?;
    debug!("generated {} line(s) of WGSL", ctx.line - 1);
    Ok(WgslOutput {
        code: ctx.out,
        source_map: ctx.source_map,
    })
}

/// Context for lowering IR to WGSL
struct LowerCtx {
    out: String,
    /// 1-based line the next write lands on.
    line: u32,
    indent: usize,
    source_map: Option<SourceMap>,
}

impl LowerCtx {
    fn lower_program(&mut self, program: &Program) -> Result<()> {
        for s in &program.structs {
            self.lower_struct(s)?;
        }
        for u in &program.uniforms {
            self.lower_uniform(u)?;
        }
        if !program.uniforms.is_empty() {
            self.blank()?;
        }
        for (i, f) in program.functions.iter().enumerate() {
            if i > 0 {
                self.blank()?;
            }
            self.lower_function(f)?;
        }
        Ok(())
    }

    fn map(&mut self, span: Span, name: Option<&str>) {
        let column = (self.indent * INDENT.len()) as u32 + 1;
        if let Some(map) = &mut self.source_map {
            map.add(self.line, column, span, name);
        }
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        writeln!(self.out, "{}", text)?;
        self.line += 1;
        Ok(())
    }

    fn blank(&mut self) -> Result<()> {
        writeln!(self.out)?;
        self.line += 1;
        Ok(())
    }

    fn lower_struct(&mut self, s: &Struct) -> Result<()> {
        self.map(s.span, Some(&s.name));
        self.emit(&format!("struct {} {{", s.name))?;
        self.indent += 1;
        for field in &s.fields {
            let attrs = attribute_prefix(&field.attributes);
            self.emit(&format!("{}{}: {},", attrs, field.name, field.ty))?;
        }
        self.indent -= 1;
        self.emit("}")?;
        self.blank()
    }

    fn lower_uniform(&mut self, u: &Uniform) -> Result<()> {
        let stages: Vec<_> = u.visibility.iter().map(Stage::as_str).collect();
        self.emit(&format!("// visibility: {}", stages.join(", ")))?;
        let storage = match &u.ty.resolved {
            Some(ty) if ty.is_handle() => "var",
            _ => "var<uniform>",
        };
        self.map(u.span, Some(&u.name));
        self.emit(&format!(
            "@group({}) @binding({}) {} {}: {};",
            u.group, u.binding, storage, u.name, u.ty
        ))
    }

    fn lower_function(&mut self, f: &Function) -> Result<()> {
        let mut header = String::new();
        if let Some(stage) = f.stage {
            write!(header, "@{} ", stage)?;
            match f.attributes.workgroup_size() {
                Some(dims) => write!(header, "{} ", Attribute::WorkgroupSize(dims.to_vec()))?,
                None if stage == Stage::Compute => {
                    write!(header, "@workgroup_size({}) ", DEFAULT_WORKGROUP_SIZE)?
                }
                None => {}
            }
        }

        let mut params: Vec<String> = f
            .params
            .iter()
            .map(|p| format!("{}{}: {}", attribute_prefix(&p.attributes), p.name, p.ty))
            .collect();
        let has_builtin = |name: &str| f.params.iter().any(|p| p.attributes.first_builtin() == Some(name));
        match f.stage {
            Some(Stage::Vertex) if !has_builtin("vertex_index") => {
                params.push("@builtin(vertex_index) vertex_index: u32".to_string());
            }
            Some(Stage::Compute) if !has_builtin("global_invocation_id") => {
                params.push("@builtin(global_invocation_id) global_id: vec3<u32>".to_string());
            }
            _ => {}
        }

        write!(header, "fn {}({})", f.name, params.join(", "))?;
        if let Some(ret) = &f.return_type {
            let attrs = if !f.return_attributes.is_empty() {
                attribute_prefix(&f.return_attributes)
            } else {
                match (f.stage, &ret.resolved) {
                    (Some(Stage::Fragment), _) => "@location(0) ".to_string(),
                    (Some(Stage::Vertex), Some(Type::Vector { size: 4, .. })) => "@builtin(position) ".to_string(),
                    _ => String::new(),
                }
            };
            write!(header, " -> {}{}", attrs, ret)?;
        }
        header.push_str(" {");

        self.map(f.span, Some(&f.name));
        self.emit(&header)?;
        self.lower_stmts(&f.body)?;
        self.emit("}")
    }

    fn lower_stmts(&mut self, block: &Block) -> Result<()> {
        self.indent += 1;
        for stmt in &block.stmts {
            self.lower_stmt(stmt)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        let line = match &stmt.kind {
            StmtKind::Let { name, ty, value } => match ty {
                Some(ty) => format!("let {}: {} = {};", name, ty, expr(value)),
                None => format!("let {} = {};", name, expr(value)),
            },
            StmtKind::Var { name, ty, value } => {
                let mut line = format!("var {}", name);
                if let Some(ty) = ty {
                    write!(line, ": {}", ty)?;
                }
                if let Some(value) = value {
                    write!(line, " = {}", expr(value))?;
                }
                line.push(';');
                line
            }
            StmtKind::Assign { target, value } => format!("{} = {};", expr(target), expr(value)),
            StmtKind::Return(Some(value)) => format!("return {};", expr(value)),
            StmtKind::Return(None) => "return;".to_string(),
            StmtKind::Expr(value) => format!("{};", expr(value)),
            StmtKind::Block(block) => {
                self.map(stmt.span, None);
                self.emit("{")?;
                self.lower_stmts(block)?;
                return self.emit("}");
            }
        };
        let name = match &stmt.kind {
            StmtKind::Let { name, .. } | StmtKind::Var { name, .. } => Some(name.as_str()),
            _ => None,
        };
        self.map(stmt.span, name);
        self.emit(&line)
    }
}

fn attribute_prefix(attributes: &[Attribute]) -> String {
    attributes.iter().map(|a| format!("{} ", a)).collect()
}

fn expr(e: &Expr) -> String {
    match &e.kind {
        ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
        ExprKind::Literal(Literal::Number(n)) => number(n, e.ty.as_ref()),
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::Binary { op, lhs, rhs } => {
            format!("{} {} {}", operand(lhs, *op, false), op, operand(rhs, *op, true))
        }
        ExprKind::Unary { op, operand } => {
            let sign = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            };
            let needs_parens = matches!(operand.kind, ExprKind::Binary { .. } | ExprKind::Unary { .. })
                || is_negative_literal(operand);
            if needs_parens {
                format!("{}({})", sign, expr(operand))
            } else {
                format!("{}{}", sign, expr(operand))
            }
        }
        ExprKind::Call { callee, args } => {
            let name = match (callee, &e.ty) {
                (Callee::Constructor(_), Some(ty)) => ty.to_string(),
                _ => callee.name().to_string(),
            };
            let args: Vec<_> = args.iter().map(expr).collect();
            format!("{}({})", name, args.join(", "))
        }
        ExprKind::Member { base, member, .. } => format!("{}.{}", postfix_base(base), member),
        ExprKind::Index { base, index } => format!("{}[{}]", postfix_base(base), expr(index)),
    }
}

/// A binary operand, parenthesized unless its own operator binds tighter.
/// WGSL rejects mixing comparison and logical operators without
/// parentheses, so those always get them.
fn operand(e: &Expr, parent: BinaryOp, right: bool) -> String {
    let ExprKind::Binary { op, .. } = &e.kind else {
        return expr(e);
    };
    let tighter = op.precedence() > parent.precedence() || (op.precedence() == parent.precedence() && !right);
    if tighter && op.is_arithmetic() {
        expr(e)
    } else {
        format!("({})", expr(e))
    }
}

fn postfix_base(e: &Expr) -> String {
    match e.kind {
        ExprKind::Binary { .. } | ExprKind::Unary { .. } => format!("({})", expr(e)),
        _ if is_negative_literal(e) => format!("({})", expr(e)),
        _ => expr(e),
    }
}

fn is_negative_literal(e: &Expr) -> bool {
    matches!(&e.kind, ExprKind::Literal(Literal::Number(n)) if n.value < 0.0)
}

/// Spell a numeric literal for the scalar type it was given.
fn number(n: &Number, ty: Option<&Type>) -> String {
    let kind = match (n.kind, ty) {
        (NumberKind::Abstract, Some(Type::Primitive(p))) => match p {
            Primitive::F16 => NumberKind::F16,
            Primitive::I32 => NumberKind::I32,
            Primitive::U32 => NumberKind::U32,
            _ => NumberKind::F32,
        },
        (NumberKind::Abstract, _) => NumberKind::F32,
        (kind, _) => kind,
    };
    match kind {
        NumberKind::I32 => format!("{}i", n.value as i64),
        NumberKind::U32 => format!("{}u", n.value as u64),
        NumberKind::F16 => format!("{}h", float(n.value)),
        NumberKind::F32 | NumberKind::Abstract => float(n.value),
    }
}

fn float(value: f64) -> String {
    let mut text = (value as f32).to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(value: f64, kind: NumberKind) -> Number {
        Number {
            value,
            kind,
            integral: value.fract() == 0.0,
        }
    }

    #[test]
    fn test_literal_spelling() {
        assert_eq!(number(&num(2.0, NumberKind::Abstract), None), "2.0");
        assert_eq!(number(&num(2.0, NumberKind::F16), None), "2.0h");
        assert_eq!(number(&num(2.0, NumberKind::I32), None), "2i");
        assert_eq!(number(&num(2.0, NumberKind::U32), None), "2u");
        assert_eq!(number(&num(0.1, NumberKind::F32), None), "0.1");
        assert_eq!(number(&num(-3.0, NumberKind::I32), None), "-3i");
        let i32_ty = Type::Primitive(Primitive::I32);
        assert_eq!(number(&num(4.0, NumberKind::Abstract), Some(&i32_ty)), "4i");
    }

    #[test]
    fn test_float_keeps_fraction() {
        assert_eq!(float(1e6), "1000000.0");
        assert_eq!(float(0.5), "0.5");
    }
}
