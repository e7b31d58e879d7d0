//! Constant folding pass for the IR.
//!
//! Evaluates operators whose operands are all literals and replaces them
//! with the computed literal. Children are folded first, so nested constant
//! expressions collapse in a single pass.

use crate::ast::{BinaryOp, Literal, Number, NumberKind, UnaryOp};
use crate::ir::visitor::{self, Folder};
use crate::ir::{Expr, ExprKind, Program};
use log::debug;

/// Constant folder that performs compile-time evaluation of literal expressions.
#[derive(Debug, Default)]
pub struct ConstantFolder {
    folded: usize,
}

impl ConstantFolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of expressions replaced so far.
    pub fn folded(&self) -> usize {
        self.folded
    }

    fn try_fold_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<Literal> {
        match (literal(lhs)?, literal(rhs)?) {
            (Literal::Number(l), Literal::Number(r)) => fold_numbers(op, l, r),
            (Literal::Bool(l), Literal::Bool(r)) => {
                let value = match op {
                    BinaryOp::And => l && r,
                    BinaryOp::Or => l || r,
                    BinaryOp::Eq => l == r,
                    BinaryOp::Ne => l != r,
                    _ => return None,
                };
                Some(Literal::Bool(value))
            }
            _ => None,
        }
    }

    fn try_fold_unary(&self, op: UnaryOp, operand: &Expr) -> Option<Literal> {
        match (op, &operand.kind) {
            // Negated literals are already in canonical form.
            (UnaryOp::Neg, _) => None,
            (UnaryOp::Not, ExprKind::Literal(Literal::Bool(b))) => Some(Literal::Bool(!b)),
            _ => None,
        }
    }
}

impl Folder for ConstantFolder {
    fn fold_expr(&mut self, e: Expr) -> Expr {
        let e = visitor::fold_expr(self, e);
        let folded = match &e.kind {
            ExprKind::Binary { op, lhs, rhs } => self.try_fold_binary(*op, lhs, rhs),
            ExprKind::Unary { op, operand } => self.try_fold_unary(*op, operand),
            _ => None,
        };
        match folded {
            Some(lit) => {
                debug!("folded expression at {}:{} to {:?}", e.span.line, e.span.column, lit);
                self.folded += 1;
                Expr::new(ExprKind::Literal(lit), e.ty, e.span)
            }
            None => e,
        }
    }
}

/// A literal operand, reading through a negation of a numeric literal.
fn literal(expr: &Expr) -> Option<Literal> {
    match &expr.kind {
        ExprKind::Literal(lit) => Some(*lit),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ExprKind::Literal(Literal::Number(n)) => Some(Literal::Number(Number { value: -n.value, ..*n })),
            _ => None,
        },
        _ => None,
    }
}

fn fold_numbers(op: BinaryOp, l: Number, r: Number) -> Option<Literal> {
    let kind = match (l.kind, r.kind) {
        (NumberKind::Abstract, k) | (k, NumberKind::Abstract) => k,
        (a, b) if a == b => a,
        _ => return None,
    };

    if op.is_comparison() {
        let value = match op {
            BinaryOp::Eq => l.value == r.value,
            BinaryOp::Ne => l.value != r.value,
            BinaryOp::Lt => l.value < r.value,
            BinaryOp::Le => l.value <= r.value,
            BinaryOp::Gt => l.value > r.value,
            BinaryOp::Ge => l.value >= r.value,
            _ => return None,
        };
        return Some(Literal::Bool(value));
    }

    let value = match kind {
        NumberKind::I32 => fold_i32(op, l.value as i32, r.value as i32)? as f64,
        NumberKind::U32 => fold_u32(op, l.value as u32, r.value as u32)? as f64,
        NumberKind::Abstract | NumberKind::F32 => fold_float(op, l.value, r.value)? as f32 as f64,
        NumberKind::F16 => {
            let v = fold_float(op, l.value, r.value)?;
            if v.abs() > 65504.0 {
                return None;
            }
            v
        }
    };
    if !value.is_finite() {
        return None;
    }
    Some(Literal::Number(Number {
        value,
        kind,
        integral: l.integral && r.integral && value.fract() == 0.0,
    }))
}

fn fold_float(op: BinaryOp, l: f64, r: f64) -> Option<f64> {
    match op {
        BinaryOp::Add => Some(l + r),
        BinaryOp::Sub => Some(l - r),
        BinaryOp::Mul => Some(l * r),
        BinaryOp::Div if r != 0.0 => Some(l / r),
        _ => None,
    }
}

fn fold_i32(op: BinaryOp, l: i32, r: i32) -> Option<i32> {
    match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Rem => l.checked_rem(r),
        _ => None,
    }
}

fn fold_u32(op: BinaryOp, l: u32, r: u32) -> Option<u32> {
    match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Rem => l.checked_rem(r),
        _ => None,
    }
}

/// Fold constants in an IR program (convenience function).
pub fn fold_constants(program: Program) -> Program {
    let mut folder = ConstantFolder::new();
    let program = folder.fold_program(program);
    debug!("constant folding replaced {} expression(s)", folder.folded());
    program
}
