//! Traversal over the typed IR.
//!
//! [`Visitor`] walks by reference and may short-circuit through
//! `ControlFlow`. [`Folder`] consumes the tree and rebuilds it, which is how
//! the optimization passes rewrite functions. Both delegate to `walk_*` /
//! `fold_*` functions that perform the canonical traversal, so
//! implementors override only the hooks they need.

use super::*;
use std::ops::ControlFlow;

pub trait Visitor: Sized {
    type Break;

    fn visit_program(&mut self, p: &Program) -> ControlFlow<Self::Break> {
        walk_program(self, p)
    }

    fn visit_function(&mut self, f: &Function) -> ControlFlow<Self::Break> {
        walk_function(self, f)
    }

    fn visit_block(&mut self, b: &Block) -> ControlFlow<Self::Break> {
        walk_block(self, b)
    }

    fn visit_stmt(&mut self, s: &Stmt) -> ControlFlow<Self::Break> {
        walk_stmt(self, s)
    }

    fn visit_expr(&mut self, e: &Expr) -> ControlFlow<Self::Break> {
        walk_expr(self, e)
    }

    fn visit_expr_binary(&mut self, _e: &Expr, _op: BinaryOp, lhs: &Expr, rhs: &Expr) -> ControlFlow<Self::Break> {
        self.visit_expr(lhs)?;
        self.visit_expr(rhs)
    }

    fn visit_expr_call(&mut self, _e: &Expr, _callee: &Callee, args: &[Expr]) -> ControlFlow<Self::Break> {
        walk_exprs(self, args)
    }

    fn visit_expr_identifier(&mut self, _name: &str) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }
}

pub fn walk_program<V: Visitor>(v: &mut V, p: &Program) -> ControlFlow<V::Break> {
    for function in &p.functions {
        v.visit_function(function)?;
    }
    ControlFlow::Continue(())
}

pub fn walk_function<V: Visitor>(v: &mut V, f: &Function) -> ControlFlow<V::Break> {
    v.visit_block(&f.body)
}

pub fn walk_block<V: Visitor>(v: &mut V, b: &Block) -> ControlFlow<V::Break> {
    for stmt in &b.stmts {
        v.visit_stmt(stmt)?;
    }
    ControlFlow::Continue(())
}

pub fn walk_stmt<V: Visitor>(v: &mut V, s: &Stmt) -> ControlFlow<V::Break> {
    match &s.kind {
        StmtKind::Let { value, .. } => v.visit_expr(value),
        StmtKind::Var { value: Some(value), .. } => v.visit_expr(value),
        StmtKind::Var { value: None, .. } => ControlFlow::Continue(()),
        StmtKind::Assign { target, value } => {
            v.visit_expr(target)?;
            v.visit_expr(value)
        }
        StmtKind::Return(Some(value)) | StmtKind::Expr(value) => v.visit_expr(value),
        StmtKind::Return(None) => ControlFlow::Continue(()),
        StmtKind::Block(block) => v.visit_block(block),
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, e: &Expr) -> ControlFlow<V::Break> {
    match &e.kind {
        ExprKind::Literal(_) => ControlFlow::Continue(()),
        ExprKind::Identifier(name) => v.visit_expr_identifier(name),
        ExprKind::Binary { op, lhs, rhs } => v.visit_expr_binary(e, *op, lhs, rhs),
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Call { callee, args } => v.visit_expr_call(e, callee, args),
        ExprKind::Member { base, .. } => v.visit_expr(base),
        ExprKind::Index { base, index } => {
            v.visit_expr(base)?;
            v.visit_expr(index)
        }
    }
}

pub fn walk_exprs<V: Visitor>(v: &mut V, exprs: &[Expr]) -> ControlFlow<V::Break> {
    for expr in exprs {
        v.visit_expr(expr)?;
    }
    ControlFlow::Continue(())
}

/// A rewriting pass over the IR. Every hook takes ownership of a node and
/// returns its replacement.
pub trait Folder: Sized {
    fn fold_program(&mut self, p: Program) -> Program {
        fold_program(self, p)
    }

    fn fold_function(&mut self, f: Function) -> Function {
        fold_function(self, f)
    }

    fn fold_block(&mut self, b: Block) -> Block {
        fold_block(self, b)
    }

    fn fold_stmt(&mut self, s: Stmt) -> Stmt {
        fold_stmt(self, s)
    }

    fn fold_expr(&mut self, e: Expr) -> Expr {
        fold_expr(self, e)
    }
}

pub fn fold_program<F: Folder>(folder: &mut F, p: Program) -> Program {
    Program {
        functions: p.functions.into_iter().map(|f| folder.fold_function(f)).collect(),
        ..p
    }
}

pub fn fold_function<F: Folder>(folder: &mut F, f: Function) -> Function {
    Function {
        body: folder.fold_block(f.body),
        ..f
    }
}

pub fn fold_block<F: Folder>(folder: &mut F, b: Block) -> Block {
    Block {
        stmts: b.stmts.into_iter().map(|s| folder.fold_stmt(s)).collect(),
        ..b
    }
}

pub fn fold_stmt<F: Folder>(folder: &mut F, s: Stmt) -> Stmt {
    let kind = match s.kind {
        StmtKind::Let { name, ty, value } => StmtKind::Let {
            name,
            ty,
            value: folder.fold_expr(value),
        },
        StmtKind::Var { name, ty, value } => StmtKind::Var {
            name,
            ty,
            value: value.map(|v| folder.fold_expr(v)),
        },
        StmtKind::Assign { target, value } => StmtKind::Assign {
            target: folder.fold_expr(target),
            value: folder.fold_expr(value),
        },
        StmtKind::Return(value) => StmtKind::Return(value.map(|v| folder.fold_expr(v))),
        StmtKind::Expr(value) => StmtKind::Expr(folder.fold_expr(value)),
        StmtKind::Block(block) => StmtKind::Block(folder.fold_block(block)),
    };
    Stmt { kind, span: s.span }
}

pub fn fold_expr<F: Folder>(folder: &mut F, e: Expr) -> Expr {
    let kind = match e.kind {
        ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
            op,
            lhs: Box::new(folder.fold_expr(*lhs)),
            rhs: Box::new(folder.fold_expr(*rhs)),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op,
            operand: Box::new(folder.fold_expr(*operand)),
        },
        ExprKind::Call { callee, args } => ExprKind::Call {
            callee,
            args: args.into_iter().map(|a| folder.fold_expr(a)).collect(),
        },
        ExprKind::Member { base, member, kind } => ExprKind::Member {
            base: Box::new(folder.fold_expr(*base)),
            member,
            kind,
        },
        ExprKind::Index { base, index } => ExprKind::Index {
            base: Box::new(folder.fold_expr(*base)),
            index: Box::new(folder.fold_expr(*index)),
        },
        leaf @ (ExprKind::Literal(_) | ExprKind::Identifier(_)) => leaf,
    };
    Expr { kind, ..e }
}
