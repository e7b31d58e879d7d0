//! Typed intermediate representation.
//!
//! The analyzer produces it from the AST with a resolved type attached to
//! every expression; the optimizer and the WGSL generator consume it. Each
//! stage takes a `Program` by value and returns a new one.

pub mod visitor;

use crate::ast::{Attribute, BinaryOp, Literal, NumberKind, Span, Stage, UnaryOp};
use crate::builtins::Builtin;
use crate::types::Type;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: Vec<Function>,
    pub structs: Vec<Struct>,
    pub uniforms: Vec<Uniform>,
    pub entry_points: Vec<EntryPoint>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    pub name: String,
    pub stage: Stage,
}

/// A type annotation: its resolution, if any, and the spelling it was written with.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredType {
    pub resolved: Option<Type>,
    pub written: String,
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resolved {
            Some(ty) => write!(f, "{}", ty),
            None => f.write_str(&self.written),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<StructField>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: DeclaredType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub name: String,
    pub ty: DeclaredType,
    pub group: u32,
    pub binding: u32,
    pub visibility: Vec<Stage>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub stage: Option<Stage>,
    pub params: Vec<Param>,
    pub return_type: Option<DeclaredType>,
    pub return_attributes: Vec<Attribute>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: DeclaredType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
    pub end: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let {
        name: String,
        ty: Option<DeclaredType>,
        value: Expr,
    },
    Var {
        name: String,
        ty: Option<DeclaredType>,
        value: Option<Expr>,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    Return(Option<Expr>),
    Expr(Expr),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// `None` when the expression could not be typed; a diagnostic has
    /// already been reported for it or for one of its operands.
    pub ty: Option<Type>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Option<Type>, span: Span) -> Self {
        Expr { kind, ty, span }
    }

    /// An unsuffixed numeric literal, possibly negated.
    pub fn is_abstract_literal(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(Literal::Number(n)) => n.kind == NumberKind::Abstract,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => operand.is_abstract_literal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call {
        callee: Callee,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
        kind: MemberKind,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Builtin(Builtin),
    /// A type constructor or conversion, with its spelling as written
    /// (e.g. `vec3`, `vec4<f32>`, `array`).
    Constructor(String),
    Struct(String),
    /// A user function, or an unknown name that was reported as undefined.
    User(String),
}

impl Callee {
    pub fn name(&self) -> &str {
        match self {
            Callee::Builtin(b) => b.name(),
            Callee::Constructor(name) | Callee::Struct(name) | Callee::User(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Swizzle,
    Field,
}
