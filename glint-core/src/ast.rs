//! Abstract syntax tree produced by the parser.
//!
//! Every node carries the [`Span`] it was parsed from. The tree is never
//! edited in place; later stages build their own representations from it.

use serde::Serialize;
use std::fmt;

/// Source location of a node: 1-based line and column plus the byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    #[serde(skip)]
    pub offset: usize,
    #[serde(rename = "length")]
    pub len: usize,
}

impl Span {
    pub fn new(line: u32, column: u32, offset: usize, len: usize) -> Self {
        Span {
            line,
            column,
            offset,
            len,
        }
    }

    pub fn dummy() -> Self {
        Span::default()
    }

    /// A span starting at `self` and ending where `other` ends.
    pub fn to(self, other: Span) -> Span {
        let end = (other.offset + other.len).max(self.offset + self.len);
        Span {
            len: end - self.offset,
            ..self
        }
    }
}

/// Pipeline stage an entry point runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
            Stage::Compute => "compute",
        }
    }

    pub fn from_name(name: &str) -> Option<Stage> {
        match name {
            "vertex" => Some(Stage::Vertex),
            "fragment" => Some(Stage::Fragment),
            "compute" => Some(Stage::Compute),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decorator (`@name(args)`) attached to an item, parameter, field or return type.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Stage(Stage),
    WorkgroupSize(Vec<u32>),
    Group(u32),
    Binding(u32),
    Visibility(Vec<Stage>),
    BuiltIn(String),
    Location(u32),
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Stage(stage) => write!(f, "@{}", stage),
            Attribute::WorkgroupSize(dims) => {
                let dims: Vec<_> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "@workgroup_size({})", dims.join(", "))
            }
            Attribute::Group(n) => write!(f, "@group({})", n),
            Attribute::Binding(n) => write!(f, "@binding({})", n),
            Attribute::Visibility(stages) => {
                let stages: Vec<_> = stages.iter().map(|s| s.as_str()).collect();
                write!(f, "@visibility({})", stages.join(", "))
            }
            Attribute::BuiltIn(name) => write!(f, "@builtin({})", name),
            Attribute::Location(n) => write!(f, "@location({})", n),
        }
    }
}

pub trait AttrExt {
    fn has<F: Fn(&Attribute) -> bool>(&self, pred: F) -> bool;
    fn stages(&self) -> Vec<Stage>;
    fn first_builtin(&self) -> Option<&str>;
    fn first_location(&self) -> Option<u32>;
    fn workgroup_size(&self) -> Option<&[u32]>;
}

impl AttrExt for [Attribute] {
    fn has<F: Fn(&Attribute) -> bool>(&self, pred: F) -> bool {
        self.iter().any(pred)
    }
    fn stages(&self) -> Vec<Stage> {
        self.iter().filter_map(|a| if let Attribute::Stage(s) = a { Some(*s) } else { None }).collect()
    }
    fn first_builtin(&self) -> Option<&str> {
        self.iter().find_map(|a| if let Attribute::BuiltIn(b) = a { Some(b.as_str()) } else { None })
    }
    fn first_location(&self) -> Option<u32> {
        self.iter().find_map(|a| if let Attribute::Location(l) = a { Some(*l) } else { None })
    }
    fn workgroup_size(&self) -> Option<&[u32]> {
        self.iter().find_map(|a| if let Attribute::WorkgroupSize(d) = a { Some(d.as_slice()) } else { None })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Function(FunctionDecl),
    Struct(StructDecl),
    Uniform(UniformDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Function(f) => &f.name,
            Declaration::Struct(s) => &s.name,
            Declaration::Uniform(u) => &u.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Declaration::Function(f) => f.span,
            Declaration::Struct(s) => s.span,
            Declaration::Uniform(u) => u.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub return_attributes: Vec<Attribute>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    /// The first stage decorator, if any.
    pub fn stage(&self) -> Option<Stage> {
        self.attributes.stages().first().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub attributes: Vec<Attribute>,
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub group: u32,
    pub binding: u32,
    pub visibility: Vec<Stage>,
    pub span: Span,
}

/// A type as written in source, e.g. `vec3<f32>` or `array<Light, 4>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub name: String,
    pub args: Vec<TypeArg>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Type(TypeExpr),
    Size(u32),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            let args: Vec<_> = self
                .args
                .iter()
                .map(|a| match a {
                    TypeArg::Type(t) => t.to_string(),
                    TypeArg::Size(n) => n.to_string(),
                })
                .collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
    /// Location of the closing brace.
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
        ty: Option<TypeExpr>,
        value: Expr,
    },
    Var {
        name: String,
        ty: Option<TypeExpr>,
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
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
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
    /// `name(args)` or `name<T, ...>(args)`.
    Call {
        callee: String,
        type_args: Vec<TypeArg>,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Number(Number),
    Bool(bool),
}

/// A numeric literal. `integral` records that it was written without a
/// fractional part or exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Number {
    pub value: f64,
    pub kind: NumberKind,
    pub integral: bool,
}

/// Literal suffix. `Abstract` is an unsuffixed literal, typed `f32` unless
/// the context coerces it to another scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Abstract,
    F32,
    F16,
    I32,
    U32,
}

impl NumberKind {
    pub fn from_suffix(c: char) -> Option<NumberKind> {
        match c {
            'f' => Some(NumberKind::F32),
            'h' => Some(NumberKind::F16),
            'i' => Some(NumberKind::I32),
            'u' => Some(NumberKind::U32),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, NumberKind::I32 | NumberKind::U32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter. All operators are left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}
