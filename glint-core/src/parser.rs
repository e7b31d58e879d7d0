use crate::ast::*;
use crate::diagnostics::{find_similar_names, Diagnostic, DiagnosticCode, DEFAULT_MAX_DISTANCE};
use crate::lexer::{tokenize, LocatedToken, Token};
use crate::source::SourceFile;
use crate::types::parse_shape_name;
use log::trace;

/// Deepest expression, block or type nesting accepted in one item. Later
/// stages walk the tree recursively.
pub const MAX_NESTING_DEPTH: usize = 128;

const DECORATORS: &[&str] = &[
    "vertex",
    "fragment",
    "compute",
    "workgroup_size",
    "group",
    "binding",
    "visibility",
    "builtin",
    "location",
];

/// A syntax error that aborts the current top-level item.
#[derive(Debug, Clone)]
struct ParseError {
    code: DiagnosticCode,
    message: String,
    span: Span,
}

impl ParseError {
    fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        ParseError {
            code,
            message: message.into(),
            span,
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::new(err.code, err.message).at(err.span)
    }
}

type PResult<T> = std::result::Result<T, ParseError>;

/// Tokenize and parse a source file. Lexical and syntax diagnostics are
/// returned together; the program is partial when any were reported.
pub fn parse(source: &SourceFile) -> (Program, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = tokenize(source);
    let (program, parse_diagnostics) = Parser::new(tokens).parse_program();
    diagnostics.extend(parse_diagnostics);
    (program, diagnostics)
}

pub struct Parser {
    tokens: Vec<LocatedToken>,
    current: usize,
    /// Open `(` and `{` between the start of the current item and `current`.
    depth: usize,
    /// Syntactic nesting of the expression, block or type being parsed.
    nesting: usize,
    diagnostics: Vec<Diagnostic>,
}

enum AttrArg {
    Ident(String),
    Number(Number),
}

impl Parser {
    pub fn new(mut tokens: Vec<LocatedToken>) -> Self {
        if !matches!(tokens.last(), Some(LocatedToken { token: Token::Eof, .. })) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(LocatedToken {
                token: Token::Eof,
                span: Span::new(span.line, span.column + span.len as u32, span.offset + span.len, 0),
            });
        }
        Parser {
            tokens: retain_item_visibility_comments(tokens),
            current: 0,
            depth: 0,
            nesting: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse every top-level item, recovering at item boundaries.
    pub fn parse_program(mut self) -> (Program, Vec<Diagnostic>) {
        let mut declarations = Vec::new();

        while !self.is_at_end() {
            let start = self.current;
            self.depth = 0;
            self.nesting = 0;
            match self.parse_item() {
                Ok(decl) => declarations.push(decl),
                Err(err) => {
                    let at_eof = self.is_at_end();
                    self.diagnostics.push(err.into());
                    if self.current == start {
                        self.advance();
                    }
                    self.synchronize();
                    if self.depth > 0 {
                        if !at_eof {
                            self.diagnostics.push(
                                Diagnostic::new(
                                    DiagnosticCode::UnexpectedToken,
                                    "unexpected end of input: unterminated item",
                                )
                                .at(self.peek_span()),
                            );
                        }
                        trace!("unterminated item at end of input, discarding program");
                        return (Program::default(), self.diagnostics);
                    }
                }
            }
        }

        (Program { declarations }, self.diagnostics)
    }

    /// Skip to the next token that can begin a top-level item outside any
    /// open braces or parentheses.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            let starts_item = matches!(
                self.peek(),
                Token::Fn | Token::Struct | Token::Uniform | Token::Var | Token::At | Token::VisibilityComment(_)
            );
            if self.depth == 0 && starts_item {
                return;
            }
            self.advance();
        }
    }

    fn parse_item(&mut self) -> PResult<Declaration> {
        trace!("parse_item: next token = {:?}", self.peek());
        let mut attributes = Vec::new();
        let mut commented_visibility = None;
        loop {
            match self.peek() {
                Token::VisibilityComment(stages) => {
                    commented_visibility = Some(stages.clone());
                    self.advance();
                }
                Token::At => attributes.extend(self.parse_attribute()?),
                _ => break,
            }
        }

        match self.peek() {
            Token::Fn => self.parse_function(attributes).map(Declaration::Function),
            Token::Struct => self.parse_struct().map(Declaration::Struct),
            Token::Uniform | Token::Var => {
                let explicit = attributes.iter().any(|a| matches!(a, Attribute::Visibility(_)));
                if let (false, Some(stages)) = (explicit, commented_visibility) {
                    attributes.push(Attribute::Visibility(stages));
                }
                self.parse_uniform(attributes).map(Declaration::Uniform)
            }
            Token::Eof if !attributes.is_empty() => Err(self.error_here("expected an item after decorators")),
            other => Err(ParseError::new(
                DiagnosticCode::ExpectedItem,
                format!("expected `fn`, `struct` or `uniform`, found {}", other),
                self.peek_span(),
            )),
        }
    }

    fn parse_function(&mut self, attributes: Vec<Attribute>) -> PResult<FunctionDecl> {
        trace!("parse_function: next token = {:?}", self.peek());
        self.expect(Token::Fn)?;
        let (name, span) = self.expect_identifier()?;

        self.expect(Token::LeftParen)?;
        let mut params = Vec::new();
        while !self.check(&Token::RightParen) {
            let param_attributes = self.parse_attributes()?;
            let (param_name, param_span) = self.expect_identifier()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param {
                attributes: param_attributes,
                name: param_name,
                ty,
                span: param_span,
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;

        let (return_type, return_attributes) = if self.eat(&Token::Arrow) {
            let attrs = self.parse_attributes()?;
            (Some(self.parse_type()?), attrs)
        } else {
            (None, Vec::new())
        };

        let body = self.parse_block()?;
        Ok(FunctionDecl {
            attributes,
            name,
            params,
            return_type,
            return_attributes,
            body,
            span,
        })
    }

    fn parse_struct(&mut self) -> PResult<StructDecl> {
        trace!("parse_struct: next token = {:?}", self.peek());
        self.expect(Token::Struct)?;
        let (name, span) = self.expect_identifier()?;
        self.expect(Token::LeftBrace)?;

        let mut fields = Vec::new();
        while !self.check(&Token::RightBrace) && !self.is_at_end() {
            let attributes = self.parse_attributes()?;
            let (field_name, field_span) = self.expect_identifier()?;
            self.expect(Token::Colon)?;
            let ty = self.parse_type()?;
            fields.push(Field {
                attributes,
                name: field_name,
                ty,
                span: field_span,
            });
            if !self.eat(&Token::Comma) {
                self.eat(&Token::Semicolon);
            }
        }
        self.expect(Token::RightBrace)?;
        self.eat(&Token::Semicolon);

        Ok(StructDecl { name, fields, span })
    }

    /// `uniform name: T;` or `var<space> name: T;`.
    fn parse_uniform(&mut self, attributes: Vec<Attribute>) -> PResult<UniformDecl> {
        trace!("parse_uniform: next token = {:?}", self.peek());
        if self.eat(&Token::Var) {
            if self.eat(&Token::Less) {
                if !self.eat(&Token::Uniform) {
                    self.expect_identifier()?;
                }
                if self.eat(&Token::Comma) {
                    self.expect_identifier()?;
                }
                self.expect(Token::Greater)?;
            }
        } else {
            self.expect(Token::Uniform)?;
        }
        let (name, span) = self.expect_identifier()?;
        self.expect(Token::Colon)?;
        let ty = self.parse_type()?;
        self.expect(Token::Semicolon)?;

        let mut group = None;
        let mut binding = None;
        let mut visibility = None;
        for attr in &attributes {
            match attr {
                Attribute::Group(g) => group = Some(*g),
                Attribute::Binding(b) => binding = Some(*b),
                Attribute::Visibility(stages) => visibility = Some(stages.clone()),
                _ => {}
            }
        }
        for (value, decorator) in [(group, "group"), (binding, "binding")] {
            if value.is_none() {
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::InvalidDecoratorArgument,
                        format!("uniform `{}` has no @{} decorator; defaulting to 0", name, decorator),
                    )
                    .at(span),
                );
            }
        }

        Ok(UniformDecl {
            name,
            ty,
            group: group.unwrap_or(0),
            binding: binding.unwrap_or(0),
            visibility: visibility.unwrap_or_else(|| vec![Stage::Vertex, Stage::Fragment]),
            span,
        })
    }

    fn parse_attributes(&mut self) -> PResult<Vec<Attribute>> {
        let mut attributes = Vec::new();
        while self.check(&Token::At) {
            if let Some(attr) = self.parse_attribute()? {
                attributes.push(attr);
            }
        }
        Ok(attributes)
    }

    /// Parse one decorator. Unknown decorators and bad arguments are
    /// reported without aborting the item; they yield `None`.
    fn parse_attribute(&mut self) -> PResult<Option<Attribute>> {
        trace!("parse_attribute: next token = {:?}", self.peek());
        let at_span = self.peek_span();
        self.expect(Token::At)?;
        let (name, name_span) = self.expect_identifier()?;
        let span = at_span.to(name_span);

        let mut args = Vec::new();
        if self.eat(&Token::LeftParen) {
            while !self.check(&Token::RightParen) {
                let arg = match self.peek().clone() {
                    Token::Identifier(ident) => AttrArg::Ident(ident),
                    Token::Number(n) => AttrArg::Number(n),
                    other => {
                        return Err(self.error_here(format!("expected a decorator argument, found {}", other)));
                    }
                };
                self.advance();
                args.push(arg);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen)?;
        }
        let span = span.to(self.prev_span());

        let invalid = |message: String| {
            Diagnostic::new(DiagnosticCode::InvalidDecoratorArgument, message).at(span)
        };

        let attr = match name.as_str() {
            "vertex" | "fragment" | "compute" => match Stage::from_name(&name) {
                Some(stage) if args.is_empty() => Ok(Attribute::Stage(stage)),
                _ => Err(invalid(format!("@{} takes no arguments", name))),
            },
            "group" | "binding" | "location" => match args.as_slice() {
                [AttrArg::Number(n)] => match index_value(n) {
                    Some(v) if name == "group" => Ok(Attribute::Group(v)),
                    Some(v) if name == "binding" => Ok(Attribute::Binding(v)),
                    Some(v) => Ok(Attribute::Location(v)),
                    None => Err(invalid(format!("@{} expects a non-negative integer", name))),
                },
                _ => Err(invalid(format!("@{} expects exactly one integer argument", name))),
            },
            "workgroup_size" => {
                let dims: Option<Vec<u32>> = args
                    .iter()
                    .map(|a| match a {
                        AttrArg::Number(n) => index_value(n).filter(|v| *v > 0),
                        AttrArg::Ident(_) => None,
                    })
                    .collect();
                match dims {
                    Some(dims) if (1..=3).contains(&dims.len()) => Ok(Attribute::WorkgroupSize(dims)),
                    _ => Err(invalid("@workgroup_size expects one to three positive integers".to_string())),
                }
            }
            "visibility" => {
                let stages: Option<Vec<Stage>> = args
                    .iter()
                    .map(|a| match a {
                        AttrArg::Ident(s) => Stage::from_name(s),
                        AttrArg::Number(_) => None,
                    })
                    .collect();
                match stages {
                    Some(stages) if !stages.is_empty() => Ok(Attribute::Visibility(stages)),
                    _ => Err(invalid("@visibility expects stage names: vertex, fragment, compute".to_string())),
                }
            }
            "builtin" => match args.as_slice() {
                [AttrArg::Ident(b)] => Ok(Attribute::BuiltIn(b.clone())),
                _ => Err(invalid("@builtin expects a builtin value name".to_string())),
            },
            _ => {
                let suggestions = find_similar_names(&name, DECORATORS, DEFAULT_MAX_DISTANCE);
                Err(Diagnostic::new(DiagnosticCode::UnknownDecorator, format!("unknown decorator `@{}`", name))
                    .at(span)
                    .with_suggestions(suggestions))
            }
        };

        match attr {
            Ok(attr) => Ok(Some(attr)),
            Err(diag) => {
                self.diagnostics.push(diag);
                Ok(None)
            }
        }
    }

    fn parse_type(&mut self) -> PResult<TypeExpr> {
        trace!("parse_type: next token = {:?}", self.peek());
        let (name, span) = self.expect_identifier()?;
        let args = if self.check(&Token::Less) {
            self.parse_type_args()?
        } else {
            Vec::new()
        };
        Ok(TypeExpr {
            name,
            args,
            span: span.to(self.prev_span()),
        })
    }

    fn parse_type_args(&mut self) -> PResult<Vec<TypeArg>> {
        self.expect(Token::Less)?;
        let mut args = Vec::new();
        loop {
            let arg = match self.peek().clone() {
                Token::Number(n) => {
                    let size = index_value(&n)
                        .ok_or_else(|| self.error_here("array size must be a non-negative integer"))?;
                    self.advance();
                    TypeArg::Size(size)
                }
                _ => TypeArg::Type(self.nested(1, "type", Self::parse_type)?),
            };
            args.push(arg);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::Greater)?;
        Ok(args)
    }

    fn parse_block(&mut self) -> PResult<Block> {
        let span = self.peek_span();
        self.expect(Token::LeftBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&Token::RightBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }
        let end = self.peek_span();
        self.expect(Token::RightBrace)?;
        Ok(Block { stmts, span, end })
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        trace!("parse_statement: next token = {:?}", self.peek());
        let start = self.peek_span();
        let kind = match self.peek() {
            Token::Let => {
                self.advance();
                let (name, _) = self.expect_identifier()?;
                let ty = if self.eat(&Token::Colon) { Some(self.parse_type()?) } else { None };
                self.expect(Token::Assign)?;
                let value = self.parse_expression()?;
                self.expect(Token::Semicolon)?;
                StmtKind::Let { name, ty, value }
            }
            Token::Var => {
                self.advance();
                let (name, _) = self.expect_identifier()?;
                let ty = if self.eat(&Token::Colon) { Some(self.parse_type()?) } else { None };
                let value = if self.eat(&Token::Assign) { Some(self.parse_expression()?) } else { None };
                self.expect(Token::Semicolon)?;
                StmtKind::Var { name, ty, value }
            }
            Token::Return => {
                self.advance();
                let value = if self.check(&Token::Semicolon) { None } else { Some(self.parse_expression()?) };
                self.expect(Token::Semicolon)?;
                StmtKind::Return(value)
            }
            Token::LeftBrace => StmtKind::Block(self.nested(1, "block", Self::parse_block)?),
            _ => {
                let target = self.parse_expression()?;
                if self.eat(&Token::Assign) {
                    let value = self.parse_expression()?;
                    self.expect(Token::Semicolon)?;
                    StmtKind::Assign { target, value }
                } else {
                    self.expect(Token::Semicolon)?;
                    StmtKind::Expr(target)
                }
            }
        };
        Ok(Stmt {
            kind,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_binary_expression_with_precedence(1)
    }

    fn binary_operator(token: &Token) -> Option<BinaryOp> {
        match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::Ne),
            Token::Less => Some(BinaryOp::Lt),
            Token::Greater => Some(BinaryOp::Gt),
            Token::LessEq => Some(BinaryOp::Le),
            Token::GreaterEq => Some(BinaryOp::Ge),
            Token::AndAnd => Some(BinaryOp::And),
            Token::OrOr => Some(BinaryOp::Or),
            _ => None,
        }
    }

    fn parse_binary_expression_with_precedence(&mut self, min_precedence: u8) -> PResult<Expr> {
        let mut left = self.parse_unary_expression()?;
        let mut chain = 0;

        while let Some(op) = Self::binary_operator(self.peek()) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            // All operators are left-associative, so each one deepens the tree.
            chain += 1;
            let right = self.nested(chain, "expression", |p| {
                p.parse_binary_expression_with_precedence(precedence + 1)
            })?;
            let span = left.span.to(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_postfix_expression(),
        };
        let start = self.peek_span();
        self.advance();
        let operand = self.nested(1, "expression", Self::parse_unary_expression)?;
        let span = start.to(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix_expression(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary_expression()?;
        let mut chain = 0;

        loop {
            match self.peek() {
                Token::Dot => {
                    chain += 1;
                    self.check_nesting(chain, "expression")?;
                    self.advance();
                    let (member, member_span) = self.expect_identifier()?;
                    let span = expr.span.to(member_span);
                    expr = Expr::new(
                        ExprKind::Member {
                            base: Box::new(expr),
                            member,
                        },
                        span,
                    );
                }
                Token::LeftBracket => {
                    chain += 1;
                    self.advance();
                    let index = self.nested(chain, "expression", Self::parse_expression)?;
                    self.expect(Token::RightBracket)?;
                    let span = expr.span.to(self.prev_span());
                    expr = Expr::new(
                        ExprKind::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Token::LeftParen => {
                    return Err(self.error_here("only named functions can be called"));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> PResult<Expr> {
        trace!("parse_primary_expression: next token = {:?}", self.peek());
        let span = self.peek_span();
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Number(n)), span))
            }
            Token::True | Token::False => {
                let value = self.check(&Token::True);
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Bool(value)), span))
            }
            Token::LeftParen => {
                self.advance();
                let inner = self.nested(1, "expression", Self::parse_expression)?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            Token::Identifier(name) => {
                self.advance();
                let type_args = if self.check(&Token::Less) && takes_type_args(&name) {
                    self.try_parse_constructor_type_args()
                } else {
                    None
                };
                if type_args.is_some() || self.check(&Token::LeftParen) {
                    let args = self.parse_call_arguments()?;
                    Ok(Expr::new(
                        ExprKind::Call {
                            callee: name,
                            type_args: type_args.unwrap_or_default(),
                            args,
                        },
                        span.to(self.prev_span()),
                    ))
                } else {
                    Ok(Expr::new(ExprKind::Identifier(name), span))
                }
            }
            other => Err(self.error_here(format!("expected an expression, found {}", other))),
        }
    }

    /// `<...>` followed by `(` after a constructor name. Backtracks and
    /// returns `None` when the tokens read as a comparison instead.
    fn try_parse_constructor_type_args(&mut self) -> Option<Vec<TypeArg>> {
        let checkpoint = self.current;
        match self.parse_type_args() {
            Ok(args) if self.check(&Token::LeftParen) => Some(args),
            _ => {
                self.current = checkpoint;
                None
            }
        }
    }

    fn parse_call_arguments(&mut self) -> PResult<Vec<Expr>> {
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        while !self.check(&Token::RightParen) {
            args.push(self.nested(1, "expression", Self::parse_expression)?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;
        Ok(args)
    }

    /// Run `parse` `levels` deeper than the current nesting, failing once
    /// the nesting would pass [`MAX_NESTING_DEPTH`].
    fn nested<T>(&mut self, levels: usize, what: &str, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.check_nesting(levels, what)?;
        self.nesting += levels;
        let result = parse(self);
        self.nesting -= levels;
        result
    }

    fn check_nesting(&self, levels: usize, what: &str) -> PResult<()> {
        if self.nesting + levels > MAX_NESTING_DEPTH {
            return Err(self.error_here(format!("{} nested too deeply", what)));
        }
        Ok(())
    }

    // Helper methods
    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)].token
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.current.min(self.tokens.len() - 1)].span
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.current.saturating_sub(1).min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        match self.peek() {
            Token::LeftBrace | Token::LeftParen => self.depth += 1,
            Token::RightBrace | Token::RightParen => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.current += 1;
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        let matched = self.check(token);
        if matched {
            self.advance();
        }
        matched
    }

    fn expect(&mut self, token: Token) -> PResult<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {}, found {}", token, self.peek())))
        }
    }

    fn expect_identifier(&mut self) -> PResult<(String, Span)> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                let span = self.peek_span();
                self.advance();
                Ok((name, span))
            }
            other => Err(self.error_here(format!("expected an identifier, found {}", other))),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(DiagnosticCode::UnexpectedToken, message, self.peek_span())
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }
}

/// Drop visibility comments except those heading a top-level item.
fn retain_item_visibility_comments(tokens: Vec<LocatedToken>) -> Vec<LocatedToken> {
    let mut depth = 0usize;
    let mut kept = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    while let Some(token) = iter.next() {
        match &token.token {
            Token::LeftBrace | Token::LeftParen => depth += 1,
            Token::RightBrace | Token::RightParen => depth = depth.saturating_sub(1),
            Token::VisibilityComment(_) => {
                let heads_item = matches!(
                    iter.peek().map(|t| &t.token),
                    Some(Token::At | Token::Var | Token::Uniform | Token::VisibilityComment(_))
                );
                if depth > 0 || !heads_item {
                    continue;
                }
            }
            _ => {}
        }
        kept.push(token);
    }
    kept
}

/// Names that may be followed by `<T>` in expression position.
fn takes_type_args(name: &str) -> bool {
    name == "array" || parse_shape_name(name).is_some()
}

fn index_value(n: &Number) -> Option<u32> {
    let integral = n.integral && matches!(n.kind, NumberKind::Abstract | NumberKind::I32 | NumberKind::U32);
    (integral && n.value >= 0.0 && n.value <= u32::MAX as f64).then_some(n.value as u32)
}

#[cfg(test)]
mod tests;
