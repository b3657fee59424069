//! Statement definitions for the AST

use super::*;

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression statement
    Expr(Node<Expr>),

    /// Variable declaration: const/let pattern: Type = value
    VarDecl(VarDecl),

    /// Type alias: type Name = Type
    TypeAlias(TypeAliasDecl),

    /// Block statement: { stmts }
    Block(BlockStmt),

    /// distribute (scrutinee) { body }: checks body once per union member
    Distribute {
        scrutinee: Node<Expr>,
        body: BlockStmt,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarDeclKind {
    Const,
    Let,
}

/// A single-binding declaration. A declaration without initializer stands
/// for an ambient (`declare const`) binding and must be annotated.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarDeclKind,
    pub pattern: Node<Pattern>,
    pub type_annotation: Option<Node<TypeId>>,
    pub init: Option<Node<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// x
    Ident(Node<Ident>),
    /// { a, b: c }
    Object(Vec<PatternProperty>),
}

impl Pattern {
    /// Names introduced by this pattern, in source order
    pub fn bindings(&self) -> Vec<&Node<Ident>> {
        match self {
            Pattern::Ident(name) => vec![name],
            Pattern::Object(props) => props.iter().map(|p| &p.binding).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    pub key: Node<Ident>,
    pub binding: Node<Ident>,
}

impl PatternProperty {
    pub fn shorthand(name: Node<Ident>) -> Self {
        Self { key: name.clone(), binding: name }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub name: Node<Ident>,
    pub ty: Node<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStmt {
    pub stmts: Vec<Node<Stmt>>,
}

/// A checked unit: top-level statements plus the span of the whole source
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Node<Stmt>>,
    pub span: Span,
}
