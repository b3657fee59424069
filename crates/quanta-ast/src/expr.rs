//! Expression definitions for the AST

use super::*;
use std::fmt;

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal values
    Literal(Literal),

    /// Identifier
    Ident(Ident),

    /// Binary operation: left op right
    Binary {
        left: Box<Node<Expr>>,
        op: BinaryOp,
        right: Box<Node<Expr>>,
    },

    /// Unary operation: op expr
    Unary {
        op: UnaryOp,
        expr: Box<Node<Expr>>,
    },

    /// Function call: callee(args)
    Call {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
    },

    /// Constructor call: new callee(args)
    New {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
    },

    /// Member access: object.property
    Member {
        object: Box<Node<Expr>>,
        property: Node<Ident>,
    },

    /// Index access: object[index]
    Index {
        object: Box<Node<Expr>>,
        index: Box<Node<Expr>>,
    },

    /// Array literal: [elem1, elem2, ...]
    Array(Vec<Node<Expr>>),

    /// Object literal: { key1: value1, key2 }
    Object(Vec<ObjectProperty>),

    /// Arrow function: (params) => body
    Arrow {
        params: Vec<ArrowParam>,
        body: Box<Node<Expr>>,
    },
}

impl Expr {
    /// Dotted path for identifiers and member chains (`action.type`), the keys
    /// narrowing is recorded under.
    pub fn access_path(&self) -> Option<String> {
        match self {
            Expr::Ident(ident) => Some(ident.name.clone()),
            Expr::Member { object, property } => object
                .value
                .access_path()
                .map(|base| format!("{}.{}", base, property.value.name)),
            _ => None,
        }
    }

    /// Arrow functions with an unannotated parameter take their parameter
    /// types from context.
    pub fn is_context_sensitive(&self) -> bool {
        match self {
            Expr::Arrow { params, .. } => params.iter().any(|p| p.type_annotation.is_none()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    TypeOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    /// key: value
    Property {
        key: Node<Ident>,
        value: Node<Expr>,
    },
    /// { key }, reading the binding of the same name
    Shorthand(Node<Ident>),
}

impl ObjectProperty {
    pub fn key(&self) -> &Node<Ident> {
        match self {
            ObjectProperty::Property { key, .. } => key,
            ObjectProperty::Shorthand(key) => key,
        }
    }
}

/// Arrow function parameter with an optional type annotation
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowParam {
    pub name: Node<Ident>,
    pub type_annotation: Option<TypeId>,
    pub optional: bool,
}

impl ArrowParam {
    pub fn new(name: Node<Ident>) -> Self {
        Self { name, type_annotation: None, optional: false }
    }

    pub fn annotated(name: Node<Ident>, ty: TypeId) -> Self {
        Self { name, type_annotation: Some(ty), optional: false }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::TypeOf => "typeof",
        };
        write!(f, "{}", s)
    }
}
