//! Type checking errors

use std::fmt;
use quanta_ast::Span;

/// Type error kinds. Types are captured in their rendered form so a
/// diagnostic outlives the arena it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeErrorKind {
    /// Type mismatch
    TypeMismatch {
        expected: String,
        found: String,
    },
    /// Undefined variable
    UndefinedVariable(String),
    /// Undefined type
    UndefinedType(String),
    /// Duplicate declaration in one scope
    DuplicateDeclaration(String),
    /// Property not found
    PropertyNotFound {
        ty: String,
        property: String,
    },
    /// Required property missing from an object literal
    MissingProperty {
        property: String,
        ty: String,
    },
    /// Cannot call non-function
    NotCallable(String),
    /// Cannot index non-array/object
    NotIndexable(String),
    /// Arity mismatch (function call)
    ArityMismatch {
        expected: usize,
        found: usize,
    },
    /// Invalid operation
    InvalidOperation(String),
    /// Extends clause of a conditional type did not match
    ShapeMismatch {
        pattern: String,
        candidate: String,
        reason: String,
    },
    /// Solved quantifier parameter does not satisfy its constraint
    ConstraintViolation {
        param: String,
        found: String,
        constraint: String,
    },
    /// Two positions of one row disagree on a quantifier parameter
    CorrelationViolation {
        param: String,
        position: String,
        found: String,
        anchor: String,
        expected: String,
    },
    /// Binding or alias read while it is still being declared
    SelfReferentialBinding(String),
    /// Construct outside the supported model, or recursion past the depth limit
    Unsupported(String),
}

impl TypeErrorKind {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            TypeErrorKind::TypeMismatch { .. } => "E2001",
            TypeErrorKind::UndefinedVariable(_) => "E2002",
            TypeErrorKind::UndefinedType(_) => "E2003",
            TypeErrorKind::DuplicateDeclaration(_) => "E2004",
            TypeErrorKind::PropertyNotFound { .. } => "E2005",
            TypeErrorKind::MissingProperty { .. } => "E2006",
            TypeErrorKind::NotCallable(_) => "E2007",
            TypeErrorKind::NotIndexable(_) => "E2008",
            TypeErrorKind::ArityMismatch { .. } => "E2009",
            TypeErrorKind::InvalidOperation(_) => "E2010",
            TypeErrorKind::ShapeMismatch { .. } => "E2011",
            TypeErrorKind::ConstraintViolation { .. } => "E2012",
            TypeErrorKind::CorrelationViolation { .. } => "E2013",
            TypeErrorKind::SelfReferentialBinding(_) => "E2014",
            TypeErrorKind::Unsupported(_) => "E2015",
        }
    }
}

/// Type error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
    pub note: Option<String>,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, span: Span) -> Self {
        Self { kind, span, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error[{}] at {}:{}: {}",
            self.code(),
            self.span.start,
            self.span.end,
            self.kind
        )?;
        if let Some(note) = &self.note {
            write!(f, " (note: {})", note)?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeErrorKind::TypeMismatch { expected, found } => {
                write!(f, "type '{}' is not assignable to type '{}'", found, expected)
            }
            TypeErrorKind::UndefinedVariable(name) => {
                write!(f, "undefined variable '{}'", name)
            }
            TypeErrorKind::UndefinedType(name) => {
                write!(f, "undefined type '{}'", name)
            }
            TypeErrorKind::DuplicateDeclaration(name) => {
                write!(f, "duplicate declaration of '{}'", name)
            }
            TypeErrorKind::PropertyNotFound { ty, property } => {
                write!(f, "property '{}' does not exist on type '{}'", property, ty)
            }
            TypeErrorKind::MissingProperty { property, ty } => {
                write!(f, "property '{}' is missing but required by type '{}'", property, ty)
            }
            TypeErrorKind::NotCallable(ty) => {
                write!(f, "type '{}' is not callable", ty)
            }
            TypeErrorKind::NotIndexable(ty) => {
                write!(f, "type '{}' cannot be indexed", ty)
            }
            TypeErrorKind::ArityMismatch { expected, found } => {
                write!(f, "expected {} arguments, found {}", expected, found)
            }
            TypeErrorKind::InvalidOperation(msg) => {
                write!(f, "invalid operation: {}", msg)
            }
            TypeErrorKind::ShapeMismatch { pattern, candidate, reason } => {
                write!(f, "'{}' does not match '{}': {}", candidate, pattern, reason)
            }
            TypeErrorKind::ConstraintViolation { param, found, constraint } => {
                write!(
                    f,
                    "type '{}' inferred for '{}' does not satisfy the constraint '{}'",
                    found, param, constraint
                )
            }
            TypeErrorKind::CorrelationViolation { param, position, found, anchor, expected } => {
                write!(
                    f,
                    "'{}' is '{}' at {} but '{}' at {}",
                    param, found, position, expected, anchor
                )
            }
            TypeErrorKind::SelfReferentialBinding(name) => {
                write!(f, "'{}' is referenced in its own initializer", name)
            }
            TypeErrorKind::Unsupported(msg) => {
                write!(f, "unsupported: {}", msg)
            }
        }
    }
}

impl std::error::Error for TypeError {}
