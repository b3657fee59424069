//! Type expression model
//!
//! Type expressions live in a [`TypeArena`] and refer to their children by
//! [`TypeId`]. Nodes are never mutated after allocation; rewriting operations
//! (substitution, renaming) allocate new nodes and leave the originals intact.

use std::collections::BTreeSet;
use std::fmt;

/// Handle to a node in a [`TypeArena`].
///
/// The primitive types are interned at fixed indices by [`TypeArena::new`], so
/// they can be named without an arena at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const NUMBER: TypeId = TypeId(0);
    pub const STRING: TypeId = TypeId(1);
    pub const BOOLEAN: TypeId = TypeId(2);
    pub const VOID: TypeId = TypeId(3);
    pub const NULL: TypeId = TypeId(4);
    pub const UNDEFINED: TypeId = TypeId(5);
    pub const ANY: TypeId = TypeId(6);
    pub const NEVER: TypeId = TypeId(7);
    pub const UNKNOWN: TypeId = TypeId(8);

    /// First index handed out for non-primitive nodes
    pub const FIRST_DYNAMIC: u32 = 9;

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Number,
    String,
    Boolean,
    Void,
    Null,
    Undefined,
    Any,
    Never,
    Unknown,
}

impl PrimitiveType {
    /// Interning order; must line up with the reserved `TypeId` constants.
    pub const ALL: [PrimitiveType; 9] = [
        PrimitiveType::Number,
        PrimitiveType::String,
        PrimitiveType::Boolean,
        PrimitiveType::Void,
        PrimitiveType::Null,
        PrimitiveType::Undefined,
        PrimitiveType::Any,
        PrimitiveType::Never,
        PrimitiveType::Unknown,
    ];

    pub fn id(self) -> TypeId {
        match self {
            PrimitiveType::Number => TypeId::NUMBER,
            PrimitiveType::String => TypeId::STRING,
            PrimitiveType::Boolean => TypeId::BOOLEAN,
            PrimitiveType::Void => TypeId::VOID,
            PrimitiveType::Null => TypeId::NULL,
            PrimitiveType::Undefined => TypeId::UNDEFINED,
            PrimitiveType::Any => TypeId::ANY,
            PrimitiveType::Never => TypeId::NEVER,
            PrimitiveType::Unknown => TypeId::UNKNOWN,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Number => write!(f, "number"),
            PrimitiveType::String => write!(f, "string"),
            PrimitiveType::Boolean => write!(f, "boolean"),
            PrimitiveType::Void => write!(f, "void"),
            PrimitiveType::Null => write!(f, "null"),
            PrimitiveType::Undefined => write!(f, "undefined"),
            PrimitiveType::Any => write!(f, "any"),
            PrimitiveType::Never => write!(f, "never"),
            PrimitiveType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Literal types: "hello" | 42 | true
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl LiteralType {
    /// The primitive a literal widens to
    pub fn primitive(&self) -> PrimitiveType {
        match self {
            LiteralType::String(_) => PrimitiveType::String,
            LiteralType::Number(_) => PrimitiveType::Number,
            LiteralType::Boolean(_) => PrimitiveType::Boolean,
        }
    }

    /// Property key spelled by this literal, used when indexing objects
    pub fn as_key(&self) -> String {
        match self {
            LiteralType::String(s) => s.clone(),
            LiteralType::Number(n) => n.to_string(),
            LiteralType::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralType::String(s) => write!(f, "{:?}", s),
            LiteralType::Number(n) => write!(f, "{}", n),
            LiteralType::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A named property of an object type
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: TypeId,
    pub optional: bool,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty, optional: false }
    }

    pub fn optional(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty, optional: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
    pub optional: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty, optional: false }
    }

    pub fn optional(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty, optional: true }
    }
}

/// Parameter list and return type shared by the three callable shapes
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub ret: TypeId,
}

impl Signature {
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }
}

/// Type expression node
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// number, string, boolean, void, null, undefined, any, never, unknown
    Primitive(PrimitiveType),

    /// "hello" | 42 | true
    Literal(LiteralType),

    /// { a: T; b?: U }
    Object(Vec<Member>),

    /// T[]
    Array(TypeId),

    /// [A, B]
    Tuple(Vec<TypeId>),

    /// (x: T) => U
    Function(Signature),

    /// { (x: T): U }
    CallSignature(Signature),

    /// { new (x: T): U }
    ConstructSignature(Signature),

    /// A | B
    Union(Vec<TypeId>),

    /// A & B
    Intersection(Vec<TypeId>),

    /// C extends P ? X : Y
    Conditional {
        check: TypeId,
        extends: TypeId,
        true_type: TypeId,
        false_type: TypeId,
    },

    /// infer R
    Infer(String),

    /// <T extends C> Body
    Quantified {
        param: String,
        constraint: Option<TypeId>,
        body: TypeId,
    },

    /// A type alias name, a quantifier parameter, or an infer name used in a true branch
    Reference(String),
}

impl TypeNode {
    /// Human readable tag, used in shape mismatch diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeNode::Primitive(_) => "primitive type",
            TypeNode::Literal(_) => "literal type",
            TypeNode::Object(_) => "object type",
            TypeNode::Array(_) => "array type",
            TypeNode::Tuple(_) => "tuple type",
            TypeNode::Function(_) => "function type",
            TypeNode::CallSignature(_) => "call signature",
            TypeNode::ConstructSignature(_) => "construct signature",
            TypeNode::Union(_) => "union type",
            TypeNode::Intersection(_) => "intersection type",
            TypeNode::Conditional { .. } => "conditional type",
            TypeNode::Infer(_) => "infer placeholder",
            TypeNode::Quantified { .. } => "quantified type",
            TypeNode::Reference(_) => "type reference",
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            TypeNode::Function(sig)
            | TypeNode::CallSignature(sig)
            | TypeNode::ConstructSignature(sig) => Some(sig),
            _ => None,
        }
    }

    /// Invocable without `new`: bare functions and call signatures
    pub fn is_callable(&self) -> bool {
        matches!(self, TypeNode::Function(_) | TypeNode::CallSignature(_))
    }
}

/// Arena owning every type node of one checking session
#[derive(Debug, Clone)]
pub struct TypeArena {
    nodes: Vec<TypeNode>,
}

impl TypeArena {
    pub fn new() -> Self {
        let nodes = PrimitiveType::ALL.iter().map(|p| TypeNode::Primitive(*p)).collect();
        Self { nodes }
    }

    pub fn alloc(&mut self, node: TypeNode) -> TypeId {
        if let TypeNode::Primitive(p) = node {
            return p.id();
        }
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Look up a node. Ids are only ever minted by this arena.
    pub fn get(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn string_literal(&mut self, value: impl Into<String>) -> TypeId {
        self.alloc(TypeNode::Literal(LiteralType::String(value.into())))
    }

    pub fn number_literal(&mut self, value: f64) -> TypeId {
        self.alloc(TypeNode::Literal(LiteralType::Number(value)))
    }

    pub fn boolean_literal(&mut self, value: bool) -> TypeId {
        self.alloc(TypeNode::Literal(LiteralType::Boolean(value)))
    }

    pub fn object(&mut self, members: Vec<Member>) -> TypeId {
        self.alloc(TypeNode::Object(members))
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.alloc(TypeNode::Array(element))
    }

    pub fn tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Tuple(elements))
    }

    pub fn function(&mut self, params: Vec<Param>, ret: TypeId) -> TypeId {
        self.alloc(TypeNode::Function(Signature { params, ret }))
    }

    pub fn call_signature(&mut self, params: Vec<Param>, ret: TypeId) -> TypeId {
        self.alloc(TypeNode::CallSignature(Signature { params, ret }))
    }

    pub fn construct_signature(&mut self, params: Vec<Param>, ret: TypeId) -> TypeId {
        self.alloc(TypeNode::ConstructSignature(Signature { params, ret }))
    }

    pub fn union(&mut self, members: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Union(members))
    }

    pub fn intersection(&mut self, members: Vec<TypeId>) -> TypeId {
        self.alloc(TypeNode::Intersection(members))
    }

    pub fn conditional(
        &mut self,
        check: TypeId,
        extends: TypeId,
        true_type: TypeId,
        false_type: TypeId,
    ) -> TypeId {
        self.alloc(TypeNode::Conditional { check, extends, true_type, false_type })
    }

    pub fn infer(&mut self, name: impl Into<String>) -> TypeId {
        self.alloc(TypeNode::Infer(name.into()))
    }

    pub fn quantified(
        &mut self,
        param: impl Into<String>,
        constraint: Option<TypeId>,
        body: TypeId,
    ) -> TypeId {
        self.alloc(TypeNode::Quantified { param: param.into(), constraint, body })
    }

    pub fn reference(&mut self, name: impl Into<String>) -> TypeId {
        self.alloc(TypeNode::Reference(name.into()))
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Direct children of a node, in declaration order
    pub fn children(&self, id: TypeId) -> Vec<TypeId> {
        match self.get(id) {
            TypeNode::Primitive(_)
            | TypeNode::Literal(_)
            | TypeNode::Infer(_)
            | TypeNode::Reference(_) => Vec::new(),
            TypeNode::Object(members) => members.iter().map(|m| m.ty).collect(),
            TypeNode::Array(element) => vec![*element],
            TypeNode::Tuple(items) | TypeNode::Union(items) | TypeNode::Intersection(items) => {
                items.clone()
            }
            TypeNode::Function(sig)
            | TypeNode::CallSignature(sig)
            | TypeNode::ConstructSignature(sig) => {
                let mut out: Vec<TypeId> = sig.params.iter().map(|p| p.ty).collect();
                out.push(sig.ret);
                out
            }
            TypeNode::Conditional { check, extends, true_type, false_type } => {
                vec![*check, *extends, *true_type, *false_type]
            }
            TypeNode::Quantified { constraint, body, .. } => {
                let mut out: Vec<TypeId> = constraint.iter().copied().collect();
                out.push(*body);
                out
            }
        }
    }

    /// Names referenced but not bound inside `id`.
    ///
    /// Quantifiers bind their parameter over constraint and body; a conditional
    /// binds the infer names of its extends clause over its true branch.
    pub fn free_names(&self, id: TypeId) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_free_names(id, &mut out);
        out
    }

    fn collect_free_names(&self, id: TypeId, out: &mut BTreeSet<String>) {
        match self.get(id) {
            TypeNode::Reference(name) => {
                out.insert(name.clone());
            }
            TypeNode::Quantified { param, constraint, body } => {
                let mut inner = BTreeSet::new();
                if let Some(c) = constraint {
                    self.collect_free_names(*c, &mut inner);
                }
                self.collect_free_names(*body, &mut inner);
                inner.remove(param);
                out.extend(inner);
            }
            TypeNode::Conditional { check, extends, true_type, false_type } => {
                self.collect_free_names(*check, out);
                self.collect_free_names(*extends, out);
                self.collect_free_names(*false_type, out);
                let bound = self.infer_names(*extends);
                let mut branch = BTreeSet::new();
                self.collect_free_names(*true_type, &mut branch);
                out.extend(branch.into_iter().filter(|n| !bound.contains(n)));
            }
            _ => {
                for child in self.children(id) {
                    self.collect_free_names(child, out);
                }
            }
        }
    }

    pub fn mentions(&self, id: TypeId, name: &str) -> bool {
        self.free_names(id).contains(name)
    }

    /// Every infer placeholder name declared inside `id`
    pub fn infer_names(&self, id: TypeId) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let TypeNode::Infer(name) = self.get(next) {
                out.insert(name.clone());
            }
            stack.extend(self.children(next));
        }
        out
    }

    pub fn contains_infer(&self, id: TypeId) -> bool {
        self.any_node(id, |node| matches!(node, TypeNode::Infer(_)))
    }

    pub fn contains_quantified(&self, id: TypeId) -> bool {
        self.any_node(id, |node| matches!(node, TypeNode::Quantified { .. }))
    }

    pub fn contains_conditional(&self, id: TypeId) -> bool {
        self.any_node(id, |node| matches!(node, TypeNode::Conditional { .. }))
    }

    fn any_node(&self, id: TypeId, pred: impl Fn(&TypeNode) -> bool) -> bool {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if pred(self.get(next)) {
                return true;
            }
            stack.extend(self.children(next));
        }
        false
    }

    /// A name derived from `base` that does not collide with anything in `avoid`
    pub fn fresh_name(&self, base: &str, avoid: &BTreeSet<String>) -> String {
        let mut n = 1usize;
        loop {
            let candidate = format!("{}{}", base, n);
            if !avoid.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    // -------------------------------------------------------------------------
    // Structural equality
    // -------------------------------------------------------------------------

    /// Structural equality, identifying quantified types that differ only in
    /// the name of their bound parameter.
    pub fn structurally_equal(&self, a: TypeId, b: TypeId) -> bool {
        let mut binders = Vec::new();
        self.equal_in(a, b, &mut binders)
    }

    fn equal_in(&self, a: TypeId, b: TypeId, binders: &mut Vec<(String, String)>) -> bool {
        if a == b && binders.is_empty() {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (TypeNode::Primitive(x), TypeNode::Primitive(y)) => x == y,
            (TypeNode::Literal(x), TypeNode::Literal(y)) => x == y,
            (TypeNode::Infer(x), TypeNode::Infer(y)) => x == y,
            (TypeNode::Reference(x), TypeNode::Reference(y)) => {
                match binders.iter().rev().find(|(l, r)| l == x || r == y) {
                    Some((l, r)) => l == x && r == y,
                    None => x == y,
                }
            }
            (TypeNode::Object(ma), TypeNode::Object(mb)) => {
                ma.len() == mb.len()
                    && ma.iter().all(|m| {
                        mb.iter().any(|n| {
                            n.name == m.name
                                && n.optional == m.optional
                                && self.equal_in(m.ty, n.ty, binders)
                        })
                    })
            }
            (TypeNode::Array(x), TypeNode::Array(y)) => self.equal_in(*x, *y, binders),
            (TypeNode::Tuple(xs), TypeNode::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(x, y)| self.equal_in(*x, *y, binders))
            }
            (TypeNode::Union(xs), TypeNode::Union(ys))
            | (TypeNode::Intersection(xs), TypeNode::Intersection(ys)) => {
                xs.iter().all(|x| ys.iter().any(|y| self.equal_in(*x, *y, binders)))
                    && ys.iter().all(|y| xs.iter().any(|x| self.equal_in(*x, *y, binders)))
            }
            (TypeNode::Function(sa), TypeNode::Function(sb))
            | (TypeNode::CallSignature(sa), TypeNode::CallSignature(sb))
            | (TypeNode::ConstructSignature(sa), TypeNode::ConstructSignature(sb)) => {
                sa.params.len() == sb.params.len()
                    && sa.params.iter().zip(&sb.params).all(|(p, q)| {
                        p.optional == q.optional && self.equal_in(p.ty, q.ty, binders)
                    })
                    && self.equal_in(sa.ret, sb.ret, binders)
            }
            (
                TypeNode::Conditional { check: c1, extends: e1, true_type: t1, false_type: f1 },
                TypeNode::Conditional { check: c2, extends: e2, true_type: t2, false_type: f2 },
            ) => {
                self.equal_in(*c1, *c2, binders)
                    && self.equal_in(*e1, *e2, binders)
                    && self.equal_in(*t1, *t2, binders)
                    && self.equal_in(*f1, *f2, binders)
            }
            (
                TypeNode::Quantified { param: p1, constraint: k1, body: b1 },
                TypeNode::Quantified { param: p2, constraint: k2, body: b2 },
            ) => {
                binders.push((p1.clone(), p2.clone()));
                let constraints_equal = match (k1, k2) {
                    (None, None) => true,
                    (Some(x), Some(y)) => self.equal_in(*x, *y, binders),
                    _ => false,
                };
                let equal = constraints_equal && self.equal_in(*b1, *b2, binders);
                binders.pop();
                equal
            }
            _ => false,
        }
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}
