//! Helper methods for type checking: type construction utilities and the
//! assignability oracle.

use quanta_ast::{LiteralType, PrimitiveType, Signature, TypeArena, TypeId, TypeNode};

use crate::env::TypeEnv;

/// Helper methods for type construction and classification
pub struct TypeHelpers;

impl TypeHelpers {
    pub fn is_numeric(arena: &TypeArena, ty: TypeId) -> bool {
        matches!(
            arena.get(ty),
            TypeNode::Primitive(PrimitiveType::Number) | TypeNode::Literal(LiteralType::Number(_))
        )
    }

    pub fn is_string(arena: &TypeArena, ty: TypeId) -> bool {
        matches!(
            arena.get(ty),
            TypeNode::Primitive(PrimitiveType::String) | TypeNode::Literal(LiteralType::String(_))
        )
    }

    /// Flattened, deduplicated union. `never` members vanish, `any` absorbs
    /// everything, and a single remaining member is returned as is.
    pub fn union_type(arena: &mut TypeArena, types: Vec<TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        let mut stack: Vec<TypeId> = types.into_iter().rev().collect();
        while let Some(ty) = stack.pop() {
            match arena.get(ty) {
                TypeNode::Union(members) => stack.extend(members.iter().rev().copied()),
                TypeNode::Primitive(PrimitiveType::Never) => {}
                TypeNode::Primitive(PrimitiveType::Any) => return TypeId::ANY,
                _ => {
                    if !flat.iter().any(|t| arena.structurally_equal(*t, ty)) {
                        flat.push(ty);
                    }
                }
            }
        }

        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => arena.union(flat),
        }
    }

    /// Replace literal types by their primitives, through object, array,
    /// tuple, and union structure. Callable types are left alone.
    pub fn widen(arena: &mut TypeArena, ty: TypeId) -> TypeId {
        match arena.get(ty).clone() {
            TypeNode::Literal(lit) => lit.primitive().id(),
            TypeNode::Object(_) | TypeNode::Array(_) | TypeNode::Tuple(_) => {
                arena.map_children(ty, Self::widen)
            }
            TypeNode::Union(members) => {
                let widened = members.into_iter().map(|m| Self::widen(arena, m)).collect();
                Self::union_type(arena, widened)
            }
            _ => ty,
        }
    }

    /// True when no value inhabits both types. Only primitives and literals
    /// are judged; anything else may overlap.
    pub fn are_disjoint(arena: &TypeArena, a: TypeId, b: TypeId) -> bool {
        let prim = |ty: TypeId| match arena.get(ty) {
            TypeNode::Primitive(p) => Some(*p),
            TypeNode::Literal(lit) => Some(lit.primitive()),
            _ => None,
        };
        match (arena.get(a), arena.get(b)) {
            (TypeNode::Literal(x), TypeNode::Literal(y)) => x != y,
            _ => match (prim(a), prim(b)) {
                (Some(PrimitiveType::Any | PrimitiveType::Unknown), _)
                | (_, Some(PrimitiveType::Any | PrimitiveType::Unknown)) => false,
                (Some(x), Some(y)) => x != y,
                _ => false,
            },
        }
    }
}

/// Assignability oracle. Resolves alias references through the environment
/// and treats a pair already under comparison as assignable, so recursive
/// aliases terminate.
pub struct Assignability<'a> {
    arena: &'a TypeArena,
    env: &'a TypeEnv,
    max_depth: usize,
    assumed: Vec<(TypeId, TypeId)>,
}

impl<'a> Assignability<'a> {
    pub fn new(arena: &'a TypeArena, env: &'a TypeEnv, max_depth: usize) -> Self {
        Self { arena, env, max_depth, assumed: Vec::new() }
    }

    /// Follow alias references. A cycle, or a chain longer than the depth
    /// limit, resolves to `unknown`.
    pub fn resolve(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..self.max_depth {
            match self.arena.get(current) {
                TypeNode::Reference(name) => match self.env.lookup_type(name) {
                    Some(target) => current = target,
                    None => return current,
                },
                _ => return current,
            }
        }
        TypeId::UNKNOWN
    }

    pub fn mutually_assignable(&mut self, a: TypeId, b: TypeId) -> bool {
        self.is_assignable(a, b) && self.is_assignable(b, a)
    }

    pub fn is_assignable(&mut self, from: TypeId, to: TypeId) -> bool {
        let from = self.resolve(from);
        let to = self.resolve(to);

        if from == to || self.arena.structurally_equal(from, to) {
            return true;
        }
        if self.assumed.contains(&(from, to)) {
            return true;
        }
        if self.assumed.len() >= self.max_depth {
            return false;
        }

        self.assumed.push((from, to));
        let result = self.compare(from, to);
        self.assumed.pop();
        result
    }

    fn compare(&mut self, from: TypeId, to: TypeId) -> bool {
        let arena = self.arena;
        match (arena.get(from), arena.get(to)) {
            // Top types accept everything; any and never flow anywhere
            (_, TypeNode::Primitive(PrimitiveType::Any | PrimitiveType::Unknown)) => true,
            (TypeNode::Primitive(PrimitiveType::Any | PrimitiveType::Never), _) => true,

            (
                TypeNode::Primitive(PrimitiveType::Undefined),
                TypeNode::Primitive(PrimitiveType::Void),
            ) => true,

            (TypeNode::Literal(lit), TypeNode::Primitive(prim)) => lit.primitive() == *prim,

            (TypeNode::Union(members), _) => members.iter().all(|m| self.is_assignable(*m, to)),
            (_, TypeNode::Union(members)) => members.iter().any(|m| self.is_assignable(from, *m)),
            (_, TypeNode::Intersection(members)) => {
                members.iter().all(|m| self.is_assignable(from, *m))
            }
            (TypeNode::Intersection(members), _) => {
                members.iter().any(|m| self.is_assignable(*m, to))
            }

            (TypeNode::Array(a), TypeNode::Array(b)) => self.is_assignable(*a, *b),
            (TypeNode::Tuple(xs), TypeNode::Tuple(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.is_assignable(*x, *y))
            }
            (TypeNode::Tuple(xs), TypeNode::Array(elem)) => {
                xs.iter().all(|x| self.is_assignable(*x, *elem))
            }

            (TypeNode::Object(src), TypeNode::Object(dst)) => {
                dst.iter().all(|target| match src.iter().find(|m| m.name == target.name) {
                    Some(source) => {
                        (target.optional || !source.optional)
                            && self.is_assignable(source.ty, target.ty)
                    }
                    None => target.optional,
                })
            }
            // Anything but the nullish primitives fits an all-optional object type
            (
                TypeNode::Primitive(
                    PrimitiveType::Null | PrimitiveType::Undefined | PrimitiveType::Void,
                ),
                TypeNode::Object(_),
            ) => false,
            (_, TypeNode::Object(dst)) => dst.iter().all(|m| m.optional),

            (
                TypeNode::Function(s) | TypeNode::CallSignature(s),
                TypeNode::Function(t) | TypeNode::CallSignature(t),
            )
            | (TypeNode::ConstructSignature(s), TypeNode::ConstructSignature(t)) => {
                self.signature_assignable(s, t)
            }

            // Under one binder, every instantiation of the target must also
            // instantiate the source
            (
                TypeNode::Quantified { param: p, constraint: c, body: b },
                TypeNode::Quantified { param: q, constraint: d, body: e },
            ) if p == q => {
                self.is_assignable(d.unwrap_or(TypeId::UNKNOWN), c.unwrap_or(TypeId::UNKNOWN))
                    && self.is_assignable(*b, *e)
            }

            _ => false,
        }
    }

    /// Parameters compare contravariantly; the source may accept fewer
    /// parameters than the target supplies. A `void` target return accepts
    /// any source return.
    fn signature_assignable(&mut self, source: &Signature, target: &Signature) -> bool {
        if source.required_params() > target.params.len() {
            return false;
        }
        let params_ok = source
            .params
            .iter()
            .zip(&target.params)
            .all(|(s, t)| self.is_assignable(t.ty, s.ty));
        if !params_ok {
            return false;
        }
        self.resolve(target.ret) == TypeId::VOID || self.is_assignable(source.ret, target.ret)
    }
}
