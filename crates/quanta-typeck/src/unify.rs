//! Unifier: structural matching of a pattern containing `infer`
//! placeholders against a candidate type.
//!
//! Matching descends on the tag of the pattern. Placeholders bind to the
//! candidate subtree they meet; subtrees without placeholders are handed to
//! the assignability oracle. When one placeholder is bound more than once,
//! the bindings are merged by the variance of their positions.

use std::collections::BTreeMap;

use quanta_ast::{PrimitiveType, Signature, Span, Substitution, TypeArena, TypeId, TypeNode};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::env::TypeEnv;
use crate::helpers::{Assignability, TypeHelpers};
use crate::options::CheckerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Covariant,
    Contravariant,
}

impl Variance {
    pub fn flip(self) -> Self {
        match self {
            Variance::Covariant => Variance::Contravariant,
            Variance::Contravariant => Variance::Covariant,
        }
    }
}

/// Where a binding was read from
#[derive(Debug, Clone, PartialEq)]
pub enum Provenance {
    /// Matching a pattern against a candidate type
    Pattern,
    /// A position of an object, tuple, or array literal
    Position { path: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: TypeId,
    pub variance: Variance,
    pub provenance: Provenance,
}

/// Placeholder name -> binding, iterated in name order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: BTreeMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: impl Into<String>, ty: TypeId, variance: Variance) -> Self {
        let mut bindings = Self::new();
        bindings.insert(name.into(), Binding { ty, variance, provenance: Provenance::Pattern });
        bindings
    }

    pub fn insert(&mut self, name: String, binding: Binding) {
        self.entries.insert(name, binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn ty(&self, name: &str) -> Option<TypeId> {
        self.entries.get(name).map(|b| b.ty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.entries.iter()
    }

    pub fn to_substitution(&self) -> Substitution {
        self.entries.iter().map(|(name, b)| (name.clone(), b.ty)).collect()
    }
}

/// Why a match failed. `Shape` is the ordinary NoMatch outcome;
/// `Unsupported` aborts the whole resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchFailure {
    Shape { pattern: TypeId, candidate: TypeId, reason: String },
    Unsupported(String),
}

pub type MatchResult = Result<Bindings, MatchFailure>;

/// Memoized match results of one check request
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: FxHashMap<(TypeId, TypeId, Variance), MatchResult>,
    hits: usize,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

pub struct Unifier<'a> {
    arena: &'a mut TypeArena,
    env: &'a TypeEnv,
    cache: &'a mut MatchCache,
    options: &'a CheckerOptions,
    visiting: FxHashSet<(TypeId, TypeId, Variance)>,
    depth: usize,
}

impl<'a> Unifier<'a> {
    pub fn new(
        arena: &'a mut TypeArena,
        env: &'a TypeEnv,
        cache: &'a mut MatchCache,
        options: &'a CheckerOptions,
    ) -> Self {
        Self { arena, env, cache, options, visiting: FxHashSet::default(), depth: 0 }
    }

    /// Match `pattern` against `candidate` in covariant position
    pub fn match_types(&mut self, pattern: TypeId, candidate: TypeId) -> MatchResult {
        if self.arena.contains_quantified(pattern) {
            return Err(MatchFailure::Unsupported(format!(
                "quantified type inside the pattern '{}'",
                self.arena.display(pattern)
            )));
        }
        self.match_at(pattern, candidate, Variance::Covariant)
    }

    pub fn match_at(&mut self, pattern: TypeId, candidate: TypeId, variance: Variance) -> MatchResult {
        let key = (pattern, candidate, variance);
        if self.options.memoize {
            if let Some(hit) = self.cache.entries.get(&key) {
                self.cache.hits += 1;
                return hit.clone();
            }
        }
        // Re-entering a pair under comparison assumes success
        if self.visiting.contains(&key) {
            return Ok(Bindings::new());
        }
        if self.depth >= self.options.max_depth {
            return Err(MatchFailure::Unsupported(format!(
                "matching exceeded the depth limit of {}",
                self.options.max_depth
            )));
        }

        self.visiting.insert(key);
        self.depth += 1;
        let result = self.match_uncached(pattern, candidate, variance);
        self.depth -= 1;
        self.visiting.remove(&key);

        if self.options.memoize {
            self.cache.entries.insert(key, result.clone());
        }
        result
    }

    fn oracle(&self) -> Assignability<'_> {
        Assignability::new(&*self.arena, self.env, self.options.max_depth)
    }

    fn mismatch(&self, pattern: TypeId, candidate: TypeId, reason: impl Into<String>) -> MatchFailure {
        MatchFailure::Shape { pattern, candidate, reason: reason.into() }
    }

    fn match_uncached(&mut self, pattern: TypeId, candidate: TypeId, variance: Variance) -> MatchResult {
        let (pattern, candidate) = {
            let oracle = self.oracle();
            (oracle.resolve(pattern), oracle.resolve(candidate))
        };
        let p_node = self.arena.get(pattern).clone();

        if let TypeNode::Infer(name) = &p_node {
            trace!(%name, candidate = %self.arena.display(candidate), ?variance, "bind placeholder");
            return Ok(Bindings::single(name.clone(), candidate, variance));
        }

        if !self.arena.contains_infer(pattern) {
            let ok = match variance {
                Variance::Covariant => self.oracle().is_assignable(candidate, pattern),
                Variance::Contravariant => self.oracle().is_assignable(pattern, candidate),
            };
            trace!(pattern = %self.arena.display(pattern), candidate = %self.arena.display(candidate), ok, "leaf");
            return if ok {
                Ok(Bindings::new())
            } else {
                Err(self.mismatch(pattern, candidate, "types are not assignable"))
            };
        }

        let c_node = self.arena.get(candidate).clone();
        match &c_node {
            TypeNode::Primitive(PrimitiveType::Any) => {
                return Ok(self.bind_all(pattern, TypeId::ANY, variance));
            }
            TypeNode::Primitive(PrimitiveType::Never) => {
                return Ok(self.bind_all(pattern, TypeId::NEVER, variance));
            }
            TypeNode::Union(members) if !matches!(p_node, TypeNode::Union(_)) => {
                let mut acc = Bindings::new();
                for member in members {
                    let found = self.match_at(pattern, *member, variance)?;
                    self.merge_into(&mut acc, found)?;
                }
                return Ok(acc);
            }
            _ => {}
        }

        match p_node {
            TypeNode::ConstructSignature(ps) => match &c_node {
                TypeNode::ConstructSignature(cs) => {
                    self.match_signature(pattern, candidate, &ps, cs, variance)
                }
                other => Err(self.mismatch(
                    pattern,
                    candidate,
                    format!("expected a construct signature, found a {}", other.kind_name()),
                )),
            },
            TypeNode::Function(ps) | TypeNode::CallSignature(ps) => match &c_node {
                TypeNode::Function(cs) | TypeNode::CallSignature(cs) => {
                    self.match_signature(pattern, candidate, &ps, cs, variance)
                }
                TypeNode::ConstructSignature(_) => Err(self.mismatch(
                    pattern,
                    candidate,
                    "a construct signature cannot be called without 'new'",
                )),
                other => Err(self.mismatch(
                    pattern,
                    candidate,
                    format!("expected a callable type, found a {}", other.kind_name()),
                )),
            },
            TypeNode::Object(pattern_members) => {
                let TypeNode::Object(candidate_members) = &c_node else {
                    return Err(self.mismatch(
                        pattern,
                        candidate,
                        format!("expected an object type, found a {}", c_node.kind_name()),
                    ));
                };
                let mut acc = Bindings::new();
                for member in &pattern_members {
                    let found = match candidate_members.iter().find(|c| c.name == member.name) {
                        Some(c) => self.match_at(member.ty, c.ty, variance)?,
                        None if member.optional => {
                            self.bind_all(member.ty, TypeId::UNKNOWN, variance)
                        }
                        None => {
                            return Err(self.mismatch(
                                pattern,
                                candidate,
                                format!("property '{}' is missing", member.name),
                            ))
                        }
                    };
                    self.merge_into(&mut acc, found)?;
                }
                Ok(acc)
            }
            TypeNode::Array(element) => match &c_node {
                TypeNode::Array(c_element) => self.match_at(element, *c_element, variance),
                TypeNode::Tuple(items) if items.is_empty() => {
                    Ok(self.bind_all(element, TypeId::NEVER, variance))
                }
                TypeNode::Tuple(items) => {
                    let mut acc = Bindings::new();
                    for item in items {
                        let found = self.match_at(element, *item, variance)?;
                        self.merge_into(&mut acc, found)?;
                    }
                    Ok(acc)
                }
                other => Err(self.mismatch(
                    pattern,
                    candidate,
                    format!("expected an array type, found a {}", other.kind_name()),
                )),
            },
            TypeNode::Tuple(pattern_items) => match &c_node {
                TypeNode::Tuple(items) if items.len() == pattern_items.len() => {
                    let mut acc = Bindings::new();
                    for (p, c) in pattern_items.iter().zip(items) {
                        let found = self.match_at(*p, *c, variance)?;
                        self.merge_into(&mut acc, found)?;
                    }
                    Ok(acc)
                }
                TypeNode::Tuple(items) => Err(self.mismatch(
                    pattern,
                    candidate,
                    format!(
                        "expected a tuple of length {}, found length {}",
                        pattern_items.len(),
                        items.len()
                    ),
                )),
                other => Err(self.mismatch(
                    pattern,
                    candidate,
                    format!("expected a tuple type, found a {}", other.kind_name()),
                )),
            },
            // First alternative that matches wins
            TypeNode::Union(alternatives) => {
                let mut last = None;
                for alternative in alternatives {
                    match self.match_at(alternative, candidate, variance) {
                        Ok(found) => return Ok(found),
                        Err(MatchFailure::Unsupported(msg)) => {
                            return Err(MatchFailure::Unsupported(msg))
                        }
                        Err(failure) => last = Some(failure),
                    }
                }
                Err(last.unwrap_or_else(|| {
                    self.mismatch(pattern, candidate, "no alternative of the union matched")
                }))
            }
            TypeNode::Intersection(parts) => {
                let mut acc = Bindings::new();
                for part in parts {
                    let found = self.match_at(part, candidate, variance)?;
                    self.merge_into(&mut acc, found)?;
                }
                Ok(acc)
            }
            TypeNode::Quantified { .. } => Err(MatchFailure::Unsupported(
                "quantified type inside a conditional type pattern".to_string(),
            )),
            TypeNode::Conditional { .. } => Err(MatchFailure::Unsupported(
                "conditional type inside a conditional type pattern".to_string(),
            )),
            other => Err(self.mismatch(
                pattern,
                candidate,
                format!("cannot match a {}", other.kind_name()),
            )),
        }
    }

    fn match_signature(
        &mut self,
        pattern: TypeId,
        candidate: TypeId,
        ps: &Signature,
        cs: &Signature,
        variance: Variance,
    ) -> MatchResult {
        if cs.required_params() > ps.params.len() {
            return Err(self.mismatch(
                pattern,
                candidate,
                format!(
                    "candidate requires {} parameters but the pattern supplies {}",
                    cs.required_params(),
                    ps.params.len()
                ),
            ));
        }

        let mut acc = Bindings::new();
        for (i, param) in ps.params.iter().enumerate() {
            let found = match cs.params.get(i) {
                Some(c) => self.match_at(param.ty, c.ty, variance.flip())?,
                // The candidate ignores this parameter
                None => self.bind_all(param.ty, TypeId::UNKNOWN, variance.flip()),
            };
            self.merge_into(&mut acc, found)?;
        }
        let found = self.match_at(ps.ret, cs.ret, variance)?;
        self.merge_into(&mut acc, found)?;
        Ok(acc)
    }

    /// Bind every placeholder inside `pattern` to `ty`
    fn bind_all(&self, pattern: TypeId, ty: TypeId, variance: Variance) -> Bindings {
        let mut bindings = Bindings::new();
        for name in self.arena.infer_names(pattern) {
            bindings.insert(name, Binding { ty, variance, provenance: Provenance::Pattern });
        }
        bindings
    }

    pub fn merge_into(&mut self, acc: &mut Bindings, other: Bindings) -> Result<(), MatchFailure> {
        for (name, incoming) in other.entries {
            let merged = match acc.entries.remove(&name) {
                Some(existing) => self.merge_binding(&name, existing, incoming)?,
                None => incoming,
            };
            acc.entries.insert(name, merged);
        }
        Ok(())
    }

    /// Covariant bindings widen to a union, contravariant ones narrow to an
    /// intersection, and a mixed pair keeps the covariant type when it fits
    /// the contravariant one.
    pub fn merge_binding(
        &mut self,
        name: &str,
        a: Binding,
        b: Binding,
    ) -> Result<Binding, MatchFailure> {
        let (ty, variance) = match (a.variance, b.variance) {
            (Variance::Covariant, Variance::Covariant) => (self.widest(a.ty, b.ty), Variance::Covariant),
            (Variance::Contravariant, Variance::Contravariant) => {
                match self.narrowest(a.ty, b.ty) {
                    Some(ty) => (ty, Variance::Contravariant),
                    None => {
                        return Err(self.mismatch(
                            a.ty,
                            b.ty,
                            format!("'{}' has no common subtype across parameter positions", name),
                        ))
                    }
                }
            }
            _ => {
                let (co, contra) = if a.variance == Variance::Covariant { (&a, &b) } else { (&b, &a) };
                if !self.oracle().is_assignable(co.ty, contra.ty) {
                    return Err(self.mismatch(
                        contra.ty,
                        co.ty,
                        format!("'{}' is bound incompatibly in value and parameter positions", name),
                    ));
                }
                (co.ty, Variance::Covariant)
            }
        };
        trace!(%name, merged = %self.arena.display(ty), ?variance, "merge bindings");
        Ok(Binding { ty, variance, provenance: Provenance::Pattern })
    }

    fn widest(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if self.oracle().is_assignable(a, b) {
            b
        } else if self.oracle().is_assignable(b, a) {
            a
        } else {
            TypeHelpers::union_type(self.arena, vec![a, b])
        }
    }

    fn narrowest(&mut self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if self.oracle().is_assignable(a, b) {
            Some(a)
        } else if self.oracle().is_assignable(b, a) {
            Some(b)
        } else if TypeHelpers::are_disjoint(&*self.arena, a, b) {
            None
        } else {
            Some(self.arena.intersection(vec![a, b]))
        }
    }
}
