//! Conditional type resolution and type normalization

use std::collections::HashMap;

use quanta_ast::{Span, TypeId, TypeNode};
use tracing::debug;

use crate::checker::TypeChecker;
use crate::error::{TypeError, TypeErrorKind};
use crate::unify::{Bindings, MatchFailure};

impl TypeChecker {
    /// Resolve the conditional type `conditional`: match its extends clause
    /// against its check type, then yield the true branch with the bindings
    /// substituted, or the false branch when the match fails. A branch that
    /// is itself conditional is resolved again, up to the depth limit.
    ///
    /// Any other type is returned unchanged.
    pub fn resolve_conditional(&mut self, conditional: TypeId) -> TypeId {
        let site = self.request.site;
        self.resolve_conditional_at(conditional, &site, 0)
    }

    pub(crate) fn resolve_conditional_at(&mut self, conditional: TypeId, span: &Span, depth: usize) -> TypeId {
        let TypeNode::Conditional { check, extends, true_type, false_type } =
            self.arena.get(conditional).clone()
        else {
            return conditional;
        };

        if depth >= self.options.max_depth {
            self.report(
                TypeErrorKind::Unsupported(format!(
                    "conditional type resolution exceeded the depth limit of {}",
                    self.options.max_depth
                )),
                *span,
            );
            return TypeId::UNKNOWN;
        }

        let check = self.normalize(check, span);
        let matched = self.unifier().match_types(extends, check);
        let branch = match matched {
            Ok(bindings) => {
                debug!(
                    conditional = %self.arena.display(conditional),
                    bindings = bindings.len(),
                    "conditional matched"
                );
                let subst = bindings.to_substitution();
                self.arena.substitute(true_type, &subst)
            }
            Err(MatchFailure::Shape { reason, .. }) => {
                debug!(conditional = %self.arena.display(conditional), %reason, "conditional fell through");
                false_type
            }
            Err(MatchFailure::Unsupported(msg)) => {
                self.report(TypeErrorKind::Unsupported(msg), *span);
                return TypeId::UNKNOWN;
            }
        };

        self.resolve_conditional_at(branch, span, depth + 1)
    }

    /// Run the unifier on its own and explain a failed match as a
    /// `ShapeMismatch` diagnostic at `span`.
    pub fn explain_match(
        &mut self,
        pattern: TypeId,
        candidate: TypeId,
        span: Span,
    ) -> Result<Bindings, TypeError> {
        let matched = self.unifier().match_types(pattern, candidate);
        match matched {
            Ok(bindings) => Ok(bindings),
            Err(MatchFailure::Shape { pattern: p, candidate: c, reason }) => Err(TypeError::new(
                TypeErrorKind::ShapeMismatch {
                    pattern: self.render(p),
                    candidate: self.render(c),
                    reason,
                },
                span,
            )),
            Err(MatchFailure::Unsupported(msg)) => {
                Err(TypeError::new(TypeErrorKind::Unsupported(msg), span))
            }
        }
    }

    /// Resolve aliases and conditional types at the top of `ty`. An alias
    /// cycle is reported as `SelfReferentialBinding` and yields `unknown`.
    pub(crate) fn normalize(&mut self, ty: TypeId, span: &Span) -> TypeId {
        let mut current = ty;
        let mut resolving: Vec<String> = Vec::new();
        for _ in 0..self.options.max_depth {
            match self.arena.get(current).clone() {
                TypeNode::Reference(name) => match self.env.lookup_type(&name) {
                    Some(target) => {
                        if resolving.contains(&name) {
                            self.report(TypeErrorKind::SelfReferentialBinding(name), *span);
                            return TypeId::UNKNOWN;
                        }
                        resolving.push(name);
                        current = target;
                    }
                    None => return current,
                },
                TypeNode::Conditional { .. } => {
                    current = self.resolve_conditional_at(current, span, 0);
                }
                _ => return current,
            }
        }
        self.report(
            TypeErrorKind::Unsupported(format!(
                "type '{}' did not normalize within the depth limit",
                self.arena.display(ty)
            )),
            *span,
        );
        TypeId::UNKNOWN
    }

    /// Resolve every conditional type inside `ty` whose names all resolve
    /// in scope. Conditionals over a quantifier's own parameter stay as they
    /// are until the quantifier is instantiated.
    pub(crate) fn resolve_conditionals_deep(&mut self, ty: TypeId, span: &Span) -> TypeId {
        self.resolve_deep_at(ty, span, 0)
    }

    fn resolve_deep_at(&mut self, ty: TypeId, span: &Span, depth: usize) -> TypeId {
        if depth >= self.options.max_depth || !self.arena.contains_conditional(ty) {
            return ty;
        }
        match self.arena.get(ty) {
            TypeNode::Conditional { .. } => {
                if !self.is_closed(ty) {
                    return ty;
                }
                let resolved = self.resolve_conditional_at(ty, span, 0);
                self.resolve_deep_at(resolved, span, depth + 1)
            }
            TypeNode::Quantified { .. } => ty,
            _ => {
                let mut replaced = HashMap::new();
                for child in self.arena.children(ty) {
                    let resolved = self.resolve_deep_at(child, span, depth + 1);
                    replaced.insert(child, resolved);
                }
                self.arena.map_children(ty, |_, child| replaced.get(&child).copied().unwrap_or(child))
            }
        }
    }

    fn is_closed(&self, ty: TypeId) -> bool {
        self.arena.free_names(ty).iter().all(|name| self.env.lookup_type(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::checker::TypeChecker;
    use crate::error::TypeErrorKind;
    use quanta_ast::{Member, Param, Span, TypeArena, TypeId};

    #[test]
    fn test_call_pattern_against_constructor_resolves_false_branch() {
        // { new (): string } extends { (): infer R } ? R : never
        let mut arena = TypeArena::new();
        let ctor = arena.construct_signature(vec![], TypeId::STRING);
        let r = arena.infer("R");
        let pattern = arena.call_signature(vec![], r);
        let r_ref = arena.reference("R");
        let cond = arena.conditional(ctor, pattern, r_ref, TypeId::NEVER);

        let mut checker = TypeChecker::new(arena);
        assert_eq!(checker.resolve_conditional(cond), TypeId::NEVER);
        assert!(checker.diagnostics().is_empty());
    }

    #[test]
    fn test_construct_pattern_resolves_true_branch() {
        let mut arena = TypeArena::new();
        let ctor = arena.construct_signature(vec![], TypeId::STRING);
        let r = arena.infer("R");
        let pattern = arena.construct_signature(vec![], r);
        let r_ref = arena.reference("R");
        let cond = arena.conditional(ctor, pattern, r_ref, TypeId::NEVER);

        let mut checker = TypeChecker::new(arena);
        assert_eq!(checker.resolve_conditional(cond), TypeId::STRING);
    }

    #[test]
    fn test_function_pattern_against_string_is_never() {
        let mut arena = TypeArena::new();
        let u = arena.infer("U");
        let pattern = arena.function(vec![Param::new("x", u)], TypeId::ANY);
        let u_ref = arena.reference("U");
        let cond = arena.conditional(TypeId::STRING, pattern, u_ref, TypeId::NEVER);

        let mut checker = TypeChecker::new(arena);
        assert_eq!(checker.resolve_conditional(cond), TypeId::NEVER);
    }

    #[test]
    fn test_check_type_resolves_through_alias() {
        // type Ctor = { new (): number }; Ctor extends { new (): infer R } ? R : never
        let mut arena = TypeArena::new();
        let ctor = arena.construct_signature(vec![], TypeId::NUMBER);
        let alias = arena.reference("Ctor");
        let r = arena.infer("R");
        let pattern = arena.construct_signature(vec![], r);
        let r_ref = arena.reference("R");
        let cond = arena.conditional(alias, pattern, r_ref, TypeId::NEVER);

        let mut checker = TypeChecker::new(arena);
        checker.declare_type_alias("Ctor", ctor);
        assert_eq!(checker.resolve_conditional(cond), TypeId::NUMBER);
    }

    #[test]
    fn test_nested_conditional_in_false_branch() {
        // string extends number ? 1 : (string extends string ? 2 : 3)
        let mut arena = TypeArena::new();
        let one = arena.number_literal(1.0);
        let two = arena.number_literal(2.0);
        let three = arena.number_literal(3.0);
        let inner = arena.conditional(TypeId::STRING, TypeId::STRING, two, three);
        let outer = arena.conditional(TypeId::STRING, TypeId::NUMBER, one, inner);

        let mut checker = TypeChecker::new(arena);
        assert_eq!(checker.resolve_conditional(outer), two);
    }

    #[test]
    fn test_explain_match_reports_shape_mismatch() {
        let mut arena = TypeArena::new();
        let r = arena.infer("R");
        let pattern = arena.call_signature(vec![], r);
        let ctor = arena.construct_signature(vec![], TypeId::STRING);

        let mut checker = TypeChecker::new(arena);
        let err = checker.explain_match(pattern, ctor, Span::new(1, 2, 0)).unwrap_err();
        match err.kind {
            TypeErrorKind::ShapeMismatch { pattern, candidate, reason } => {
                assert_eq!(pattern, "{ (): infer R }");
                assert_eq!(candidate, "{ new (): string }");
                assert!(reason.contains("new"));
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_alias_cycle_is_self_referential() {
        let mut arena = TypeArena::new();
        let a = arena.reference("A");
        let b = arena.reference("B");
        let mut checker = TypeChecker::new(arena);
        checker.declare_type_alias("A", b);
        checker.declare_type_alias("B", a);

        assert_eq!(checker.normalize(a, &Span::default()), TypeId::UNKNOWN);
        assert!(matches!(
            checker.diagnostics()[0].kind,
            TypeErrorKind::SelfReferentialBinding(_)
        ));
    }

    #[test]
    fn test_deep_resolution_inside_object() {
        let mut arena = TypeArena::new();
        let r = arena.infer("R");
        let pattern = arena.function(vec![], r);
        let f = arena.function(vec![], TypeId::BOOLEAN);
        let r_ref = arena.reference("R");
        let cond = arena.conditional(f, pattern, r_ref, TypeId::NEVER);
        let obj = arena.object(vec![Member::new("result", cond)]);

        let mut checker = TypeChecker::new(arena);
        let resolved = checker.resolve_conditionals_deep(obj, &Span::default());
        assert_eq!(checker.arena().render(resolved), "{ result: boolean }");
    }
}
