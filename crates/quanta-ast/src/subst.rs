//! Capture-avoiding substitution over arena types

use std::collections::{BTreeSet, HashMap};

use crate::types::{Member, Param, Signature, TypeArena, TypeId, TypeNode};

/// Name -> replacement mapping used by [`TypeArena::substitute`]
pub type Substitution = HashMap<String, TypeId>;

impl TypeArena {
    /// Replace every free `Reference(name)` in `ty` by `map[name]`.
    ///
    /// Quantifier parameters shadow the mapping inside their body, and a binder
    /// that would capture a free name of a replacement is renamed first.
    /// Unchanged subtrees keep their ids.
    pub fn substitute(&mut self, ty: TypeId, map: &Substitution) -> TypeId {
        if map.is_empty() {
            return ty;
        }
        match self.get(ty).clone() {
            TypeNode::Reference(name) => map.get(&name).copied().unwrap_or(ty),
            TypeNode::Quantified { param, constraint, body } => {
                self.substitute_quantified(ty, param, constraint, body, map)
            }
            TypeNode::Conditional { check, extends, true_type, false_type } => {
                self.substitute_conditional(check, extends, true_type, false_type, map)
            }
            _ => self.map_children(ty, |arena, child| arena.substitute(child, map)),
        }
    }

    fn substitute_quantified(
        &mut self,
        ty: TypeId,
        param: String,
        constraint: Option<TypeId>,
        body: TypeId,
        map: &Substitution,
    ) -> TypeId {
        let mut inner = map.clone();
        inner.remove(&param);
        if inner.is_empty() {
            return ty;
        }

        let captured = inner.values().any(|r| self.mentions(*r, &param));
        let (param, constraint, body) = if captured {
            let avoid = self.avoid_set(body, &inner);
            let fresh = self.fresh_name(&param, &avoid);
            let fresh_ref = self.reference(fresh.clone());
            let rename = Substitution::from([(param, fresh_ref)]);
            let body = self.substitute(body, &rename);
            let constraint = constraint.map(|c| self.substitute(c, &rename));
            (fresh, constraint, body)
        } else {
            (param, constraint, body)
        };

        let body = self.substitute(body, &inner);
        let constraint = constraint.map(|c| self.substitute(c, &inner));
        self.alloc(TypeNode::Quantified { param, constraint, body })
    }

    fn substitute_conditional(
        &mut self,
        check: TypeId,
        extends: TypeId,
        true_type: TypeId,
        false_type: TypeId,
        map: &Substitution,
    ) -> TypeId {
        let check = self.substitute(check, map);
        let false_type = self.substitute(false_type, map);

        let bound = self.infer_names(extends);
        let mut inner = map.clone();
        inner.retain(|name, _| !bound.contains(name));

        let mut extends = extends;
        let mut true_type = true_type;
        for name in &bound {
            if inner.values().any(|r| self.mentions(*r, name)) {
                let avoid = self.avoid_set(true_type, &inner);
                let fresh = self.fresh_name(name, &avoid);
                extends = self.rename_infer(extends, name, &fresh);
                let fresh_ref = self.reference(fresh);
                true_type = self.substitute(true_type, &Substitution::from([(name.clone(), fresh_ref)]));
            }
        }

        let extends = self.substitute(extends, map);
        let true_type = self.substitute(true_type, &inner);
        self.alloc(TypeNode::Conditional { check, extends, true_type, false_type })
    }

    fn avoid_set(&self, body: TypeId, map: &Substitution) -> BTreeSet<String> {
        let mut avoid = self.free_names(body);
        for (name, replacement) in map {
            avoid.insert(name.clone());
            avoid.extend(self.free_names(*replacement));
        }
        avoid
    }

    /// Rename the infer placeholder `from` to `to` throughout `ty`
    pub fn rename_infer(&mut self, ty: TypeId, from: &str, to: &str) -> TypeId {
        if matches!(self.get(ty), TypeNode::Infer(name) if name == from) {
            return self.infer(to);
        }
        self.map_children(ty, |arena, child| arena.rename_infer(child, from, to))
    }

    /// Rebuild `ty` with `f` applied to each direct child. Returns `ty` itself
    /// when no child changed.
    pub fn map_children<F>(&mut self, ty: TypeId, mut f: F) -> TypeId
    where
        F: FnMut(&mut TypeArena, TypeId) -> TypeId,
    {
        let node = self.get(ty).clone();
        let mut changed = false;
        let mut go = |arena: &mut TypeArena, child: TypeId| {
            let mapped = f(arena, child);
            changed |= mapped != child;
            mapped
        };

        let rebuilt = match node {
            TypeNode::Primitive(_)
            | TypeNode::Literal(_)
            | TypeNode::Infer(_)
            | TypeNode::Reference(_) => return ty,
            TypeNode::Object(members) => TypeNode::Object(
                members
                    .into_iter()
                    .map(|m| Member { ty: go(self, m.ty), ..m })
                    .collect(),
            ),
            TypeNode::Array(element) => TypeNode::Array(go(self, element)),
            TypeNode::Tuple(items) => {
                TypeNode::Tuple(items.into_iter().map(|t| go(self, t)).collect())
            }
            TypeNode::Union(items) => {
                TypeNode::Union(items.into_iter().map(|t| go(self, t)).collect())
            }
            TypeNode::Intersection(items) => {
                TypeNode::Intersection(items.into_iter().map(|t| go(self, t)).collect())
            }
            TypeNode::Function(sig) => TypeNode::Function(map_signature(self, sig, &mut go)),
            TypeNode::CallSignature(sig) => {
                TypeNode::CallSignature(map_signature(self, sig, &mut go))
            }
            TypeNode::ConstructSignature(sig) => {
                TypeNode::ConstructSignature(map_signature(self, sig, &mut go))
            }
            TypeNode::Conditional { check, extends, true_type, false_type } => {
                TypeNode::Conditional {
                    check: go(self, check),
                    extends: go(self, extends),
                    true_type: go(self, true_type),
                    false_type: go(self, false_type),
                }
            }
            TypeNode::Quantified { param, constraint, body } => TypeNode::Quantified {
                param,
                constraint: constraint.map(|c| go(self, c)),
                body: go(self, body),
            },
        };

        if changed {
            self.alloc(rebuilt)
        } else {
            ty
        }
    }
}

fn map_signature<G>(arena: &mut TypeArena, sig: Signature, go: &mut G) -> Signature
where
    G: FnMut(&mut TypeArena, TypeId) -> TypeId,
{
    let params = sig
        .params
        .into_iter()
        .map(|p| Param { ty: go(arena, p.ty), ..p })
        .collect();
    Signature { params, ret: go(arena, sig.ret) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_replaces_free_references() {
        let mut arena = TypeArena::new();
        let t = arena.reference("T");
        let f = arena.function(vec![Param::new("value", t)], TypeId::STRING);
        let t_arr = arena.array(t);
        let obj = arena.object(vec![Member::new("values", t_arr), Member::new("identifier", f)]);

        let out = arena.substitute(obj, &Substitution::from([("T".to_string(), TypeId::NUMBER)]));

        let num_arr = arena.array(TypeId::NUMBER);
        let g = arena.function(vec![Param::new("value", TypeId::NUMBER)], TypeId::STRING);
        let expected = arena.object(vec![Member::new("values", num_arr), Member::new("identifier", g)]);
        assert!(arena.structurally_equal(out, expected));
    }

    #[test]
    fn test_substitute_keeps_unchanged_ids() {
        let mut arena = TypeArena::new();
        let arr = arena.array(TypeId::STRING);
        let out = arena.substitute(arr, &Substitution::from([("T".to_string(), TypeId::NUMBER)]));
        assert_eq!(out, arr);
    }

    #[test]
    fn test_quantifier_shadows_substitution() {
        let mut arena = TypeArena::new();
        let t = arena.reference("T");
        let body = arena.array(t);
        let q = arena.quantified("T", None, body);

        let out = arena.substitute(q, &Substitution::from([("T".to_string(), TypeId::NUMBER)]));
        assert_eq!(out, q);
    }

    #[test]
    fn test_substitution_avoids_capture() {
        // <T> [T, U] with U := T must not turn into <T> [T, T]
        let mut arena = TypeArena::new();
        let t = arena.reference("T");
        let u = arena.reference("U");
        let body = arena.tuple(vec![t, u]);
        let q = arena.quantified("T", None, body);

        let outer_t = arena.reference("T");
        let out = arena.substitute(q, &Substitution::from([("U".to_string(), outer_t)]));

        match arena.get(out).clone() {
            TypeNode::Quantified { param, body, .. } => {
                assert_ne!(param, "T");
                assert!(arena.free_names(out).contains("T"));
                match arena.get(body) {
                    TypeNode::Tuple(items) => {
                        assert_eq!(arena.get(items[0]), &TypeNode::Reference(param.clone()));
                        assert_eq!(arena.get(items[1]), &TypeNode::Reference("T".to_string()));
                    }
                    other => panic!("expected tuple body, got {:?}", other),
                }
            }
            other => panic!("expected quantified type, got {:?}", other),
        }
    }

    #[test]
    fn test_conditional_true_branch_shadowed_by_infer() {
        let mut arena = TypeArena::new();
        let r_infer = arena.infer("R");
        let pattern = arena.call_signature(vec![], r_infer);
        let r = arena.reference("R");
        let x = arena.reference("X");
        let cond = arena.conditional(x, pattern, r, r);

        let out = arena.substitute(
            cond,
            &Substitution::from([
                ("R".to_string(), TypeId::BOOLEAN),
                ("X".to_string(), TypeId::STRING),
            ]),
        );
        match arena.get(out) {
            TypeNode::Conditional { check, true_type, false_type, .. } => {
                assert_eq!(*check, TypeId::STRING);
                assert_eq!(arena.get(*true_type), &TypeNode::Reference("R".to_string()));
                assert_eq!(*false_type, TypeId::BOOLEAN);
            }
            other => panic!("expected conditional, got {:?}", other),
        }
    }
}
