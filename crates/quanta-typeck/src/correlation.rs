//! Correlation tracker
//!
//! Within one row of a literal, every position that reads the bound
//! parameter of a quantified type must agree on it. Positions are gathered
//! by walking the literal alongside the quantifier's body; the first
//! covariant position is the anchor the others are compared with.

use quanta_ast::{Expr, ObjectProperty, Span, Substitution, TypeId, TypeNode};
use tracing::trace;

use crate::checker::TypeChecker;
use crate::error::{TypeError, TypeErrorKind};
use crate::helpers::TypeHelpers;
use crate::solver::Quantifier;
use crate::unify::{Binding, Provenance, Variance};

/// One row: the literal it belongs to and, for array rows, the element index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowId {
    pub literal: Span,
    pub index: Option<usize>,
}

/// A literal position that reads the quantifier's parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Access path inside the row (`values[0]`, `identifier(value)`)
    pub path: String,
    pub span: Span,
    pub binding: Binding,
}

impl Position {
    fn label(&self) -> String {
        if self.path.is_empty() {
            "the value".to_string()
        } else {
            format!("'{}'", self.path)
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationGroup {
    pub param: String,
    pub row: RowId,
    pub positions: Vec<Position>,
}

impl CorrelationGroup {
    /// First covariant position, or the first position of any variance
    pub fn anchor(&self) -> Option<usize> {
        self.positions
            .iter()
            .position(|p| p.binding.variance == Variance::Covariant)
            .or(if self.positions.is_empty() { None } else { Some(0) })
    }
}

impl TypeChecker {
    /// Collect the positions of `expr` that bind `quantifier.param`.
    /// Diagnostics raised while typing the positions are dropped; the
    /// contextual check that follows reports them.
    pub(crate) fn collect_positions(&mut self, quantifier: &Quantifier, expr: &Expr, span: &Span) -> Vec<Position> {
        let keep_literals = self.keeps_literals(quantifier.constraint, span);
        let mut out = Vec::new();
        self.speculate(|checker| {
            checker.walk_positions(quantifier, quantifier.body, expr, span, "", keep_literals, &mut out)
        });
        trace!(param = %quantifier.param, positions = out.len(), "positions collected");
        out
    }

    /// Require every position of the group to be mutually assignable with
    /// the anchor. Returns the anchor, or every disagreeing position.
    pub(crate) fn check_correlation(&mut self, group: &CorrelationGroup) -> Result<Option<Position>, Vec<TypeError>> {
        let Some(anchor_index) = group.anchor() else {
            return Ok(None);
        };
        let anchor = &group.positions[anchor_index];

        let mut violations = Vec::new();
        for (i, position) in group.positions.iter().enumerate() {
            if i == anchor_index {
                continue;
            }
            if !self.oracle().mutually_assignable(anchor.binding.ty, position.binding.ty) {
                violations.push(TypeError::new(
                    TypeErrorKind::CorrelationViolation {
                        param: group.param.clone(),
                        position: position.label(),
                        found: self.render(position.binding.ty),
                        anchor: anchor.label(),
                        expected: self.render(anchor.binding.ty),
                    },
                    position.span,
                ));
            }
        }

        if violations.is_empty() {
            Ok(Some(anchor.clone()))
        } else {
            Err(violations)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_positions(
        &mut self,
        quantifier: &Quantifier,
        ty: TypeId,
        expr: &Expr,
        span: &Span,
        path: &str,
        keep_literals: bool,
        out: &mut Vec<Position>,
    ) {
        let param = quantifier.param.as_str();
        if !self.arena.mentions(ty, param) {
            return;
        }

        match (self.arena.get(ty).clone(), expr) {
            (TypeNode::Reference(name), _) if name == param => {
                if expr.is_context_sensitive() {
                    return;
                }
                if let Ok(found) = self.check_expr(expr, span) {
                    let found = self.literal_policy(found, keep_literals);
                    out.push(self.position(path, span, found, Variance::Covariant));
                }
            }
            (TypeNode::Object(members), Expr::Object(props)) => {
                for member in members {
                    if !self.arena.mentions(member.ty, param) {
                        continue;
                    }
                    // Absent optional fields do not take part
                    let Some(prop) = props.iter().find(|p| p.key().value.name == member.name) else {
                        continue;
                    };
                    let child = join_path(path, &member.name);
                    match prop {
                        ObjectProperty::Property { value, .. } => self.walk_positions(
                            quantifier,
                            member.ty,
                            &value.value,
                            &value.span,
                            &child,
                            keep_literals,
                            out,
                        ),
                        ObjectProperty::Shorthand(key) => {
                            let read = Expr::Ident(key.value.clone());
                            self.walk_positions(
                                quantifier,
                                member.ty,
                                &read,
                                &key.span,
                                &child,
                                keep_literals,
                                out,
                            )
                        }
                    }
                }
            }
            (TypeNode::Tuple(items), Expr::Array(elements)) => {
                for (i, (item, element)) in items.iter().zip(elements).enumerate() {
                    let child = format!("{}[{}]", path, i);
                    self.walk_positions(
                        quantifier,
                        *item,
                        &element.value,
                        &element.span,
                        &child,
                        keep_literals,
                        out,
                    );
                }
            }
            // All elements of an array literal merge into one position
            (TypeNode::Array(element_ty), Expr::Array(elements)) => {
                let mut inner = Vec::new();
                for (i, element) in elements.iter().enumerate() {
                    let child = format!("{}[{}]", path, i);
                    self.walk_positions(
                        quantifier,
                        element_ty,
                        &element.value,
                        &element.span,
                        &child,
                        keep_literals,
                        &mut inner,
                    );
                }
                let (covariant, contravariant): (Vec<Position>, Vec<Position>) = inner
                    .into_iter()
                    .partition(|p| p.binding.variance == Variance::Covariant);
                if !covariant.is_empty() {
                    let candidates = covariant.iter().map(|p| p.binding.ty).collect();
                    let merged = TypeHelpers::union_type(&mut self.arena, candidates);
                    out.push(self.position(path, span, merged, Variance::Covariant));
                }
                out.extend(contravariant);
            }
            (
                TypeNode::Function(sig) | TypeNode::CallSignature(sig),
                Expr::Arrow { params, body },
            ) => {
                for (i, arrow_param) in params.iter().enumerate() {
                    let (Some(annotation), Some(expected)) =
                        (arrow_param.type_annotation, sig.params.get(i))
                    else {
                        continue;
                    };
                    if !self.arena.mentions(expected.ty, param) {
                        continue;
                    }
                    let pattern = self.as_pattern(expected.ty, param);
                    let matched = self.unifier().match_at(pattern, annotation, Variance::Contravariant);
                    if let Some(found) = matched.ok().and_then(|b| b.ty(param)) {
                        let child = format!("{}({})", path, arrow_param.name.value.name);
                        out.push(self.position(
                            &child,
                            &arrow_param.name.span,
                            found,
                            Variance::Contravariant,
                        ));
                    }
                }

                // The return only speaks for the parameter once every
                // parameter is annotated
                if expr.is_context_sensitive() || !self.arena.mentions(sig.ret, param) {
                    return;
                }
                let Ok(arrow_ty) = self.check_expr(expr, span) else {
                    return;
                };
                let Some(ret) = self.arena.get(arrow_ty).signature().map(|s| s.ret) else {
                    return;
                };
                let ret = self.literal_policy(ret, keep_literals);
                let pattern = self.as_pattern(sig.ret, param);
                let matched = self.unifier().match_at(pattern, ret, Variance::Covariant);
                if let Some(found) = matched.ok().and_then(|b| b.ty(param)) {
                    let child = format!("{}()", path);
                    out.push(self.position(&child, &body.span, found, Variance::Covariant));
                }
            }
            _ => {
                if expr.is_context_sensitive() {
                    return;
                }
                let Ok(found) = self.check_expr(expr, span) else {
                    return;
                };
                let found = self.literal_policy(found, keep_literals);
                let pattern = self.as_pattern(ty, param);
                let matched = self.unifier().match_at(pattern, found, Variance::Covariant);
                if let Some(found) = matched.ok().and_then(|b| b.ty(param)) {
                    out.push(self.position(path, span, found, Variance::Covariant));
                }
            }
        }
    }

    fn position(&self, path: &str, span: &Span, ty: TypeId, variance: Variance) -> Position {
        trace!(%path, ty = %self.arena.display(ty), ?variance, "position");
        Position {
            path: path.to_string(),
            span: *span,
            binding: Binding {
                ty,
                variance,
                provenance: Provenance::Position { path: path.to_string(), span: *span },
            },
        }
    }

    fn literal_policy(&mut self, ty: TypeId, keep_literals: bool) -> TypeId {
        if keep_literals {
            ty
        } else {
            TypeHelpers::widen(&mut self.arena, ty)
        }
    }

    /// `ty` with the quantifier's parameter turned into an infer placeholder
    fn as_pattern(&mut self, ty: TypeId, param: &str) -> TypeId {
        let placeholder = self.arena.infer(param);
        self.arena.substitute(ty, &Substitution::from([(param.to_string(), placeholder)]))
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}
