//! Constraint solver for quantified types
//!
//! Every literal checked against `<T extends C> Body` is solved on its own:
//! rows are partitioned, the correlation tracker fixes `T` per row, the
//! solution is checked against `C`, and the row is then checked
//! contextually against `Body[T := solution]`. Nothing carries over between
//! use sites.

use quanta_ast::{Expr, Node, PrimitiveType, Span, Substitution, TypeId, TypeNode};
use tracing::debug;

use crate::checker::TypeChecker;
use crate::correlation::{CorrelationGroup, RowId};
use crate::error::{TypeError, TypeErrorKind};

/// Instantiation chosen for one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowSolution {
    pub row: RowId,
    pub param: String,
    pub ty: TypeId,
}

/// Result of checking one literal against a quantified type
#[derive(Debug, Clone, Default)]
pub struct QuantifiedOutcome {
    pub solutions: Vec<RowSolution>,
    pub diagnostics: Vec<TypeError>,
}

/// `<param extends constraint> body`, split apart; the constraint defaults to `unknown`
#[derive(Debug, Clone)]
pub(crate) struct Quantifier {
    pub(crate) param: String,
    pub(crate) constraint: TypeId,
    pub(crate) body: TypeId,
}

impl TypeChecker {
    /// Check `literal` against `declared` (a quantified type, an alias of
    /// one, or an array or tuple of them) as one independent use site.
    pub fn check_quantified_assignment(&mut self, declared: TypeId, literal: &Node<Expr>) -> Vec<TypeError> {
        self.solve_quantified(declared, literal).diagnostics
    }

    /// Like [`check_quantified_assignment`](Self::check_quantified_assignment),
    /// also returning the per-row instantiations.
    pub fn solve_quantified(&mut self, declared: TypeId, literal: &Node<Expr>) -> QuantifiedOutcome {
        self.begin_request(&literal.span);
        let diagnostics = self.collect_errors(|checker| {
            if let Err(e) = checker.check_expr_against(&literal.value, &literal.span, declared) {
                checker.errors.push(e);
            }
        });
        QuantifiedOutcome { solutions: std::mem::take(&mut self.request.solutions), diagnostics }
    }

    /// Solve each site separately; a violation at one site never shows up
    /// in the outcome of another.
    pub fn check_quantified_use_sites(&mut self, declared: TypeId, sites: &[Node<Expr>]) -> Vec<QuantifiedOutcome> {
        sites.iter().map(|site| self.solve_quantified(declared, site)).collect()
    }

    /// Check one literal against a quantified type already normalized to a
    /// `Quantified` node.
    pub(crate) fn assign_quantified(&mut self, declared: TypeId, expr: &Expr, span: &Span) -> Result<(), TypeError> {
        let Some(quantifier) = self.split_quantifier(declared, span) else {
            return Ok(());
        };

        let body = self.normalize_body(&quantifier, span);
        match (self.arena.get(body).clone(), expr) {
            // Each element of the literal is a row of its own
            (TypeNode::Array(element), Expr::Array(items)) => {
                let element_quantifier = Quantifier { body: element, ..quantifier };
                for (index, item) in items.iter().enumerate() {
                    let row = RowId { literal: *span, index: Some(index) };
                    self.solve_row(&element_quantifier, &item.value, &item.span, row)?;
                }
                Ok(())
            }
            _ => {
                let row = RowId { literal: *span, index: None };
                self.solve_row(&Quantifier { body, ..quantifier }, expr, span, row)
            }
        }
    }

    /// Check a value that is not a literal against a quantified type. A
    /// value already typed by a quantified type is compared as a whole;
    /// anything else is solved like a literal row.
    pub(crate) fn assign_quantified_value(&mut self, declared: TypeId, expr: &Expr, span: &Span) -> Result<(), TypeError> {
        let mark = self.errors.len();
        let found = self.check_expr(expr, span)?;
        let found = self.normalize(found, span);
        if !matches!(self.arena.get(found), TypeNode::Quantified { .. }) {
            self.errors.truncate(mark);
            return self.assign_quantified(declared, expr, span);
        }
        if !self.is_assignable(found, declared) {
            let err = self.mismatch(declared, found, *span);
            self.errors.push(err);
        }
        Ok(())
    }

    /// Body of a quantified type with its parameter replaced: by an opaque
    /// reference tied to `owner` when one is given, otherwise by the
    /// constraint. Reads through the same owner agree on the parameter.
    pub(crate) fn open_quantified(&mut self, ty: TypeId, owner: Option<&str>) -> TypeId {
        let TypeNode::Quantified { param, constraint, body } = self.arena.get(ty).clone() else {
            return ty;
        };
        let replacement = match owner {
            Some(owner) => self.arena.reference(format!("{}@{}", param, owner)),
            None => constraint.unwrap_or(TypeId::UNKNOWN),
        };
        self.arena.substitute(body, &Substitution::from([(param, replacement)]))
    }

    fn split_quantifier(&mut self, declared: TypeId, span: &Span) -> Option<Quantifier> {
        let TypeNode::Quantified { param, constraint, body } = self.arena.get(declared).clone() else {
            return None;
        };
        let nested = self.arena.contains_quantified(body)
            || constraint.is_some_and(|c| self.arena.contains_quantified(c));
        if nested {
            self.report(
                TypeErrorKind::Unsupported(format!(
                    "quantified type nested inside '{}'",
                    self.arena.display(declared)
                )),
                *span,
            );
            return None;
        }
        Some(Quantifier { param, constraint: constraint.unwrap_or(TypeId::UNKNOWN), body })
    }

    /// The body with aliases resolved, leaving a bare reference to the
    /// quantifier's own parameter alone.
    fn normalize_body(&mut self, quantifier: &Quantifier, span: &Span) -> TypeId {
        match self.arena.get(quantifier.body) {
            TypeNode::Reference(name) if *name == quantifier.param => quantifier.body,
            TypeNode::Reference(_) => self.normalize(quantifier.body, span),
            _ => quantifier.body,
        }
    }

    fn solve_row(&mut self, quantifier: &Quantifier, expr: &Expr, span: &Span, row: RowId) -> Result<(), TypeError> {
        let positions = self.collect_positions(quantifier, expr, span);
        let group = CorrelationGroup { param: quantifier.param.clone(), row, positions };

        let anchor = match self.check_correlation(&group) {
            Ok(anchor) => anchor,
            Err(violations) => {
                self.errors.extend(violations);
                return Ok(());
            }
        };

        let (solved, site) = match &anchor {
            Some(position) => (position.binding.ty, position.span),
            None => (quantifier.constraint, *span),
        };
        if !self.is_assignable(solved, quantifier.constraint) {
            self.report(
                TypeErrorKind::ConstraintViolation {
                    param: quantifier.param.clone(),
                    found: self.render(solved),
                    constraint: self.render(quantifier.constraint),
                },
                site,
            );
            return Ok(());
        }

        debug!(
            param = %quantifier.param,
            row = ?row.index,
            solved = %self.arena.display(solved),
            "row solved"
        );
        self.request.solutions.push(RowSolution { row, param: quantifier.param.clone(), ty: solved });

        let subst = Substitution::from([(quantifier.param.clone(), solved)]);
        let instantiated = self.arena.substitute(quantifier.body, &subst);
        let instantiated = self.resolve_conditionals_deep(instantiated, span);
        self.check_expr_against(expr, span, instantiated)
    }

    /// Whether literal candidates keep their literal form: only when the
    /// constraint is, or contains, a primitive or literal type.
    pub(crate) fn keeps_literals(&mut self, constraint: TypeId, span: &Span) -> bool {
        let constraint = self.normalize(constraint, span);
        match self.arena.get(constraint).clone() {
            TypeNode::Primitive(p) => matches!(
                p,
                PrimitiveType::String | PrimitiveType::Number | PrimitiveType::Boolean
            ),
            TypeNode::Literal(_) => true,
            TypeNode::Union(members) | TypeNode::Intersection(members) => {
                members.into_iter().any(|m| self.keeps_literals(m, span))
            }
            _ => false,
        }
    }
}
