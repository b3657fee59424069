//! Distribution over union-typed values
//!
//! `distribute (x) { ... }` checks its body once per member of `x`'s union
//! type, with `x` narrowed to that member. When the members share a literal
//! discriminant property, `x.<discriminant>` narrows along with it, so a
//! lookup such as `handlers[x.type](x)` sees one member at a time.

use quanta_ast::{BlockStmt, Expr, LiteralType, Node, Span, TypeId, TypeNode};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::checker::TypeChecker;
use crate::error::{TypeError, TypeErrorKind};

/// One member of the scrutinee's union type
#[derive(Debug, Clone, PartialEq)]
pub struct UnionMember {
    /// Value of the discriminant property in this member
    pub discriminant: Option<LiteralType>,
    pub ty: TypeId,
}

/// How a distribution dispatches: the narrowed path, the discriminant
/// property if one exists, and the members in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTable {
    pub path: String,
    pub discriminant: Option<String>,
    pub members: Vec<UnionMember>,
}

impl TypeChecker {
    /// Check `body` once per union member of `scrutinee` as one request and
    /// return the diagnostics it produced.
    pub fn check_distribute(&mut self, scrutinee: &Node<Expr>, body: &BlockStmt) -> Vec<TypeError> {
        self.begin_request(&scrutinee.span);
        self.collect_errors(|checker| {
            if let Err(e) = checker.distribute(scrutinee, body, &scrutinee.span) {
                checker.errors.push(e);
            }
        })
    }

    /// Build the dispatch table for `scrutinee` without checking anything else
    pub fn dispatch_table(&mut self, scrutinee: &Node<Expr>) -> Result<DispatchTable, TypeError> {
        let Some(path) = scrutinee.value.access_path() else {
            return Err(TypeError::new(
                TypeErrorKind::Unsupported(
                    "only an identifier or a property path can be distributed".to_string(),
                ),
                scrutinee.span,
            ));
        };

        let ty = self.check_expr(&scrutinee.value, &scrutinee.span)?;
        let ty = self.normalize(ty, &scrutinee.span);
        let member_types = match self.arena.get(ty) {
            TypeNode::Union(members) => members.clone(),
            _ => vec![ty],
        };

        let discriminant = self.find_discriminant(&member_types, &scrutinee.span);
        let mut members = Vec::with_capacity(member_types.len());
        for ty in member_types {
            let value = match &discriminant {
                Some(key) => self.literal_member(ty, key, &scrutinee.span),
                None => None,
            };
            members.push(UnionMember { discriminant: value, ty });
        }

        Ok(DispatchTable { path, discriminant, members })
    }

    pub(crate) fn distribute(&mut self, scrutinee: &Node<Expr>, body: &BlockStmt, span: &Span) -> Result<(), TypeError> {
        let table = self.dispatch_table(scrutinee)?;
        if table.members.len() < 2 {
            return self.check_block(body);
        }
        debug!(
            path = %table.path,
            members = table.members.len(),
            discriminant = ?table.discriminant,
            "distributing"
        );

        let mark = self.errors.len();
        for member in &table.members {
            let before = self.errors.len();

            self.env.push_narrowing();
            self.env.narrow(table.path.clone(), member.ty);
            if let (Some(key), Some(value)) = (&table.discriminant, &member.discriminant) {
                let literal = self.arena.alloc(TypeNode::Literal(value.clone()));
                self.env.narrow(format!("{}.{}", table.path, key), literal);
            }
            if let Err(e) = self.check_block(body) {
                self.errors.push(e);
            }
            self.env.pop_narrowing();

            let note = format!("while distributing `{}` as '{}'", table.path, self.render(member.ty));
            for err in &mut self.errors[before..] {
                if err.note.is_none() {
                    err.note = Some(note.clone());
                }
            }
        }

        // The same diagnostic raised under several members is reported once
        let raised = self.errors.split_off(mark);
        let mut seen = FxHashSet::default();
        for err in raised {
            if seen.insert((err.code(), err.span, err.kind.to_string())) {
                self.errors.push(err);
            }
        }
        debug!(start = span.start, diagnostics = self.errors.len() - mark, "distribution checked");
        Ok(())
    }

    /// First property of the first member that holds a literal in every
    /// member, with no two members sharing a value
    fn find_discriminant(&mut self, members: &[TypeId], span: &Span) -> Option<String> {
        let first = *members.first()?;
        let first = self.normalize(first, span);
        let TypeNode::Object(props) = self.arena.get(first).clone() else {
            return None;
        };

        'candidates: for prop in props {
            let mut values: Vec<LiteralType> = Vec::with_capacity(members.len());
            for &member in members {
                let Some(value) = self.literal_member(member, &prop.name, span) else {
                    continue 'candidates;
                };
                if values.contains(&value) {
                    continue 'candidates;
                }
                values.push(value);
            }
            return Some(prop.name);
        }
        None
    }

    fn literal_member(&mut self, ty: TypeId, key: &str, span: &Span) -> Option<LiteralType> {
        let ty = self.normalize(ty, span);
        let TypeNode::Object(props) = self.arena.get(ty).clone() else {
            return None;
        };
        let member = props.into_iter().find(|m| m.name == key && !m.optional)?;
        let member_ty = self.normalize(member.ty, span);
        match self.arena.get(member_ty) {
            TypeNode::Literal(lit) => Some(lit.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::checker::TypeChecker;
    use crate::error::TypeErrorKind;
    use quanta_ast::*;

    fn node<T>(value: T) -> Node<T> {
        Node::new(value, Span::default())
    }

    /// type A = { type: "a"; payload: number }; type B = { type: "b"; payload: string }
    fn tagged_union() -> (TypeChecker, TypeId) {
        let mut arena = TypeArena::new();
        let tag_a = arena.string_literal("a");
        let tag_b = arena.string_literal("b");
        let a = arena.object(vec![Member::new("type", tag_a), Member::new("payload", TypeId::NUMBER)]);
        let b = arena.object(vec![Member::new("type", tag_b), Member::new("payload", TypeId::STRING)]);
        let a_ref = arena.reference("A");
        let b_ref = arena.reference("B");
        let union = arena.union(vec![a_ref, b_ref]);
        let mut checker = TypeChecker::new(arena);
        checker.declare_type_alias("A", a);
        checker.declare_type_alias("B", b);
        (checker, union)
    }

    #[test]
    fn test_dispatch_table_finds_discriminant() {
        let (mut checker, union) = tagged_union();
        checker.declare_value("action", union);
        let table = checker.dispatch_table(&node(Expr::Ident(Ident::new("action")))).unwrap();
        assert_eq!(table.path, "action");
        assert_eq!(table.discriminant.as_deref(), Some("type"));
        assert_eq!(table.members.len(), 2);
        assert_eq!(table.members[0].discriminant, Some(LiteralType::String("a".into())));
        assert_eq!(table.members[1].discriminant, Some(LiteralType::String("b".into())));
    }

    #[test]
    fn test_shared_literal_is_not_a_discriminant() {
        let mut arena = TypeArena::new();
        let kind = arena.string_literal("same");
        let a = arena.object(vec![Member::new("kind", kind), Member::new("n", TypeId::NUMBER)]);
        let b = arena.object(vec![Member::new("kind", kind), Member::new("s", TypeId::STRING)]);
        let union = arena.union(vec![a, b]);
        let mut checker = TypeChecker::new(arena);
        checker.declare_value("v", union);
        let table = checker.dispatch_table(&node(Expr::Ident(Ident::new("v")))).unwrap();
        assert_eq!(table.discriminant, None);
        assert_eq!(table.members.len(), 2);
    }

    #[test]
    fn test_body_sees_narrowed_member() {
        // distribute (action) { const p: number = action.payload; }
        // holds only for A, so exactly one diagnostic, noted with the B member
        let (mut checker, union) = tagged_union();
        checker.declare_value("action", union);
        let read = Expr::Member {
            object: Box::new(node(Expr::Ident(Ident::new("action")))),
            property: node(Ident::new("payload")),
        };
        let body = BlockStmt {
            stmts: vec![node(Stmt::VarDecl(VarDecl {
                kind: VarDeclKind::Const,
                pattern: node(Pattern::Ident(node(Ident::new("p")))),
                type_annotation: Some(node(TypeId::NUMBER)),
                init: Some(node(read)),
            }))],
        };
        let errors = checker.check_distribute(&node(Expr::Ident(Ident::new("action"))), &body);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "E2001");
        assert!(errors[0].note.as_deref().unwrap_or("").contains("as 'B'"));
    }

    #[test]
    fn test_distinct_diagnostics_at_one_span_are_kept() {
        // Members with string and boolean payloads both fail at the same
        // span; the second string member repeats the first one's diagnostic
        let mut arena = TypeArena::new();
        let mut members = Vec::new();
        for (tag, payload) in [
            ("a", TypeId::NUMBER),
            ("b", TypeId::STRING),
            ("c", TypeId::BOOLEAN),
            ("d", TypeId::STRING),
        ] {
            let tag = arena.string_literal(tag);
            members.push(arena.object(vec![Member::new("type", tag), Member::new("payload", payload)]));
        }
        let union = arena.union(members);
        let mut checker = TypeChecker::new(arena);
        checker.declare_value("action", union);

        let read = Expr::Member {
            object: Box::new(node(Expr::Ident(Ident::new("action")))),
            property: node(Ident::new("payload")),
        };
        let body = BlockStmt {
            stmts: vec![node(Stmt::VarDecl(VarDecl {
                kind: VarDeclKind::Const,
                pattern: node(Pattern::Ident(node(Ident::new("p")))),
                type_annotation: Some(node(TypeId::NUMBER)),
                init: Some(node(read)),
            }))],
        };
        let errors = checker.check_distribute(&node(Expr::Ident(Ident::new("action"))), &body);
        let found: Vec<&str> = errors
            .iter()
            .map(|e| match &e.kind {
                TypeErrorKind::TypeMismatch { found, .. } => found.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(found, vec!["string", "boolean"]);
    }

    #[test]
    fn test_shadowing_the_scrutinee_drops_its_narrowing() {
        // distribute (action) { const f = (action: number) => action + 1; }
        let (mut checker, union) = tagged_union();
        checker.declare_value("action", union);
        let add = Expr::Binary {
            left: Box::new(node(Expr::Ident(Ident::new("action")))),
            op: BinaryOp::Add,
            right: Box::new(node(Expr::Literal(Literal::Number(1.0)))),
        };
        let f = Expr::Arrow {
            params: vec![ArrowParam::annotated(node(Ident::new("action")), TypeId::NUMBER)],
            body: Box::new(node(add)),
        };
        let body = BlockStmt {
            stmts: vec![node(Stmt::VarDecl(VarDecl {
                kind: VarDeclKind::Const,
                pattern: node(Pattern::Ident(node(Ident::new("f")))),
                type_annotation: None,
                init: Some(node(f)),
            }))],
        };
        let errors = checker.check_distribute(&node(Expr::Ident(Ident::new("action"))), &body);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_non_path_scrutinee_is_unsupported() {
        let (mut checker, _) = tagged_union();
        let scrutinee = node(Expr::Literal(Literal::Number(1.0)));
        let errors = checker.check_distribute(&scrutinee, &BlockStmt::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "E2015");
    }
}
