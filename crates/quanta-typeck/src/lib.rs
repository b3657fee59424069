//! # Quanta Type Checker
//!
//! Structural type checking for a small TypeScript-shaped language, built
//! around a unifier that matches `infer` patterns against candidate types.
//! On top of it sit conditional type resolution, a per-use-site solver for
//! quantified types `<T extends C> Body` with correlation checking across
//! the positions of each row, and distribution of a statement block over
//! the members of a union-typed value.

mod error;
mod options;
mod binding;
mod env;
mod helpers;
mod builtins;
mod unify;
mod checker;
mod conditional;
mod solver;
mod correlation;
mod distribute;
mod stmt_checker;
mod expr_checker;

// Re-export public API
pub use error::{TypeError, TypeErrorKind};
pub use options::CheckerOptions;
pub use binding::{BindingState, VarInfo};
pub use env::TypeEnv;
pub use helpers::{Assignability, TypeHelpers};
pub use builtins::BuiltinRegistry;
pub use unify::{
    Binding, Bindings, MatchCache, MatchFailure, MatchResult, Provenance, Unifier, Variance,
};
pub use checker::TypeChecker;
pub use solver::{QuantifiedOutcome, RowSolution};
pub use correlation::{CorrelationGroup, Position, RowId};
pub use distribute::{DispatchTable, UnionMember};

use quanta_ast::{Program, TypeArena};

// =============================================================================
// Public API
// =============================================================================

/// Type check a program whose types live in `arena`
pub fn check_program(arena: TypeArena, program: &Program) -> Result<(), Vec<TypeError>> {
    let mut checker = TypeChecker::new(arena);
    checker.check_program(program)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quanta_ast::*;

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end, 0)
    }

    fn make_node<T>(value: T) -> Node<T> {
        Node::new(value, Span::default())
    }

    fn ident(name: &str) -> Node<Expr> {
        make_node(Expr::Ident(Ident::new(name)))
    }

    fn str_lit(s: &str) -> Node<Expr> {
        make_node(Expr::Literal(Literal::String(s.to_string())))
    }

    fn num_lit(n: f64) -> Node<Expr> {
        make_node(Expr::Literal(Literal::Number(n)))
    }

    fn object(props: Vec<(&str, Node<Expr>)>) -> Node<Expr> {
        make_node(Expr::Object(
            props
                .into_iter()
                .map(|(key, value)| ObjectProperty::Property { key: make_node(Ident::new(key)), value })
                .collect(),
        ))
    }

    fn arrow(param: &str, annotation: Option<TypeId>, body: Node<Expr>) -> Node<Expr> {
        let name = make_node(Ident::new(param));
        let param = match annotation {
            Some(ty) => ArrowParam::annotated(name, ty),
            None => ArrowParam::new(name),
        };
        make_node(Expr::Arrow { params: vec![param], body: Box::new(body) })
    }

    fn member(object: Node<Expr>, property: &str) -> Node<Expr> {
        make_node(Expr::Member { object: Box::new(object), property: make_node(Ident::new(property)) })
    }

    fn binary(left: Node<Expr>, op: BinaryOp, right: Node<Expr>) -> Node<Expr> {
        make_node(Expr::Binary { left: Box::new(left), op, right: Box::new(right) })
    }

    fn call(callee: Node<Expr>, args: Vec<Node<Expr>>) -> Node<Expr> {
        make_node(Expr::Call { callee: Box::new(callee), args })
    }

    fn declare(name: &str, ty: TypeId) -> Node<Stmt> {
        make_node(Stmt::VarDecl(VarDecl {
            kind: VarDeclKind::Const,
            pattern: make_node(Pattern::Ident(make_node(Ident::new(name)))),
            type_annotation: Some(make_node(ty)),
            init: None,
        }))
    }

    fn alias(name: &str, ty: TypeId) -> Node<Stmt> {
        make_node(Stmt::TypeAlias(TypeAliasDecl { name: make_node(Ident::new(name)), ty: make_node(ty) }))
    }

    fn program(items: Vec<Node<Stmt>>) -> Program {
        Program { items, span: Span::default() }
    }

    /// `<T> { a: T; ab: (a: T) => unknown; bc?: (b: unknown) => unknown }[]`
    fn rows_type(arena: &mut TypeArena) -> TypeId {
        let t = arena.reference("T");
        let ab = arena.function(vec![Param::new("a", t)], TypeId::UNKNOWN);
        let bc = arena.function(vec![Param::new("b", TypeId::UNKNOWN)], TypeId::UNKNOWN);
        let body = arena.object(vec![
            Member::new("a", t),
            Member::new("ab", ab),
            Member::optional("bc", bc),
        ]);
        let rows = arena.array(body);
        arena.quantified("T", None, rows)
    }

    fn heterogeneous_rows() -> Node<Expr> {
        make_node(Expr::Array(vec![
            object(vec![
                ("a", str_lit("0")),
                ("ab", arrow("a", None, binary(ident("a"), BinaryOp::Add, str_lit("!")))),
                (
                    "bc",
                    arrow(
                        "b",
                        None,
                        make_node(Expr::Unary { op: UnaryOp::TypeOf, expr: Box::new(ident("b")) }),
                    ),
                ),
            ]),
            object(vec![("a", str_lit("x")), ("ab", arrow("a", None, member(ident("a"), "length")))]),
            object(vec![
                ("a", num_lit(42.0)),
                ("ab", arrow("a", None, call(member(ident("a"), "toString"), vec![]))),
            ]),
        ]))
    }

    fn solve_rows(options: CheckerOptions) -> QuantifiedOutcome {
        let mut arena = TypeArena::new();
        let rows = rows_type(&mut arena);
        let declared = arena.reference("Rows");
        let mut checker = TypeChecker::with_options(arena, options);
        checker.declare_type_alias("Rows", rows);
        checker.solve_quantified(declared, &heterogeneous_rows())
    }

    #[test]
    fn test_heterogeneous_rows_solve_independently() {
        let outcome = solve_rows(CheckerOptions::default());
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
        let solved: Vec<TypeId> = outcome.solutions.iter().map(|s| s.ty).collect();
        assert_eq!(solved, vec![TypeId::STRING, TypeId::STRING, TypeId::NUMBER]);
        let rows: Vec<Option<usize>> = outcome.solutions.iter().map(|s| s.row.index).collect();
        assert_eq!(rows, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_memoization_does_not_change_results() {
        let memo = solve_rows(CheckerOptions::default());
        let plain = solve_rows(CheckerOptions { memoize: false, ..CheckerOptions::default() });
        assert_eq!(memo.solutions, plain.solutions);
        assert_eq!(memo.diagnostics, plain.diagnostics);
    }

    /// `<K extends string> { key: K; ref: K }`
    fn keyed(arena: &mut TypeArena) -> TypeId {
        let k = arena.reference("K");
        let body = arena.object(vec![Member::new("key", k), Member::new("ref", k)]);
        arena.quantified("K", Some(TypeId::STRING), body)
    }

    fn keyed_row(key: &str, reference: Node<Expr>) -> Node<Expr> {
        object(vec![("key", str_lit(key)), ("ref", reference)])
    }

    #[test]
    fn test_correlation_violation_is_local_to_its_row() {
        let mut arena = TypeArena::new();
        let keyed = keyed(&mut arena);
        let declared = arena.array(keyed);
        let mut checker = TypeChecker::new(arena);

        let bad_ref = Node::new(Expr::Literal(Literal::String("b".into())), span(40, 43));
        let rows = make_node(Expr::Array(vec![
            keyed_row("a", str_lit("a")),
            keyed_row("a", bad_ref),
            keyed_row("c", str_lit("c")),
        ]));
        let outcome = checker.solve_quantified(declared, &rows);

        assert_eq!(outcome.diagnostics.len(), 1);
        let err = &outcome.diagnostics[0];
        assert_eq!(err.code(), "E2013");
        assert_eq!(err.span, span(40, 43));
        match &err.kind {
            TypeErrorKind::CorrelationViolation { param, position, found, expected, .. } => {
                assert_eq!(param, "K");
                assert_eq!(position, "'ref'");
                assert_eq!(found, "\"b\"");
                assert_eq!(expected, "\"a\"");
            }
            other => panic!("expected correlation violation, got {:?}", other),
        }

        // Rows on either side still solve, with literals kept under a string constraint
        let solved: Vec<String> = outcome.solutions.iter().map(|s| checker.arena().render(s.ty)).collect();
        assert_eq!(solved, vec!["\"a\"", "\"c\""]);
    }

    #[test]
    fn test_use_sites_do_not_share_solutions() {
        let mut arena = TypeArena::new();
        let declared = keyed(&mut arena);
        let mut checker = TypeChecker::new(arena);

        let good = keyed_row("x", str_lit("x"));
        let bad = keyed_row("x", str_lit("y"));
        let outcomes = checker.check_quantified_use_sites(declared, &[good.clone(), bad, good]);

        assert!(outcomes[0].diagnostics.is_empty());
        assert_eq!(outcomes[1].diagnostics.len(), 1);
        assert_eq!(outcomes[1].diagnostics[0].code(), "E2013");
        assert!(outcomes[2].diagnostics.is_empty());
        assert_eq!(outcomes[2].solutions.len(), 1);
    }

    #[test]
    fn test_constraint_violation() {
        let mut arena = TypeArena::new();
        let declared = keyed(&mut arena);
        let mut checker = TypeChecker::new(arena);

        let row = object(vec![("key", num_lit(1.0)), ("ref", num_lit(1.0))]);
        let diagnostics = checker.check_quantified_assignment(declared, &row);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0].kind,
            TypeErrorKind::ConstraintViolation { param, constraint, .. } if param == "K" && constraint == "string"
        ));
    }

    /// type A = { type: "a"; payload: number }
    /// type B = { type: "b"; payload: string }
    /// declare const handlers: { a: (x: A) => void; b: (x: B) => void }
    /// declare const action: A | B
    fn dispatch_prelude(arena: &mut TypeArena) -> Vec<Node<Stmt>> {
        let tag_a = arena.string_literal("a");
        let tag_b = arena.string_literal("b");
        let a = arena.object(vec![Member::new("type", tag_a), Member::new("payload", TypeId::NUMBER)]);
        let b = arena.object(vec![Member::new("type", tag_b), Member::new("payload", TypeId::STRING)]);
        let a_ref = arena.reference("A");
        let b_ref = arena.reference("B");
        let handle_a = arena.function(vec![Param::new("x", a_ref)], TypeId::VOID);
        let handle_b = arena.function(vec![Param::new("x", b_ref)], TypeId::VOID);
        let handlers = arena.object(vec![Member::new("a", handle_a), Member::new("b", handle_b)]);
        let action = arena.union(vec![a_ref, b_ref]);
        vec![alias("A", a), alias("B", b), declare("handlers", handlers), declare("action", action)]
    }

    /// handlers[action.type](action)
    fn dispatch_call() -> Node<Stmt> {
        let lookup = make_node(Expr::Index {
            object: Box::new(ident("handlers")),
            index: Box::new(member(ident("action"), "type")),
        });
        make_node(Stmt::Expr(call(lookup, vec![ident("action")])))
    }

    #[test]
    fn test_distributed_dispatch_checks_cleanly() {
        let mut arena = TypeArena::new();
        let mut items = dispatch_prelude(&mut arena);
        items.push(make_node(Stmt::Distribute {
            scrutinee: ident("action"),
            body: BlockStmt { stmts: vec![dispatch_call()] },
        }));
        assert_eq!(check_program(arena, &program(items)), Ok(()));
    }

    #[test]
    fn test_undistributed_dispatch_is_rejected() {
        let mut arena = TypeArena::new();
        let mut items = dispatch_prelude(&mut arena);
        items.push(dispatch_call());
        let errors = check_program(arena, &program(items)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "E2001");
    }

    #[test]
    fn test_self_reference_in_destructuring_initializer() {
        // const { c, f } = { c: 0, f }
        let pattern = Pattern::Object(vec![
            PatternProperty::shorthand(make_node(Ident::new("c"))),
            PatternProperty::shorthand(make_node(Ident::new("f"))),
        ]);
        let init = Expr::Object(vec![
            ObjectProperty::Property { key: make_node(Ident::new("c")), value: num_lit(0.0) },
            ObjectProperty::Shorthand(Node::new(Ident::new("f"), span(20, 21))),
        ]);
        let decl = make_node(Stmt::VarDecl(VarDecl {
            kind: VarDeclKind::Const,
            pattern: make_node(pattern),
            type_annotation: None,
            init: Some(make_node(init)),
        }));

        let mut checker = TypeChecker::new(TypeArena::new());
        let errors = checker.check_program(&program(vec![decl])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0].kind, TypeErrorKind::SelfReferentialBinding(name) if name == "f"));
        assert_eq!(errors[0].span, span(20, 21));
        assert_eq!(checker.lookup_value("c"), Some(TypeId::NUMBER));
        assert_eq!(checker.lookup_value("f"), Some(TypeId::UNKNOWN));
    }

    #[test]
    fn test_block_aliases_are_hoisted_and_scoped() {
        let mut arena = TypeArena::new();
        let inner = arena.reference("Inner");
        let first = BlockStmt {
            stmts: vec![
                make_node(Stmt::VarDecl(VarDecl {
                    kind: VarDeclKind::Const,
                    pattern: make_node(Pattern::Ident(make_node(Ident::new("x")))),
                    type_annotation: Some(make_node(inner)),
                    init: Some(str_lit("s")),
                })),
                alias("Inner", TypeId::STRING),
            ],
        };
        let second = BlockStmt {
            stmts: vec![
                alias("Inner", TypeId::NUMBER),
                make_node(Stmt::VarDecl(VarDecl {
                    kind: VarDeclKind::Const,
                    pattern: make_node(Pattern::Ident(make_node(Ident::new("y")))),
                    type_annotation: Some(make_node(inner)),
                    init: Some(num_lit(1.0)),
                })),
            ],
        };
        let items = vec![
            make_node(Stmt::Block(first)),
            make_node(Stmt::Block(second)),
            declare("z", inner),
        ];

        let errors = check_program(arena, &program(items)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0].kind, TypeErrorKind::UndefinedType(name) if name == "Inner"));
    }

    #[test]
    fn test_quantified_parameter_is_solved_per_call() {
        // type Q = <T> { value: T; check: (v: T) => boolean }
        // declare const use: (row: Q) => void
        let mut arena = TypeArena::new();
        let t = arena.reference("T");
        let check = arena.function(vec![Param::new("v", t)], TypeId::BOOLEAN);
        let body = arena.object(vec![Member::new("value", t), Member::new("check", check)]);
        let q = arena.quantified("T", None, body);
        let q_ref = arena.reference("Q");
        let use_fn = arena.function(vec![Param::new("row", q_ref)], TypeId::VOID);

        let numeric = object(vec![
            ("value", num_lit(1.0)),
            ("check", arrow("v", None, binary(ident("v"), BinaryOp::Gt, num_lit(0.0)))),
        ]);
        let textual = object(vec![
            ("value", str_lit("s")),
            (
                "check",
                arrow("v", None, binary(member(ident("v"), "length"), BinaryOp::Gt, num_lit(0.0))),
            ),
        ]);
        let mismatched = object(vec![
            ("value", num_lit(1.0)),
            (
                "check",
                arrow("v", Some(TypeId::STRING), make_node(Expr::Literal(Literal::Boolean(true)))),
            ),
        ]);

        let items = vec![
            alias("Q", q),
            declare("use", use_fn),
            make_node(Stmt::Expr(call(ident("use"), vec![numeric]))),
            make_node(Stmt::Expr(call(ident("use"), vec![textual]))),
            make_node(Stmt::Expr(call(ident("use"), vec![mismatched]))),
        ];
        let errors = check_program(arena, &program(items)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "E2013");
    }

    #[test]
    fn test_arity_and_property_errors() {
        let mut arena = TypeArena::new();
        let f = arena.function(vec![Param::new("x", TypeId::NUMBER)], TypeId::NUMBER);
        let items = vec![
            declare("f", f),
            make_node(Stmt::Expr(call(ident("f"), vec![]))),
            make_node(Stmt::Expr(member(ident("f"), "missing"))),
        ];
        let errors = check_program(arena, &program(items)).unwrap_err();
        let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["E2009", "E2005"]);
    }

    /// `<T> { values: T[]; identifier: (value: T) => string }`
    fn identified(arena: &mut TypeArena) -> TypeId {
        let t = arena.reference("T");
        let values = arena.array(t);
        let identifier = arena.function(vec![Param::new("value", t)], TypeId::STRING);
        let body = arena.object(vec![Member::new("values", values), Member::new("identifier", identifier)]);
        arena.quantified("T", None, body)
    }

    fn constant(name: &str, ty: TypeId, init: Node<Expr>) -> Node<Stmt> {
        make_node(Stmt::VarDecl(VarDecl {
            kind: VarDeclKind::Const,
            pattern: make_node(Pattern::Ident(make_node(Ident::new(name)))),
            type_annotation: Some(make_node(ty)),
            init: Some(init),
        }))
    }

    #[test]
    fn test_quantified_value_flows_into_its_own_type() {
        // declare const t1: Q; const t2: Q = t1; use(t1);
        let mut arena = TypeArena::new();
        let q = identified(&mut arena);
        let q_ref = arena.reference("Q");
        let use_fn = arena.function(vec![Param::new("row", q_ref)], TypeId::VOID);
        let items = vec![
            alias("Q", q),
            declare("t1", q_ref),
            constant("t2", q_ref, ident("t1")),
            declare("use", use_fn),
            make_node(Stmt::Expr(call(ident("use"), vec![ident("t1")]))),
        ];
        assert_eq!(check_program(arena, &program(items)), Ok(()));
    }

    #[test]
    fn test_quantified_value_rejects_other_quantified_shapes() {
        // type P = <T> { values: T[] }; declare const p: P; const q: Q = p;
        let mut arena = TypeArena::new();
        let q = identified(&mut arena);
        let t = arena.reference("T");
        let values = arena.array(t);
        let p_body = arena.object(vec![Member::new("values", values)]);
        let p = arena.quantified("T", None, p_body);
        let q_ref = arena.reference("Q");
        let p_ref = arena.reference("P");
        let items = vec![
            alias("Q", q),
            alias("P", p),
            declare("p", p_ref),
            constant("q", q_ref, ident("p")),
        ];
        let errors = check_program(arena, &program(items)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "E2001");
    }

    #[test]
    fn test_members_of_a_quantified_value_share_its_parameter() {
        // t1.identifier(t1.values[0]); t1.identifier(42);
        let mut arena = TypeArena::new();
        let q = identified(&mut arena);
        let q_ref = arena.reference("Q");
        let first = make_node(Expr::Index {
            object: Box::new(member(ident("t1"), "values")),
            index: Box::new(num_lit(0.0)),
        });
        let wrong = Node::new(Expr::Literal(Literal::Number(42.0)), span(60, 62));
        let items = vec![
            alias("Q", q),
            declare("t1", q_ref),
            make_node(Stmt::Expr(call(member(ident("t1"), "identifier"), vec![first]))),
            make_node(Stmt::Expr(call(member(ident("t1"), "identifier"), vec![wrong]))),
        ];
        let errors = check_program(arena, &program(items)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "E2001");
        assert_eq!(errors[0].span, span(60, 62));
    }

    #[test]
    fn test_destructured_quantified_value_uses_its_constraint() {
        // const { values } = t1  (values: unknown[])
        let mut arena = TypeArena::new();
        let q = identified(&mut arena);
        let q_ref = arena.reference("Q");
        let destructure = make_node(Stmt::VarDecl(VarDecl {
            kind: VarDeclKind::Const,
            pattern: make_node(Pattern::Object(vec![PatternProperty::shorthand(make_node(Ident::new(
                "values",
            )))])),
            type_annotation: None,
            init: Some(ident("t1")),
        }));
        let mut checker = TypeChecker::new(arena);
        let items = vec![alias("Q", q), declare("t1", q_ref), destructure];
        assert_eq!(checker.check_program(&program(items)), Ok(()));
        let values = checker.lookup_value("values").unwrap();
        assert_eq!(checker.arena().render(values), "unknown[]");
    }

    #[test]
    fn test_shadowed_scrutinee_inside_distribute() {
        // distribute (action) { const f = (action: number) => action + 1; }
        let mut arena = TypeArena::new();
        let mut items = dispatch_prelude(&mut arena);
        let f = make_node(Expr::Arrow {
            params: vec![ArrowParam::annotated(make_node(Ident::new("action")), TypeId::NUMBER)],
            body: Box::new(binary(ident("action"), BinaryOp::Add, num_lit(1.0))),
        });
        let body = BlockStmt {
            stmts: vec![make_node(Stmt::VarDecl(VarDecl {
                kind: VarDeclKind::Const,
                pattern: make_node(Pattern::Ident(make_node(Ident::new("f")))),
                type_annotation: None,
                init: Some(f),
            }))],
        };
        items.push(make_node(Stmt::Distribute { scrutinee: ident("action"), body }));
        assert_eq!(check_program(arena, &program(items)), Ok(()));
    }

    #[test]
    fn test_nested_quantifier_is_unsupported() {
        // type N = <T> { inner: <U> U[] }; const n: N = { inner: [] }; const s: number = "s";
        let mut arena = TypeArena::new();
        let u = arena.reference("U");
        let list = arena.array(u);
        let inner = arena.quantified("U", None, list);
        let body = arena.object(vec![Member::new("inner", inner)]);
        let nested = arena.quantified("T", None, body);
        let n_ref = arena.reference("N");
        let literal = Node::new(
            Expr::Object(vec![ObjectProperty::Property {
                key: make_node(Ident::new("inner")),
                value: make_node(Expr::Array(vec![])),
            }]),
            span(30, 43),
        );
        let items = vec![
            alias("N", nested),
            constant("n", n_ref, literal),
            constant("s", TypeId::NUMBER, str_lit("s")),
        ];
        let errors = check_program(arena, &program(items)).unwrap_err();
        let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["E2015", "E2001"]);
        assert_eq!(errors[0].span, span(30, 43));
    }
}
