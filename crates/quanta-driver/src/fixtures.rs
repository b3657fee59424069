//! Conformance fixtures
//!
//! There is no parser in this workspace: each fixture carries its source
//! text for display and diagnostics rendering, and a builder that produces
//! the matching checker input. Spans are located by searching the source
//! text, so reported locations point into the shown source.

use quanta_ast::{
    ArrowParam, BinaryOp, BlockStmt, Expr, Ident, Literal, Member, Node, ObjectProperty, Param,
    Pattern, PatternProperty, Program, Span, Stmt, TypeAliasDecl, TypeArena, TypeId, UnaryOp,
    VarDecl, VarDeclKind,
};
use quanta_typeck::{CheckerOptions, TypeChecker, TypeError};

/// A source text, its checker input and the codes it must produce
pub struct Fixture {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    /// Diagnostic codes the checker must report, in order
    pub expected: &'static [&'static str],
    build: fn(&mut Tree) -> Vec<Node<Stmt>>,
}

/// Checker input for one fixture
pub struct BuiltFixture {
    pub arena: TypeArena,
    pub program: Program,
    /// Type aliases and annotated declarations, in source order
    pub declared: Vec<(String, TypeId)>,
}

/// Outcome of checking one fixture
#[derive(Debug)]
pub struct FixtureRun {
    pub diagnostics: Vec<TypeError>,
    pub passed: bool,
}

impl FixtureRun {
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(|d| d.code()).collect()
    }
}

impl Fixture {
    pub fn build(&self) -> BuiltFixture {
        let mut tree = Tree::new(self.source);
        let items = (self.build)(&mut tree);
        BuiltFixture {
            arena: tree.arena,
            program: Program { items, span: Span::new(0, self.source.len(), 0) },
            declared: tree.declared,
        }
    }

    pub fn run(&self, options: CheckerOptions) -> FixtureRun {
        let built = self.build();
        let mut checker = TypeChecker::with_options(built.arena, options);
        let diagnostics = checker.check_program(&built.program).err().unwrap_or_default();
        let passed = diagnostics.iter().map(|d| d.code()).eq(self.expected.iter().copied());
        FixtureRun { diagnostics, passed }
    }
}

pub fn find(name: &str) -> Option<&'static Fixture> {
    FIXTURES.iter().find(|f| f.name == name)
}

pub static FIXTURES: &[Fixture] = &[
    Fixture {
        name: "call-pattern-vs-constructor",
        description: "a call-signature pattern does not match a construct signature",
        source: CALL_VS_CONSTRUCT,
        expected: &["E2001"],
        build: call_pattern_vs_constructor,
    },
    Fixture {
        name: "construct-pattern",
        description: "a construct-signature pattern infers the constructed type",
        source: CONSTRUCT_PATTERN,
        expected: &[],
        build: construct_pattern,
    },
    Fixture {
        name: "function-pattern-vs-string",
        description: "a function pattern does not match a primitive",
        source: FUNCTION_VS_STRING,
        expected: &["E2001"],
        build: function_pattern_vs_string,
    },
    Fixture {
        name: "heterogeneous-rows",
        description: "each row of a quantified array literal is solved on its own",
        source: HETEROGENEOUS_ROWS,
        expected: &[],
        build: heterogeneous_rows,
    },
    Fixture {
        name: "distributed-dispatch",
        description: "a handler lookup checks once per member of a tagged union",
        source: DISTRIBUTED_DISPATCH,
        expected: &[],
        build: distributed_dispatch,
    },
    Fixture {
        name: "undistributed-dispatch",
        description: "the same lookup without distribution is rejected",
        source: UNDISTRIBUTED_DISPATCH,
        expected: &["E2001"],
        build: undistributed_dispatch,
    },
    Fixture {
        name: "self-referential-destructuring",
        description: "a destructured binding read by its own initializer",
        source: SELF_REFERENCE,
        expected: &["E2014"],
        build: self_referential_destructuring,
    },
    Fixture {
        name: "correlated-use-sites",
        description: "a correlation violation is reported only at the offending site",
        source: CORRELATED_USE_SITES,
        expected: &["E2013"],
        build: correlated_use_sites,
    },
    Fixture {
        name: "constraint-violation",
        description: "a row solution outside the parameter's constraint",
        source: CONSTRAINT_VIOLATION,
        expected: &["E2012"],
        build: constraint_violation,
    },
    Fixture {
        name: "quantified-parameter",
        description: "a quantified parameter type is solved afresh at every call",
        source: QUANTIFIED_PARAMETER,
        expected: &["E2013"],
        build: quantified_parameter,
    },
];

// =============================================================================
// Sources
// =============================================================================

const CALL_VS_CONSTRUCT: &str = r#"type Ctor = { new (): string };
type Result = Ctor extends { (): infer R } ? R : never;
const value: Result = "text";
"#;

const CONSTRUCT_PATTERN: &str = r#"type Ctor = { new (): string };
type Result = Ctor extends { new (): infer R } ? R : never;
const value: Result = "text";
"#;

const FUNCTION_VS_STRING: &str = r#"type Result = string extends (x: infer U) => any ? U : never;
const value: Result = "text";
"#;

const HETEROGENEOUS_ROWS: &str = r#"type Rows = <T> { a: T; ab: (a: T) => unknown; bc?: (b: unknown) => unknown }[];
const rows: Rows = [
  { a: "0", ab: a => +a, bc: b => typeof b === "number" },
  { a: "hello", ab: a => a + " world", bc: b => +b },
  { a: 42, ab: a => a.toString() },
];
"#;

const DISTRIBUTED_DISPATCH: &str = r#"type A = { type: "a"; payload: number };
type B = { type: "b"; payload: string };
declare const handlers: { a: (x: A) => void; b: (x: B) => void };
declare const action: A | B;
distribute (action) {
  handlers[action.type](action);
}
"#;

const UNDISTRIBUTED_DISPATCH: &str = r#"type A = { type: "a"; payload: number };
type B = { type: "b"; payload: string };
declare const handlers: { a: (x: A) => void; b: (x: B) => void };
declare const action: A | B;
handlers[action.type](action);
"#;

const SELF_REFERENCE: &str = r#"const { c, f } = { c: 0, f };
"#;

const CORRELATED_USE_SITES: &str = r#"type Keyed = <K extends string> { key: K; ref: K };
const first: Keyed = { key: "a", ref: "a" };
const second: Keyed = { key: "a", ref: "b" };
const third: Keyed = { key: "c", ref: "c" };
"#;

const CONSTRAINT_VIOLATION: &str = r#"type Keyed = <K extends string> { key: K; ref: K };
const bad: Keyed = { key: 1, ref: 1 };
"#;

const QUANTIFIED_PARAMETER: &str = r#"type Check = <T> { value: T; check: (v: T) => boolean };
declare const use: (row: Check) => void;
use({ value: 1, check: v => v > 0 });
use({ value: "s", check: v => v.length > 0 });
use({ value: 1, check: (v: string) => true });
"#;

// =============================================================================
// Builders
// =============================================================================

/// `Ctor extends <pattern> ? R : never` over `type Ctor = { new (): string }`
fn ctor_conditional(t: &mut Tree, pattern: TypeId) -> Vec<Node<Stmt>> {
    let ctor = t.arena.construct_signature(vec![], TypeId::STRING);
    let ctor_ref = t.arena.reference("Ctor");
    let r_ref = t.arena.reference("R");
    let result = t.arena.conditional(ctor_ref, pattern, r_ref, TypeId::NEVER);
    let result_ref = t.arena.reference("Result");

    let ctor_span = t.begin("type Ctor", ";\n");
    let ctor_decl = t.alias(ctor_span, "Ctor", ctor);
    let result_span = t.begin("type Result", ";\n");
    let result_decl = t.alias(result_span, "Result", result);
    let value_span = t.begin("const value", ";\n");
    let init = t.string("text");
    let value_decl = t.constant(value_span, "value", Some(result_ref), init);
    vec![ctor_decl, result_decl, value_decl]
}

fn call_pattern_vs_constructor(t: &mut Tree) -> Vec<Node<Stmt>> {
    let r = t.arena.infer("R");
    let pattern = t.arena.call_signature(vec![], r);
    ctor_conditional(t, pattern)
}

fn construct_pattern(t: &mut Tree) -> Vec<Node<Stmt>> {
    let r = t.arena.infer("R");
    let pattern = t.arena.construct_signature(vec![], r);
    ctor_conditional(t, pattern)
}

fn function_pattern_vs_string(t: &mut Tree) -> Vec<Node<Stmt>> {
    let u = t.arena.infer("U");
    let pattern = t.arena.function(vec![Param::new("x", u)], TypeId::ANY);
    let u_ref = t.arena.reference("U");
    let result = t.arena.conditional(TypeId::STRING, pattern, u_ref, TypeId::NEVER);
    let result_ref = t.arena.reference("Result");

    let result_span = t.begin("type Result", ";\n");
    let result_decl = t.alias(result_span, "Result", result);
    let value_span = t.begin("const value", ";\n");
    let init = t.string("text");
    vec![result_decl, t.constant(value_span, "value", Some(result_ref), init)]
}

fn heterogeneous_rows(t: &mut Tree) -> Vec<Node<Stmt>> {
    let t_ref = t.arena.reference("T");
    let ab = t.arena.function(vec![Param::new("a", t_ref)], TypeId::UNKNOWN);
    let bc = t.arena.function(vec![Param::new("b", TypeId::UNKNOWN)], TypeId::UNKNOWN);
    let row = t.arena.object(vec![
        Member::new("a", t_ref),
        Member::new("ab", ab),
        Member::optional("bc", bc),
    ]);
    let rows = t.arena.array(row);
    let quantified = t.arena.quantified("T", None, rows);
    let rows_ref = t.arena.reference("Rows");

    let alias_span = t.begin("type Rows", ";\n");
    let alias = t.alias(alias_span, "Rows", quantified);
    let decl_span = t.begin("const rows", "];\n");
    let open = t.at("[");

    t.enter("{ a: \"0\"");
    let first = t.object(
        r#"{ a: "0", ab: a => +a, bc: b => typeof b === "number" }"#,
        vec![
            ("a", t.string("0")),
            ("ab", t.arrow("a => +a", "a", None, t.unary("+a", UnaryOp::Plus, t.ident("a")))),
            (
                "bc",
                t.arrow(
                    r#"b => typeof b === "number""#,
                    "b",
                    None,
                    t.binary(
                        r#"typeof b === "number""#,
                        t.unary("typeof b", UnaryOp::TypeOf, t.ident("b")),
                        BinaryOp::StrictEq,
                        t.string("number"),
                    ),
                ),
            ),
        ],
    );

    t.enter("{ a: \"hello\"");
    let second = t.object(
        r#"{ a: "hello", ab: a => a + " world", bc: b => +b }"#,
        vec![
            ("a", t.string("hello")),
            (
                "ab",
                t.arrow(
                    r#"a => a + " world""#,
                    "a",
                    None,
                    t.binary(r#"a + " world""#, t.ident("a"), BinaryOp::Add, t.string(" world")),
                ),
            ),
            ("bc", t.arrow("b => +b", "b", None, t.unary("+b", UnaryOp::Plus, t.ident("b")))),
        ],
    );

    t.enter("{ a: 42");
    let to_string = t.member("a.toString", t.ident("a"), "toString");
    let third = t.object(
        "{ a: 42, ab: a => a.toString() }",
        vec![
            ("a", t.number("42")),
            ("ab", t.arrow("a => a.toString()", "a", None, t.call("a.toString()", to_string, vec![]))),
        ],
    );

    let literal = Node::new(Expr::Array(vec![first, second, third]), open);
    vec![alias, t.constant(decl_span, "rows", Some(rows_ref), literal)]
}

/// Aliases `A` and `B` and the `handlers`/`action` declarations
fn dispatch_prelude(t: &mut Tree) -> Vec<Node<Stmt>> {
    let tag_a = t.arena.string_literal("a");
    let tag_b = t.arena.string_literal("b");
    let a = t.arena.object(vec![Member::new("type", tag_a), Member::new("payload", TypeId::NUMBER)]);
    let b = t.arena.object(vec![Member::new("type", tag_b), Member::new("payload", TypeId::STRING)]);
    let a_ref = t.arena.reference("A");
    let b_ref = t.arena.reference("B");
    let handle_a = t.arena.function(vec![Param::new("x", a_ref)], TypeId::VOID);
    let handle_b = t.arena.function(vec![Param::new("x", b_ref)], TypeId::VOID);
    let handlers = t.arena.object(vec![Member::new("a", handle_a), Member::new("b", handle_b)]);
    let action = t.arena.union(vec![a_ref, b_ref]);

    let a_span = t.begin("type A", ";\n");
    let a_decl = t.alias(a_span, "A", a);
    let b_span = t.begin("type B", ";\n");
    let b_decl = t.alias(b_span, "B", b);
    let handlers_span = t.begin("declare const handlers", ";\n");
    let handlers_decl = t.ambient(handlers_span, "handlers", handlers);
    let action_span = t.begin("declare const action", ";\n");
    let action_decl = t.ambient(action_span, "action", action);
    vec![a_decl, b_decl, handlers_decl, action_decl]
}

/// `handlers[action.type](action);`
fn dispatch_call(t: &mut Tree) -> Node<Stmt> {
    let span = t.begin("handlers[action.type](action);", ";");
    let call_span = t.at("handlers[action.type](action)");
    let key = t.member("action.type", t.ident("action"), "type");
    let lookup = t.index("handlers[action.type]", t.ident("handlers"), key);
    t.enter("(action)");
    let arg = t.ident("action");
    let call = Expr::Call { callee: Box::new(lookup), args: vec![arg] };
    Node::new(Stmt::Expr(Node::new(call, call_span)), span)
}

fn distributed_dispatch(t: &mut Tree) -> Vec<Node<Stmt>> {
    let mut items = dispatch_prelude(t);
    let span = t.begin("distribute (action)", "}\n");
    let scrutinee = t.ident("action");
    let body = BlockStmt { stmts: vec![dispatch_call(t)] };
    items.push(Node::new(Stmt::Distribute { scrutinee, body }, span));
    items
}

fn undistributed_dispatch(t: &mut Tree) -> Vec<Node<Stmt>> {
    let mut items = dispatch_prelude(t);
    items.push(dispatch_call(t));
    items
}

fn self_referential_destructuring(t: &mut Tree) -> Vec<Node<Stmt>> {
    let span = t.begin("const { c, f }", ";\n");
    let pattern_span = t.at("{ c, f }");
    let pattern = Pattern::Object(vec![
        PatternProperty::shorthand(t.name("c")),
        PatternProperty::shorthand(t.name("f")),
    ]);

    t.enter("{ c: 0, f }");
    let init_span = t.at("{ c: 0, f }");
    let c = t.name("c");
    t.enter("0, f");
    let zero = t.number("0");
    let f = t.name("f");
    let init = Expr::Object(vec![
        ObjectProperty::Property { key: c, value: zero },
        ObjectProperty::Shorthand(f),
    ]);

    vec![Node::new(
        Stmt::VarDecl(VarDecl {
            kind: VarDeclKind::Const,
            pattern: Node::new(pattern, pattern_span),
            type_annotation: None,
            init: Some(Node::new(init, init_span)),
        }),
        span,
    )]
}

/// `type Keyed = <K extends string> { key: K; ref: K }`
fn keyed_alias(t: &mut Tree) -> (Node<Stmt>, TypeId) {
    let k = t.arena.reference("K");
    let body = t.arena.object(vec![Member::new("key", k), Member::new("ref", k)]);
    let keyed = t.arena.quantified("K", Some(TypeId::STRING), body);
    let keyed_ref = t.arena.reference("Keyed");
    let span = t.begin("type Keyed", ";\n");
    (t.alias(span, "Keyed", keyed), keyed_ref)
}

/// `const name: Keyed = { key: <key>, ref: <reference> };`
fn keyed_decl(
    t: &mut Tree,
    name: &str,
    ty: TypeId,
    value: fn(&Tree, &str) -> Node<Expr>,
    key: &str,
    reference: &str,
) -> Node<Stmt> {
    let span = t.begin(&format!("const {}", name), ";\n");
    let open = t.at("{");
    t.enter("key:");
    let key = ObjectProperty::Property { key: t.name("key"), value: value(t, key) };
    t.enter("ref:");
    let reference = ObjectProperty::Property { key: t.name("ref"), value: value(t, reference) };
    let literal = Node::new(Expr::Object(vec![key, reference]), open);
    t.constant(span, name, Some(ty), literal)
}

fn correlated_use_sites(t: &mut Tree) -> Vec<Node<Stmt>> {
    let (alias, keyed) = keyed_alias(t);
    let mut items = vec![alias];
    for (name, key, reference) in [("first", "a", "a"), ("second", "a", "b"), ("third", "c", "c")] {
        items.push(keyed_decl(t, name, keyed, Tree::string, key, reference));
    }
    items
}

fn constraint_violation(t: &mut Tree) -> Vec<Node<Stmt>> {
    let (alias, keyed) = keyed_alias(t);
    vec![alias, keyed_decl(t, "bad", keyed, Tree::number, "1", "1")]
}

fn quantified_parameter(t: &mut Tree) -> Vec<Node<Stmt>> {
    let t_ref = t.arena.reference("T");
    let check = t.arena.function(vec![Param::new("v", t_ref)], TypeId::BOOLEAN);
    let body = t.arena.object(vec![Member::new("value", t_ref), Member::new("check", check)]);
    let quantified = t.arena.quantified("T", None, body);
    let check_ref = t.arena.reference("Check");
    let use_fn = t.arena.function(vec![Param::new("row", check_ref)], TypeId::VOID);

    let alias_span = t.begin("type Check", ";\n");
    let alias = t.alias(alias_span, "Check", quantified);
    let use_span = t.begin("declare const use", ";\n");
    let use_decl = t.ambient(use_span, "use", use_fn);
    let mut items = vec![alias, use_decl];

    let span = t.begin("use({ value: 1, check: v", ";\n");
    let row = t.object(
        "{ value: 1, check: v => v > 0 }",
        vec![
            ("value", t.number("1")),
            (
                "check",
                t.arrow(
                    "v => v > 0",
                    "v",
                    None,
                    t.binary("v > 0", t.ident("v"), BinaryOp::Gt, t.number("0")),
                ),
            ),
        ],
    );
    items.push(t.call_stmt(span, "use", row));

    let span = t.begin("use({ value: \"s\"", ";\n");
    let length = t.member("v.length", t.ident("v"), "length");
    let row = t.object(
        r#"{ value: "s", check: v => v.length > 0 }"#,
        vec![
            ("value", t.string("s")),
            (
                "check",
                t.arrow(
                    "v => v.length > 0",
                    "v",
                    None,
                    t.binary("v.length > 0", length, BinaryOp::Gt, t.number("0")),
                ),
            ),
        ],
    );
    items.push(t.call_stmt(span, "use", row));

    let span = t.begin("use({ value: 1, check: (v: string)", ";\n");
    let row = t.object(
        "{ value: 1, check: (v: string) => true }",
        vec![
            ("value", t.number("1")),
            (
                "check",
                t.arrow("(v: string) => true", "v", Some(TypeId::STRING), t.boolean("true")),
            ),
        ],
    );
    items.push(t.call_stmt(span, "use", row));
    items
}

// =============================================================================
// Tree building
// =============================================================================

/// Builds checker input for one source text. Lookups search forward from a
/// cursor that the builders move statement by statement.
struct Tree {
    source: &'static str,
    cursor: usize,
    arena: TypeArena,
    declared: Vec<(String, TypeId)>,
}

impl Tree {
    fn new(source: &'static str) -> Self {
        Self { source, cursor: 0, arena: TypeArena::new(), declared: Vec::new() }
    }

    /// Move the cursor to the next occurrence of `text`
    fn enter(&mut self, text: &str) {
        if let Some(offset) = self.source[self.cursor..].find(text) {
            self.cursor += offset;
        }
    }

    /// Span of the next occurrence of `needle`
    fn at(&self, needle: &str) -> Span {
        self.at_from(self.cursor, needle)
    }

    fn at_from(&self, from: usize, needle: &str) -> Span {
        match self.source[from..].find(needle) {
            Some(offset) => Span::new(from + offset, from + offset + needle.len(), 0),
            None => Span::new(from, from, 0),
        }
    }

    /// Enter the statement starting with `start`; its span runs through the
    /// first `end` after that, without a trailing newline
    fn begin(&mut self, start: &str, end: &str) -> Span {
        self.enter(start);
        let end_len = end.trim_end_matches('\n').len();
        let to = match self.source[self.cursor..].find(end) {
            Some(offset) => self.cursor + offset + end_len,
            None => self.source.len(),
        };
        Span::new(self.cursor, to, 0)
    }

    fn name(&self, name: &str) -> Node<Ident> {
        Node::new(Ident::new(name), self.at(name))
    }

    fn ident(&self, name: &str) -> Node<Expr> {
        Node::new(Expr::Ident(Ident::new(name)), self.at(name))
    }

    fn string(&self, value: &str) -> Node<Expr> {
        Node::new(Expr::Literal(Literal::String(value.to_string())), self.at(&format!("\"{}\"", value)))
    }

    fn number(&self, text: &str) -> Node<Expr> {
        let value = text.parse().unwrap_or(0.0);
        Node::new(Expr::Literal(Literal::Number(value)), self.at(text))
    }

    fn boolean(&self, text: &str) -> Node<Expr> {
        Node::new(Expr::Literal(Literal::Boolean(text == "true")), self.at(text))
    }

    fn object(&self, text: &str, props: Vec<(&str, Node<Expr>)>) -> Node<Expr> {
        let props = props
            .into_iter()
            .map(|(key, value)| ObjectProperty::Property { key: self.name(key), value })
            .collect();
        Node::new(Expr::Object(props), self.at(text))
    }

    fn arrow(&self, text: &str, param: &str, annotation: Option<TypeId>, body: Node<Expr>) -> Node<Expr> {
        let name = self.name(param);
        let param = match annotation {
            Some(ty) => ArrowParam::annotated(name, ty),
            None => ArrowParam::new(name),
        };
        Node::new(Expr::Arrow { params: vec![param], body: Box::new(body) }, self.at(text))
    }

    fn unary(&self, text: &str, op: UnaryOp, operand: Node<Expr>) -> Node<Expr> {
        Node::new(Expr::Unary { op, expr: Box::new(operand) }, self.at(text))
    }

    fn binary(&self, text: &str, left: Node<Expr>, op: BinaryOp, right: Node<Expr>) -> Node<Expr> {
        Node::new(Expr::Binary { left: Box::new(left), op, right: Box::new(right) }, self.at(text))
    }

    fn member(&self, text: &str, object: Node<Expr>, property: &str) -> Node<Expr> {
        let property = Node::new(Ident::new(property), self.at(&format!(".{}", property)));
        Node::new(Expr::Member { object: Box::new(object), property }, self.at(text))
    }

    fn index(&self, text: &str, object: Node<Expr>, index: Node<Expr>) -> Node<Expr> {
        Node::new(Expr::Index { object: Box::new(object), index: Box::new(index) }, self.at(text))
    }

    fn call(&self, text: &str, callee: Node<Expr>, args: Vec<Node<Expr>>) -> Node<Expr> {
        Node::new(Expr::Call { callee: Box::new(callee), args }, self.at(text))
    }

    /// `callee(arg);` as a statement spanning `span`
    fn call_stmt(&self, span: Span, callee: &str, arg: Node<Expr>) -> Node<Stmt> {
        let callee = Node::new(Expr::Ident(Ident::new(callee)), Span::new(span.start, span.start + callee.len(), 0));
        let call = Node::new(Expr::Call { callee: Box::new(callee), args: vec![arg] }, span);
        Node::new(Stmt::Expr(call), span)
    }

    fn alias(&mut self, span: Span, name: &str, ty: TypeId) -> Node<Stmt> {
        self.declared.push((name.to_string(), ty));
        let name = Node::new(Ident::new(name), self.at_from(span.start, name));
        let decl = TypeAliasDecl { name, ty: Node::new(ty, span) };
        Node::new(Stmt::TypeAlias(decl), span)
    }

    /// `declare const name: ty;`
    fn ambient(&mut self, span: Span, name: &str, ty: TypeId) -> Node<Stmt> {
        self.declaration(span, name, Some(ty), None)
    }

    fn constant(&mut self, span: Span, name: &str, ty: Option<TypeId>, init: Node<Expr>) -> Node<Stmt> {
        self.declaration(span, name, ty, Some(init))
    }

    fn declaration(&mut self, span: Span, name: &str, ty: Option<TypeId>, init: Option<Node<Expr>>) -> Node<Stmt> {
        if let Some(ty) = ty {
            self.declared.push((name.to_string(), ty));
        }
        let name_span = self.at_from(span.start, name);
        let pattern = Pattern::Ident(Node::new(Ident::new(name), name_span));
        let pattern = Node::new(pattern, name_span);
        Node::new(
            Stmt::VarDecl(VarDecl {
                kind: VarDeclKind::Const,
                pattern,
                type_annotation: ty.map(|ty| Node::new(ty, span)),
                init,
            }),
            span,
        )
    }
}
