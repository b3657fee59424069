//! Main type checker struct

use quanta_ast::{Program, Span, Stmt, TypeArena, TypeId, VarDeclKind};
use tracing::debug;

use crate::binding::VarInfo;
use crate::builtins::BuiltinRegistry;
use crate::env::TypeEnv;
use crate::error::{TypeError, TypeErrorKind};
use crate::helpers::Assignability;
use crate::options::CheckerOptions;
use crate::solver::RowSolution;
use crate::unify::{MatchCache, Unifier};

/// State scoped to one check request (a top-level statement, or one call
/// of the public entry points). Dropped wholesale when the request ends.
#[derive(Debug, Default)]
pub(crate) struct CheckRequest {
    /// Span of the statement the request was opened for
    pub(crate) site: Span,
    pub(crate) cache: MatchCache,
    pub(crate) solutions: Vec<RowSolution>,
}

/// Main type checker
pub struct TypeChecker {
    pub(crate) arena: TypeArena,
    pub(crate) env: TypeEnv,
    pub(crate) errors: Vec<TypeError>,
    pub(crate) builtins: BuiltinRegistry,
    pub(crate) options: CheckerOptions,
    pub(crate) request: CheckRequest,
}

impl TypeChecker {
    pub fn new(arena: TypeArena) -> Self {
        Self::with_options(arena, CheckerOptions::default())
    }

    pub fn with_options(mut arena: TypeArena, options: CheckerOptions) -> Self {
        let builtins = BuiltinRegistry::new(&mut arena);
        Self {
            arena,
            env: TypeEnv::new(),
            errors: Vec::new(),
            builtins,
            options,
            request: CheckRequest::default(),
        }
    }

    /// Check a whole program. Each top-level statement is its own request:
    /// the first unrecoverable error abandons that statement only.
    pub fn check_program(&mut self, program: &Program) -> Result<(), Vec<TypeError>> {
        self.hoist_type_aliases(&program.items);

        for item in &program.items {
            self.begin_request(&item.span);
            if let Err(e) = self.check_stmt(&item.value, &item.span) {
                self.errors.push(e);
            }
        }

        debug!(diagnostics = self.errors.len(), "program checked");
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.clone())
        }
    }

    pub(crate) fn begin_request(&mut self, span: &Span) {
        self.request = CheckRequest { site: *span, ..CheckRequest::default() };
        debug!(start = span.start, end = span.end, "begin check request");
    }

    /// Declare aliases of one block before any of its statements is checked
    pub(crate) fn hoist_type_aliases(&mut self, stmts: &[quanta_ast::Node<Stmt>]) {
        for stmt in stmts {
            if let Stmt::TypeAlias(alias) = &stmt.value {
                let name = alias.name.value.name.clone();
                if self.env.has_type_in_current_scope(&name) {
                    self.errors.push(TypeError::new(
                        TypeErrorKind::DuplicateDeclaration(name),
                        alias.name.span,
                    ));
                    continue;
                }
                self.env.define_type_alias(name, alias.ty.value);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut TypeArena {
        &mut self.arena
    }

    pub fn env(&self) -> &TypeEnv {
        &self.env
    }

    pub fn options(&self) -> &CheckerOptions {
        &self.options
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &[TypeError] {
        &self.errors
    }

    /// Type of a value binding visible at the current scope
    pub fn lookup_value(&self, name: &str) -> Option<TypeId> {
        self.env.lookup(name).map(|info| info.ty)
    }

    /// Declare an ambient, already initialized value binding
    pub fn declare_value(&mut self, name: impl Into<String>, ty: TypeId) {
        self.env.declare(name.into(), VarInfo::initialized(ty, VarDeclKind::Const));
    }

    pub fn declare_type_alias(&mut self, name: impl Into<String>, ty: TypeId) {
        self.env.define_type_alias(name.into(), ty);
    }

    /// Memoized unifier results of the current request
    pub fn cached_matches(&self) -> usize {
        self.request.cache.len()
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    pub(crate) fn unifier(&mut self) -> Unifier<'_> {
        Unifier::new(&mut self.arena, &self.env, &mut self.request.cache, &self.options)
    }

    pub(crate) fn oracle(&self) -> Assignability<'_> {
        Assignability::new(&self.arena, &self.env, self.options.max_depth)
    }

    pub(crate) fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        self.oracle().is_assignable(from, to)
    }

    pub(crate) fn render(&self, ty: TypeId) -> String {
        self.arena.render(ty)
    }

    pub(crate) fn report(&mut self, kind: TypeErrorKind, span: Span) {
        self.errors.push(TypeError::new(kind, span));
    }

    pub(crate) fn mismatch(&self, expected: TypeId, found: TypeId, span: Span) -> TypeError {
        TypeError::new(
            TypeErrorKind::TypeMismatch { expected: self.render(expected), found: self.render(found) },
            span,
        )
    }

    /// Run `f` and throw away whatever diagnostics it produced
    pub(crate) fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.errors.len();
        let result = f(self);
        self.errors.truncate(mark);
        result
    }

    /// Run `f` and hand back the diagnostics it produced instead of keeping them
    pub(crate) fn collect_errors(&mut self, f: impl FnOnce(&mut Self)) -> Vec<TypeError> {
        let mark = self.errors.len();
        f(self);
        self.errors.split_off(mark)
    }
}
