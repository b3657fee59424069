//! Type environment (scoped symbol tables)
//!
//! Values and type aliases live in two parallel scope chains that are pushed
//! and popped together. Narrowings recorded by `distribute` sit in a third
//! stack of their own so they can be undone independently of block scopes.

use std::collections::HashMap;
use quanta_ast::TypeId;

use crate::binding::VarInfo;

#[derive(Debug, Clone)]
pub struct TypeEnv {
    scopes: Vec<HashMap<String, VarInfo>>,
    type_scopes: Vec<HashMap<String, TypeId>>,
    narrowings: Vec<HashMap<String, Narrowed>>,
}

#[derive(Debug, Clone, Copy)]
struct Narrowed {
    ty: TypeId,
    /// Index of the scope declaring the path's root name
    scope: usize,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            type_scopes: vec![HashMap::new()],
            narrowings: Vec::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        self.type_scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            self.type_scopes.pop();
        }
    }

    pub fn declare(&mut self, name: String, var_info: VarInfo) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, var_info);
        }
    }

    /// Check if a binding exists in the current (innermost) scope only
    pub fn has_in_current_scope(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains_key(name))
    }

    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn scope_of(&self, name: &str) -> Option<usize> {
        self.scopes.iter().rposition(|scope| scope.contains_key(name))
    }

    pub fn define_type_alias(&mut self, name: String, ty: TypeId) {
        if let Some(scope) = self.type_scopes.last_mut() {
            scope.insert(name, ty);
        }
    }

    pub fn has_type_in_current_scope(&self, name: &str) -> bool {
        self.type_scopes.last().is_some_and(|scope| scope.contains_key(name))
    }

    /// Innermost alias named `name`
    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    pub fn push_narrowing(&mut self) {
        self.narrowings.push(HashMap::new());
    }

    pub fn pop_narrowing(&mut self) {
        self.narrowings.pop();
    }

    /// Record that the access path `path` has type `ty` in the innermost
    /// narrowing frame. Paths whose root is not declared are ignored.
    pub fn narrow(&mut self, path: String, ty: TypeId) {
        let Some(scope) = self.scope_of(root_name(&path)) else {
            return;
        };
        if let Some(frame) = self.narrowings.last_mut() {
            frame.insert(path, Narrowed { ty, scope });
        }
    }

    /// Narrowed type of `path`, unless its root has since been shadowed
    pub fn lookup_narrowed(&self, path: &str) -> Option<TypeId> {
        let narrowed = self.narrowings.iter().rev().find_map(|frame| frame.get(path))?;
        (self.scope_of(root_name(path)) == Some(narrowed.scope)).then_some(narrowed.ty)
    }
}

fn root_name(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
