//! Statement checking methods

use quanta_ast::{BlockStmt, Ident, Node, Pattern, Span, Stmt, TypeId, VarDecl, VarDeclKind};

use crate::binding::VarInfo;
use crate::checker::TypeChecker;
use crate::error::{TypeError, TypeErrorKind};
use crate::helpers::TypeHelpers;

impl TypeChecker {
    pub(crate) fn check_stmt(&mut self, stmt: &Stmt, span: &Span) -> Result<(), TypeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.check_expr(&expr.value, &expr.span)?;
                Ok(())
            }
            Stmt::VarDecl(var_decl) => self.check_var_decl(var_decl, span),
            // Already declared by hoisting; only the references are checked here
            Stmt::TypeAlias(alias) => self.validate_type_refs(alias.ty.value, &alias.ty.span),
            Stmt::Block(block) => self.check_block(block),
            Stmt::Distribute { scrutinee, body } => self.distribute(scrutinee, body, span),
        }
    }

    pub(crate) fn check_block(&mut self, block: &BlockStmt) -> Result<(), TypeError> {
        self.env.push_scope();
        self.hoist_type_aliases(&block.stmts);
        let result = block
            .stmts
            .iter()
            .try_for_each(|stmt| self.check_stmt(&stmt.value, &stmt.span));
        self.env.pop_scope();
        result
    }

    fn check_var_decl(&mut self, var_decl: &VarDecl, span: &Span) -> Result<(), TypeError> {
        let names: Vec<Node<Ident>> = var_decl.pattern.value.bindings().into_iter().cloned().collect();
        for name in &names {
            if self.env.has_in_current_scope(&name.value.name) {
                return Err(TypeError::new(
                    TypeErrorKind::DuplicateDeclaration(name.value.name.clone()),
                    name.span,
                ));
            }
        }

        // In scope, but not readable, while the initializer is checked
        for name in &names {
            self.env.declare(name.value.name.clone(), VarInfo::declaring(var_decl.kind));
        }

        match self.declared_type(var_decl, span) {
            Ok(ty) => {
                self.bind_pattern(&var_decl.pattern.value, ty, var_decl.kind);
                Ok(())
            }
            Err(e) => {
                for name in &names {
                    self.env.declare(
                        name.value.name.clone(),
                        VarInfo::initialized(TypeId::UNKNOWN, var_decl.kind),
                    );
                }
                Err(e)
            }
        }
    }

    fn declared_type(&mut self, var_decl: &VarDecl, span: &Span) -> Result<TypeId, TypeError> {
        let annotation = match &var_decl.type_annotation {
            Some(annotation) => {
                self.validate_type_refs(annotation.value, &annotation.span)?;
                Some(self.resolve_conditionals_deep(annotation.value, &annotation.span))
            }
            None => None,
        };

        match (annotation, &var_decl.init) {
            (Some(annotation), Some(init)) => {
                self.check_expr_against(&init.value, &init.span, annotation)?;
                Ok(annotation)
            }
            (None, Some(init)) => {
                let ty = self.check_expr(&init.value, &init.span)?;
                Ok(match var_decl.kind {
                    VarDeclKind::Let => TypeHelpers::widen(&mut self.arena, ty),
                    VarDeclKind::Const => ty,
                })
            }
            (Some(annotation), None) => Ok(annotation),
            (None, None) => Err(TypeError::new(
                TypeErrorKind::InvalidOperation(
                    "a declaration without initializer needs a type annotation".to_string(),
                ),
                *span,
            )),
        }
    }

    /// Move the pattern's names to their final types. A property missing
    /// from `ty` is reported and its binding typed `unknown`.
    fn bind_pattern(&mut self, pattern: &Pattern, ty: TypeId, kind: VarDeclKind) {
        match pattern {
            Pattern::Ident(name) => {
                self.env.declare(name.value.name.clone(), VarInfo::initialized(ty, kind));
            }
            Pattern::Object(props) => {
                for prop in props {
                    let member = match self.property_of(ty, &prop.key.value.name, &prop.key.span) {
                        Ok(member) => member,
                        Err(e) => {
                            self.errors.push(e);
                            TypeId::UNKNOWN
                        }
                    };
                    self.env.declare(prop.binding.value.name.clone(), VarInfo::initialized(member, kind));
                }
            }
        }
    }

    fn validate_type_refs(&mut self, ty: TypeId, span: &Span) -> Result<(), TypeError> {
        match self
            .arena
            .free_names(ty)
            .into_iter()
            .find(|name| self.env.lookup_type(name).is_none())
        {
            Some(name) => Err(TypeError::new(TypeErrorKind::UndefinedType(name), *span)),
            None => Ok(()),
        }
    }
}
