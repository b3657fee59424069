//! Expression checking methods

use quanta_ast::{
    ArrowParam, BinaryOp, Expr, Ident, Literal, LiteralType, Member, Node, ObjectProperty, Param,
    PrimitiveType, Signature, Span, TypeId, TypeNode, UnaryOp, VarDeclKind,
};

use crate::binding::VarInfo;
use crate::checker::TypeChecker;
use crate::error::{TypeError, TypeErrorKind};
use crate::helpers::TypeHelpers;

impl TypeChecker {
    pub(crate) fn check_expr(&mut self, expr: &Expr, span: &Span) -> Result<TypeId, TypeError> {
        match expr {
            Expr::Literal(lit) => Ok(self.check_literal(lit)),
            Expr::Ident(ident) => self.check_ident(&ident.name, span),
            Expr::Binary { left, op, right } => self.check_binary(left, *op, right, span),
            Expr::Unary { op, expr: operand } => self.check_unary(*op, operand),
            Expr::Call { callee, args } => self.check_call(callee, args, span),
            Expr::New { callee, args } => self.check_new(callee, args, span),
            Expr::Member { object, property } => self.check_member(expr, object, property, span),
            Expr::Index { object, index } => self.check_index(object, index, span),
            Expr::Array(elements) => self.check_array(elements),
            Expr::Object(props) => self.check_object(props),
            Expr::Arrow { params, body } => self.check_arrow(params, body),
        }
    }

    fn check_literal(&mut self, lit: &Literal) -> TypeId {
        match lit {
            Literal::String(s) => self.arena.string_literal(s.clone()),
            Literal::Number(n) => self.arena.number_literal(*n),
            Literal::Boolean(b) => self.arena.boolean_literal(*b),
            Literal::Null => TypeId::NULL,
            Literal::Undefined => TypeId::UNDEFINED,
        }
    }

    pub(crate) fn check_ident(&mut self, name: &str, span: &Span) -> Result<TypeId, TypeError> {
        if let Some(narrowed) = self.env.lookup_narrowed(name) {
            return Ok(narrowed);
        }
        match self.env.lookup(name).cloned() {
            Some(info) if info.is_declaring() => {
                self.report(TypeErrorKind::SelfReferentialBinding(name.to_string()), *span);
                Ok(TypeId::UNKNOWN)
            }
            Some(info) => Ok(info.ty),
            None => Err(TypeError::new(
                TypeErrorKind::UndefinedVariable(name.to_string()),
                *span,
            )),
        }
    }

    fn check_binary(
        &mut self,
        left: &Node<Expr>,
        op: BinaryOp,
        right: &Node<Expr>,
        span: &Span,
    ) -> Result<TypeId, TypeError> {
        let left_ty = self.check_expr(&left.value, &left.span)?;
        let right_ty = self.check_expr(&right.value, &right.span)?;
        let l = self.normalize(left_ty, &left.span);
        let r = self.normalize(right_ty, &right.span);
        let is_any = |ty: TypeId| ty == TypeId::ANY;

        match op {
            BinaryOp::Add => {
                if TypeHelpers::is_string(&self.arena, l) || TypeHelpers::is_string(&self.arena, r) {
                    Ok(TypeId::STRING)
                } else if is_any(l) || is_any(r) {
                    Ok(TypeId::ANY)
                } else {
                    if !(TypeHelpers::is_numeric(&self.arena, l) && TypeHelpers::is_numeric(&self.arena, r)) {
                        self.report_operands(op, l, r, span);
                    }
                    Ok(TypeId::NUMBER)
                }
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let numeric = |checker: &Self, ty: TypeId| {
                    is_any(ty) || TypeHelpers::is_numeric(&checker.arena, ty)
                };
                if !(numeric(self, l) && numeric(self, r)) {
                    self.report_operands(op, l, r, span);
                }
                Ok(TypeId::NUMBER)
            }
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::StrictEq
            | BinaryOp::StrictNotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq => Ok(TypeId::BOOLEAN),
            BinaryOp::And => Ok(right_ty),
            BinaryOp::Or => Ok(TypeHelpers::union_type(&mut self.arena, vec![left_ty, right_ty])),
        }
    }

    fn report_operands(&mut self, op: BinaryOp, left: TypeId, right: TypeId, span: &Span) {
        let msg = format!(
            "operator '{}' cannot be applied to types '{}' and '{}'",
            op,
            self.render(left),
            self.render(right)
        );
        self.report(TypeErrorKind::InvalidOperation(msg), *span);
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Node<Expr>) -> Result<TypeId, TypeError> {
        self.check_expr(&operand.value, &operand.span)?;
        Ok(match op {
            UnaryOp::Plus | UnaryOp::Minus => TypeId::NUMBER,
            UnaryOp::Not => TypeId::BOOLEAN,
            UnaryOp::TypeOf => TypeId::STRING,
        })
    }

    fn check_call(&mut self, callee: &Node<Expr>, args: &[Node<Expr>], span: &Span) -> Result<TypeId, TypeError> {
        let callee_ty = self.check_expr(&callee.value, &callee.span)?;
        let callee_ty = self.normalize(callee_ty, &callee.span);

        match self.arena.get(callee_ty).clone() {
            TypeNode::Primitive(PrimitiveType::Any) => {
                for arg in args {
                    self.check_expr(&arg.value, &arg.span)?;
                }
                Ok(TypeId::ANY)
            }
            TypeNode::Function(sig) | TypeNode::CallSignature(sig) => {
                self.check_arguments(std::slice::from_ref(&sig), args, span)?;
                Ok(sig.ret)
            }
            TypeNode::ConstructSignature(_) => Err(TypeError::new(
                TypeErrorKind::NotCallable(self.render(callee_ty)),
                callee.span,
            )
            .with_note("a construct signature is only callable with 'new'")),
            // Every member must accept the arguments
            TypeNode::Union(members) => {
                let mut sigs = Vec::new();
                for member in members {
                    let member = self.normalize(member, &callee.span);
                    match self.arena.get(member) {
                        TypeNode::Function(sig) | TypeNode::CallSignature(sig) => sigs.push(sig.clone()),
                        _ => {
                            return Err(TypeError::new(
                                TypeErrorKind::NotCallable(self.render(callee_ty)),
                                callee.span,
                            ))
                        }
                    }
                }
                self.check_arguments(&sigs, args, span)?;
                let rets = sigs.iter().map(|s| s.ret).collect();
                Ok(TypeHelpers::union_type(&mut self.arena, rets))
            }
            _ => Err(TypeError::new(
                TypeErrorKind::NotCallable(self.render(callee_ty)),
                callee.span,
            )),
        }
    }

    fn check_new(&mut self, callee: &Node<Expr>, args: &[Node<Expr>], span: &Span) -> Result<TypeId, TypeError> {
        let callee_ty = self.check_expr(&callee.value, &callee.span)?;
        let callee_ty = self.normalize(callee_ty, &callee.span);

        match self.arena.get(callee_ty).clone() {
            TypeNode::Primitive(PrimitiveType::Any) => {
                for arg in args {
                    self.check_expr(&arg.value, &arg.span)?;
                }
                Ok(TypeId::ANY)
            }
            TypeNode::ConstructSignature(sig) => {
                self.check_arguments(std::slice::from_ref(&sig), args, span)?;
                Ok(sig.ret)
            }
            _ => Err(TypeError::new(
                TypeErrorKind::NotCallable(self.render(callee_ty)),
                callee.span,
            )
            .with_note("only a construct signature can be called with 'new'")),
        }
    }

    /// Check arity and each argument against every signature in `sigs`
    fn check_arguments(&mut self, sigs: &[Signature], args: &[Node<Expr>], span: &Span) -> Result<(), TypeError> {
        for sig in sigs {
            let required = sig.required_params();
            if args.len() < required || args.len() > sig.params.len() {
                let expected = if args.len() < required { required } else { sig.params.len() };
                return Err(TypeError::new(
                    TypeErrorKind::ArityMismatch { expected, found: args.len() },
                    *span,
                ));
            }
        }

        for (i, arg) in args.iter().enumerate() {
            let expected: Vec<TypeId> = sigs.iter().filter_map(|s| s.params.get(i).map(|p| p.ty)).collect();
            match expected.as_slice() {
                [] => {
                    self.check_expr(&arg.value, &arg.span)?;
                }
                // Quantified parameter types are solved afresh at every call
                [single] => self.check_expr_against(&arg.value, &arg.span, *single)?,
                _ => {
                    let found = self.check_expr(&arg.value, &arg.span)?;
                    let all = self.arena.intersection(expected);
                    if !self.is_assignable(found, all) {
                        let err = self.mismatch(all, found, arg.span);
                        self.errors.push(err);
                    }
                }
            }
        }
        Ok(())
    }

    fn check_member(
        &mut self,
        expr: &Expr,
        object: &Node<Expr>,
        property: &Node<Ident>,
        span: &Span,
    ) -> Result<TypeId, TypeError> {
        if let Some(narrowed) = expr.access_path().and_then(|path| self.env.lookup_narrowed(&path)) {
            return Ok(narrowed);
        }
        let object_ty = self.check_expr(&object.value, &object.span)?;
        let object_ty = self.open_owned(object, object_ty);
        self.property_of(object_ty, &property.value.name, span)
    }

    /// A quantified value read through an access path is opened with a
    /// parameter of its own, shared by every read through that path.
    fn open_owned(&mut self, object: &Node<Expr>, ty: TypeId) -> TypeId {
        let ty = self.normalize(ty, &object.span);
        if !matches!(self.arena.get(ty), TypeNode::Quantified { .. }) {
            return ty;
        }
        match object.value.access_path() {
            Some(path) => self.open_quantified(ty, Some(&path)),
            None => ty,
        }
    }

    /// Type of property `name` on values of type `ty`
    pub(crate) fn property_of(&mut self, ty: TypeId, name: &str, span: &Span) -> Result<TypeId, TypeError> {
        let ty = self.normalize(ty, span);
        let not_found = |checker: &Self| {
            TypeError::new(
                TypeErrorKind::PropertyNotFound { ty: checker.render(ty), property: name.to_string() },
                *span,
            )
        };

        match self.arena.get(ty).clone() {
            TypeNode::Primitive(PrimitiveType::Any) => Ok(TypeId::ANY),
            TypeNode::Object(members) => match members.iter().find(|m| m.name == name) {
                Some(member) => Ok(member.ty),
                None => Err(not_found(self)),
            },
            // Must exist on every member
            TypeNode::Union(members) => {
                let mut found = Vec::with_capacity(members.len());
                for member in members {
                    found.push(self.property_of(member, name, span).map_err(|_| not_found(self))?);
                }
                Ok(TypeHelpers::union_type(&mut self.arena, found))
            }
            TypeNode::Intersection(members) => {
                let found: Vec<TypeId> = members
                    .into_iter()
                    .filter_map(|m| self.property_of(m, name, span).ok())
                    .collect();
                match found.len() {
                    0 => Err(not_found(self)),
                    1 => Ok(found[0]),
                    _ => Ok(self.arena.intersection(found)),
                }
            }
            TypeNode::Primitive(prim) => self.builtins.member_type(prim, name).ok_or_else(|| not_found(self)),
            TypeNode::Literal(lit) => self
                .builtins
                .member_type(lit.primitive(), name)
                .ok_or_else(|| not_found(self)),
            TypeNode::Array(_) | TypeNode::Tuple(_) if name == "length" => Ok(TypeId::NUMBER),
            TypeNode::Quantified { .. } => {
                let opened = self.open_quantified(ty, None);
                self.property_of(opened, name, span)
            }
            _ => Err(not_found(self)),
        }
    }

    fn check_index(&mut self, object: &Node<Expr>, index: &Node<Expr>, span: &Span) -> Result<TypeId, TypeError> {
        let object_ty = self.check_expr(&object.value, &object.span)?;
        let object_ty = self.open_owned(object, object_ty);
        let key_ty = self.check_expr(&index.value, &index.span)?;
        let key_ty = self.normalize(key_ty, &index.span);
        self.index_type(object_ty, key_ty, span)
    }

    /// Element type of `object[key]`. A union of keys yields the union of
    /// the indexed types.
    fn index_type(&mut self, object: TypeId, key: TypeId, span: &Span) -> Result<TypeId, TypeError> {
        let not_indexable = |checker: &Self| {
            TypeError::new(TypeErrorKind::NotIndexable(checker.render(object)), *span)
                .with_note(format!("index type is '{}'", checker.render(key)))
        };

        match (self.arena.get(object).clone(), self.arena.get(key).clone()) {
            (TypeNode::Primitive(PrimitiveType::Any), _) => Ok(TypeId::ANY),
            (_, TypeNode::Union(keys)) => {
                let mut found = Vec::with_capacity(keys.len());
                for k in keys {
                    found.push(self.index_type(object, k, span)?);
                }
                Ok(TypeHelpers::union_type(&mut self.arena, found))
            }
            (TypeNode::Object(_), TypeNode::Literal(lit)) => self.property_of(object, &lit.as_key(), span),
            (TypeNode::Tuple(items), TypeNode::Literal(LiteralType::Number(n))) => {
                let slot = if n >= 0.0 && n.fract() == 0.0 { items.get(n as usize).copied() } else { None };
                slot.ok_or_else(|| not_indexable(self))
            }
            (TypeNode::Tuple(items), TypeNode::Primitive(PrimitiveType::Number)) => {
                Ok(TypeHelpers::union_type(&mut self.arena, items))
            }
            (TypeNode::Array(element), _) if TypeHelpers::is_numeric(&self.arena, key) => Ok(element),
            (TypeNode::Primitive(PrimitiveType::String) | TypeNode::Literal(LiteralType::String(_)), _)
                if TypeHelpers::is_numeric(&self.arena, key) =>
            {
                Ok(TypeId::STRING)
            }
            _ => Err(not_indexable(self)),
        }
    }

    fn check_array(&mut self, elements: &[Node<Expr>]) -> Result<TypeId, TypeError> {
        let mut types = Vec::with_capacity(elements.len());
        for element in elements {
            let ty = self.check_expr(&element.value, &element.span)?;
            types.push(TypeHelpers::widen(&mut self.arena, ty));
        }
        let element = TypeHelpers::union_type(&mut self.arena, types);
        Ok(self.arena.array(element))
    }

    fn check_object(&mut self, props: &[ObjectProperty]) -> Result<TypeId, TypeError> {
        let mut members = Vec::with_capacity(props.len());
        for prop in props {
            let ty = match prop {
                ObjectProperty::Property { value, .. } => self.check_expr(&value.value, &value.span)?,
                ObjectProperty::Shorthand(key) => self.check_ident(&key.value.name, &key.span)?,
            };
            let ty = TypeHelpers::widen(&mut self.arena, ty);
            members.push(Member::new(prop.key().value.name.clone(), ty));
        }
        Ok(self.arena.object(members))
    }

    fn check_arrow(&mut self, params: &[ArrowParam], body: &Node<Expr>) -> Result<TypeId, TypeError> {
        self.env.push_scope();
        let result = self.check_arrow_body(params, body);
        self.env.pop_scope();
        result
    }

    fn check_arrow_body(&mut self, params: &[ArrowParam], body: &Node<Expr>) -> Result<TypeId, TypeError> {
        let mut sig_params = Vec::with_capacity(params.len());
        for param in params {
            let ty = param.type_annotation.unwrap_or(TypeId::ANY);
            let name = param.name.value.name.clone();
            self.env.declare(name.clone(), VarInfo::initialized(ty, VarDeclKind::Let));
            sig_params.push(Param { name, ty, optional: param.optional });
        }
        let ret = self.check_expr(&body.value, &body.span)?;
        let ret = TypeHelpers::widen(&mut self.arena, ret);
        Ok(self.arena.function(sig_params, ret))
    }

    // -------------------------------------------------------------------------
    // Contextual checking
    // -------------------------------------------------------------------------

    /// Check `expr` against `expected`, pushing recoverable mismatches and
    /// propagating unrecoverable errors. Literals are checked member by
    /// member so diagnostics land on the offending position.
    pub(crate) fn check_expr_against(&mut self, expr: &Expr, span: &Span, expected: TypeId) -> Result<(), TypeError> {
        let expected = self.normalize(expected, span);

        match (self.arena.get(expected).clone(), expr) {
            (TypeNode::Quantified { .. }, Expr::Object(_) | Expr::Array(_) | Expr::Arrow { .. }) => {
                self.assign_quantified(expected, expr, span)
            }
            (TypeNode::Quantified { .. }, _) => self.assign_quantified_value(expected, expr, span),
            (TypeNode::Array(element), Expr::Array(items)) => {
                for item in items {
                    self.check_expr_against(&item.value, &item.span, element)?;
                }
                Ok(())
            }
            (TypeNode::Tuple(types), Expr::Array(items)) if types.len() == items.len() => {
                for (item, ty) in items.iter().zip(types) {
                    self.check_expr_against(&item.value, &item.span, ty)?;
                }
                Ok(())
            }
            (TypeNode::Object(members), Expr::Object(props)) => {
                self.check_object_against(expected, &members, props, span)
            }
            (TypeNode::Function(sig) | TypeNode::CallSignature(sig), Expr::Arrow { params, body })
                if params.len() <= sig.params.len() =>
            {
                self.env.push_scope();
                let result = self.check_arrow_against(&sig, params, body);
                self.env.pop_scope();
                result
            }
            _ => {
                let found = self.check_expr(expr, span)?;
                if !self.is_assignable(found, expected) {
                    let err = self.mismatch(expected, found, *span);
                    self.errors.push(err);
                }
                Ok(())
            }
        }
    }

    fn check_object_against(
        &mut self,
        expected: TypeId,
        members: &[Member],
        props: &[ObjectProperty],
        span: &Span,
    ) -> Result<(), TypeError> {
        for member in members {
            match props.iter().find(|p| p.key().value.name == member.name) {
                Some(ObjectProperty::Property { value, .. }) => {
                    self.check_expr_against(&value.value, &value.span, member.ty)?;
                }
                Some(ObjectProperty::Shorthand(key)) => {
                    let read = Expr::Ident(key.value.clone());
                    self.check_expr_against(&read, &key.span, member.ty)?;
                }
                None if member.optional => {}
                None => {
                    let kind = TypeErrorKind::MissingProperty {
                        property: member.name.clone(),
                        ty: self.render(expected),
                    };
                    self.report(kind, *span);
                }
            }
        }

        // Properties the type does not declare are still checked
        for prop in props {
            if members.iter().any(|m| m.name == prop.key().value.name) {
                continue;
            }
            match prop {
                ObjectProperty::Property { value, .. } => {
                    self.check_expr(&value.value, &value.span)?;
                }
                ObjectProperty::Shorthand(key) => {
                    self.check_ident(&key.value.name, &key.span)?;
                }
            }
        }
        Ok(())
    }

    /// Parameters take the expected parameter types unless annotated; an
    /// annotation must accept the expected type.
    fn check_arrow_against(&mut self, sig: &Signature, params: &[ArrowParam], body: &Node<Expr>) -> Result<(), TypeError> {
        for (i, param) in params.iter().enumerate() {
            let contextual = sig.params.get(i).map(|p| p.ty);
            let ty = match (param.type_annotation, contextual) {
                (Some(annotation), Some(expected)) => {
                    if !self.is_assignable(expected, annotation) {
                        let err = self.mismatch(annotation, expected, param.name.span);
                        self.errors.push(err);
                    }
                    annotation
                }
                (Some(annotation), None) => annotation,
                (None, Some(expected)) => expected,
                (None, None) => TypeId::ANY,
            };
            self.env.declare(param.name.value.name.clone(), VarInfo::initialized(ty, VarDeclKind::Let));
        }

        let ret = self.normalize(sig.ret, &body.span);
        if ret == TypeId::VOID {
            self.check_expr(&body.value, &body.span)?;
            Ok(())
        } else {
            self.check_expr_against(&body.value, &body.span, ret)
        }
    }
}
