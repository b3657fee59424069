//! TypeScript-syntax rendering of arena types, used in diagnostics

use std::fmt;

use crate::types::{Signature, TypeArena, TypeId, TypeNode};

// Binding strength of the surrounding context
const PREC_TOP: u8 = 0;
const PREC_UNION: u8 = 1;
const PREC_INTERSECTION: u8 = 2;
const PREC_POSTFIX: u8 = 3;

/// Borrowed view rendering one type through `Display`
pub struct DisplayType<'a> {
    arena: &'a TypeArena,
    id: TypeId,
}

impl TypeArena {
    pub fn display(&self, id: TypeId) -> DisplayType<'_> {
        DisplayType { arena: self, id }
    }

    /// Owned rendering, for embedding in diagnostics
    pub fn render(&self, id: TypeId) -> String {
        self.display(id).to_string()
    }
}

impl fmt::Display for DisplayType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(self.arena, self.id, PREC_TOP, f)
    }
}

fn write_type(arena: &TypeArena, id: TypeId, prec: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match arena.get(id) {
        TypeNode::Primitive(p) => write!(f, "{}", p),
        TypeNode::Literal(lit) => write!(f, "{}", lit),
        TypeNode::Reference(name) => write!(f, "{}", name),
        TypeNode::Infer(name) => write!(f, "infer {}", name),
        TypeNode::Object(members) => {
            if members.is_empty() {
                return write!(f, "{{}}");
            }
            write!(f, "{{ ")?;
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                let opt = if member.optional { "?" } else { "" };
                write!(f, "{}{}: ", member.name, opt)?;
                write_type(arena, member.ty, PREC_TOP, f)?;
            }
            write!(f, " }}")
        }
        TypeNode::Array(element) => {
            write_type(arena, *element, PREC_POSTFIX, f)?;
            write!(f, "[]")
        }
        TypeNode::Tuple(items) => {
            write!(f, "[")?;
            write_list(arena, items, ", ", PREC_TOP, f)?;
            write!(f, "]")
        }
        TypeNode::Function(sig) => parenthesized(prec > PREC_TOP, f, |f| {
            write_params(arena, sig, f)?;
            write!(f, " => ")?;
            write_type(arena, sig.ret, PREC_TOP, f)
        }),
        TypeNode::CallSignature(sig) => {
            write!(f, "{{ ")?;
            write_params(arena, sig, f)?;
            write!(f, ": ")?;
            write_type(arena, sig.ret, PREC_TOP, f)?;
            write!(f, " }}")
        }
        TypeNode::ConstructSignature(sig) => {
            write!(f, "{{ new ")?;
            write_params(arena, sig, f)?;
            write!(f, ": ")?;
            write_type(arena, sig.ret, PREC_TOP, f)?;
            write!(f, " }}")
        }
        TypeNode::Union(items) => parenthesized(prec > PREC_UNION, f, |f| {
            write_list(arena, items, " | ", PREC_UNION, f)
        }),
        TypeNode::Intersection(items) => parenthesized(prec > PREC_INTERSECTION, f, |f| {
            write_list(arena, items, " & ", PREC_INTERSECTION, f)
        }),
        TypeNode::Conditional { check, extends, true_type, false_type } => {
            parenthesized(prec > PREC_TOP, f, |f| {
                write_type(arena, *check, PREC_UNION, f)?;
                write!(f, " extends ")?;
                write_type(arena, *extends, PREC_UNION, f)?;
                write!(f, " ? ")?;
                write_type(arena, *true_type, PREC_TOP, f)?;
                write!(f, " : ")?;
                write_type(arena, *false_type, PREC_TOP, f)
            })
        }
        TypeNode::Quantified { param, constraint, body } => parenthesized(prec > PREC_TOP, f, |f| {
            write!(f, "<{}", param)?;
            if let Some(c) = constraint {
                write!(f, " extends ")?;
                write_type(arena, *c, PREC_TOP, f)?;
            }
            write!(f, "> ")?;
            write_type(arena, *body, PREC_TOP, f)
        }),
    }
}

fn write_params(arena: &TypeArena, sig: &Signature, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    for (i, param) in sig.params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        let opt = if param.optional { "?" } else { "" };
        write!(f, "{}{}: ", param.name, opt)?;
        write_type(arena, param.ty, PREC_TOP, f)?;
    }
    write!(f, ")")
}

fn write_list(
    arena: &TypeArena,
    items: &[TypeId],
    sep: &str,
    prec: u8,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write_type(arena, *item, prec, f)?;
    }
    Ok(())
}

fn parenthesized<F>(wrap: bool, f: &mut fmt::Formatter<'_>, body: F) -> fmt::Result
where
    F: FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    if wrap {
        write!(f, "(")?;
    }
    body(f)?;
    if wrap {
        write!(f, ")")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::types::{Member, Param, TypeArena, TypeId};

    #[test]
    fn test_render_callable_shapes() {
        let mut arena = TypeArena::new();
        let r = arena.infer("R");
        let call = arena.call_signature(vec![], r);
        let ctor = arena.construct_signature(vec![], TypeId::STRING);
        let func = arena.function(vec![Param::new("x", TypeId::NUMBER)], TypeId::ANY);

        assert_eq!(arena.render(call), "{ (): infer R }");
        assert_eq!(arena.render(ctor), "{ new (): string }");
        assert_eq!(arena.render(func), "(x: number) => any");
    }

    #[test]
    fn test_render_quantified_object() {
        let mut arena = TypeArena::new();
        let t = arena.reference("T");
        let t_arr = arena.array(t);
        let identifier = arena.function(vec![Param::new("value", t)], TypeId::STRING);
        let body = arena.object(vec![
            Member::new("values", t_arr),
            Member::optional("identifier", identifier),
        ]);
        let q = arena.quantified("T", Some(TypeId::STRING), body);

        assert_eq!(
            arena.render(q),
            "<T extends string> { values: T[]; identifier?: (value: T) => string }"
        );
    }

    #[test]
    fn test_render_parenthesizes_array_elements() {
        let mut arena = TypeArena::new();
        let u = arena.union(vec![TypeId::STRING, TypeId::NUMBER]);
        let arr = arena.array(u);
        let f = arena.function(vec![], TypeId::VOID);
        let f_arr = arena.array(f);

        assert_eq!(arena.render(arr), "(string | number)[]");
        assert_eq!(arena.render(f_arr), "(() => void)[]");
    }

    #[test]
    fn test_render_conditional_and_literals() {
        let mut arena = TypeArena::new();
        let lit = arena.string_literal("a");
        let n = arena.number_literal(42.0);
        let cond = arena.conditional(lit, TypeId::STRING, n, TypeId::NEVER);
        assert_eq!(arena.render(cond), "\"a\" extends string ? 42 : never");
    }
}
