//! Built-in apparent member registry
//!
//! Member access on a primitive value resolves against this table. Literal
//! types use the table of the primitive they widen to.

use std::collections::HashMap;
use quanta_ast::{Param, PrimitiveType, TypeArena, TypeId};

/// Registry of apparent members per primitive type
pub struct BuiltinRegistry {
    members: HashMap<PrimitiveType, HashMap<String, TypeId>>,
}

impl BuiltinRegistry {
    /// Allocates the member signatures into `arena`
    pub fn new(arena: &mut TypeArena) -> Self {
        let mut registry = Self { members: HashMap::new() };
        registry.register_string(arena);
        registry.register_number(arena);
        registry.register_boolean(arena);
        registry
    }

    /// Type of `name` on values of primitive `prim`
    pub fn member_type(&self, prim: PrimitiveType, name: &str) -> Option<TypeId> {
        self.members.get(&prim)?.get(name).copied()
    }

    pub fn has_members(&self, prim: PrimitiveType) -> bool {
        self.members.contains_key(&prim)
    }

    fn register(&mut self, prim: PrimitiveType, members: HashMap<String, TypeId>) {
        self.members.insert(prim, members);
    }

    fn register_string(&mut self, arena: &mut TypeArena) {
        let mut members = HashMap::new();
        let to_string = arena.function(vec![], TypeId::STRING);

        members.insert("length".to_string(), TypeId::NUMBER);
        members.insert("toString".to_string(), to_string);
        members.insert("toUpperCase".to_string(), to_string);
        members.insert("toLowerCase".to_string(), to_string);
        members.insert("trim".to_string(), to_string);

        // includes(search: string) => boolean
        let search = arena.function(vec![Param::new("search", TypeId::STRING)], TypeId::BOOLEAN);
        members.insert("includes".to_string(), search);
        members.insert("startsWith".to_string(), search);

        self.register(PrimitiveType::String, members);
    }

    fn register_number(&mut self, arena: &mut TypeArena) {
        let mut members = HashMap::new();

        members.insert("toString".to_string(), arena.function(vec![], TypeId::STRING));

        // toFixed(digits?: number) => string
        let to_fixed =
            arena.function(vec![Param::optional("digits", TypeId::NUMBER)], TypeId::STRING);
        members.insert("toFixed".to_string(), to_fixed);

        self.register(PrimitiveType::Number, members);
    }

    fn register_boolean(&mut self, arena: &mut TypeArena) {
        let mut members = HashMap::new();
        members.insert("toString".to_string(), arena.function(vec![], TypeId::STRING));
        self.register(PrimitiveType::Boolean, members);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_members() {
        let mut arena = TypeArena::new();
        let registry = BuiltinRegistry::new(&mut arena);

        assert_eq!(registry.member_type(PrimitiveType::String, "length"), Some(TypeId::NUMBER));
        let upper = registry.member_type(PrimitiveType::String, "toUpperCase");
        assert_eq!(upper.map(|t| arena.render(t)), Some("() => string".to_string()));
        let includes = registry.member_type(PrimitiveType::String, "includes");
        assert_eq!(
            includes.map(|t| arena.render(t)),
            Some("(search: string) => boolean".to_string())
        );
    }

    #[test]
    fn test_number_and_boolean_members() {
        let mut arena = TypeArena::new();
        let registry = BuiltinRegistry::new(&mut arena);

        let to_fixed = registry.member_type(PrimitiveType::Number, "toFixed");
        assert_eq!(
            to_fixed.map(|t| arena.render(t)),
            Some("(digits?: number) => string".to_string())
        );
        assert!(registry.member_type(PrimitiveType::Boolean, "toString").is_some());
        assert!(registry.member_type(PrimitiveType::Number, "length").is_none());
    }

    #[test]
    fn test_unknown_primitive() {
        let mut arena = TypeArena::new();
        let registry = BuiltinRegistry::new(&mut arena);
        assert!(!registry.has_members(PrimitiveType::Null));
        assert!(registry.member_type(PrimitiveType::Void, "toString").is_none());
    }
}
