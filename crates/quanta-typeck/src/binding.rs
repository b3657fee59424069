//! Value binding records

use quanta_ast::{TypeId, VarDeclKind};

/// Declaration progress of a value binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// Name is in scope but its initializer is still being checked
    Declaring,
    /// Initializer checked; `ty` is final
    Initialized,
}

/// Variable information in the symbol table
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub ty: TypeId,
    pub kind: VarDeclKind,
    pub state: BindingState,
}

impl VarInfo {
    pub fn declaring(kind: VarDeclKind) -> Self {
        Self { ty: TypeId::UNKNOWN, kind, state: BindingState::Declaring }
    }

    pub fn initialized(ty: TypeId, kind: VarDeclKind) -> Self {
        Self { ty, kind, state: BindingState::Initialized }
    }

    pub fn is_declaring(&self) -> bool {
        self.state == BindingState::Declaring
    }
}
