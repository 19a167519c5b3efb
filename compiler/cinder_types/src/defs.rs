//! Nominal type definitions.

use cinder_ir::{Name, Span, SymbolId};

/// Index of a [`TypeDef`] in the pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct DefId(u32);

impl DefId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        DefId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DefKind {
    Struct,
    Class,
    Interface,
    Enum,
}

impl DefKind {
    /// Structs and enums are stored inline; classes and interfaces are
    /// references to the managed heap.
    #[inline]
    pub const fn is_value_type(self) -> bool {
        matches!(self, DefKind::Struct | DefKind::Enum)
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TypeDef {
    pub name: Name,
    pub kind: DefKind,
    /// Number of generic parameters. Field types refer to them by position.
    pub type_params: u32,
    /// Instance and static fields, in declaration order.
    pub fields: Vec<SymbolId>,
    /// Declared with the `unsafe` modifier.
    pub is_unsafe: bool,
    pub span: Span,
}
