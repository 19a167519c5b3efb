//! Resolved locals, parameters, and fields.

use cinder_ir::{Idx, Name, Span, SymbolId};

use crate::DefId;

/// How a local or parameter holds its value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum RefKind {
    /// Owns its storage on the stack frame.
    #[default]
    Value,
    /// Aliases storage elsewhere (`ref` / `out` / `in`).
    Ref,
}

/// `fixed T name[length]` inside a struct.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FixedBuffer {
    pub element: Idx,
    pub length: u32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum SymbolKind {
    Local {
        ty: Idx,
        ref_kind: RefKind,
    },
    Parameter {
        ty: Idx,
        ref_kind: RefKind,
    },
    Field {
        owner: DefId,
        /// For a fixed-size buffer this is the element pointer type.
        ty: Idx,
        is_static: bool,
        fixed_buffer: Option<FixedBuffer>,
    },
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Symbol {
    pub name: Name,
    pub span: Span,
    pub kind: SymbolKind,
}

impl Symbol {
    #[inline]
    pub fn ty(&self) -> Idx {
        match self.kind {
            SymbolKind::Local { ty, .. }
            | SymbolKind::Parameter { ty, .. }
            | SymbolKind::Field { ty, .. } => ty,
        }
    }

    /// `ref` locals and parameters.
    #[inline]
    pub fn is_by_ref(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Local {
                ref_kind: RefKind::Ref,
                ..
            } | SymbolKind::Parameter {
                ref_kind: RefKind::Ref,
                ..
            }
        )
    }

    pub fn is_static_field(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Field {
                is_static: true,
                ..
            }
        )
    }

    pub fn fixed_buffer(&self) -> Option<FixedBuffer> {
        match self.kind {
            SymbolKind::Field { fixed_buffer, .. } => fixed_buffer,
            _ => None,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX));
        self.symbols.push(symbol);
        id
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, symbol)| {
            (
                SymbolId::new(u32::try_from(i).unwrap_or(u32::MAX)),
                symbol,
            )
        })
    }
}
