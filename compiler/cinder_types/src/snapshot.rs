//! Frozen view of the resolved program.
//!
//! The resolver builds a [`Snapshot`] once per compilation through
//! [`SnapshotBuilder`]; afterwards it is immutable and shared across bind
//! requests, usually behind an `Arc`.

use std::sync::Arc;

use cinder_ir::{Idx, Name, SharedInterner, Span, StringInterner, SymbolId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    DefId, DefKind, FixedBuffer, Pool, RefKind, Symbol, SymbolKind, SymbolTable, TypeData,
    TypeDef, WellKnownType,
};

/// A user-declared conversion operator `from -> to`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct UserConversion {
    pub from: Idx,
    pub to: Idx,
    /// Declared `implicit`; otherwise usable only in casts.
    pub implicit: bool,
}

/// Inconsistent input handed to [`SnapshotBuilder::finish`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("type index {idx:?} used by {context} is not in the pool")]
    DanglingType { idx: Idx, context: &'static str },

    #[error("definition {def:?} is not registered")]
    UnknownDef { def: DefId },

    #[error("definition {def:?} expects {expected} type arguments, got {found}")]
    ArityMismatch {
        def: DefId,
        expected: u32,
        found: usize,
    },

    #[error("fixed-size buffer {field:?} declared outside a struct")]
    FixedBufferOutsideStruct { field: SymbolId },

    #[error("well-known type {kind} registered twice")]
    DuplicateWellKnown { kind: WellKnownType },

    #[error("conversion operator from {from:?} to itself")]
    IdentityConversion { from: Idx },
}

/// Immutable types, symbols, and conversion operators of one compilation.
#[derive(Debug)]
pub struct Snapshot {
    pool: Pool,
    symbols: SymbolTable,
    interner: SharedInterner,
    conversions: FxHashMap<Idx, SmallVec<[UserConversion; 2]>>,
    well_known: [Option<Idx>; 2],
}

impl Snapshot {
    #[inline]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Text of a symbol's name, for logging.
    pub fn symbol_name(&self, id: SymbolId) -> Option<Arc<str>> {
        self.symbol(id).and_then(|s| self.interner.lookup(s.name))
    }

    /// Conversion operators whose source type is exactly `from`.
    pub fn conversions_from(&self, from: Idx) -> &[UserConversion] {
        match self.conversions.get(&from) {
            Some(list) => list.as_slice(),
            None => &[],
        }
    }

    pub fn well_known(&self, kind: WellKnownType) -> Option<Idx> {
        self.well_known[kind.slot()]
    }

    pub fn def(&self, def: DefId) -> Option<&TypeDef> {
        self.pool.def(def)
    }
}

/// Mutable construction side of a [`Snapshot`].
///
/// ```text
/// let mut b = SnapshotBuilder::new();
/// let point = b.define_type("Point", DefKind::Struct, 0);
/// b.add_field(point, "x", Idx::I32, span);
/// let snapshot = b.finish()?;
/// ```
pub struct SnapshotBuilder {
    pool: Pool,
    symbols: SymbolTable,
    interner: SharedInterner,
    conversions: Vec<UserConversion>,
    well_known: Vec<(WellKnownType, Idx)>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::with_interner(Arc::new(StringInterner::new()))
    }

    /// Share names with an interner the resolver already populated.
    pub fn with_interner(interner: SharedInterner) -> Self {
        SnapshotBuilder {
            pool: Pool::new(),
            symbols: SymbolTable::new(),
            interner,
            conversions: Vec::new(),
            well_known: Vec::new(),
        }
    }

    pub fn intern(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    // === Types ===

    pub fn pointer(&mut self, pointee: Idx) -> Idx {
        self.pool.pointer(pointee)
    }

    pub fn array(&mut self, element: Idx, rank: u8) -> Idx {
        self.pool.array(element, rank)
    }

    pub fn nullable(&mut self, inner: Idx) -> Idx {
        self.pool.nullable(inner)
    }

    pub fn type_param(&mut self, index: u32, name: &str) -> Idx {
        let name = self.interner.intern(name);
        self.pool.type_param(index, name)
    }

    pub fn define_type(&mut self, name: &str, kind: DefKind, type_params: u32) -> DefId {
        let name = self.interner.intern(name);
        self.pool.define(TypeDef {
            name,
            kind,
            type_params,
            fields: Vec::new(),
            is_unsafe: false,
            span: Span::DUMMY,
        })
    }

    /// Mark a definition as declared `unsafe` and give it a source span.
    pub fn set_type_decl(&mut self, def: DefId, is_unsafe: bool, span: Span) {
        if let Some(def) = self.pool.def_mut(def) {
            def.is_unsafe = is_unsafe;
            def.span = span;
        }
    }

    pub fn nominal(&mut self, def: DefId) -> Idx {
        self.pool.nominal(def)
    }

    pub fn applied(&mut self, def: DefId, args: &[Idx]) -> Idx {
        self.pool.applied(def, args)
    }

    // === Symbols ===

    pub fn add_field(&mut self, owner: DefId, name: &str, ty: Idx, span: Span) -> SymbolId {
        self.push_field(owner, name, span, ty, false, None)
    }

    pub fn add_static_field(&mut self, owner: DefId, name: &str, ty: Idx, span: Span) -> SymbolId {
        self.push_field(owner, name, span, ty, true, None)
    }

    /// `fixed element name[length]`. The field's type is `element*`.
    pub fn add_fixed_buffer(
        &mut self,
        owner: DefId,
        name: &str,
        element: Idx,
        length: u32,
        span: Span,
    ) -> SymbolId {
        let ty = self.pool.pointer(element);
        self.push_field(
            owner,
            name,
            span,
            ty,
            false,
            Some(FixedBuffer { element, length }),
        )
    }

    fn push_field(
        &mut self,
        owner: DefId,
        name: &str,
        span: Span,
        ty: Idx,
        is_static: bool,
        fixed_buffer: Option<FixedBuffer>,
    ) -> SymbolId {
        let id = self.symbols.push(Symbol {
            name: self.interner.intern(name),
            span,
            kind: SymbolKind::Field {
                owner,
                ty,
                is_static,
                fixed_buffer,
            },
        });
        if let Some(def) = self.pool.def_mut(owner) {
            def.fields.push(id);
        }
        id
    }

    pub fn add_local(&mut self, name: &str, ty: Idx) -> SymbolId {
        self.push_local(name, ty, RefKind::Value)
    }

    pub fn add_ref_local(&mut self, name: &str, ty: Idx) -> SymbolId {
        self.push_local(name, ty, RefKind::Ref)
    }

    fn push_local(&mut self, name: &str, ty: Idx, ref_kind: RefKind) -> SymbolId {
        self.symbols.push(Symbol {
            name: self.interner.intern(name),
            span: Span::DUMMY,
            kind: SymbolKind::Local { ty, ref_kind },
        })
    }

    pub fn add_parameter(
        &mut self,
        name: &str,
        ty: Idx,
        ref_kind: RefKind,
        span: Span,
    ) -> SymbolId {
        self.symbols.push(Symbol {
            name: self.interner.intern(name),
            span,
            kind: SymbolKind::Parameter { ty, ref_kind },
        })
    }

    // === Conversions and well-known types ===

    pub fn add_user_conversion(&mut self, from: Idx, to: Idx, implicit: bool) {
        self.conversions.push(UserConversion { from, to, implicit });
    }

    pub fn register_well_known(&mut self, kind: WellKnownType, ty: Idx) {
        self.well_known.push((kind, ty));
    }

    /// Validate and freeze.
    pub fn finish(self) -> Result<Snapshot, SnapshotError> {
        let SnapshotBuilder {
            pool,
            symbols,
            interner,
            conversions,
            well_known,
        } = self;

        let check = |idx: Idx, context: &'static str| {
            if pool.contains(idx) {
                Ok(())
            } else {
                Err(SnapshotError::DanglingType { idx, context })
            }
        };

        for (_, data) in pool.iter() {
            match data {
                TypeData::Primitive(_) | TypeData::TypeParam { .. } => {}
                TypeData::Pointer(inner) | TypeData::Nullable(inner) => check(*inner, "a type")?,
                TypeData::Array { element, .. } => check(*element, "an array")?,
                TypeData::Nominal(def) => {
                    pool.def(*def)
                        .ok_or(SnapshotError::UnknownDef { def: *def })?;
                }
                TypeData::Applied { def, args } => {
                    let expected = pool
                        .def(*def)
                        .ok_or(SnapshotError::UnknownDef { def: *def })?
                        .type_params;
                    if u32::try_from(args.len()).ok() != Some(expected) {
                        return Err(SnapshotError::ArityMismatch {
                            def: *def,
                            expected,
                            found: args.len(),
                        });
                    }
                    for arg in args.iter() {
                        check(*arg, "a type argument")?;
                    }
                }
            }
        }

        for (id, symbol) in symbols.iter() {
            check(symbol.ty(), "a symbol")?;
            if let SymbolKind::Field {
                owner,
                fixed_buffer,
                ..
            } = &symbol.kind
            {
                let def = pool
                    .def(*owner)
                    .ok_or(SnapshotError::UnknownDef { def: *owner })?;
                if fixed_buffer.is_some() && def.kind != DefKind::Struct {
                    return Err(SnapshotError::FixedBufferOutsideStruct { field: id });
                }
            }
        }

        let mut by_source: FxHashMap<Idx, SmallVec<[UserConversion; 2]>> = FxHashMap::default();
        for conversion in conversions {
            check(conversion.from, "a conversion operator")?;
            check(conversion.to, "a conversion operator")?;
            if conversion.from == conversion.to {
                return Err(SnapshotError::IdentityConversion {
                    from: conversion.from,
                });
            }
            by_source.entry(conversion.from).or_default().push(conversion);
        }

        let mut slots = [None; 2];
        for (kind, ty) in well_known {
            check(ty, "a well-known type")?;
            let slot = &mut slots[kind.slot()];
            if slot.is_some() {
                return Err(SnapshotError::DuplicateWellKnown { kind });
            }
            *slot = Some(ty);
        }

        tracing::debug!(
            types = pool.len(),
            symbols = symbols.len(),
            conversions = by_source.len(),
            "snapshot frozen"
        );

        Ok(Snapshot {
            pool,
            symbols,
            interner,
            conversions: by_source,
            well_known: slots,
        })
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
