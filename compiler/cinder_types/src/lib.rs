//! Cinder type system data.
//!
//! The external resolver fills a [`SnapshotBuilder`] with types, type
//! definitions, symbols, and user-defined conversion operators, then freezes
//! it into an immutable [`Snapshot`]. Everything downstream reads the
//! snapshot concurrently.
//!
//! # Components
//!
//! - [`Pool`]: interned types addressed by [`Idx`], with [`TypeFlags`]
//!   computed at interning time
//! - [`SymbolTable`]: locals, parameters, and fields addressed by
//!   [`SymbolId`](cinder_ir::SymbolId)
//! - [`TrackedKindCache`]: memoized "does this type hold managed
//!   references" classification, safe on cyclic value types

mod defs;
mod flags;
mod pool;
mod snapshot;
mod symbols;
mod tracked;
mod well_known;

pub use cinder_ir::Idx;
pub use defs::{DefId, DefKind, TypeDef};
pub use flags::TypeFlags;
pub use pool::{Pool, TypeData};
pub use snapshot::{Snapshot, SnapshotBuilder, SnapshotError, UserConversion};
pub use symbols::{FixedBuffer, RefKind, Symbol, SymbolKind, SymbolTable};
pub use tracked::{TrackedKind, TrackedKindCache, DEFAULT_MAX_TYPE_DEPTH};
pub use well_known::WellKnownType;
