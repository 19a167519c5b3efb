//! Cinder IR - shared vocabulary of the Cinder compiler
//!
//! This crate holds the small, copyable handles every later phase passes
//! around:
//! - [`Span`] for source locations
//! - [`Name`] and [`StringInterner`] for identifiers
//! - [`Idx`] for interned types (the pool itself lives in `cinder_types`)
//! - [`SymbolId`], [`ExprId`], [`StmtId`] for resolved symbols and bound nodes
//! - [`BodyArena`], the flattened bound tree handed over by name resolution
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings become `Name(u32)`, types become `Idx(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, children are `ExprId` indices

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod body;
mod ids;
mod idx;
mod interner;
mod name;
mod ops;
mod span;

pub use body::{
    BodyArena, Callable, CallableKind, ClosureKind, DeclaredType, Expr, ExprKind, Literal,
    PinDeclarator, Stmt, StmtKind,
};
pub use ids::{ExprId, StmtId, SymbolId};
pub use idx::Idx;
pub use interner::{SharedInterner, StringInterner};
pub use name::Name;
pub use ops::{BinaryOp, UnaryOp};
pub use span::Span;
