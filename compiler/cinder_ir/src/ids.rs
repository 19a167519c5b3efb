//! Index handles for bound-tree nodes and resolved symbols.
//!
//! All three are `u32` indices with a `u32::MAX` sentinel, so they are
//! `Copy`, compare in O(1), and keep arena nodes small.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "no node".
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                } else {
                    write!(f, concat!(stringify!($name), "::INVALID"))
                }
            }
        }
    };
}

define_id! {
    /// Index into [`BodyArena`](crate::BodyArena) expressions.
    ExprId
}

define_id! {
    /// Index into [`BodyArena`](crate::BodyArena) statements.
    StmtId
}

define_id! {
    /// A resolved local, parameter, or field in the snapshot's symbol table.
    SymbolId
}
