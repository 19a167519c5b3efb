//! Interned type handle.

use std::fmt;

/// Index of a type in the `cinder_types::Pool`.
///
/// Primitive types are pre-interned at fixed indices so the hot
/// classification paths can match on them without touching the pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    pub const BOOL: Idx = Idx(0);
    pub const CHAR: Idx = Idx(1);
    pub const I8: Idx = Idx(2);
    pub const U8: Idx = Idx(3);
    pub const I16: Idx = Idx(4);
    pub const U16: Idx = Idx(5);
    pub const I32: Idx = Idx(6);
    pub const U32: Idx = Idx(7);
    pub const I64: Idx = Idx(8);
    pub const U64: Idx = Idx(9);
    pub const F32: Idx = Idx(10);
    pub const F64: Idx = Idx(11);
    pub const DECIMAL: Idx = Idx(12);
    pub const STRING: Idx = Idx(13);
    pub const OBJECT: Idx = Idx(14);
    pub const VOID: Idx = Idx(15);
    /// Type of the `null` literal before it is converted to a target type.
    pub const NULL: Idx = Idx(16);
    /// Recovery type after an error has been reported.
    pub const ERROR: Idx = Idx(17);
    /// `void*`, pre-interned because pointer comparison widens to it.
    pub const VOID_PTR: Idx = Idx(18);

    /// Number of primitive types (indices below this are primitives).
    pub const PRIMITIVE_COUNT: u32 = 18;

    /// First index handed out by the pool for compound types.
    pub const FIRST_DYNAMIC: u32 = 19;

    /// Sentinel for "no type".
    pub const NONE: Idx = Idx(u32::MAX);

    /// The pointer-convertible integral types, in conversion order.
    pub const INTEGRALS: [Idx; 8] = [
        Idx::I8,
        Idx::U8,
        Idx::I16,
        Idx::U16,
        Idx::I32,
        Idx::U32,
        Idx::I64,
        Idx::U64,
    ];

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Idx(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// One of `i8 u8 i16 u16 i32 u32 i64 u64`.
    #[inline]
    pub const fn is_integral(self) -> bool {
        self.0 >= Self::I8.0 && self.0 <= Self::U64.0
    }

    /// Integral, floating, decimal, or char.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        self.0 >= Self::CHAR.0 && self.0 <= Self::DECIMAL.0
    }

    /// Name of a primitive type, `None` for compound types.
    pub const fn primitive_name(self) -> Option<&'static str> {
        Some(match self {
            Idx::BOOL => "bool",
            Idx::CHAR => "char",
            Idx::I8 => "i8",
            Idx::U8 => "u8",
            Idx::I16 => "i16",
            Idx::U16 => "u16",
            Idx::I32 => "i32",
            Idx::U32 => "u32",
            Idx::I64 => "i64",
            Idx::U64 => "u64",
            Idx::F32 => "f32",
            Idx::F64 => "f64",
            Idx::DECIMAL => "decimal",
            Idx::STRING => "string",
            Idx::OBJECT => "object",
            Idx::VOID => "void",
            Idx::NULL => "null",
            Idx::ERROR => "<error>",
            Idx::VOID_PTR => "void*",
            _ => return None,
        })
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primitive_name() {
            Some(name) => write!(f, "Idx::{name}"),
            None if self.is_none() => write!(f, "Idx::NONE"),
            None => write!(f, "Idx({})", self.0),
        }
    }
}
