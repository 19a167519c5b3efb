//! Pre-computed type metadata flags.

use bitflags::bitflags;

bitflags! {
    /// Properties of a type computed once when it is interned.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u16 {
        /// One of the pre-interned primitives.
        const IS_PRIMITIVE = 1 << 0;
        /// The type itself is a pointer.
        const IS_POINTER = 1 << 1;
        /// A pointer occurs somewhere in the type (element, argument, ..).
        const HAS_POINTER = 1 << 2;
        /// Values live on the managed heap: string, object, arrays,
        /// classes, interfaces.
        const IS_REFERENCE = 1 << 3;
        /// Mentions a generic type parameter.
        const HAS_TYPE_PARAM = 1 << 4;
        /// Mentions the error type.
        const HAS_ERROR = 1 << 5;
        /// Struct, enum, or a nullable wrapper of one.
        const IS_VALUE_AGGREGATE = 1 << 6;
    }
}

impl TypeFlags {
    /// Flags a compound type inherits from one of its components.
    pub const PROPAGATED: TypeFlags = TypeFlags::HAS_POINTER
        .union(TypeFlags::HAS_TYPE_PARAM)
        .union(TypeFlags::HAS_ERROR);

    #[inline]
    pub fn has_pointer(self) -> bool {
        self.contains(TypeFlags::HAS_POINTER)
    }

    #[inline]
    pub fn has_errors(self) -> bool {
        self.contains(TypeFlags::HAS_ERROR)
    }
}
