//! Conversion lattice between pointer, numeric, array, and user types.
//!
//! [`classify_conversion`] answers "which conversion turns a `source` value
//! into a `target` value". It never reports; the binder decides whether an
//! explicit-only answer is acceptable at a given site.

use cinder_ir::Idx;
use cinder_types::{Pool, Snapshot, UserConversion, WellKnownType};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ConversionKind {
    Identity,
    ImplicitNumeric,
    /// `null` to any pointer.
    NullToPointer,
    /// `T*` to `void*`.
    PointerToVoid,
    /// `void*` to `T*`.
    PointerFromVoid,
    /// `T*` to `U*`.
    PointerToPointer,
    PointerToInteger,
    IntegerToPointer,
    /// An array to the untyped array base type.
    ArrayToBaseArray,
    BaseArrayToArray,
    ExplicitNumeric,
    UserDefined {
        implicit: bool,
    },
    /// More than one user-defined operator applies.
    AmbiguousUserDefined,
    None,
}

impl ConversionKind {
    /// Applies without a cast.
    pub const fn is_implicit(self) -> bool {
        matches!(
            self,
            ConversionKind::Identity
                | ConversionKind::ImplicitNumeric
                | ConversionKind::NullToPointer
                | ConversionKind::PointerToVoid
                | ConversionKind::ArrayToBaseArray
                | ConversionKind::UserDefined { implicit: true }
        )
    }

    /// Applies only with a cast.
    pub const fn is_explicit(self) -> bool {
        self.exists() && !self.is_implicit()
    }

    pub const fn exists(self) -> bool {
        !matches!(
            self,
            ConversionKind::None | ConversionKind::AmbiguousUserDefined
        )
    }

    /// Involves a pointer on at least one side.
    pub const fn is_pointer_conversion(self) -> bool {
        matches!(
            self,
            ConversionKind::NullToPointer
                | ConversionKind::PointerToVoid
                | ConversionKind::PointerFromVoid
                | ConversionKind::PointerToPointer
                | ConversionKind::PointerToInteger
                | ConversionKind::IntegerToPointer
        )
    }
}

/// Classify the conversion from `source` to `target`.
pub fn classify_conversion(snapshot: &Snapshot, source: Idx, target: Idx) -> ConversionKind {
    if source == target {
        return ConversionKind::Identity;
    }
    let pool = snapshot.pool();
    if !pool.contains(source) || !pool.contains(target) {
        return ConversionKind::None;
    }

    let kind = pointer_conversion(pool, source, target)
        .or_else(|| array_conversion(snapshot, source, target))
        .or_else(|| numeric_conversion(source, target))
        .unwrap_or_else(|| user_defined(snapshot, source, target));
    tracing::trace!(?source, ?target, ?kind, "classified conversion");
    kind
}

/// `None` when neither side is a pointer, or when the other side may
/// still define a user conversion.
fn pointer_conversion(pool: &Pool, source: Idx, target: Idx) -> Option<ConversionKind> {
    let source_is_pointer = pool.is_pointer(source);
    let target_is_pointer = pool.is_pointer(target);

    match (source_is_pointer, target_is_pointer) {
        (false, false) => None,
        (true, true) => Some(if pool.is_void_pointer(target) {
            ConversionKind::PointerToVoid
        } else if pool.is_void_pointer(source) {
            ConversionKind::PointerFromVoid
        } else {
            ConversionKind::PointerToPointer
        }),
        (false, true) if source == Idx::NULL => Some(ConversionKind::NullToPointer),
        (false, true) if source.is_integral() => Some(ConversionKind::IntegerToPointer),
        (true, false) if target.is_integral() => Some(ConversionKind::PointerToInteger),
        (true, false) => closed_to_pointers(pool, target),
        (false, true) => closed_to_pointers(pool, source),
    }
}

/// Primitives and nullable wrappers never convert to or from a pointer.
fn closed_to_pointers(pool: &Pool, other: Idx) -> Option<ConversionKind> {
    (other.is_primitive() || pool.nullable_inner(other).is_some()).then_some(ConversionKind::None)
}

fn array_conversion(snapshot: &Snapshot, source: Idx, target: Idx) -> Option<ConversionKind> {
    let pool = snapshot.pool();
    let source_is_array = pool.array_element(source).is_some();
    let target_is_array = pool.array_element(target).is_some();
    if !source_is_array && !target_is_array {
        return None;
    }
    if source_is_array && target_is_array {
        return Some(ConversionKind::None);
    }
    let base = snapshot.well_known(WellKnownType::ArrayBase)?;
    if source_is_array && target == base {
        Some(ConversionKind::ArrayToBaseArray)
    } else if target_is_array && source == base {
        Some(ConversionKind::BaseArrayToArray)
    } else {
        None
    }
}

fn numeric_conversion(source: Idx, target: Idx) -> Option<ConversionKind> {
    if !source.is_numeric() || !target.is_numeric() {
        return None;
    }
    Some(if implicit_numeric(source, target) {
        ConversionKind::ImplicitNumeric
    } else {
        ConversionKind::ExplicitNumeric
    })
}

/// Built-in implicit numeric widening.
fn implicit_numeric(source: Idx, target: Idx) -> bool {
    let widens_to: &[Idx] = match source {
        Idx::I8 => &[Idx::I16, Idx::I32, Idx::I64, Idx::F32, Idx::F64, Idx::DECIMAL],
        Idx::U8 => &[
            Idx::I16,
            Idx::U16,
            Idx::I32,
            Idx::U32,
            Idx::I64,
            Idx::U64,
            Idx::F32,
            Idx::F64,
            Idx::DECIMAL,
        ],
        Idx::I16 => &[Idx::I32, Idx::I64, Idx::F32, Idx::F64, Idx::DECIMAL],
        Idx::CHAR => &[
            Idx::U16,
            Idx::I32,
            Idx::U32,
            Idx::I64,
            Idx::U64,
            Idx::F32,
            Idx::F64,
            Idx::DECIMAL,
        ],
        Idx::U16 => &[
            Idx::I32,
            Idx::U32,
            Idx::I64,
            Idx::U64,
            Idx::F32,
            Idx::F64,
            Idx::DECIMAL,
        ],
        Idx::I32 => &[Idx::I64, Idx::F32, Idx::F64, Idx::DECIMAL],
        Idx::U32 => &[Idx::I64, Idx::U64, Idx::F32, Idx::F64, Idx::DECIMAL],
        Idx::I64 | Idx::U64 => &[Idx::F32, Idx::F64, Idx::DECIMAL],
        Idx::F32 => &[Idx::F64],
        _ => &[],
    };
    widens_to.contains(&target)
}

/// User-defined operators declared on `source`. An operator producing
/// `target` exactly beats one whose result widens to it.
fn user_defined(snapshot: &Snapshot, source: Idx, target: Idx) -> ConversionKind {
    let candidates = snapshot.conversions_from(source);
    let exact = candidates.iter().filter(|c| c.to == target);
    match pick(exact) {
        Some(kind) => kind,
        None => {
            let widened = candidates
                .iter()
                .filter(|c| implicit_numeric(c.to, target));
            pick(widened).unwrap_or(ConversionKind::None)
        }
    }
}

fn pick<'a>(mut candidates: impl Iterator<Item = &'a UserConversion>) -> Option<ConversionKind> {
    let first = candidates.next()?;
    Some(if candidates.next().is_some() {
        ConversionKind::AmbiguousUserDefined
    } else {
        ConversionKind::UserDefined {
            implicit: first.implicit,
        }
    })
}
