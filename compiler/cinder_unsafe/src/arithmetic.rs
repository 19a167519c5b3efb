//! Built-in pointer operators.

use cinder_ir::{BinaryOp, Idx};
use cinder_types::Snapshot;

use crate::conversion::{classify_conversion, ConversionKind};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OperatorKind {
    /// `T* + int`
    PointerPlusInt,
    /// `int + T*`
    IntPlusPointer,
    /// `T* - int`
    PointerMinusInt,
    /// `T* - T*`, in elements.
    PointerDifference,
    PointerComparison,
}

impl OperatorKind {
    #[inline]
    pub const fn is_arithmetic(self) -> bool {
        !matches!(self, OperatorKind::PointerComparison)
    }
}

/// A resolved built-in operator. `left` and `right` are the types the
/// operands convert to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct OperatorSignature {
    pub kind: OperatorKind,
    pub op: BinaryOp,
    pub left: Idx,
    pub right: Idx,
    pub result: Idx,
}

/// Integer operand types accepted next to a pointer, in preference order
/// for user-defined conversions.
const INT_OPERANDS: [Idx; 4] = [Idx::I32, Idx::U32, Idx::I64, Idx::U64];

/// Resolve `left op right` when at least one side is a pointer.
///
/// `None` means no built-in pointer operator applies, including all
/// arithmetic on `void*`.
pub fn resolve_builtin_operator(
    snapshot: &Snapshot,
    op: BinaryOp,
    left: Idx,
    right: Idx,
) -> Option<OperatorSignature> {
    let pool = snapshot.pool();
    let left_ptr = pool.is_pointer(left);
    let right_ptr = pool.is_pointer(right);
    if !left_ptr && !right_ptr {
        return None;
    }

    let signature = |kind, l, r, result| OperatorSignature {
        kind,
        op,
        left: l,
        right: r,
        result,
    };

    if op.is_comparison() {
        let operand = match (left_ptr, right_ptr) {
            (true, true) if left == right => left,
            (true, true) => Idx::VOID_PTR,
            (true, false) if right == Idx::NULL => left,
            (false, true) if left == Idx::NULL => right,
            _ => return None,
        };
        return Some(signature(
            OperatorKind::PointerComparison,
            operand,
            operand,
            Idx::BOOL,
        ));
    }

    let typed = |ptr: Idx| pool.pointee(ptr).is_some_and(|pointee| pointee != Idx::VOID);

    match (op, left_ptr, right_ptr) {
        (BinaryOp::Add, true, false) if typed(left) => {
            let int = int_operand_type(snapshot, right)?;
            Some(signature(OperatorKind::PointerPlusInt, left, int, left))
        }
        (BinaryOp::Add, false, true) if typed(right) => {
            let int = int_operand_type(snapshot, left)?;
            Some(signature(OperatorKind::IntPlusPointer, int, right, right))
        }
        (BinaryOp::Sub, true, false) if typed(left) => {
            let int = int_operand_type(snapshot, right)?;
            Some(signature(OperatorKind::PointerMinusInt, left, int, left))
        }
        (BinaryOp::Sub, true, true) if left == right && typed(left) => Some(signature(
            OperatorKind::PointerDifference,
            left,
            right,
            Idx::I64,
        )),
        _ => None,
    }
}

/// The integer type an operand is used as in pointer arithmetic.
///
/// 8- and 16-bit integers widen to `i32`; `char`, `bool`, nullable and
/// floating types are rejected.
pub fn int_operand_type(snapshot: &Snapshot, ty: Idx) -> Option<Idx> {
    match ty {
        Idx::I8 | Idx::U8 | Idx::I16 | Idx::U16 => Some(Idx::I32),
        Idx::I32 | Idx::U32 | Idx::I64 | Idx::U64 => Some(ty),
        _ if ty.is_primitive() || snapshot.pool().nullable_inner(ty).is_some() => None,
        _ => INT_OPERANDS.into_iter().find(|&int| {
            classify_conversion(snapshot, ty, int) == ConversionKind::UserDefined { implicit: true }
        }),
    }
}

#[cfg(test)]
mod tests;
