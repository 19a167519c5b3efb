use cinder_types::{DefKind, SnapshotBuilder};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

struct Fixture {
    snapshot: Snapshot,
    byte_ptr: Idx,
    int_ptr: Idx,
    index: Idx,
    explicit_index: Idx,
    nullable_int: Idx,
}

fn fixture() -> Fixture {
    let mut b = SnapshotBuilder::new();
    let byte_ptr = b.pointer(Idx::U8);
    let int_ptr = b.pointer(Idx::I32);
    let index_def = b.define_type("Index", DefKind::Struct, 0);
    let index = b.nominal(index_def);
    b.add_user_conversion(index, Idx::I64, true);
    let explicit_def = b.define_type("Offset", DefKind::Struct, 0);
    let explicit_index = b.nominal(explicit_def);
    b.add_user_conversion(explicit_index, Idx::I32, false);
    let nullable_int = b.nullable(Idx::I32);
    Fixture {
        snapshot: b.finish().unwrap_or_else(|e| panic!("{e}")),
        byte_ptr,
        int_ptr,
        index,
        explicit_index,
        nullable_int,
    }
}

#[test]
fn pointer_plus_int() {
    let f = fixture();
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Add, f.byte_ptr, Idx::I32),
        Some(OperatorSignature {
            kind: OperatorKind::PointerPlusInt,
            op: BinaryOp::Add,
            left: f.byte_ptr,
            right: Idx::I32,
            result: f.byte_ptr,
        })
    );
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Add, Idx::U64, f.byte_ptr)
            .map(|s| (s.kind, s.left, s.result)),
        Some((OperatorKind::IntPlusPointer, Idx::U64, f.byte_ptr))
    );
}

#[test]
fn small_integers_widen_to_i32() {
    let f = fixture();
    for small in [Idx::I8, Idx::U8, Idx::I16, Idx::U16] {
        let sig = resolve_builtin_operator(&f.snapshot, BinaryOp::Sub, f.int_ptr, small);
        assert_eq!(sig.map(|s| (s.kind, s.right)), Some((OperatorKind::PointerMinusInt, Idx::I32)));
    }
}

#[test]
fn rejected_offsets() {
    let f = fixture();
    for bad in [
        Idx::CHAR,
        Idx::BOOL,
        Idx::F32,
        Idx::F64,
        Idx::DECIMAL,
        f.nullable_int,
        f.explicit_index,
    ] {
        assert_eq!(
            resolve_builtin_operator(&f.snapshot, BinaryOp::Add, f.byte_ptr, bad),
            None,
            "{bad:?}"
        );
    }
}

#[test]
fn user_defined_implicit_offset() {
    let f = fixture();
    assert_eq!(int_operand_type(&f.snapshot, f.index), Some(Idx::I64));
    assert_eq!(int_operand_type(&f.snapshot, f.explicit_index), None);
}

#[test]
fn pointer_difference() {
    let f = fixture();
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Sub, f.byte_ptr, f.byte_ptr)
            .map(|s| (s.kind, s.result)),
        Some((OperatorKind::PointerDifference, Idx::I64))
    );
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Sub, f.byte_ptr, f.int_ptr),
        None
    );
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Add, f.byte_ptr, f.byte_ptr),
        None
    );
}

#[test]
fn void_pointer_arithmetic_is_rejected() {
    let f = fixture();
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Add, Idx::VOID_PTR, Idx::I32),
        None
    );
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Sub, Idx::VOID_PTR, Idx::VOID_PTR),
        None
    );
}

#[test]
fn comparisons() {
    let f = fixture();
    let same = resolve_builtin_operator(&f.snapshot, BinaryOp::Lt, f.byte_ptr, f.byte_ptr);
    assert_eq!(same.map(|s| (s.left, s.result)), Some((f.byte_ptr, Idx::BOOL)));

    let mixed = resolve_builtin_operator(&f.snapshot, BinaryOp::Eq, f.byte_ptr, f.int_ptr);
    assert_eq!(mixed.map(|s| s.left), Some(Idx::VOID_PTR));

    let void = resolve_builtin_operator(&f.snapshot, BinaryOp::NotEq, Idx::VOID_PTR, Idx::VOID_PTR);
    assert!(void.is_some());

    let null = resolve_builtin_operator(&f.snapshot, BinaryOp::Eq, Idx::NULL, f.int_ptr);
    assert_eq!(null.map(|s| s.kind), Some(OperatorKind::PointerComparison));

    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Eq, f.int_ptr, Idx::I32),
        None
    );
}

#[test]
fn other_operators_reject_pointers() {
    let f = fixture();
    for op in [
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
        BinaryOp::And,
        BinaryOp::Or,
    ] {
        assert_eq!(
            resolve_builtin_operator(&f.snapshot, op, f.byte_ptr, Idx::I32),
            None
        );
    }
    assert_eq!(
        resolve_builtin_operator(&f.snapshot, BinaryOp::Add, Idx::I32, Idx::I32),
        None
    );
}

proptest! {
    #[test]
    fn additive_result_is_the_pointer(
        int in prop::sample::select(Idx::INTEGRALS.to_vec()),
        pointee in prop::sample::select(vec![Idx::U8, Idx::I32, Idx::F64, Idx::CHAR]),
    ) {
        let mut b = SnapshotBuilder::new();
        let ptr = b.pointer(pointee);
        let snapshot = b.finish().unwrap_or_else(|e| panic!("{e}"));
        for op in [BinaryOp::Add, BinaryOp::Sub] {
            let sig = resolve_builtin_operator(&snapshot, op, ptr, int);
            prop_assert_eq!(sig.map(|s| s.result), Some(ptr));
            prop_assert!(sig.is_some_and(|s| s.kind.is_arithmetic()));
        }
    }
}
