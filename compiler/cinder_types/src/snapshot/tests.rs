use pretty_assertions::assert_eq;

use super::*;

#[test]
fn builds_and_freezes() {
    let mut b = SnapshotBuilder::new();
    let point = b.define_type("Point", DefKind::Struct, 0);
    let x = b.add_field(point, "x", Idx::I32, Span::new(10, 11));
    let point_ty = b.nominal(point);
    let local = b.add_local("p", point_ty);
    b.add_user_conversion(point_ty, Idx::I64, true);
    let base = b.define_type("ArrayBase", DefKind::Class, 0);
    let base_ty = b.nominal(base);
    b.register_well_known(WellKnownType::ArrayBase, base_ty);

    let snapshot = b.finish().unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(snapshot.def(point).map(|d| d.fields.clone()), Some(vec![x]));
    assert_eq!(snapshot.symbol(local).map(Symbol::ty), Some(point_ty));
    assert_eq!(snapshot.symbol_name(x).as_deref(), Some("x"));
    assert_eq!(
        snapshot.conversions_from(point_ty),
        &[UserConversion {
            from: point_ty,
            to: Idx::I64,
            implicit: true
        }]
    );
    assert!(snapshot.conversions_from(Idx::I32).is_empty());
    assert_eq!(snapshot.well_known(WellKnownType::ArrayBase), Some(base_ty));
    assert_eq!(snapshot.well_known(WellKnownType::StringPinHelper), None);
}

#[test]
fn dangling_symbol_type_is_rejected() {
    let mut b = SnapshotBuilder::new();
    b.add_local("ghost", Idx::from_raw(9_999));
    assert!(matches!(
        b.finish(),
        Err(SnapshotError::DanglingType {
            context: "a symbol",
            ..
        })
    ));
}

#[test]
fn applied_arity_is_checked() {
    let mut b = SnapshotBuilder::new();
    let pair = b.define_type("Pair", DefKind::Struct, 2);
    b.applied(pair, &[Idx::I32]);
    assert_eq!(
        b.finish().err(),
        Some(SnapshotError::ArityMismatch {
            def: pair,
            expected: 2,
            found: 1
        })
    );
}

#[test]
fn fixed_buffers_only_in_structs() {
    let mut b = SnapshotBuilder::new();
    let class = b.define_type("Holder", DefKind::Class, 0);
    let field = b.add_fixed_buffer(class, "data", Idx::U8, 8, Span::DUMMY);
    assert_eq!(
        b.finish().err(),
        Some(SnapshotError::FixedBufferOutsideStruct { field })
    );
}

#[test]
fn fixed_buffer_field_has_element_pointer_type() {
    let mut b = SnapshotBuilder::new();
    let s = b.define_type("Packet", DefKind::Struct, 0);
    let field = b.add_fixed_buffer(s, "data", Idx::U8, 8, Span::DUMMY);
    let byte_ptr = b.pointer(Idx::U8);
    let snapshot = b.finish().unwrap_or_else(|e| panic!("{e}"));
    let symbol = snapshot.symbol(field).unwrap_or_else(|| panic!("field missing"));
    assert_eq!(symbol.ty(), byte_ptr);
    assert_eq!(
        symbol.fixed_buffer(),
        Some(FixedBuffer {
            element: Idx::U8,
            length: 8
        })
    );
}

#[test]
fn duplicate_well_known_is_rejected() {
    let mut b = SnapshotBuilder::new();
    b.register_well_known(WellKnownType::StringPinHelper, Idx::OBJECT);
    b.register_well_known(WellKnownType::StringPinHelper, Idx::OBJECT);
    let err = b.finish().err();
    assert_eq!(
        err,
        Some(SnapshotError::DuplicateWellKnown {
            kind: WellKnownType::StringPinHelper
        })
    );
    assert_eq!(
        err.map(|e| e.to_string()),
        Some("well-known type StringPinHelper registered twice".to_string())
    );
}

#[test]
fn identity_conversion_operator_is_rejected() {
    let mut b = SnapshotBuilder::new();
    b.add_user_conversion(Idx::I32, Idx::I32, true);
    assert!(matches!(
        b.finish(),
        Err(SnapshotError::IdentityConversion { from: Idx::I32 })
    ));
}
