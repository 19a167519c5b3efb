use cinder_ir::{BinaryOp, Idx, Span};
use cinder_types::{DefKind, RefKind, SnapshotBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::BodyBuilder;

struct Fixture {
    snapshot: Snapshot,
    point_ty: Idx,
    node_ty: Idx,
    packet_ty: Idx,
    byte_ptr: Idx,
    x: SymbolId,
    value: SymbolId,
    data: SymbolId,
    counter: SymbolId,
    p: SymbolId,
    r: SymbolId,
    arg: SymbolId,
    ref_arg: SymbolId,
    node: SymbolId,
    packet: SymbolId,
    ptr: SymbolId,
}

fn fixture() -> Fixture {
    let mut b = SnapshotBuilder::new();
    let point = b.define_type("Point", DefKind::Struct, 0);
    let x = b.add_field(point, "x", Idx::I32, Span::DUMMY);
    let counter = b.add_static_field(point, "counter", Idx::I32, Span::DUMMY);
    let point_ty = b.nominal(point);

    let node_def = b.define_type("Node", DefKind::Class, 0);
    let value = b.add_field(node_def, "value", Idx::I32, Span::DUMMY);
    let node_ty = b.nominal(node_def);

    let packet_def = b.define_type("Packet", DefKind::Struct, 0);
    let data = b.add_fixed_buffer(packet_def, "data", Idx::U8, 16, Span::DUMMY);
    let packet_ty = b.nominal(packet_def);
    let byte_ptr = b.pointer(Idx::U8);

    let p = b.add_local("p", point_ty);
    let r = b.add_ref_local("r", point_ty);
    let arg = b.add_parameter("arg", Idx::I32, RefKind::Value, Span::DUMMY);
    let ref_arg = b.add_parameter("ref_arg", Idx::I32, RefKind::Ref, Span::DUMMY);
    let node = b.add_local("node", node_ty);
    let packet = b.add_local("packet", packet_ty);
    let ptr = b.add_local("ptr", byte_ptr);

    Fixture {
        snapshot: b.finish().unwrap_or_else(|e| panic!("{e}")),
        point_ty,
        node_ty,
        packet_ty,
        byte_ptr,
        x,
        value,
        data,
        counter,
        p,
        r,
        arg,
        ref_arg,
        node,
        packet,
        ptr,
    }
}

fn stable(root: SymbolId) -> StorageClassification {
    StorageClassification {
        class: StorageClass::Stable,
        root: Some(root),
    }
}

#[test]
fn locals_and_parameters() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let p = body.local(f.p, f.point_ty);
    let r = body.local(f.r, f.point_ty);
    let arg = body.param(f.arg, Idx::I32);
    let ref_arg = body.param(f.ref_arg, Idx::I32);
    let arena = body.finish();

    assert_eq!(classify_storage(&f.snapshot, &arena, p), stable(f.p));
    assert_eq!(classify_storage(&f.snapshot, &arena, arg), stable(f.arg));
    assert_eq!(
        classify_storage(&f.snapshot, &arena, r),
        StorageClassification::MOVEABLE
    );
    assert_eq!(
        classify_storage(&f.snapshot, &arena, ref_arg),
        StorageClassification::MOVEABLE
    );
}

#[test]
fn value_type_fields_follow_the_receiver() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let p = body.local(f.p, f.point_ty);
    let px = body.field(Some(p), f.x, Idx::I32);
    let r = body.local(f.r, f.point_ty);
    let rx = body.field(Some(r), f.x, Idx::I32);
    let arena = body.finish();

    assert_eq!(classify_storage(&f.snapshot, &arena, px), stable(f.p));
    assert_eq!(
        classify_storage(&f.snapshot, &arena, rx).class,
        StorageClass::Moveable
    );
}

#[test]
fn reference_receivers_and_statics_are_moveable() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let node = body.local(f.node, f.node_ty);
    let value = body.field(Some(node), f.value, Idx::I32);
    let p = body.local(f.p, f.point_ty);
    let counter = body.field(Some(p), f.counter, Idx::I32);
    let bare = body.field(None, f.counter, Idx::I32);
    let this = body.this(f.point_ty);
    let arena = body.finish();

    for expr in [value, counter, bare, this] {
        assert_eq!(
            classify_storage(&f.snapshot, &arena, expr),
            StorageClassification::MOVEABLE
        );
    }
}

#[test]
fn pointer_targets_are_stable_without_root() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let ptr = body.local(f.ptr, f.byte_ptr);
    let deref = body.deref(ptr, Idx::U8);
    let zero = body.int(0);
    let element = body.pointer_element(ptr, &[zero], Idx::U8);
    let count = body.int(4);
    let stack = body.stackalloc(Idx::U8, count, f.byte_ptr);
    let arena = body.finish();

    for expr in [deref, element, stack] {
        let class = classify_storage(&f.snapshot, &arena, expr);
        assert_eq!(class, StorageClassification::UNROOTED);
        assert!(class.is_address_stable());
    }
}

#[test]
fn fixed_buffer_elements_follow_the_buffer_receiver() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let packet = body.local(f.packet, f.packet_ty);
    let buffer = body.field(Some(packet), f.data, f.byte_ptr);
    let zero = body.int(0);
    let element = body.pointer_element(buffer, &[zero], Idx::U8);
    let this = body.this(f.packet_ty);
    let this_buffer = body.field(Some(this), f.data, f.byte_ptr);
    let one = body.int(1);
    let this_element = body.pointer_element(this_buffer, &[one], Idx::U8);
    let arena = body.finish();

    assert_eq!(classify_storage(&f.snapshot, &arena, element), stable(f.packet));
    assert_eq!(
        classify_storage(&f.snapshot, &arena, this_element),
        StorageClassification::MOVEABLE
    );
}

#[test]
fn rvalues() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let one = body.int(1);
    let two = body.int(2);
    let sum = body.binary(BinaryOp::Add, one, two, Idx::I32);
    let call = body.call(&[one], Idx::I32);
    let cast = body.cast(two, Idx::I64);
    let arena = body.finish();

    for expr in [one, sum, call, cast] {
        assert_eq!(
            classify_storage(&f.snapshot, &arena, expr),
            StorageClassification::VALUE
        );
    }
}

#[test]
fn classification_is_idempotent() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let p = body.local(f.p, f.point_ty);
    let px = body.field(Some(p), f.x, Idx::I32);
    let node = body.local(f.node, f.node_ty);
    let value = body.field(Some(node), f.value, Idx::I32);
    let arena = body.finish();

    for expr in [p, px, node, value] {
        assert_eq!(
            classify_storage(&f.snapshot, &arena, expr),
            classify_storage(&f.snapshot, &arena, expr)
        );
    }
}

#[test]
fn member_chains_have_paths() {
    let f = fixture();
    let mut body = BodyBuilder::new();
    let node = body.local(f.node, f.node_ty);
    let value = body.field(Some(node), f.value, Idx::I32);
    let node_again = body.local(f.node, f.node_ty);
    let value_again = body.field(Some(node_again), f.value, Idx::I32);
    let p = body.local(f.p, f.point_ty);
    let px = body.field(Some(p), f.x, Idx::I32);
    let this = body.this(f.point_ty);
    let this_x = body.field(Some(this), f.x, Idx::I32);
    let one = body.int(1);
    let arena = body.finish();

    let path = |expr| storage_path(&arena, expr).unwrap_or_else(|| panic!("no path"));
    assert_eq!(path(value), path(value_again));
    assert!(path(value).starts_with(&path(node)));
    assert!(!path(node).starts_with(&path(value)));
    assert!(path(px).starts_with(&path(p)));
    assert!(!path(this_x).starts_with(&path(p)));
    assert_eq!(storage_path(&arena, one), None);
}
