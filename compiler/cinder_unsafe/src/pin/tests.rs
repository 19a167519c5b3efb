use std::sync::Arc;

use cinder_diagnostic::{Diagnostic, DiagnosticArg, ErrorCode};
use cinder_ir::{CallableKind, ClosureKind};
use cinder_types::{DefKind, Snapshot, SnapshotBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::BodyBuilder;
use crate::{CompilationOptions, EngineConfig, PointerContext};

struct Fixture {
    snapshot: Snapshot,
    int_ptr: Idx,
    char_ptr: Idx,
    byte_ptr: Idx,
    node_ty: Idx,
    int_array: Idx,
    node_array: Idx,
    short_array: Idx,
    value: SymbolId,
    x: SymbolId,
    s: SymbolId,
    arr: SymbolId,
    nodes: SymbolId,
    shorts: SymbolId,
    n: SymbolId,
    bp: SymbolId,
    p: SymbolId,
    q: SymbolId,
}

fn fixture(with_string_helper: bool) -> Fixture {
    let mut b = SnapshotBuilder::new();
    let int_ptr = b.pointer(Idx::I32);
    let char_ptr = b.pointer(Idx::CHAR);
    let byte_ptr = b.pointer(Idx::U8);
    let node = b.define_type("Node", DefKind::Class, 0);
    let value = b.add_field(node, "value", Idx::I32, Span::DUMMY);
    let node_ty = b.nominal(node);
    let int_array = b.array(Idx::I32, 1);
    let node_array = b.array(node_ty, 1);
    let short_array = b.array(Idx::I16, 1);
    if with_string_helper {
        let helper = b.define_type("StringPin", DefKind::Class, 0);
        let helper_ty = b.nominal(helper);
        b.register_well_known(WellKnownType::StringPinHelper, helper_ty);
    }

    let x = b.add_local("x", Idx::I32);
    let s = b.add_local("s", Idx::STRING);
    let arr = b.add_local("arr", int_array);
    let nodes = b.add_local("nodes", node_array);
    let shorts = b.add_local("shorts", short_array);
    let n = b.add_local("n", node_ty);
    let bp = b.add_local("bp", byte_ptr);
    let p = b.add_local("p", int_ptr);
    let q = b.add_local("q", char_ptr);

    Fixture {
        snapshot: b.finish().unwrap_or_else(|e| panic!("{e}")),
        int_ptr,
        char_ptr,
        byte_ptr,
        node_ty,
        int_array,
        node_array,
        short_array,
        value,
        x,
        s,
        arr,
        nodes,
        shorts,
        n,
        bp,
        p,
        q,
    }
}

fn context(snapshot: Snapshot) -> PointerContext {
    PointerContext::new(
        Arc::new(snapshot),
        CompilationOptions::default(),
        EngineConfig::unlimited(),
    )
}

fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
    diagnostics.iter().map(|d| d.code).collect()
}

fn pin_binder(ctx: &PointerContext) -> PointerBinder<'_> {
    let mut binder = ctx.binder();
    binder.enter_callable(CallableKind::Regular, true, Span::DUMMY);
    binder.begin_pin_block(Span::DUMMY);
    binder
}

#[test]
fn address_of_local() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let x = body.local(f.x, Idx::I32);
    let init = body.address_of(x, f.int_ptr);
    let decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(init));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    let pinned = binder.bind_pin_declarator(&arena, &decl);
    assert_eq!(
        pinned,
        PinnedLocal {
            local: f.p,
            pointer_ty: f.int_ptr,
            source: PinSource::Address { root: Some(f.x) },
        }
    );
    assert!(binder.pins.last().is_some_and(|s| s.locals.contains(&f.p)));
    assert!(binder.finish().is_empty());
}

#[test]
fn moveable_target_becomes_stable() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let n = body.local(f.n, f.node_ty);
    let field = body.field(Some(n), f.value, Idx::I32);
    let init = body.address_of(field, f.int_ptr);
    let decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(init));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    let pinned = binder.bind_pin_declarator(&arena, &decl);
    assert_eq!(pinned.source, PinSource::Address { root: None });
    assert!(binder.finish().is_empty());
}

#[test]
fn address_of_rejections() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let one = body.int(1);
    let value_init = body.address_of(one, f.int_ptr);
    let value_decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(value_init));
    let n = body.local(f.n, f.node_ty);
    let tracked_init = body.address_of(n, Idx::ERROR);
    let tracked_decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(tracked_init));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    assert_eq!(
        binder.bind_pin_declarator(&arena, &value_decl).source,
        PinSource::Invalid
    );
    assert_eq!(
        binder.bind_pin_declarator(&arena, &tracked_decl).source,
        PinSource::Invalid
    );
    assert_eq!(
        codes(&binder.finish()),
        vec![ErrorCode::E7007, ErrorCode::E7004]
    );
}

#[test]
fn address_problems_are_all_reported() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let make = body.call(&[], f.node_ty);
    let tracked_value = body.address_of(make, Idx::ERROR);
    let tracked_decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(tracked_value));
    let one = body.int(1);
    let wrong_ptr = body.address_of(one, f.byte_ptr);
    let wrong_decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(wrong_ptr));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    binder.bind_pin_declarator(&arena, &tracked_decl);
    binder.bind_pin_declarator(&arena, &wrong_decl);
    assert_eq!(
        codes(&binder.finish()),
        vec![
            ErrorCode::E7004,
            ErrorCode::E7007,
            ErrorCode::E7007,
            ErrorCode::E7005
        ]
    );
}

#[test]
fn pinned_target_is_stable_until_the_block_ends() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let n = body.local(f.n, f.node_ty);
    let field = body.field(Some(n), f.value, Idx::I32);
    let init = body.address_of(field, f.int_ptr);
    let decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(init));
    let n_again = body.local(f.n, f.node_ty);
    let inside = body.field(Some(n_again), f.value, Idx::I32);
    let after = body.field(Some(n_again), f.value, Idx::I32);
    let arena = body.finish();
    let (inside_span, after_span) = (Span::new(600, 602), Span::new(700, 702));

    let mut binder = pin_binder(&ctx);
    binder.bind_pin_declarator(&arena, &decl);
    let storage = binder.bind_address_of(&arena, inside, inside_span);
    assert!(storage.is_address_stable());
    binder.end_pin_block();
    let storage = binder.bind_address_of(&arena, after, after_span);
    assert_eq!(storage.class, StorageClass::Moveable);

    let diagnostics = binder.finish();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::E7008]);
    assert_eq!(diagnostics[0].primary_span(), Some(after_span));
}

#[test]
fn declared_type_must_be_an_explicit_pointer() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let x = body.local(f.x, Idx::I32);
    let init = body.address_of(x, f.int_ptr);
    let inferred = body.pin_decl(f.p, DeclaredType::Inferred, Some(init));
    let not_pointer = body.pin_decl(f.p, DeclaredType::Explicit(Idx::I32), Some(init));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    let pinned = binder.bind_pin_declarator(&arena, &inferred);
    assert_eq!(pinned.pointer_ty, Idx::ERROR);
    binder.bind_pin_declarator(&arena, &not_pointer);
    let diagnostics = binder.finish();
    assert_eq!(
        codes(&diagnostics),
        vec![ErrorCode::E7016, ErrorCode::E7016]
    );
    assert_eq!(diagnostics[0].args.as_slice(), &[DiagnosticArg::Token("var")]);
    assert_eq!(diagnostics[1].args.as_slice(), &[DiagnosticArg::Type(Idx::I32)]);
}

#[test]
fn initializer_is_required() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), None);
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    assert_eq!(
        binder.bind_pin_declarator(&arena, &decl).source,
        PinSource::Invalid
    );
    assert_eq!(codes(&binder.finish()), vec![ErrorCode::E7015]);
}

#[test]
fn nothing_to_pin() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let null = body.null();
    let zero = body.int(0);
    let bp = body.local(f.bp, f.byte_ptr);
    let decls = [
        body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(null)),
        body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(zero)),
        body.pin_decl(f.p, DeclaredType::Explicit(f.byte_ptr), Some(bp)),
    ];
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    for decl in &decls {
        assert_eq!(
            binder.bind_pin_declarator(&arena, decl).source,
            PinSource::Invalid
        );
    }
    let diagnostics = binder.finish();
    assert_eq!(
        codes(&diagnostics),
        vec![ErrorCode::E7009, ErrorCode::E7009, ErrorCode::E7009]
    );
    assert_eq!(
        diagnostics[0].args.as_slice(),
        &[DiagnosticArg::Token("nothing to pin")]
    );
    assert_eq!(
        diagnostics[2].args.as_slice(),
        &[DiagnosticArg::Token("already a pointer")]
    );
}

#[test]
fn string_pins_its_characters() {
    let f = fixture(true);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let s = body.local(f.s, Idx::STRING);
    let good = body.pin_decl(f.q, DeclaredType::Explicit(f.char_ptr), Some(s));
    let to_void = body.pin_decl(f.q, DeclaredType::Explicit(Idx::VOID_PTR), Some(s));
    let bad = body.pin_decl(f.bp, DeclaredType::Explicit(f.byte_ptr), Some(s));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    assert_eq!(
        binder.bind_pin_declarator(&arena, &good).source,
        PinSource::StringChars { root: Some(f.s) }
    );
    binder.bind_pin_declarator(&arena, &to_void);
    assert!(binder.pins.last().is_some_and(|scope| scope.sources.contains(&f.s)));
    binder.bind_pin_declarator(&arena, &bad);
    let diagnostics = binder.finish();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::E7005]);
    assert_eq!(
        diagnostics[0].args.as_slice(),
        &[
            DiagnosticArg::Type(f.char_ptr),
            DiagnosticArg::Type(f.byte_ptr)
        ]
    );
}

#[test]
fn string_pin_without_helper_reports_once() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let s = body.local(f.s, Idx::STRING);
    let first = body.pin_decl(f.q, DeclaredType::Explicit(f.char_ptr), Some(s));
    let second = body.pin_decl(f.q, DeclaredType::Explicit(f.char_ptr), Some(s));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    assert_eq!(
        binder.bind_pin_declarator(&arena, &first).source,
        PinSource::Invalid
    );
    binder.bind_pin_declarator(&arena, &second);
    assert_eq!(codes(&binder.finish()), vec![ErrorCode::E7019]);
}

#[test]
fn string_pin_without_helper_still_checks_the_pointer() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let s = body.local(f.s, Idx::STRING);
    let decl = body.pin_decl(f.bp, DeclaredType::Explicit(f.byte_ptr), Some(s));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    assert_eq!(
        binder.bind_pin_declarator(&arena, &decl).source,
        PinSource::Invalid
    );
    assert_eq!(
        codes(&binder.finish()),
        vec![ErrorCode::E7019, ErrorCode::E7005]
    );
}

#[test]
fn arrays_pin_their_elements() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let arr = body.local(f.arr, f.int_array);
    let nodes = body.local(f.nodes, f.node_array);
    let shorts = body.local(f.shorts, f.short_array);
    let ints = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(arr));
    let tracked = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(nodes));
    let shorts_void = body.pin_decl(f.p, DeclaredType::Explicit(Idx::VOID_PTR), Some(shorts));
    let shorts_int = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(shorts));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    assert_eq!(
        binder.bind_pin_declarator(&arena, &ints).source,
        PinSource::ArrayElements {
            element: Idx::I32,
            root: Some(f.arr)
        }
    );
    assert_eq!(
        binder.bind_pin_declarator(&arena, &tracked).source,
        PinSource::Invalid
    );
    binder.bind_pin_declarator(&arena, &shorts_void);
    binder.bind_pin_declarator(&arena, &shorts_int);

    let diagnostics = binder.finish();
    assert_eq!(
        codes(&diagnostics),
        vec![ErrorCode::E7004, ErrorCode::E7005, ErrorCode::E7005]
    );
    // The tracked element type does not stop the declared-type check.
    assert_eq!(
        diagnostics[1].args.as_slice(),
        &[
            DiagnosticArg::PointerTo(f.node_ty),
            DiagnosticArg::Type(f.int_ptr)
        ]
    );
    assert_eq!(
        diagnostics[2].args.as_slice(),
        &[
            DiagnosticArg::PointerTo(Idx::I16),
            DiagnosticArg::Type(f.int_ptr)
        ]
    );
}

#[test]
fn other_initializers_do_not_convert() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let x = body.local(f.x, Idx::I32);
    let decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(x));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    binder.bind_pin_declarator(&arena, &decl);
    assert_eq!(codes(&binder.finish()), vec![ErrorCode::E7005]);
}

#[test]
fn captured_pin_target_conflicts_at_the_declarator() {
    let f = fixture(false);
    let ctx = context(f.snapshot);
    let mut body = BodyBuilder::new();
    let x = body.local(f.x, Idx::I32);
    let init = body.address_of(x, f.int_ptr);
    let decl = body.pin_decl(f.p, DeclaredType::Explicit(f.int_ptr), Some(init));
    let arena = body.finish();

    let mut binder = pin_binder(&ctx);
    binder.bind_pin_declarator(&arena, &decl);
    binder.enter_closure(ClosureKind::Lambda, &[f.x], Span::new(500, 510));
    binder.exit_closure();
    binder.enter_closure(ClosureKind::Lambda, &[f.x], Span::new(520, 530));
    binder.exit_closure();

    let diagnostics = binder.finish();
    assert_eq!(codes(&diagnostics), vec![ErrorCode::E7010]);
    assert_eq!(diagnostics[0].primary_span(), Some(decl.span));
}
