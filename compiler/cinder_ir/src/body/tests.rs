use pretty_assertions::assert_eq;
use smallvec::smallvec;

use super::*;

fn lit(arena: &mut BodyArena, value: i64) -> ExprId {
    arena.alloc_expr(Expr::new(
        ExprKind::Literal(Literal::Int(value)),
        Span::DUMMY,
        Idx::I32,
    ))
}

#[test]
fn alloc_hands_out_dense_ids() {
    let mut arena = BodyArena::new();
    let a = lit(&mut arena, 1);
    let b = lit(&mut arena, 2);
    assert_eq!(a.raw(), 0);
    assert_eq!(b.raw(), 1);
    assert_eq!(arena.expr_count(), 2);

    let stmt = arena.alloc_stmt(Stmt {
        kind: StmtKind::Expr(b),
        span: Span::new(0, 4),
    });
    assert_eq!(arena.stmt(stmt).kind, StmtKind::Expr(b));
}

#[test]
fn const_int_folds_negation_and_casts() {
    let mut arena = BodyArena::new();
    let five = lit(&mut arena, 5);
    let neg = arena.alloc_expr(Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand: five,
        },
        Span::DUMMY,
        Idx::I32,
    ));
    let cast = arena.alloc_expr(Expr::new(
        ExprKind::Cast {
            operand: neg,
            target: Idx::I64,
        },
        Span::DUMMY,
        Idx::I64,
    ));
    assert_eq!(arena.const_int(neg), Some(-5));
    assert_eq!(arena.const_int(cast), Some(-5));
}

fn cast(arena: &mut BodyArena, operand: ExprId, target: Idx) -> ExprId {
    arena.alloc_expr(Expr::new(
        ExprKind::Cast { operand, target },
        Span::DUMMY,
        target,
    ))
}

#[test]
fn const_int_casts_wrap_to_the_target_width() {
    let mut arena = BodyArena::new();
    let all_ones = lit(&mut arena, 4_294_967_295);
    let minus_one = lit(&mut arena, -1);
    let big = lit(&mut arena, 70_000);

    let to_int = cast(&mut arena, all_ones, Idx::I32);
    let to_uint = cast(&mut arena, minus_one, Idx::U32);
    let to_byte = cast(&mut arena, minus_one, Idx::U8);
    let to_sbyte = cast(&mut arena, big, Idx::I8);
    let to_short = cast(&mut arena, big, Idx::I16);
    let to_ulong = cast(&mut arena, minus_one, Idx::U64);
    let to_long = cast(&mut arena, all_ones, Idx::I64);

    assert_eq!(arena.const_int(to_int), Some(-1));
    assert_eq!(arena.const_int(to_uint), Some(4_294_967_295));
    assert_eq!(arena.const_int(to_byte), Some(255));
    assert_eq!(arena.const_int(to_sbyte), Some(112));
    assert_eq!(arena.const_int(to_short), Some(4464));
    assert_eq!(arena.const_int(to_ulong), None);
    assert_eq!(arena.const_int(to_long), Some(4_294_967_295));
}

#[test]
fn const_int_ignores_non_constants() {
    let mut arena = BodyArena::new();
    let x = arena.alloc_expr(Expr::new(
        ExprKind::Local(SymbolId::new(0)),
        Span::DUMMY,
        Idx::I32,
    ));
    let call = arena.alloc_expr(Expr::new(
        ExprKind::Call {
            args: smallvec![x],
        },
        Span::DUMMY,
        Idx::I32,
    ));
    assert_eq!(arena.const_int(x), None);
    assert_eq!(arena.const_int(call), None);
    assert_eq!(arena.const_int(ExprId::INVALID), None);
}

#[test]
fn null_constants() {
    let mut arena = BodyArena::new();
    let null = arena.alloc_expr(Expr::new(
        ExprKind::Literal(Literal::Null),
        Span::DUMMY,
        Idx::NULL,
    ));
    let zero = lit(&mut arena, 0);
    let one = lit(&mut arena, 1);
    assert!(arena.is_null_constant(null));
    assert!(arena.is_null_constant(zero));
    assert!(!arena.is_null_constant(one));
}

#[test]
fn suspendable_callables() {
    assert!(!CallableKind::Regular.is_suspendable());
    assert!(CallableKind::Generator.is_suspendable());
    assert!(CallableKind::Async.is_suspendable());
}
