//! Helpers shared by unit and integration tests.

use std::sync::Once;

use cinder_ir::{
    BinaryOp, BodyArena, Callable, CallableKind, ClosureKind, DeclaredType, Expr, ExprId,
    ExprKind, Idx, Literal, Name, PinDeclarator, Span, Stmt, StmtId, StmtKind, SymbolId, UnaryOp,
};
use smallvec::SmallVec;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for test debugging.
///
/// Safe to call from every test. Enable with
/// `RUST_LOG=cinder_unsafe=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// Builds a [`BodyArena`] the way the resolver would, giving every node its
/// own increasing span.
#[derive(Debug, Default)]
pub struct BodyBuilder {
    arena: BodyArena,
    next_pos: u32,
}

impl BodyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arena(&self) -> &BodyArena {
        &self.arena
    }

    pub fn finish(self) -> BodyArena {
        self.arena
    }

    pub fn fresh_span(&mut self) -> Span {
        let start = self.next_pos;
        self.next_pos += 4;
        Span::new(start, start + 2)
    }

    pub fn span_of(&self, id: ExprId) -> Span {
        self.arena.expr(id).span
    }

    pub fn stmt_span(&self, id: StmtId) -> Span {
        self.arena.stmt(id).span
    }

    // === Expressions ===

    pub fn expr(&mut self, kind: ExprKind, ty: Idx) -> ExprId {
        let span = self.fresh_span();
        self.arena.alloc_expr(Expr::new(kind, span, ty))
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Int(value)), Idx::I32)
    }

    pub fn long(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Int(value)), Idx::I64)
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Float(value.to_bits())), Idx::F64)
    }

    pub fn null(&mut self) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Null), Idx::NULL)
    }

    pub fn string(&mut self) -> ExprId {
        self.expr(ExprKind::Literal(Literal::Str(Name::EMPTY)), Idx::STRING)
    }

    pub fn local(&mut self, symbol: SymbolId, ty: Idx) -> ExprId {
        self.expr(ExprKind::Local(symbol), ty)
    }

    pub fn param(&mut self, symbol: SymbolId, ty: Idx) -> ExprId {
        self.expr(ExprKind::Parameter(symbol), ty)
    }

    pub fn this(&mut self, ty: Idx) -> ExprId {
        self.expr(ExprKind::This, ty)
    }

    pub fn field(&mut self, receiver: Option<ExprId>, field: SymbolId, ty: Idx) -> ExprId {
        self.expr(ExprKind::Field { receiver, field }, ty)
    }

    /// `&operand`, typed as `pointer_ty`.
    pub fn address_of(&mut self, operand: ExprId, pointer_ty: Idx) -> ExprId {
        self.expr(ExprKind::AddressOf(operand), pointer_ty)
    }

    pub fn deref(&mut self, operand: ExprId, ty: Idx) -> ExprId {
        self.expr(ExprKind::Deref(operand), ty)
    }

    pub fn pointer_member(&mut self, pointer: ExprId, field: SymbolId, ty: Idx) -> ExprId {
        self.expr(ExprKind::PointerMember { pointer, field }, ty)
    }

    pub fn pointer_element(&mut self, pointer: ExprId, indices: &[ExprId], ty: Idx) -> ExprId {
        let indices = SmallVec::from_slice(indices);
        self.expr(ExprKind::PointerElement { pointer, indices }, ty)
    }

    pub fn array_element(&mut self, array: ExprId, indices: &[ExprId], ty: Idx) -> ExprId {
        let indices = SmallVec::from_slice(indices);
        self.expr(ExprKind::ArrayElement { array, indices }, ty)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId, ty: Idx) -> ExprId {
        self.expr(ExprKind::Unary { op, operand }, ty)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId, ty: Idx) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right }, ty)
    }

    pub fn assign(
        &mut self,
        op: Option<BinaryOp>,
        target: ExprId,
        value: ExprId,
        ty: Idx,
    ) -> ExprId {
        self.expr(ExprKind::Assign { op, target, value }, ty)
    }

    pub fn conditional(
        &mut self,
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
        ty: Idx,
    ) -> ExprId {
        self.expr(
            ExprKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
            ty,
        )
    }

    pub fn cast(&mut self, operand: ExprId, target: Idx) -> ExprId {
        self.expr(ExprKind::Cast { operand, target }, target)
    }

    pub fn call(&mut self, args: &[ExprId], ty: Idx) -> ExprId {
        let args = SmallVec::from_slice(args);
        self.expr(ExprKind::Call { args }, ty)
    }

    pub fn new_array(&mut self, element: Idx, count: ExprId, ty: Idx) -> ExprId {
        self.expr(ExprKind::NewArray { element, count }, ty)
    }

    /// `stackalloc element[count]`, typed as `pointer_ty`.
    pub fn stackalloc(&mut self, element: Idx, count: ExprId, pointer_ty: Idx) -> ExprId {
        self.expr(ExprKind::StackAlloc { element, count }, pointer_ty)
    }

    pub fn size_of(&mut self, ty: Idx) -> ExprId {
        self.expr(ExprKind::SizeOf(ty), Idx::I32)
    }

    pub fn closure(&mut self, kind: ClosureKind, captures: &[SymbolId], body: StmtId) -> ExprId {
        let captures = SmallVec::from_slice(captures);
        self.expr(
            ExprKind::Closure {
                kind,
                captures,
                body,
            },
            Idx::OBJECT,
        )
    }

    // === Statements ===

    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.fresh_span();
        self.arena.alloc_stmt(Stmt { kind, span })
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn let_stmt(&mut self, local: SymbolId, init: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Local { local, init })
    }

    pub fn block(&mut self, stmts: Vec<StmtId>) -> StmtId {
        self.stmt(StmtKind::Block(stmts))
    }

    pub fn unsafe_block(&mut self, body: StmtId) -> StmtId {
        self.stmt(StmtKind::Unsafe(body))
    }

    pub fn pin_decl(
        &mut self,
        local: SymbolId,
        declared: DeclaredType,
        init: Option<ExprId>,
    ) -> PinDeclarator {
        PinDeclarator {
            local,
            declared,
            init,
            span: self.fresh_span(),
        }
    }

    pub fn pin(&mut self, declarators: Vec<PinDeclarator>, body: StmtId) -> StmtId {
        self.stmt(StmtKind::Pin { declarators, body })
    }

    pub fn try_stmt(
        &mut self,
        body: StmtId,
        catch: Option<StmtId>,
        finally: Option<StmtId>,
    ) -> StmtId {
        self.stmt(StmtKind::Try {
            body,
            catch,
            finally,
        })
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(value))
    }

    pub fn callable(
        &mut self,
        kind: CallableKind,
        is_unsafe: bool,
        params: Vec<SymbolId>,
        body: StmtId,
    ) -> Callable {
        Callable {
            name: Name::EMPTY,
            kind,
            is_unsafe,
            params,
            body: Some(body),
            span: self.fresh_span(),
        }
    }
}
