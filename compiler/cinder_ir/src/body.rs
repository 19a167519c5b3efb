//! The bound tree handed to the pointer-safety engine.
//!
//! Name resolution and overload resolution have already run: every
//! expression carries its resolved type, and names are [`SymbolId`]s into the
//! snapshot's symbol table. Nodes live in a [`BodyArena`] and refer to each
//! other by [`ExprId`] / [`StmtId`].

use smallvec::SmallVec;

use crate::{BinaryOp, ExprId, Idx, Name, Span, StmtId, SymbolId, UnaryOp};

/// A literal value. Only the shapes the engine inspects keep their payload.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Char(char),
    /// Stored as raw bits so the literal stays `Eq + Hash`.
    Float(u64),
    Str(Name),
    Null,
}

/// How a closure-like body runs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClosureKind {
    Lambda,
    /// A generator or async closure: its body is suspendable.
    Suspendable,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ExprKind {
    Literal(Literal),
    Local(SymbolId),
    Parameter(SymbolId),
    This,
    /// `receiver.field`, or a bare static field when `receiver` is `None`.
    Field {
        receiver: Option<ExprId>,
        field: SymbolId,
    },
    /// `&operand`
    AddressOf(ExprId),
    /// `*operand`
    Deref(ExprId),
    /// `pointer->field`
    PointerMember {
        pointer: ExprId,
        field: SymbolId,
    },
    /// `pointer[i]`, including element access on a fixed-size buffer field.
    PointerElement {
        pointer: ExprId,
        indices: SmallVec<[ExprId; 2]>,
    },
    /// `array[i, ..]` on a managed array.
    ArrayElement {
        array: ExprId,
        indices: SmallVec<[ExprId; 2]>,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        op: Option<BinaryOp>,
        target: ExprId,
        value: ExprId,
    },
    Conditional {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    /// `(target) operand`
    Cast {
        operand: ExprId,
        target: Idx,
    },
    Call {
        args: SmallVec<[ExprId; 4]>,
    },
    New {
        args: SmallVec<[ExprId; 4]>,
    },
    NewArray {
        element: Idx,
        count: ExprId,
    },
    /// `stackalloc element[count]`
    StackAlloc {
        element: Idx,
        count: ExprId,
    },
    SizeOf(Idx),
    /// A lambda or generator closure. `captures` lists the outer symbols it
    /// closes over, as computed by the external binder.
    Closure {
        kind: ClosureKind,
        captures: SmallVec<[SymbolId; 4]>,
        body: StmtId,
    },
    Error,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Idx,
}

impl Expr {
    #[inline]
    pub fn new(kind: ExprKind, span: Span, ty: Idx) -> Self {
        Expr { kind, span, ty }
    }
}

/// Declared type of a pin declarator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclaredType {
    Explicit(Idx),
    /// The inferred-type placeholder (`var`).
    Inferred,
}

/// One `T* p = init` inside a pin block.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PinDeclarator {
    pub local: SymbolId,
    pub declared: DeclaredType,
    pub init: Option<ExprId>,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum StmtKind {
    Expr(ExprId),
    /// Local declaration; the declared type is the symbol's type.
    Local {
        local: SymbolId,
        init: Option<ExprId>,
    },
    Block(Vec<StmtId>),
    /// `unsafe { .. }`
    Unsafe(StmtId),
    /// `pin (T* a = .., T* b = ..) body`
    Pin {
        declarators: Vec<PinDeclarator>,
        body: StmtId,
    },
    Try {
        body: StmtId,
        catch: Option<StmtId>,
        finally: Option<StmtId>,
    },
    Return(Option<ExprId>),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Flat storage for one callable body.
#[derive(Clone, Default, Debug)]
pub struct BodyArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl BodyArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(u32::try_from(self.exprs.len()).unwrap_or(u32::MAX));
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(u32::try_from(self.stmts.len()).unwrap_or(u32::MAX));
        self.stmts.push(stmt);
        id
    }

    /// Get an expression by id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    #[track_caller]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Get a statement by id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    #[track_caller]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn try_expr(&self, id: ExprId) -> Option<&Expr> {
        self.exprs.get(id.index())
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    /// Evaluate `id` as a compile-time integer, if it is one.
    ///
    /// Only integer literals, negation, unary plus, and integral casts of
    /// those are folded. A cast wraps to its target width; a value that
    /// does not fit the `i64` result after a `ulong` cast is not folded.
    pub fn const_int(&self, id: ExprId) -> Option<i64> {
        match &self.try_expr(id)?.kind {
            ExprKind::Literal(Literal::Int(value)) => Some(*value),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => self.const_int(*operand)?.checked_neg(),
            ExprKind::Unary {
                op: UnaryOp::Plus,
                operand,
            } => self.const_int(*operand),
            ExprKind::Cast { operand, target } if target.is_integral() => {
                wrap_to_width(*target, self.const_int(*operand)?)
            }
            _ => None,
        }
    }

    /// True for the `null` literal and the integer constant zero.
    pub fn is_null_constant(&self, id: ExprId) -> bool {
        match self.try_expr(id).map(|e| &e.kind) {
            Some(ExprKind::Literal(Literal::Null)) => true,
            Some(_) => self.const_int(id) == Some(0),
            None => false,
        }
    }
}

/// Reinterpret `value` in the integral type `target`, two's-complement.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "truncation is the semantics of a narrowing integral cast"
)]
fn wrap_to_width(target: Idx, value: i64) -> Option<i64> {
    Some(match target {
        Idx::I8 => i64::from(value as i8),
        Idx::U8 => i64::from(value as u8),
        Idx::I16 => i64::from(value as i16),
        Idx::U16 => i64::from(value as u16),
        Idx::I32 => i64::from(value as i32),
        Idx::U32 => i64::from(value as u32),
        Idx::U64 => return i64::try_from(value as u64).ok(),
        _ => value,
    })
}

/// How a callable body executes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CallableKind {
    Regular,
    Generator,
    Async,
}

impl CallableKind {
    /// Generators and async bodies are rewritten into state machines, so
    /// their locals do not live on a stable stack frame.
    #[inline]
    pub const fn is_suspendable(self) -> bool {
        matches!(self, CallableKind::Generator | CallableKind::Async)
    }
}

/// A method, constructor, accessor, or free function body.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Callable {
    pub name: Name,
    pub kind: CallableKind,
    /// Declared with the `unsafe` modifier.
    pub is_unsafe: bool,
    pub params: Vec<SymbolId>,
    pub body: Option<StmtId>,
    pub span: Span,
}

#[cfg(test)]
mod tests;
