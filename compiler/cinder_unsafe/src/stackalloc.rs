//! `stackalloc T[count]`.

use cinder_ir::{BodyArena, ExprId, ExprKind, Idx};

use crate::{PointerBinder, PointerProblem, PointerSyntax, StackAllocFault};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StackAllocation {
    /// `T*`, as typed by the resolver.
    pub pointer_ty: Idx,
    pub element: Idx,
    /// The count, when it is a compile-time constant.
    pub length: Option<i64>,
}

impl PointerBinder<'_> {
    /// Bind a stack allocation expression. A constant count of zero is a
    /// valid, empty region.
    #[tracing::instrument(level = "trace", skip_all, fields(expr = ?expr))]
    pub fn bind_stackalloc(&mut self, arena: &BodyArena, expr: ExprId) -> StackAllocation {
        let node = arena.expr(expr);
        let ExprKind::StackAlloc { element, count } = node.kind else {
            tracing::trace!("not a stack allocation");
            return StackAllocation {
                pointer_ty: Idx::ERROR,
                element: Idx::ERROR,
                length: None,
            };
        };
        let span = node.span;

        self.require_mode(PointerSyntax::StackAlloc, span);
        if self.access.in_handler_block() {
            self.report(PointerProblem::StackAllocInvalid {
                fault: StackAllocFault::HandlerBlock,
                span,
            });
        }
        if self.is_tracked(element) {
            self.report(PointerProblem::TrackedTypeAddressed { ty: element, span });
        }

        self.convert(arena, count, Idx::I32, false);
        let length = arena.const_int(count);
        if length.is_some_and(|n| n < 0) {
            self.report(PointerProblem::StackAllocInvalid {
                fault: StackAllocFault::NegativeSize,
                span: arena.expr(count).span,
            });
        }

        StackAllocation {
            pointer_ty: node.ty,
            element,
            length,
        }
    }
}
