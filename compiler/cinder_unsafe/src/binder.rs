//! Per-request binding state and the pointer checks on expressions.
//!
//! A [`PointerBinder`] owns the access-scope stack, the closure-capture
//! tracker, and the pin scopes for one bind request. It reports through a
//! [`DiagnosticQueue`] and always recovers: a failed check substitutes
//! [`Idx::ERROR`] and binding continues.
//!
//! Pinning and stack allocation live in `pin.rs` and `stackalloc.rs`; the
//! tree walk that drives everything lives in `walk.rs`.

use cinder_diagnostic::{Diagnostic, DiagnosticQueue};
use cinder_ir::{
    BinaryOp, BodyArena, CallableKind, ClosureKind, ExprId, Idx, Span, SymbolId, UnaryOp,
};
use cinder_types::{TypeData, WellKnownType};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::context::WellKnownLookup;
use crate::storage::{storage_path, StoragePath};
use crate::{
    AccessModeTracker, CaptureTracker, ConversionKind, ConversionSource, OperatorSignature,
    PointerContext, PointerProblem, PointerSyntax, StorageClass, StorageClassification,
};

/// Locals bound by one pin block, the roots their buffers came from, and
/// the variables pinned by `&target` declarators.
#[derive(Clone, Debug, Default)]
pub(crate) struct PinScope {
    pub(crate) locals: FxHashSet<SymbolId>,
    pub(crate) sources: FxHashSet<SymbolId>,
    pub(crate) targets: SmallVec<[StoragePath; 1]>,
}

impl PinScope {
    fn mentions(&self, symbol: SymbolId) -> bool {
        self.locals.contains(&symbol) || self.sources.contains(&symbol)
    }
}

pub struct PointerBinder<'ctx> {
    pub(crate) ctx: &'ctx PointerContext,
    pub(crate) access: AccessModeTracker,
    pub(crate) captures: CaptureTracker,
    pub(crate) pins: Vec<PinScope>,
    diagnostics: DiagnosticQueue,
    /// Spans that already carry a mode problem.
    mode_reported: FxHashSet<Span>,
}

impl<'ctx> PointerBinder<'ctx> {
    pub(crate) fn new(ctx: &'ctx PointerContext) -> Self {
        PointerBinder {
            ctx,
            access: AccessModeTracker::new(ctx.options()),
            captures: CaptureTracker::new(),
            pins: Vec::new(),
            diagnostics: DiagnosticQueue::with_config(ctx.config().diagnostics.clone()),
            mode_reported: FxHashSet::default(),
        }
    }

    pub fn context(&self) -> &'ctx PointerContext {
        self.ctx
    }

    pub fn access(&self) -> &AccessModeTracker {
        &self.access
    }

    /// Finish the request. Diagnostics come back in source order.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diagnostics.flush()
    }

    pub(crate) fn report(&mut self, problem: PointerProblem) {
        tracing::trace!(code = %problem.code(), span = %problem.span(), "pointer problem");
        self.diagnostics.add(problem.into_diagnostic());
    }

    fn report_all(&mut self, problems: impl IntoIterator<Item = PointerProblem>) {
        for problem in problems {
            self.report(problem);
        }
    }

    /// Check that `syntax` is allowed at `span`. At most one mode problem
    /// is reported per span.
    pub(crate) fn require_mode(&mut self, syntax: PointerSyntax, span: Span) {
        if let Some(problem) = self.access.check(syntax, span) {
            if self.mode_reported.insert(span) {
                self.report(problem);
            }
        }
    }

    pub(crate) fn is_tracked(&self, ty: Idx) -> bool {
        ty != Idx::ERROR && self.ctx.classify_tracked_kind(ty).is_tracked()
    }

    /// `Some(ty)` if registered. Only the first miss per snapshot is
    /// reported.
    pub(crate) fn require_well_known(&mut self, kind: WellKnownType, span: Span) -> Option<Idx> {
        match self.ctx.well_known(kind, span) {
            WellKnownLookup::Found(ty) => Some(ty),
            WellKnownLookup::MissingFirst(problem) => {
                self.report(problem);
                None
            }
            WellKnownLookup::MissingReported => None,
        }
    }

    // === Scopes ===

    pub fn enter_type(&mut self, is_unsafe: bool, span: Span) {
        let problem = self.access.enter_type(is_unsafe, span);
        self.report_all(problem);
    }

    pub fn enter_callable(&mut self, kind: CallableKind, is_unsafe: bool, span: Span) {
        let problem = self.access.enter_callable(kind, is_unsafe, span);
        self.report_all(problem);
    }

    pub fn enter_block(&mut self, is_unsafe: bool, span: Span) {
        let problems = self.access.enter_block(is_unsafe, span);
        self.report_all(problems);
    }

    pub fn enter_catch(&mut self) {
        self.access.enter_catch();
    }

    pub fn enter_finally(&mut self) {
        self.access.enter_finally();
    }

    pub fn exit_scope(&mut self) {
        self.access.exit();
    }

    /// Enter a closure or generator body capturing `captures`.
    pub fn enter_closure(&mut self, kind: ClosureKind, captures: &[SymbolId], span: Span) {
        let pinned: SmallVec<[SymbolId; 2]> = captures
            .iter()
            .copied()
            .filter(|&c| self.pins.iter().any(|scope| scope.mentions(c)))
            .collect();
        for local in pinned {
            self.report(PointerProblem::PinnedLocalInClosure { local, span });
        }
        let conflicts = self.captures.enter_closure(kind, captures, span);
        self.report_all(conflicts);
        self.access.enter_closure(kind);
    }

    pub fn exit_closure(&mut self) {
        self.access.exit();
        self.captures.exit_closure();
    }

    // === Types ===

    /// Check a written type. Anything containing a pointer needs pointer
    /// syntax, and no pointer may point at a tracked type.
    pub fn check_pointer_type(&mut self, ty: Idx, span: Span) {
        let ctx = self.ctx;
        let pool = ctx.snapshot().pool();
        if !pool.flags(ty).has_pointer() {
            return;
        }
        self.require_mode(PointerSyntax::PointerType, span);
        self.check_tracked_pointees(ty, span);
    }

    /// Report every tracked type some pointer inside `ty` points at.
    fn check_tracked_pointees(&mut self, ty: Idx, span: Span) {
        let ctx = self.ctx;
        let pool = ctx.snapshot().pool();
        let mut stack: SmallVec<[Idx; 4]> = smallvec::smallvec![ty];
        let mut tracked_pointees: SmallVec<[Idx; 2]> = SmallVec::new();
        while let Some(current) = stack.pop() {
            if !pool.flags(current).has_pointer() {
                continue;
            }
            match pool.data(current) {
                TypeData::Pointer(pointee) => {
                    if self.is_tracked(*pointee) {
                        tracked_pointees.push(*pointee);
                    }
                    stack.push(*pointee);
                }
                TypeData::Array { element, .. } => stack.push(*element),
                TypeData::Nullable(inner) => stack.push(*inner),
                TypeData::Applied { args, .. } => stack.extend(args.iter().copied()),
                TypeData::Primitive(_)
                | TypeData::TypeParam { .. }
                | TypeData::Nominal(_) => {}
            }
        }
        for pointee in tracked_pointees {
            self.report(PointerProblem::TrackedTypeAddressed { ty: pointee, span });
        }
    }

    /// Check a parameter of a callable of `kind`.
    pub fn check_parameter(&mut self, kind: CallableKind, param: SymbolId) {
        let Some(symbol) = self.ctx.snapshot().symbol(param) else {
            return;
        };
        let (ty, span) = (symbol.ty(), symbol.span);
        if kind.is_suspendable() && self.ctx.snapshot().pool().flags(ty).has_pointer() {
            self.report(PointerProblem::PointerParameterInSuspendable { param, span });
            self.check_tracked_pointees(ty, span);
            return;
        }
        self.check_pointer_type(ty, span);
    }

    // === Conversions ===

    /// Convert `expr` to `target`, implicitly unless `explicit`.
    pub fn convert(
        &mut self,
        arena: &BodyArena,
        expr: ExprId,
        target: Idx,
        explicit: bool,
    ) -> ConversionKind {
        let node = arena.expr(expr);
        self.convert_types(node.ty, target, explicit, node.span)
    }

    /// Classify and report a conversion. Error types convert silently to
    /// anything.
    pub fn convert_types(
        &mut self,
        source: Idx,
        target: Idx,
        explicit: bool,
        span: Span,
    ) -> ConversionKind {
        if source == Idx::ERROR || target == Idx::ERROR {
            return ConversionKind::None;
        }
        let kind = self.ctx.classify_conversion(source, target);
        if kind.is_pointer_conversion() {
            self.require_mode(PointerSyntax::Conversion, span);
        }
        match kind {
            ConversionKind::AmbiguousUserDefined => {
                self.report(PointerProblem::AmbiguousUserConversion {
                    source,
                    target,
                    span,
                });
            }
            ConversionKind::None if self.needs_array_base(source, target) => {
                self.require_well_known(WellKnownType::ArrayBase, span);
            }
            _ if !kind.exists() || (!explicit && !kind.is_implicit()) => {
                self.report_no_conversion(ConversionSource::Type(source), target, span);
            }
            _ => {}
        }
        kind
    }

    pub(crate) fn report_no_conversion(
        &mut self,
        source: ConversionSource,
        target: Idx,
        span: Span,
    ) {
        self.report(PointerProblem::ConversionNotFound {
            source,
            target,
            span,
        });
    }

    /// A pointer array paired with a nominal type: only the unregistered
    /// base array type could bridge them.
    fn needs_array_base(&self, source: Idx, target: Idx) -> bool {
        let snapshot = self.ctx.snapshot();
        let pool = snapshot.pool();
        let pointer_array = |ty: Idx| {
            pool.array_element(ty)
                .is_some_and(|(element, _)| pool.is_pointer(element))
        };
        let bridges =
            |array: Idx, other: Idx| pointer_array(array) && pool.nominal_def(other).is_some();
        (bridges(source, target) || bridges(target, source))
            && snapshot.well_known(WellKnownType::ArrayBase).is_none()
    }

    // === Expressions ===

    /// `&operand` at `span`.
    pub fn bind_address_of(
        &mut self,
        arena: &BodyArena,
        operand: ExprId,
        span: Span,
    ) -> StorageClassification {
        self.require_mode(PointerSyntax::AddressOf, span);
        let operand_ty = arena.expr(operand).ty;
        if self.is_tracked(operand_ty) {
            self.report(PointerProblem::TrackedTypeAddressed {
                ty: operand_ty,
                span,
            });
        }
        let mut storage = self.ctx.classify_storage(arena, operand);
        if storage.class == StorageClass::Moveable && self.is_pinned_target(arena, operand) {
            storage.class = StorageClass::Stable;
        }
        match storage.class {
            StorageClass::Value => self.report(PointerProblem::AddressOfNotAllowed { span }),
            StorageClass::Moveable => self.report(PointerProblem::AddressOfNeedsPinning { span }),
            StorageClass::Stable => {
                if let Some(root) = storage.root {
                    let conflict = self.captures.note_address_of(root, span);
                    self.report_all(conflict);
                }
            }
        }
        storage
    }

    /// True while an enclosing pin block holds `expr` or a variable it is
    /// nested in.
    fn is_pinned_target(&self, arena: &BodyArena, expr: ExprId) -> bool {
        let Some(path) = storage_path(arena, expr) else {
            return false;
        };
        self.pins
            .iter()
            .flat_map(|scope| &scope.targets)
            .any(|target| path.starts_with(target))
    }

    /// Pointee of `pointer`, or `Idx::ERROR` after reporting.
    fn require_pointee(&mut self, pointer_ty: Idx, span: Span) -> Idx {
        if pointer_ty == Idx::ERROR {
            return Idx::ERROR;
        }
        match self.ctx.snapshot().pool().pointee(pointer_ty) {
            None => {
                self.report(PointerProblem::PointerExpected {
                    found: pointer_ty,
                    span,
                });
                Idx::ERROR
            }
            Some(Idx::VOID) => {
                self.report(PointerProblem::VoidPointerOperation { span });
                Idx::ERROR
            }
            Some(pointee) => pointee,
        }
    }

    /// `*operand`. Returns the pointee type.
    pub fn bind_deref(&mut self, arena: &BodyArena, operand: ExprId, span: Span) -> Idx {
        self.require_mode(PointerSyntax::Dereference, span);
        self.require_pointee(arena.expr(operand).ty, span)
    }

    /// `pointer->field`. Returns the pointee type.
    pub fn bind_pointer_member(
        &mut self,
        arena: &BodyArena,
        pointer: ExprId,
        span: Span,
    ) -> Idx {
        self.require_mode(PointerSyntax::MemberAccess, span);
        self.require_pointee(arena.expr(pointer).ty, span)
    }

    /// `pointer[index]`. Returns the element type.
    pub fn bind_pointer_element(
        &mut self,
        arena: &BodyArena,
        pointer: ExprId,
        indices: &[ExprId],
        span: Span,
    ) -> Idx {
        self.require_mode(PointerSyntax::ElementAccess, span);
        let element = self.require_pointee(arena.expr(pointer).ty, span);
        if indices.len() != 1 {
            self.report(PointerProblem::PointerIndexArity {
                count: indices.len(),
                span,
            });
            return Idx::ERROR;
        }
        for &index in indices {
            let index = arena.expr(index);
            if index.ty != Idx::ERROR
                && crate::arithmetic::int_operand_type(self.ctx.snapshot(), index.ty).is_none()
            {
                self.report_no_conversion(ConversionSource::Type(index.ty), Idx::I32, index.span);
            }
        }
        element
    }

    /// A binary operator with at least one pointer operand. Returns `None`
    /// when neither operand is a pointer or after reporting.
    pub fn bind_binary(
        &mut self,
        arena: &BodyArena,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        span: Span,
    ) -> Option<OperatorSignature> {
        let (left_ty, right_ty) = (arena.expr(left).ty, arena.expr(right).ty);
        self.bind_binary_types(op, left_ty, right_ty, span)
    }

    fn bind_binary_types(
        &mut self,
        op: BinaryOp,
        left: Idx,
        right: Idx,
        span: Span,
    ) -> Option<OperatorSignature> {
        let ctx = self.ctx;
        let pool = ctx.snapshot().pool();
        if left == Idx::ERROR || right == Idx::ERROR {
            return None;
        }
        if !pool.is_pointer(left) && !pool.is_pointer(right) {
            return None;
        }
        let void_operand = pool.is_void_pointer(left) || pool.is_void_pointer(right);
        if op.is_additive() {
            self.require_mode(PointerSyntax::Arithmetic, span);
        }
        match ctx.resolve_builtin_operator(op, left, right) {
            Some(signature) => Some(signature),
            None if op.is_additive() && void_operand => {
                self.report(PointerProblem::VoidPointerOperation { span });
                None
            }
            None => {
                self.report(PointerProblem::OperatorNotFound {
                    op: op.as_symbol(),
                    left,
                    right: Some(right),
                    span,
                });
                None
            }
        }
    }

    /// A unary operator on a pointer. `++`/`--` reuse the additive rule.
    pub fn bind_unary(
        &mut self,
        arena: &BodyArena,
        op: UnaryOp,
        operand: ExprId,
        span: Span,
    ) -> Option<OperatorSignature> {
        let ty = arena.expr(operand).ty;
        if ty == Idx::ERROR || !self.ctx.snapshot().pool().is_pointer(ty) {
            return None;
        }
        if let Some(step) = op.step_op() {
            return self.bind_binary_types(step, ty, Idx::I32, span);
        }
        self.report(PointerProblem::OperatorNotFound {
            op: op.as_symbol(),
            left: ty,
            right: None,
            span,
        });
        None
    }

    /// `target = value` or `target op= value`.
    pub fn bind_assign(
        &mut self,
        arena: &BodyArena,
        op: Option<BinaryOp>,
        target: ExprId,
        value: ExprId,
        span: Span,
    ) {
        let target_ty = arena.expr(target).ty;
        match op {
            None => {
                self.convert(arena, value, target_ty, false);
            }
            Some(op) => {
                if let Some(signature) = self.bind_binary(arena, op, target, value, span) {
                    if signature.result != target_ty {
                        self.convert_types(signature.result, target_ty, false, span);
                    }
                }
            }
        }
    }

    /// `sizeof(ty)`. Numeric, `bool`, and enum operands are always fine.
    pub fn bind_sizeof(&mut self, ty: Idx, span: Span) {
        if ty == Idx::ERROR
            || ty == Idx::BOOL
            || ty.is_numeric()
            || self.ctx.snapshot().pool().is_enum(ty)
        {
            return;
        }
        self.require_mode(PointerSyntax::SizeOf, span);
        if self.is_tracked(ty) {
            self.report(PointerProblem::TrackedTypeAddressed { ty, span });
        }
    }

    // === Pin blocks ===

    pub fn begin_pin_block(&mut self, span: Span) {
        self.require_mode(PointerSyntax::Pin, span);
        self.pins.push(PinScope::default());
    }

    pub fn end_pin_block(&mut self) {
        let popped = self.pins.pop();
        debug_assert!(popped.is_some(), "unbalanced pin block");
    }
}

impl std::fmt::Debug for PointerBinder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerBinder")
            .field("access", &self.access)
            .field("captures", &self.captures)
            .field("pins", &self.pins.len())
            .finish_non_exhaustive()
    }
}
