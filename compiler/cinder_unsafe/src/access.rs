//! Lexical tracking of where pointer syntax is permitted.
//!
//! The binder pushes one [`AccessScope`] per type declaration, callable,
//! closure, `unsafe` block, and exception handler, and pops it on the way
//! out. The nearest frame answers every query.
//!
//! - `unsafe` on a type: every member inherits it
//! - `unsafe` on a callable or block: only that body
//! - generator and async bodies reject pointer syntax even inside `unsafe`

use bitflags::bitflags;
use cinder_ir::{CallableKind, ClosureKind, Span};
use smallvec::SmallVec;

use crate::{CompilationOptions, PointerProblem};

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ScopeFlags: u8 {
        /// Pointer syntax is enabled here.
        const UNSAFE = 1 << 0;
        /// Inside a generator or async body.
        const SUSPENDABLE = 1 << 1;
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    Type,
    Callable,
    Closure,
    Block,
    Catch,
    Finally,
}

impl ScopeKind {
    /// Handler searches stop at these.
    #[inline]
    const fn is_body_boundary(self) -> bool {
        matches!(self, ScopeKind::Type | ScopeKind::Callable | ScopeKind::Closure)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct AccessScope {
    pub kind: ScopeKind,
    pub flags: ScopeFlags,
}

impl AccessScope {
    #[inline]
    pub fn allows_pointer_syntax(self) -> bool {
        self.flags.contains(ScopeFlags::UNSAFE)
    }

    #[inline]
    pub fn is_suspendable_body(self) -> bool {
        self.flags.contains(ScopeFlags::SUSPENDABLE)
    }
}

/// A construct that needs pointer syntax to be enabled.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PointerSyntax {
    PointerType,
    AddressOf,
    Dereference,
    MemberAccess,
    ElementAccess,
    Arithmetic,
    Pin,
    StackAlloc,
    SizeOf,
    Conversion,
    UnsafeBlock,
}

impl PointerSyntax {
    pub const fn as_str(self) -> &'static str {
        match self {
            PointerSyntax::PointerType => "pointer type",
            PointerSyntax::AddressOf => "&",
            PointerSyntax::Dereference => "*",
            PointerSyntax::MemberAccess => "->",
            PointerSyntax::ElementAccess => "[]",
            PointerSyntax::Arithmetic => "pointer arithmetic",
            PointerSyntax::Pin => "pin",
            PointerSyntax::StackAlloc => "stackalloc",
            PointerSyntax::SizeOf => "sizeof",
            PointerSyntax::Conversion => "pointer conversion",
            PointerSyntax::UnsafeBlock => "unsafe",
        }
    }
}

/// Stack of [`AccessScope`]s for one bind request.
#[derive(Clone, Debug, Default)]
pub struct AccessModeTracker {
    options: CompilationOptions,
    frames: Vec<AccessScope>,
}

impl AccessModeTracker {
    pub fn new(options: CompilationOptions) -> Self {
        AccessModeTracker {
            options,
            frames: Vec::new(),
        }
    }

    #[inline]
    pub fn current(&self) -> Option<AccessScope> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn inherited(&self) -> ScopeFlags {
        self.current().map_or(ScopeFlags::empty(), |scope| scope.flags)
    }

    fn push(&mut self, kind: ScopeKind, flags: ScopeFlags) {
        tracing::trace!(?kind, ?flags, depth = self.frames.len(), "enter scope");
        self.frames.push(AccessScope { kind, flags });
    }

    fn gate_unsafe(&self, is_unsafe: bool, span: Span) -> Option<PointerProblem> {
        (is_unsafe && !self.options.allow_unsafe)
            .then_some(PointerProblem::UnsafeNotPermitted { span })
    }

    /// Enter a type declaration. Types never run suspended.
    pub fn enter_type(&mut self, is_unsafe: bool, span: Span) -> Option<PointerProblem> {
        let mut flags = self.inherited() & ScopeFlags::UNSAFE;
        if is_unsafe {
            flags.insert(ScopeFlags::UNSAFE);
        }
        self.push(ScopeKind::Type, flags);
        self.gate_unsafe(is_unsafe, span)
    }

    pub fn enter_callable(
        &mut self,
        kind: CallableKind,
        is_unsafe: bool,
        span: Span,
    ) -> Option<PointerProblem> {
        let mut flags = self.inherited();
        if is_unsafe {
            flags.insert(ScopeFlags::UNSAFE);
        }
        flags.set(ScopeFlags::SUSPENDABLE, kind.is_suspendable());
        self.push(ScopeKind::Callable, flags);
        self.gate_unsafe(is_unsafe, span)
    }

    /// Closures inherit the mode of their surroundings but decide
    /// suspendability for themselves.
    pub fn enter_closure(&mut self, kind: ClosureKind) {
        let mut flags = self.inherited();
        flags.set(ScopeFlags::SUSPENDABLE, kind == ClosureKind::Suspendable);
        self.push(ScopeKind::Closure, flags);
    }

    /// Enter a block. An `unsafe` block inside a suspendable body is
    /// rejected on top of the compilation-option gate.
    pub fn enter_block(&mut self, is_unsafe: bool, span: Span) -> SmallVec<[PointerProblem; 2]> {
        let mut problems = SmallVec::new();
        let mut flags = self.inherited();
        if is_unsafe {
            problems.extend(self.gate_unsafe(true, span));
            if flags.contains(ScopeFlags::SUSPENDABLE) {
                problems.push(PointerProblem::ModeInSuspendableBody {
                    syntax: PointerSyntax::UnsafeBlock,
                    span,
                });
            }
            flags.insert(ScopeFlags::UNSAFE);
        }
        self.push(ScopeKind::Block, flags);
        problems
    }

    pub fn enter_catch(&mut self) {
        self.push(ScopeKind::Catch, self.inherited());
    }

    pub fn enter_finally(&mut self) {
        self.push(ScopeKind::Finally, self.inherited());
    }

    pub fn exit(&mut self) {
        let popped = self.frames.pop();
        debug_assert!(popped.is_some(), "unbalanced access scope exit");
    }

    /// True if pointer syntax may be written at the current position.
    #[inline]
    pub fn is_pointer_syntax_enabled(&self) -> bool {
        self.current()
            .is_some_and(|scope| scope.allows_pointer_syntax() && !scope.is_suspendable_body())
    }

    /// Check `syntax` at `span`; suspendable bodies get their own problem.
    pub fn check(&self, syntax: PointerSyntax, span: Span) -> Option<PointerProblem> {
        match self.current() {
            Some(scope) if scope.is_suspendable_body() => {
                Some(PointerProblem::ModeInSuspendableBody { syntax, span })
            }
            Some(scope) if scope.allows_pointer_syntax() => None,
            _ => Some(PointerProblem::ModeNotEnabled { syntax, span }),
        }
    }

    /// True inside a `catch` or `finally` of the current callable. The
    /// search stops at the nearest callable or closure.
    pub fn in_handler_block(&self) -> bool {
        for scope in self.frames.iter().rev() {
            match scope.kind {
                ScopeKind::Catch | ScopeKind::Finally => return true,
                kind if kind.is_body_boundary() => return false,
                _ => {}
            }
        }
        false
    }
}
