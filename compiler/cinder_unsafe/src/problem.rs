//! Problems found while binding pointer constructs.
//!
//! Each problem is non-fatal: the binder records it, substitutes the error
//! type where a type is needed, and keeps going. [`PointerProblem`] is the
//! typed form; [`into_diagnostic`](PointerProblem::into_diagnostic) lowers it
//! to the structured [`Diagnostic`] handed to the renderer.

use cinder_diagnostic::{Diagnostic, DiagnosticArg, ErrorCode};
use cinder_ir::{Idx, Span, SymbolId};
use cinder_types::WellKnownType;

use crate::access::PointerSyntax;

/// Why a pin initializer pins nothing useful.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PinRedundancy {
    /// The value is already a pointer.
    AlreadyPointer,
    /// `null` or a zero constant.
    NothingToPin,
}

impl PinRedundancy {
    pub const fn as_str(self) -> &'static str {
        match self {
            PinRedundancy::AlreadyPointer => "already a pointer",
            PinRedundancy::NothingToPin => "nothing to pin",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StackAllocFault {
    NegativeSize,
    /// Inside a `catch` or `finally` block.
    HandlerBlock,
}

impl StackAllocFault {
    pub const fn as_str(self) -> &'static str {
        match self {
            StackAllocFault::NegativeSize => "negative size",
            StackAllocFault::HandlerBlock => "handler block",
        }
    }
}

/// Source side of a failed conversion.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ConversionSource {
    Type(Idx),
    /// Element pointer of a pinned string or array, which may not be
    /// interned as a type.
    PointerTo(Idx),
}

impl ConversionSource {
    fn arg(self) -> DiagnosticArg {
        match self {
            ConversionSource::Type(ty) => DiagnosticArg::Type(ty),
            ConversionSource::PointerTo(ty) => DiagnosticArg::PointerTo(ty),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerProblem {
    ModeNotEnabled {
        syntax: PointerSyntax,
        span: Span,
    },
    ModeInSuspendableBody {
        syntax: PointerSyntax,
        span: Span,
    },
    UnsafeNotPermitted {
        span: Span,
    },
    TrackedTypeAddressed {
        ty: Idx,
        span: Span,
    },
    ConversionNotFound {
        source: ConversionSource,
        target: Idx,
        span: Span,
    },
    AmbiguousUserConversion {
        source: Idx,
        target: Idx,
        span: Span,
    },
    AddressOfNotAllowed {
        span: Span,
    },
    AddressOfNeedsPinning {
        span: Span,
    },
    AlreadyPinned {
        reason: PinRedundancy,
        span: Span,
    },
    /// Reported at the first address-of site of `root`.
    ClosureCaptureConflict {
        root: SymbolId,
        span: Span,
        capture: Span,
    },
    PinnedLocalInClosure {
        local: SymbolId,
        span: Span,
    },
    StackAllocInvalid {
        fault: StackAllocFault,
        span: Span,
    },
    VoidPointerOperation {
        span: Span,
    },
    /// `right` is `None` for a unary operator.
    OperatorNotFound {
        op: &'static str,
        left: Idx,
        right: Option<Idx>,
        span: Span,
    },
    PinRequiresInitializer {
        span: Span,
    },
    /// `declared` is `None` for the inferred-type placeholder.
    PinRequiresPointerType {
        declared: Option<Idx>,
        span: Span,
    },
    PointerExpected {
        found: Idx,
        span: Span,
    },
    PointerIndexArity {
        count: usize,
        span: Span,
    },
    MissingWellKnownType {
        kind: WellKnownType,
        span: Span,
    },
    PointerParameterInSuspendable {
        param: SymbolId,
        span: Span,
    },
}

impl PointerProblem {
    pub fn code(&self) -> ErrorCode {
        match self {
            PointerProblem::ModeNotEnabled { .. } => ErrorCode::E7001,
            PointerProblem::ModeInSuspendableBody { .. } => ErrorCode::E7002,
            PointerProblem::UnsafeNotPermitted { .. } => ErrorCode::E7003,
            PointerProblem::TrackedTypeAddressed { .. } => ErrorCode::E7004,
            PointerProblem::ConversionNotFound { .. } => ErrorCode::E7005,
            PointerProblem::AmbiguousUserConversion { .. } => ErrorCode::E7006,
            PointerProblem::AddressOfNotAllowed { .. } => ErrorCode::E7007,
            PointerProblem::AddressOfNeedsPinning { .. } => ErrorCode::E7008,
            PointerProblem::AlreadyPinned { .. } => ErrorCode::E7009,
            PointerProblem::ClosureCaptureConflict { .. } => ErrorCode::E7010,
            PointerProblem::PinnedLocalInClosure { .. } => ErrorCode::E7011,
            PointerProblem::StackAllocInvalid { .. } => ErrorCode::E7012,
            PointerProblem::VoidPointerOperation { .. } => ErrorCode::E7013,
            PointerProblem::OperatorNotFound { .. } => ErrorCode::E7014,
            PointerProblem::PinRequiresInitializer { .. } => ErrorCode::E7015,
            PointerProblem::PinRequiresPointerType { .. } => ErrorCode::E7016,
            PointerProblem::PointerExpected { .. } => ErrorCode::E7017,
            PointerProblem::PointerIndexArity { .. } => ErrorCode::E7018,
            PointerProblem::MissingWellKnownType { .. } => ErrorCode::E7019,
            PointerProblem::PointerParameterInSuspendable { .. } => ErrorCode::E7020,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            PointerProblem::ModeNotEnabled { span, .. }
            | PointerProblem::ModeInSuspendableBody { span, .. }
            | PointerProblem::UnsafeNotPermitted { span }
            | PointerProblem::TrackedTypeAddressed { span, .. }
            | PointerProblem::ConversionNotFound { span, .. }
            | PointerProblem::AmbiguousUserConversion { span, .. }
            | PointerProblem::AddressOfNotAllowed { span }
            | PointerProblem::AddressOfNeedsPinning { span }
            | PointerProblem::AlreadyPinned { span, .. }
            | PointerProblem::ClosureCaptureConflict { span, .. }
            | PointerProblem::PinnedLocalInClosure { span, .. }
            | PointerProblem::StackAllocInvalid { span, .. }
            | PointerProblem::VoidPointerOperation { span }
            | PointerProblem::OperatorNotFound { span, .. }
            | PointerProblem::PinRequiresInitializer { span }
            | PointerProblem::PinRequiresPointerType { span, .. }
            | PointerProblem::PointerExpected { span, .. }
            | PointerProblem::PointerIndexArity { span, .. }
            | PointerProblem::MissingWellKnownType { span, .. }
            | PointerProblem::PointerParameterInSuspendable { span, .. } => *span,
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_label(self.span());
        match self {
            PointerProblem::ModeNotEnabled { syntax, .. }
            | PointerProblem::ModeInSuspendableBody { syntax, .. } => {
                diag.with_arg(DiagnosticArg::Token(syntax.as_str()))
            }
            PointerProblem::TrackedTypeAddressed { ty, .. } => {
                diag.with_arg(DiagnosticArg::Type(ty))
            }
            PointerProblem::ConversionNotFound { source, target, .. } => diag
                .with_arg(source.arg())
                .with_arg(DiagnosticArg::Type(target)),
            PointerProblem::AmbiguousUserConversion { source, target, .. } => diag
                .with_arg(DiagnosticArg::Type(source))
                .with_arg(DiagnosticArg::Type(target)),
            PointerProblem::AlreadyPinned { reason, .. } => {
                diag.with_arg(DiagnosticArg::Token(reason.as_str()))
            }
            PointerProblem::ClosureCaptureConflict { root, capture, .. } => diag
                .with_secondary(capture)
                .with_arg(DiagnosticArg::Symbol(root)),
            PointerProblem::PinnedLocalInClosure { local, .. } => {
                diag.with_arg(DiagnosticArg::Symbol(local))
            }
            PointerProblem::StackAllocInvalid { fault, .. } => {
                diag.with_arg(DiagnosticArg::Token(fault.as_str()))
            }
            PointerProblem::OperatorNotFound {
                op, left, right, ..
            } => {
                let diag = diag
                    .with_arg(DiagnosticArg::Token(op))
                    .with_arg(DiagnosticArg::Type(left));
                match right {
                    Some(right) => diag.with_arg(DiagnosticArg::Type(right)),
                    None => diag,
                }
            }
            PointerProblem::PinRequiresPointerType { declared, .. } => match declared {
                Some(ty) => diag.with_arg(DiagnosticArg::Type(ty)),
                None => diag.with_arg(DiagnosticArg::Token("var")),
            },
            PointerProblem::PointerExpected { found, .. } => {
                diag.with_arg(DiagnosticArg::Type(found))
            }
            PointerProblem::PointerIndexArity { count, .. } => {
                diag.with_arg(DiagnosticArg::Int(i64::try_from(count).unwrap_or(i64::MAX)))
            }
            PointerProblem::MissingWellKnownType { kind, .. } => {
                diag.with_arg(DiagnosticArg::Token(kind.as_str()))
            }
            PointerProblem::PointerParameterInSuspendable { param, .. } => {
                diag.with_arg(DiagnosticArg::Symbol(param))
            }
            PointerProblem::UnsafeNotPermitted { .. }
            | PointerProblem::AddressOfNotAllowed { .. }
            | PointerProblem::AddressOfNeedsPinning { .. }
            | PointerProblem::VoidPointerOperation { .. }
            | PointerProblem::PinRequiresInitializer { .. } => diag,
        }
    }
}
