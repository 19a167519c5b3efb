//! Pointer-safety engine for the Cinder compiler.
//!
//! Decides, for every pointer-related construct in a bound body, whether it
//! type-checks, whether pointer syntax is permitted where it appears,
//! whether the storage it addresses is stable, and which built-in operator
//! or conversion applies.
//!
//! # Architecture
//!
//! - [`PointerContext`]: per-snapshot, shared across threads. Owns the
//!   tracked-kind cache and answers the pure classification queries.
//! - [`PointerBinder`]: per-request. Owns the access-scope stack, the
//!   closure-capture tracker, and the pin scopes, and reports through a
//!   diagnostic queue.
//!
//! ```text
//! let ctx = PointerContext::with_defaults(snapshot);
//! let diagnostics = ctx.check_callable(&arena, &callable);
//! ```
//!
//! # Recovery
//!
//! No check aborts binding. A failed construct reports a
//! [`PointerProblem`] and continues with `Idx::ERROR` where a type is
//! needed, so independent problems on one construct are all reported.

mod access;
mod arithmetic;
mod binder;
mod capture;
mod config;
mod context;
mod conversion;
mod pin;
mod problem;
mod stackalloc;
mod storage;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
mod walk;

pub use access::{AccessModeTracker, AccessScope, PointerSyntax, ScopeFlags, ScopeKind};
pub use arithmetic::{int_operand_type, resolve_builtin_operator, OperatorKind, OperatorSignature};
pub use binder::PointerBinder;
pub use capture::{CaptureFrame, CaptureTracker};
pub use config::{CompilationOptions, EngineConfig};
pub use context::PointerContext;
pub use conversion::{classify_conversion, ConversionKind};
pub use pin::{PinSource, PinnedLocal};
pub use problem::{ConversionSource, PinRedundancy, PointerProblem, StackAllocFault};
pub use stackalloc::StackAllocation;
pub use storage::{classify_storage, StorageClass, StorageClassification};
