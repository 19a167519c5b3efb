//! Per-snapshot engine state.

use std::sync::Arc;

use cinder_diagnostic::Diagnostic;
use cinder_ir::{BinaryOp, BodyArena, Callable, ExprId, Idx, Span};
use cinder_types::{DefId, Snapshot, TrackedKind, TrackedKindCache, WellKnownType};
use dashmap::DashSet;
use rustc_hash::FxBuildHasher;

use crate::{
    arithmetic, conversion, storage, CompilationOptions, ConversionKind, EngineConfig,
    OperatorSignature, PointerBinder, PointerProblem, StorageClassification,
};

/// Everything the engine knows about one frozen [`Snapshot`].
///
/// Shared by reference across threads; each bind request gets its own
/// [`PointerBinder`] from [`binder`](Self::binder).
///
/// # Thread Safety
///
/// The tracked-kind cache and the missing-well-known registry publish with
/// insert-if-absent, so concurrent requests may recompute an entry but
/// always agree on it.
pub struct PointerContext {
    snapshot: Arc<Snapshot>,
    tracked: TrackedKindCache,
    missing_reported: DashSet<WellKnownType, FxBuildHasher>,
    options: CompilationOptions,
    config: EngineConfig,
}

/// Result of looking up a well-known type on behalf of a construct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum WellKnownLookup {
    Found(Idx),
    /// First miss for this snapshot; the problem must be reported.
    MissingFirst(PointerProblem),
    /// Already reported; skip silently.
    MissingReported,
}

impl PointerContext {
    pub fn new(snapshot: Arc<Snapshot>, options: CompilationOptions, config: EngineConfig) -> Self {
        PointerContext {
            tracked: TrackedKindCache::new(config.max_type_depth),
            snapshot,
            missing_reported: DashSet::with_hasher(FxBuildHasher),
            options,
            config,
        }
    }

    pub fn with_defaults(snapshot: Arc<Snapshot>) -> Self {
        Self::new(snapshot, CompilationOptions::default(), EngineConfig::default())
    }

    #[inline]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn options(&self) -> CompilationOptions {
        self.options
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracked_cache(&self) -> &TrackedKindCache {
        &self.tracked
    }

    pub fn classify_tracked_kind(&self, ty: Idx) -> TrackedKind {
        self.tracked.classify(&self.snapshot, ty)
    }

    pub fn classify_conversion(&self, source: Idx, target: Idx) -> ConversionKind {
        conversion::classify_conversion(&self.snapshot, source, target)
    }

    pub fn classify_storage(&self, arena: &BodyArena, expr: ExprId) -> StorageClassification {
        storage::classify_storage(&self.snapshot, arena, expr)
    }

    pub fn resolve_builtin_operator(
        &self,
        op: BinaryOp,
        left: Idx,
        right: Idx,
    ) -> Option<OperatorSignature> {
        arithmetic::resolve_builtin_operator(&self.snapshot, op, left, right)
    }

    /// Look up `kind`. A missing type is reported once per context.
    pub(crate) fn well_known(&self, kind: WellKnownType, span: Span) -> WellKnownLookup {
        if let Some(ty) = self.snapshot.well_known(kind) {
            return WellKnownLookup::Found(ty);
        }
        if self.missing_reported.insert(kind) {
            tracing::debug!(%kind, "well-known type missing");
            WellKnownLookup::MissingFirst(PointerProblem::MissingWellKnownType { kind, span })
        } else {
            WellKnownLookup::MissingReported
        }
    }

    /// Start a bind request.
    pub fn binder(&self) -> PointerBinder<'_> {
        PointerBinder::new(self)
    }

    /// Check one callable body outside of any type declaration.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = ?callable.kind))]
    pub fn check_callable(&self, arena: &BodyArena, callable: &Callable) -> Vec<Diagnostic> {
        let mut binder = self.binder();
        binder.walk_callable(arena, callable);
        binder.finish()
    }

    /// Check a type declaration: its fields, then each member body inside
    /// the declaration's access scope.
    #[tracing::instrument(level = "debug", skip_all, fields(def = def.raw()))]
    pub fn check_type(&self, def: DefId, members: &[(&BodyArena, &Callable)]) -> Vec<Diagnostic> {
        let mut binder = self.binder();
        binder.walk_type(def, members);
        binder.finish()
    }
}

impl std::fmt::Debug for PointerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerContext")
            .field("tracked", &self.tracked)
            .field("options", &self.options)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
