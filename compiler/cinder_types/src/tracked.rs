//! Tracked-kind classification.
//!
//! A type is *tracked* when values of it hold (or may hold) references into
//! the managed heap, so a raw pointer to it would escape the collector.
//! Classes, interfaces, strings, `object`, arrays, and type parameters are
//! tracked. Primitives, enums, and pointers are not. A struct is tracked iff
//! some instance field is, transitively.
//!
//! # Cycles
//!
//! Value types may reach themselves through their fields (directly, or via
//! a generic instantiation). The walk numbers instantiations in discovery
//! order and keeps every visited key on a component stack until its
//! strongly connected component closes, Tarjan style. Meeting a key that is
//! still on the stack contributes "not tracked" and lowers the caller's
//! low-link. All members of a component reach each other, so they share one
//! answer; when the component head finishes, every member is published with
//! the head's kind. Each instantiation is expanded at most once per request.
//!
//! # Depth limit
//!
//! Polymorphic recursion can mint ever larger instantiations. An
//! instantiation whose type arguments nest deeper than the cache's limit is
//! classified `Tracked` without looking at its fields. The measure belongs
//! to the key itself, so the answer does not depend on where a request
//! started or on what earlier requests published.
//!
//! # Concurrency
//!
//! The cache is a sharded concurrent map. No lock is held while a type is
//! being classified; two threads may compute the same entry, and the first
//! insert wins. Results are deterministic, so the loser's value is equal.

use std::sync::Arc;

use cinder_ir::Idx;
use cinder_stack::ensure_sufficient_stack;
use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::{DefId, DefKind, Snapshot, SymbolKind, TypeData};

/// Type-argument nesting after which classification gives up and answers
/// `Tracked`.
pub const DEFAULT_MAX_TYPE_DEPTH: u32 = 256;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TrackedKind {
    Untracked,
    Tracked,
}

impl TrackedKind {
    #[inline]
    pub fn is_tracked(self) -> bool {
        self == TrackedKind::Tracked
    }
}

/// A type with every generic parameter of its enclosing definitions
/// substituted away.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
enum Concrete {
    /// Classified without looking at definitions.
    Leaf(Idx),
    Nullable(Box<Concrete>),
    Inst(InstKey),
}

/// Cache key: a definition plus its substituted type arguments.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct InstKey {
    def: DefId,
    args: Arc<[Concrete]>,
    /// One more than the deepest instantiation among `args`.
    nesting: u32,
}

impl InstKey {
    fn new(def: DefId, args: Arc<[Concrete]>) -> Self {
        let nesting = args.iter().map(Concrete::nesting).max().unwrap_or(0);
        InstKey {
            def,
            args,
            nesting: nesting.saturating_add(1),
        }
    }
}

impl Concrete {
    fn nesting(&self) -> u32 {
        match self {
            Concrete::Leaf(_) => 0,
            Concrete::Nullable(inner) => inner.nesting(),
            Concrete::Inst(key) => key.nesting,
        }
    }
}

/// Per-snapshot memo of [`TrackedKind`] by instantiation.
pub struct TrackedKindCache {
    entries: DashMap<InstKey, TrackedKind, FxBuildHasher>,
    max_depth: u32,
}

impl TrackedKindCache {
    pub fn new(max_depth: u32) -> Self {
        TrackedKindCache {
            entries: DashMap::with_hasher(FxBuildHasher),
            max_depth,
        }
    }

    /// Classify `ty`. Total: unknown or malformed types answer `Tracked`.
    #[tracing::instrument(level = "trace", skip_all, fields(ty = ?ty))]
    pub fn classify(&self, snapshot: &Snapshot, ty: Idx) -> TrackedKind {
        if ty.is_primitive() {
            return classify_primitive(ty);
        }
        let mut walk = Walk::new(snapshot, self);
        let concrete = walk.concretize(ty, &[]);
        walk.visit(&concrete).kind
    }

    /// Number of published instantiations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the classification of nominal/applied `ty` is published.
    pub fn is_cached(&self, snapshot: &Snapshot, ty: Idx) -> bool {
        match Walk::new(snapshot, self).concretize(ty, &[]) {
            Concrete::Inst(key) => self.entries.contains_key(&key),
            _ => false,
        }
    }

    fn lookup(&self, key: &InstKey) -> Option<TrackedKind> {
        self.entries.get(key).map(|entry| *entry)
    }

    /// Insert-if-absent; returns the value that ended up in the cache.
    fn publish(&self, key: InstKey, kind: TrackedKind) -> TrackedKind {
        *self.entries.entry(key).or_insert(kind)
    }
}

impl Default for TrackedKindCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TYPE_DEPTH)
    }
}

impl std::fmt::Debug for TrackedKindCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedKindCache")
            .field("entries", &self.entries.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[inline]
fn classify_primitive(ty: Idx) -> TrackedKind {
    match ty {
        Idx::STRING | Idx::OBJECT => TrackedKind::Tracked,
        _ => TrackedKind::Untracked,
    }
}

/// No link to a key still on the component stack.
const NO_DEP: u32 = u32::MAX;

#[derive(Copy, Clone, Debug)]
struct Outcome {
    kind: TrackedKind,
    /// Smallest discovery index on the component stack this result
    /// reached, or `NO_DEP`.
    low: u32,
}

impl Outcome {
    const fn settled(kind: TrackedKind) -> Self {
        Outcome { kind, low: NO_DEP }
    }
}

/// One top-level classification request.
struct Walk<'a> {
    snapshot: &'a Snapshot,
    cache: &'a TrackedKindCache,
    /// Discovery index of every key on `stack`.
    open: FxHashMap<InstKey, u32>,
    stack: Vec<InstKey>,
    next_index: u32,
}

impl<'a> Walk<'a> {
    fn new(snapshot: &'a Snapshot, cache: &'a TrackedKindCache) -> Self {
        Walk {
            snapshot,
            cache,
            open: FxHashMap::default(),
            stack: Vec::new(),
            next_index: 0,
        }
    }

    /// Substitute `subst` for the type parameters mentioned by `ty`.
    fn concretize(&self, ty: Idx, subst: &[Concrete]) -> Concrete {
        let pool = self.snapshot.pool();
        if ty.is_primitive() || !pool.contains(ty) {
            return Concrete::Leaf(ty);
        }
        match pool.data(ty) {
            TypeData::TypeParam { index, .. } => subst
                .get(*index as usize)
                .cloned()
                .unwrap_or(Concrete::Leaf(ty)),
            TypeData::Nullable(inner) => {
                Concrete::Nullable(Box::new(self.concretize(*inner, subst)))
            }
            TypeData::Nominal(def) => Concrete::Inst(InstKey::new(*def, Arc::from(Vec::new()))),
            TypeData::Applied { def, args } => Concrete::Inst(InstKey::new(
                *def,
                args.iter()
                    .map(|&arg| ensure_sufficient_stack(|| self.concretize(arg, subst)))
                    .collect(),
            )),
            TypeData::Primitive(_) | TypeData::Pointer(_) | TypeData::Array { .. } => {
                Concrete::Leaf(ty)
            }
        }
    }

    fn visit(&mut self, ty: &Concrete) -> Outcome {
        match ty {
            Concrete::Leaf(idx) => Outcome::settled(self.classify_leaf(*idx)),
            Concrete::Nullable(inner) => self.visit(inner),
            Concrete::Inst(key) => self.visit_inst(key),
        }
    }

    fn classify_leaf(&self, ty: Idx) -> TrackedKind {
        if ty.is_primitive() {
            return classify_primitive(ty);
        }
        let pool = self.snapshot.pool();
        if !pool.contains(ty) {
            return TrackedKind::Tracked;
        }
        match pool.data(ty) {
            TypeData::Pointer(_) => TrackedKind::Untracked,
            TypeData::Primitive(idx) => classify_primitive(*idx),
            // Arrays live on the managed heap; an unsubstituted type
            // parameter may be instantiated with a reference type.
            TypeData::Array { .. }
            | TypeData::TypeParam { .. }
            | TypeData::Nullable(_)
            | TypeData::Nominal(_)
            | TypeData::Applied { .. } => TrackedKind::Tracked,
        }
    }

    fn visit_inst(&mut self, key: &InstKey) -> Outcome {
        if let Some(kind) = self.cache.lookup(key) {
            return Outcome::settled(kind);
        }

        let snapshot = self.snapshot;
        let Some(def) = snapshot.def(key.def) else {
            return Outcome::settled(TrackedKind::Tracked);
        };
        match def.kind {
            DefKind::Class | DefKind::Interface => {
                return Outcome::settled(self.cache.publish(key.clone(), TrackedKind::Tracked));
            }
            DefKind::Enum => {
                return Outcome::settled(self.cache.publish(key.clone(), TrackedKind::Untracked));
            }
            DefKind::Struct => {}
        }

        if let Some(&open) = self.open.get(key) {
            tracing::trace!(def = ?key.def, open, "cycle back-edge");
            return Outcome {
                kind: TrackedKind::Untracked,
                low: open,
            };
        }

        if key.nesting > self.cache.max_depth {
            tracing::debug!(
                def = ?key.def,
                nesting = key.nesting,
                "type arguments nest too deep, assuming tracked"
            );
            return Outcome::settled(self.cache.publish(key.clone(), TrackedKind::Tracked));
        }

        let index = self.next_index;
        self.next_index += 1;
        self.open.insert(key.clone(), index);
        self.stack.push(key.clone());

        let mut kind = TrackedKind::Untracked;
        let mut low = NO_DEP;
        for &field in &def.fields {
            let Some(symbol) = snapshot.symbol(field) else {
                continue;
            };
            let SymbolKind::Field {
                ty,
                is_static: false,
                ..
            } = symbol.kind
            else {
                continue;
            };
            let field_ty = self.concretize(ty, &key.args);
            let out = ensure_sufficient_stack(|| self.visit(&field_ty));
            low = low.min(out.low);
            if out.kind.is_tracked() {
                kind = TrackedKind::Tracked;
                break;
            }
        }

        if low < index {
            // Part of a component whose head is still open; the head
            // publishes for the whole component.
            tracing::trace!(def = ?key.def, ?kind, low, "deferred to component head");
            return Outcome { kind, low };
        }

        let kind = self.close_component(key, kind);
        Outcome::settled(kind)
    }

    /// Pop the component headed by `head` and publish `kind` for each
    /// member.
    fn close_component(&mut self, head: &InstKey, kind: TrackedKind) -> TrackedKind {
        let mut published = kind;
        let mut members = 0usize;
        while let Some(member) = self.stack.pop() {
            self.open.remove(&member);
            members += 1;
            let is_head = member == *head;
            let value = self.cache.publish(member, kind);
            if is_head {
                published = value;
                break;
            }
        }
        tracing::debug!(def = ?head.def, kind = ?published, members, "tracked kind published");
        published
    }
}
