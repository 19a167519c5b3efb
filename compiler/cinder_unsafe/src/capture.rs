//! Address-of versus closure-capture conflicts.
//!
//! A captured local is hoisted into a heap-allocated environment, so any
//! address taken of it would dangle once the collector moves that
//! environment. The first address-of site of a root is reported once,
//! regardless of whether the capture comes before or after it.

use cinder_ir::{ClosureKind, Span, SymbolId};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::PointerProblem;

/// One closure or generator boundary.
#[derive(Clone, Debug)]
pub struct CaptureFrame {
    pub kind: ClosureKind,
    pub span: Span,
    pub captured: SmallVec<[SymbolId; 4]>,
}

#[derive(Clone, Debug, Default)]
pub struct CaptureTracker {
    frames: Vec<CaptureFrame>,
    /// First address-of site per root.
    address_sites: FxHashMap<SymbolId, Span>,
    /// First capturing closure per root.
    capture_sites: FxHashMap<SymbolId, Span>,
    reported: FxHashSet<SymbolId>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closure_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> Option<&CaptureFrame> {
        self.frames.last()
    }

    /// Enter a closure capturing `captures`. Returns conflicts with
    /// addresses taken earlier.
    pub fn enter_closure(
        &mut self,
        kind: ClosureKind,
        captures: &[SymbolId],
        span: Span,
    ) -> SmallVec<[PointerProblem; 1]> {
        let mut problems = SmallVec::new();
        for &root in captures {
            self.capture_sites.entry(root).or_insert(span);
            if let Some(&address) = self.address_sites.get(&root) {
                problems.extend(self.conflict(root, address, span));
            }
        }
        self.frames.push(CaptureFrame {
            kind,
            span,
            captured: SmallVec::from_slice(captures),
        });
        problems
    }

    pub fn exit_closure(&mut self) {
        let popped = self.frames.pop();
        debug_assert!(popped.is_some(), "unbalanced closure exit");
    }

    /// Record `&root` at `span`. Returns a conflict if `root` was already
    /// captured.
    pub fn note_address_of(&mut self, root: SymbolId, span: Span) -> Option<PointerProblem> {
        let address = *self.address_sites.entry(root).or_insert(span);
        let capture = *self.capture_sites.get(&root)?;
        self.conflict(root, address, capture)
    }

    pub fn is_captured(&self, root: SymbolId) -> bool {
        self.capture_sites.contains_key(&root)
    }

    fn conflict(&mut self, root: SymbolId, address: Span, capture: Span) -> Option<PointerProblem> {
        if !self.reported.insert(root) {
            return None;
        }
        tracing::trace!(?root, %address, %capture, "capture conflict");
        Some(PointerProblem::ClosureCaptureConflict {
            root,
            span: address,
            capture,
        })
    }
}
