//! Address stability of bound expressions.
//!
//! Taking an address is only sound when the storage cannot move while the
//! pointer lives. Locals and by-value parameters sit in the stack frame;
//! anything reached through a managed reference may be relocated by the
//! collector and needs pinning first.

use cinder_ir::{BodyArena, ExprId, ExprKind, SymbolId};
use cinder_types::Snapshot;
use smallvec::SmallVec;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StorageClass {
    /// Address never changes while the frame lives.
    Stable,
    /// A variable whose address may change unless it is pinned.
    Moveable,
    /// Not a variable at all.
    Value,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct StorageClassification {
    pub class: StorageClass,
    /// Local or parameter the storage belongs to, for capture checks.
    pub root: Option<SymbolId>,
}

impl StorageClassification {
    const VALUE: Self = StorageClassification {
        class: StorageClass::Value,
        root: None,
    };

    const MOVEABLE: Self = StorageClassification {
        class: StorageClass::Moveable,
        root: None,
    };

    /// Stable storage not owned by any local (pointer targets).
    const UNROOTED: Self = StorageClassification {
        class: StorageClass::Stable,
        root: None,
    };

    #[inline]
    pub fn is_address_stable(self) -> bool {
        self.class == StorageClass::Stable
    }
}

/// Classify the storage `expr` denotes. Pure in `(snapshot, arena, expr)`.
pub fn classify_storage(
    snapshot: &Snapshot,
    arena: &BodyArena,
    expr: ExprId,
) -> StorageClassification {
    let mut current = expr;
    // Field chains are walked iteratively; each step moves to the receiver.
    loop {
        let Some(node) = arena.try_expr(current) else {
            return StorageClassification::VALUE;
        };
        match &node.kind {
            ExprKind::Local(symbol) | ExprKind::Parameter(symbol) => {
                return match snapshot.symbol(*symbol) {
                    Some(s) if !s.is_by_ref() => StorageClassification {
                        class: StorageClass::Stable,
                        root: Some(*symbol),
                    },
                    _ => StorageClassification::MOVEABLE,
                };
            }
            ExprKind::Field {
                receiver: Some(receiver),
                field,
            } => match value_receiver(snapshot, arena, *receiver, *field) {
                Some(next) => current = next,
                None => return StorageClassification::MOVEABLE,
            },
            ExprKind::Field { receiver: None, .. }
            | ExprKind::This
            | ExprKind::ArrayElement { .. } => return StorageClassification::MOVEABLE,
            ExprKind::Deref(_) | ExprKind::PointerMember { .. } | ExprKind::StackAlloc { .. } => {
                return StorageClassification::UNROOTED;
            }
            ExprKind::PointerElement { pointer, .. } => {
                match fixed_buffer_access(snapshot, arena, *pointer) {
                    Some(FixedBufferOwner::Receiver(next)) => current = next,
                    Some(FixedBufferOwner::Moveable) => return StorageClassification::MOVEABLE,
                    None => return StorageClassification::UNROOTED,
                }
            }
            ExprKind::Literal(_)
            | ExprKind::AddressOf(_)
            | ExprKind::Unary { .. }
            | ExprKind::Binary { .. }
            | ExprKind::Assign { .. }
            | ExprKind::Conditional { .. }
            | ExprKind::Cast { .. }
            | ExprKind::Call { .. }
            | ExprKind::New { .. }
            | ExprKind::NewArray { .. }
            | ExprKind::SizeOf(_)
            | ExprKind::Closure { .. }
            | ExprKind::Error => return StorageClassification::VALUE,
        }
    }
}

/// Where a member-access chain starts.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
enum PathBase {
    Variable(SymbolId),
    This,
    Static(SymbolId),
}

/// A variable named by a chain of member accesses, e.g. `n.inner.value`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) struct StoragePath {
    base: PathBase,
    /// Outermost first.
    fields: SmallVec<[SymbolId; 2]>,
}

impl StoragePath {
    /// True if `self` names `prefix` or a variable nested inside it.
    pub(crate) fn starts_with(&self, prefix: &StoragePath) -> bool {
        self.base == prefix.base && self.fields.starts_with(&prefix.fields)
    }
}

/// The member-access chain `expr` denotes, if it is one. Element accesses
/// and computed receivers have no path.
pub(crate) fn storage_path(arena: &BodyArena, expr: ExprId) -> Option<StoragePath> {
    let mut fields: SmallVec<[SymbolId; 2]> = SmallVec::new();
    let mut current = expr;
    let base = loop {
        match &arena.try_expr(current)?.kind {
            ExprKind::Local(symbol) | ExprKind::Parameter(symbol) => {
                break PathBase::Variable(*symbol);
            }
            ExprKind::This => break PathBase::This,
            ExprKind::Field {
                receiver: None,
                field,
            } => break PathBase::Static(*field),
            ExprKind::Field {
                receiver: Some(receiver),
                field,
            } => {
                fields.push(*field);
                current = *receiver;
            }
            _ => return None,
        }
    };
    fields.reverse();
    Some(StoragePath { base, fields })
}

/// The receiver to continue with, if `receiver.field` lives inline in it.
fn value_receiver(
    snapshot: &Snapshot,
    arena: &BodyArena,
    receiver: ExprId,
    field: SymbolId,
) -> Option<ExprId> {
    if snapshot.symbol(field)?.is_static_field() {
        return None;
    }
    let receiver_ty = arena.try_expr(receiver)?.ty;
    snapshot
        .pool()
        .is_value_type(receiver_ty)
        .then_some(receiver)
}

enum FixedBufferOwner {
    Receiver(ExprId),
    Moveable,
}

/// `Some` when `pointer` names a fixed-size buffer field.
fn fixed_buffer_access(
    snapshot: &Snapshot,
    arena: &BodyArena,
    pointer: ExprId,
) -> Option<FixedBufferOwner> {
    let ExprKind::Field { receiver, field } = &arena.try_expr(pointer)?.kind else {
        return None;
    };
    snapshot.symbol(*field)?.fixed_buffer()?;
    Some(
        match receiver.and_then(|r| value_receiver(snapshot, arena, r, *field)) {
            Some(next) => FixedBufferOwner::Receiver(next),
            None => FixedBufferOwner::Moveable,
        },
    )
}

#[cfg(test)]
mod tests;
