//! Pin declarators: `pin (T* p = init) body`.
//!
//! A pin makes moveable storage stable for the extent of its body. The
//! initializer decides what is pinned:
//!
//! | Initializer          | Pinned storage            |
//! |----------------------|---------------------------|
//! | `&variable`          | the variable              |
//! | string               | its character buffer      |
//! | array of untracked T | its elements              |
//! | pointer, `null`, `0` | nothing (`AlreadyPinned`) |

use cinder_ir::{BodyArena, DeclaredType, ExprId, ExprKind, Idx, PinDeclarator, Span, SymbolId};
use cinder_types::{TypeData, WellKnownType};

use crate::storage::storage_path;
use crate::{ConversionSource, PinRedundancy, PointerBinder, PointerProblem, StorageClass};

/// What a pin declarator ended up pinning.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PinSource {
    /// `&variable`; `root` is the owning local, if any.
    Address { root: Option<SymbolId> },
    StringChars { root: Option<SymbolId> },
    ArrayElements {
        element: Idx,
        root: Option<SymbolId>,
    },
    /// Nothing usable; a problem was reported.
    Invalid,
}

impl PinSource {
    /// Root whose buffer is pinned. Closures must not capture it while the
    /// pin is active.
    fn buffer_root(self) -> Option<SymbolId> {
        match self {
            PinSource::StringChars { root } | PinSource::ArrayElements { root, .. } => root,
            PinSource::Address { .. } | PinSource::Invalid => None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PinnedLocal {
    pub local: SymbolId,
    /// Declared pointer type, or `Idx::ERROR` if it was rejected.
    pub pointer_ty: Idx,
    pub source: PinSource,
}

impl PointerBinder<'_> {
    /// Bind one declarator of the innermost pin block.
    ///
    /// The caller has already walked the initializer's subexpressions;
    /// this checks the pin itself and registers the local for the body.
    #[tracing::instrument(level = "trace", skip_all, fields(local = ?decl.local))]
    pub fn bind_pin_declarator(&mut self, arena: &BodyArena, decl: &PinDeclarator) -> PinnedLocal {
        let declared = self.pin_declared_type(decl);
        let source = match decl.init {
            None => {
                self.report(PointerProblem::PinRequiresInitializer { span: decl.span });
                PinSource::Invalid
            }
            Some(init) => self.bind_pin_initializer(arena, init, declared, decl.span),
        };

        if let Some(scope) = self.pins.last_mut() {
            scope.locals.insert(decl.local);
            if let Some(root) = source.buffer_root() {
                scope.sources.insert(root);
            }
        }
        PinnedLocal {
            local: decl.local,
            pointer_ty: declared.unwrap_or(Idx::ERROR),
            source,
        }
    }

    fn pin_declared_type(&mut self, decl: &PinDeclarator) -> Option<Idx> {
        match decl.declared {
            DeclaredType::Explicit(Idx::ERROR) => None,
            DeclaredType::Explicit(ty) if self.ctx.snapshot().pool().is_pointer(ty) => {
                self.check_pointer_type(ty, decl.span);
                Some(ty)
            }
            DeclaredType::Explicit(ty) => {
                self.report(PointerProblem::PinRequiresPointerType {
                    declared: Some(ty),
                    span: decl.span,
                });
                None
            }
            DeclaredType::Inferred => {
                self.report(PointerProblem::PinRequiresPointerType {
                    declared: None,
                    span: decl.span,
                });
                None
            }
        }
    }

    fn bind_pin_initializer(
        &mut self,
        arena: &BodyArena,
        init: ExprId,
        declared: Option<Idx>,
        decl_span: Span,
    ) -> PinSource {
        let ctx = self.ctx;
        let pool = ctx.snapshot().pool();
        let node = arena.expr(init);

        if let ExprKind::AddressOf(operand) = node.kind {
            return self.pin_address(arena, operand, node.ty, declared, decl_span);
        }
        if arena.is_null_constant(init) {
            self.report(PointerProblem::AlreadyPinned {
                reason: PinRedundancy::NothingToPin,
                span: node.span,
            });
            return PinSource::Invalid;
        }
        if pool.is_pointer(node.ty) {
            self.report(PointerProblem::AlreadyPinned {
                reason: PinRedundancy::AlreadyPointer,
                span: node.span,
            });
            return PinSource::Invalid;
        }

        let root = ctx.classify_storage(arena, init).root;
        if node.ty == Idx::STRING {
            let helper = self.require_well_known(WellKnownType::StringPinHelper, node.span);
            self.check_element_pointer(Idx::CHAR, declared, node.span);
            return match helper {
                Some(_) => PinSource::StringChars { root },
                None => PinSource::Invalid,
            };
        }
        if let Some((element, _)) = pool.array_element(node.ty) {
            let tracked = self.is_tracked(element);
            if tracked {
                self.report(PointerProblem::TrackedTypeAddressed {
                    ty: element,
                    span: node.span,
                });
            }
            self.check_element_pointer(element, declared, node.span);
            return if tracked {
                PinSource::Invalid
            } else {
                PinSource::ArrayElements { element, root }
            };
        }
        if node.ty != Idx::ERROR {
            self.report_no_conversion(
                ConversionSource::Type(node.ty),
                declared.unwrap_or(Idx::ERROR),
                node.span,
            );
        }
        PinSource::Invalid
    }

    /// `pin (T* p = &operand)`. The operand may be moveable: the pin is
    /// what makes it stable.
    fn pin_address(
        &mut self,
        arena: &BodyArena,
        operand: ExprId,
        pointer_ty: Idx,
        declared: Option<Idx>,
        decl_span: Span,
    ) -> PinSource {
        let operand_node = arena.expr(operand);
        let tracked = self.is_tracked(operand_node.ty);
        if tracked {
            self.report(PointerProblem::TrackedTypeAddressed {
                ty: operand_node.ty,
                span: operand_node.span,
            });
        }
        let storage = self.ctx.classify_storage(arena, operand);
        if storage.class == StorageClass::Value {
            self.report(PointerProblem::AddressOfNotAllowed {
                span: operand_node.span,
            });
        }
        if let Some(declared) = declared {
            self.convert_types(pointer_ty, declared, false, decl_span);
        }
        if tracked || storage.class == StorageClass::Value {
            return PinSource::Invalid;
        }

        if let Some(root) = storage.root {
            let conflict = self.captures.note_address_of(root, decl_span);
            if let Some(problem) = conflict {
                self.report(problem);
            }
        }
        if storage.class == StorageClass::Moveable {
            if let (Some(path), Some(scope)) = (storage_path(arena, operand), self.pins.last_mut())
            {
                scope.targets.push(path);
            }
        }
        PinSource::Address { root: storage.root }
    }

    /// The element pointer of a pinned buffer must convert implicitly to
    /// the declared pointer type.
    fn check_element_pointer(&mut self, element: Idx, declared: Option<Idx>, span: Span) {
        let Some(declared) = declared else {
            return;
        };
        let ctx = self.ctx;
        match ctx.snapshot().pool().find(&TypeData::Pointer(element)) {
            Some(element_ptr) => {
                self.convert_types(element_ptr, declared, false, span);
            }
            // Never interned, so only `void*` can accept it.
            None if ctx.snapshot().pool().is_void_pointer(declared) => {}
            None => self.report_no_conversion(ConversionSource::PointerTo(element), declared, span),
        }
    }
}

#[cfg(test)]
mod tests;
