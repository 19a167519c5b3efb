//! Type pool: every type interned once, addressed by [`Idx`].

use cinder_ir::{Idx, Name};
use rustc_hash::FxHashMap;

use crate::{DefId, DefKind, TypeDef, TypeFlags};

/// Structure of one interned type.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    /// A pre-interned primitive; the payload is its own index.
    Primitive(Idx),
    Pointer(Idx),
    Array {
        element: Idx,
        rank: u8,
    },
    /// `T?` over a value type.
    Nullable(Idx),
    /// A generic parameter of the enclosing definition, by position.
    TypeParam {
        index: u32,
        name: Name,
    },
    /// A non-generic nominal type, or a generic one used without arguments.
    Nominal(DefId),
    /// A generic nominal type applied to arguments.
    Applied {
        def: DefId,
        args: Box<[Idx]>,
    },
}

/// Interned types plus the nominal definitions they refer to.
///
/// Built mutably by the resolver, then frozen inside a
/// [`Snapshot`](crate::Snapshot).
#[derive(Clone, Debug)]
pub struct Pool {
    items: Vec<TypeData>,
    flags: Vec<TypeFlags>,
    map: FxHashMap<TypeData, Idx>,
    defs: Vec<TypeDef>,
}

impl Pool {
    /// A pool holding only the primitives and `void*`.
    pub fn new() -> Self {
        let mut pool = Pool {
            items: Vec::with_capacity(64),
            flags: Vec::with_capacity(64),
            map: FxHashMap::default(),
            defs: Vec::new(),
        };
        for raw in 0..Idx::PRIMITIVE_COUNT {
            let idx = Idx::from_raw(raw);
            let mut flags = TypeFlags::IS_PRIMITIVE;
            if matches!(idx, Idx::STRING | Idx::OBJECT) {
                flags |= TypeFlags::IS_REFERENCE;
            }
            if idx == Idx::ERROR {
                flags |= TypeFlags::HAS_ERROR;
            }
            pool.items.push(TypeData::Primitive(idx));
            pool.flags.push(flags);
        }
        let void_ptr = pool.pointer(Idx::VOID);
        debug_assert_eq!(void_ptr, Idx::VOID_PTR);
        pool
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if `idx` was handed out by this pool.
    #[inline]
    pub fn contains(&self, idx: Idx) -> bool {
        idx.index() < self.items.len()
    }

    /// Structure of `idx`.
    ///
    /// # Panics
    /// Panics if `idx` does not belong to this pool.
    #[inline]
    #[track_caller]
    pub fn data(&self, idx: Idx) -> &TypeData {
        &self.items[idx.index()]
    }

    #[inline]
    pub fn flags(&self, idx: Idx) -> TypeFlags {
        self.flags.get(idx.index()).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Idx, &TypeData)> {
        self.items.iter().enumerate().map(|(i, data)| {
            (
                Idx::from_raw(u32::try_from(i).unwrap_or(u32::MAX)),
                data,
            )
        })
    }

    /// Look up an already interned type.
    pub fn find(&self, data: &TypeData) -> Option<Idx> {
        self.map.get(data).copied()
    }

    // === Constructors ===

    pub fn pointer(&mut self, pointee: Idx) -> Idx {
        self.intern(TypeData::Pointer(pointee))
    }

    pub fn array(&mut self, element: Idx, rank: u8) -> Idx {
        self.intern(TypeData::Array {
            element,
            rank: rank.max(1),
        })
    }

    pub fn nullable(&mut self, inner: Idx) -> Idx {
        self.intern(TypeData::Nullable(inner))
    }

    pub fn type_param(&mut self, index: u32, name: Name) -> Idx {
        self.intern(TypeData::TypeParam { index, name })
    }

    pub fn nominal(&mut self, def: DefId) -> Idx {
        self.intern(TypeData::Nominal(def))
    }

    pub fn applied(&mut self, def: DefId, args: &[Idx]) -> Idx {
        if args.is_empty() {
            return self.nominal(def);
        }
        self.intern(TypeData::Applied {
            def,
            args: args.into(),
        })
    }

    /// Register a nominal definition.
    pub fn define(&mut self, def: TypeDef) -> DefId {
        let id = DefId::new(u32::try_from(self.defs.len()).unwrap_or(u32::MAX));
        self.defs.push(def);
        id
    }

    fn intern(&mut self, data: TypeData) -> Idx {
        if let Some(&idx) = self.map.get(&data) {
            return idx;
        }
        let idx = Idx::from_raw(u32::try_from(self.items.len()).unwrap_or(u32::MAX));
        let flags = self.compute_flags(&data);
        self.items.push(data.clone());
        self.flags.push(flags);
        self.map.insert(data, idx);
        idx
    }

    fn compute_flags(&self, data: &TypeData) -> TypeFlags {
        let inherit = |idx: Idx| self.flags(idx) & TypeFlags::PROPAGATED;
        match data {
            TypeData::Primitive(idx) => self.flags(*idx),
            TypeData::Pointer(pointee) => {
                inherit(*pointee) | TypeFlags::IS_POINTER | TypeFlags::HAS_POINTER
            }
            TypeData::Array { element, .. } => inherit(*element) | TypeFlags::IS_REFERENCE,
            TypeData::Nullable(inner) => inherit(*inner) | TypeFlags::IS_VALUE_AGGREGATE,
            TypeData::TypeParam { .. } => TypeFlags::HAS_TYPE_PARAM,
            TypeData::Nominal(def) => self.def_kind_flags(*def),
            TypeData::Applied { def, args } => args
                .iter()
                .fold(self.def_kind_flags(*def), |acc, arg| acc | inherit(*arg)),
        }
    }

    fn def_kind_flags(&self, def: DefId) -> TypeFlags {
        match self.defs.get(def.index()).map(|d| d.kind) {
            Some(DefKind::Class | DefKind::Interface) => TypeFlags::IS_REFERENCE,
            Some(DefKind::Struct | DefKind::Enum) => TypeFlags::IS_VALUE_AGGREGATE,
            None => TypeFlags::HAS_ERROR,
        }
    }

    // === Definitions ===

    pub fn def(&self, id: DefId) -> Option<&TypeDef> {
        self.defs.get(id.index())
    }

    pub(crate) fn def_mut(&mut self, id: DefId) -> Option<&mut TypeDef> {
        self.defs.get_mut(id.index())
    }

    pub fn defs(&self) -> impl Iterator<Item = (DefId, &TypeDef)> {
        self.defs.iter().enumerate().map(|(i, def)| {
            (
                DefId::new(u32::try_from(i).unwrap_or(u32::MAX)),
                def,
            )
        })
    }

    // === Queries ===

    #[inline]
    pub fn is_pointer(&self, idx: Idx) -> bool {
        self.flags(idx).contains(TypeFlags::IS_POINTER)
    }

    /// `T` for `T*`.
    pub fn pointee(&self, idx: Idx) -> Option<Idx> {
        match self.items.get(idx.index()) {
            Some(TypeData::Pointer(pointee)) => Some(*pointee),
            _ => None,
        }
    }

    #[inline]
    pub fn is_void_pointer(&self, idx: Idx) -> bool {
        self.pointee(idx) == Some(Idx::VOID)
    }

    /// Element type and rank of an array.
    pub fn array_element(&self, idx: Idx) -> Option<(Idx, u8)> {
        match self.items.get(idx.index()) {
            Some(TypeData::Array { element, rank }) => Some((*element, *rank)),
            _ => None,
        }
    }

    pub fn nullable_inner(&self, idx: Idx) -> Option<Idx> {
        match self.items.get(idx.index()) {
            Some(TypeData::Nullable(inner)) => Some(*inner),
            _ => None,
        }
    }

    /// Definition behind a nominal or applied type.
    pub fn nominal_def(&self, idx: Idx) -> Option<DefId> {
        match self.items.get(idx.index()) {
            Some(TypeData::Nominal(def) | TypeData::Applied { def, .. }) => Some(*def),
            _ => None,
        }
    }

    pub fn is_enum(&self, idx: Idx) -> bool {
        self.nominal_def(idx)
            .and_then(|def| self.def(def))
            .is_some_and(|def| def.kind == DefKind::Enum)
    }

    /// Managed-heap types. Fields reached through these are never stable.
    #[inline]
    pub fn is_reference_type(&self, idx: Idx) -> bool {
        self.flags(idx).contains(TypeFlags::IS_REFERENCE)
    }

    /// Types stored inline in their container: primitives other than
    /// string and object, pointers, structs, enums, nullable wrappers.
    pub fn is_value_type(&self, idx: Idx) -> bool {
        if idx.is_primitive() {
            return !matches!(idx, Idx::STRING | Idx::OBJECT | Idx::NULL | Idx::ERROR);
        }
        let flags = self.flags(idx);
        flags.intersects(TypeFlags::IS_POINTER | TypeFlags::IS_VALUE_AGGREGATE)
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}
