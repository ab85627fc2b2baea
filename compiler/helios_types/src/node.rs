//! Structural type descriptors.

use helios_ir::{BasicKind, TypeId};

/// Memory space a pointer or view refers into.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum AddressSpace {
    /// Unqualified; resolvable to any concrete space.
    Generic,
    /// Device-global memory.
    Global,
    /// Work-group shared memory.
    Shared,
    /// Per-thread local memory.
    Local,
}

/// One declared field of a structure, with its projection into the
/// flattened field list.
///
/// `flat_start..flat_start + flat_len` is the range of flattened entries
/// this field expands to (1 for scalars, more for nested aggregates).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct DirectField {
    pub ty: TypeId,
    pub flat_start: u32,
    pub flat_len: u32,
}

/// Layout payload of a structure type.
///
/// `fields` is the fully flattened view: nested aggregates are expanded in
/// place, so it contains only primitives, pointers, views, arrays, and
/// padding — never another structure. `offsets` runs parallel to `fields`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct StructureData {
    pub direct: Box<[DirectField]>,
    pub fields: Box<[TypeId]>,
    pub offsets: Box<[u32]>,
    pub size: u32,
    pub alignment: u32,
}

impl StructureData {
    /// Byte offset of a declared field.
    pub fn direct_offset(&self, index: u32) -> Option<u32> {
        let field = self.direct.get(index as usize)?;
        self.offsets.get(field.flat_start as usize).copied()
    }
}

/// A canonical structural type descriptor.
///
/// Closed tagged union: every consumer (layout, interning metrics, the
/// translator's receiver dispatch) matches exhaustively, so adding a
/// variant is a compile-time event.
///
/// Instances are owned exclusively by the interner; structural equality of
/// two interned nodes implies identity of their `TypeId`s.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeNode {
    /// No value.
    Void,
    /// Opaque string handle.
    Str,
    /// Opaque runtime handle.
    Handle,
    /// Machine scalar.
    Primitive(BasicKind),
    /// Synthetic filler emitted by layout; never addressable by user code.
    Padding(BasicKind),
    /// Raw pointer to `element`.
    Pointer {
        element: TypeId,
        space: AddressSpace,
    },
    /// Bounds-carrying memory view over `element`; lowered by a later
    /// stage, so its size is provisional.
    View {
        element: TypeId,
        space: AddressSpace,
    },
    /// Multi-dimensional array over `element`; runtime-lowered like views.
    Array { element: TypeId, dimensions: u32 },
    /// Flattened aggregate with byte-exact layout.
    Structure(StructureData),
}

impl TypeNode {
    /// The scalar kind, for primitive (non-padding) nodes.
    #[inline]
    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self {
            TypeNode::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Whether this node is synthetic padding.
    #[inline]
    pub fn is_padding(&self) -> bool {
        matches!(self, TypeNode::Padding(_))
    }

    /// The pointed-at or viewed element, for indirection nodes.
    #[inline]
    pub fn element(&self) -> Option<TypeId> {
        match self {
            TypeNode::Pointer { element, .. }
            | TypeNode::View { element, .. }
            | TypeNode::Array { element, .. } => Some(*element),
            _ => None,
        }
    }
}
