//! The hash-consing type interner.
//!
//! One shared table per compilation session. Reads (structural lookups) take
//! a read lock; an insertion upgrades to a write lock only for the table
//! mutation itself. Metric computation for a candidate reads its children's
//! records *before* the write section is entered, so recursive nested-type
//! construction never holds the lock across a child interning call.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use helios_ir::{BasicKind, TypeId};

use crate::flags::TypeFlags;
use crate::node::{AddressSpace, TypeNode};

/// Size and alignment of a raw pointer on every supported target.
pub(crate) const POINTER_SIZE: u32 = 8;
/// Provisional size of a view (pointer + extent); finalized by view lowering.
pub(crate) const VIEW_SIZE: u32 = 16;

/// One canonical type: descriptor plus metrics computed at intern time.
#[derive(Clone, Debug)]
pub struct TypeRecord {
    pub node: TypeNode,
    pub flags: TypeFlags,
    pub size: u32,
    pub alignment: u32,
}

struct InternerState {
    /// Arena of canonical records, indexed by `TypeId::raw`.
    records: Vec<TypeRecord>,
    /// Structural index mapping a descriptor to its arena slot.
    index: FxHashMap<TypeNode, u32>,
}

impl InternerState {
    fn seeded() -> Self {
        let mut state = InternerState {
            records: Vec::with_capacity(64),
            index: FxHashMap::default(),
        };

        // Seed order must match the TypeId constants.
        let seeds = [
            (TypeNode::Void, 0, 1),
            (TypeNode::Str, POINTER_SIZE, POINTER_SIZE),
            (TypeNode::Handle, POINTER_SIZE, POINTER_SIZE),
            (TypeNode::Primitive(BasicKind::Int1), 1, 1),
            (TypeNode::Primitive(BasicKind::Int8), 1, 1),
            (TypeNode::Primitive(BasicKind::Int16), 2, 2),
            (TypeNode::Primitive(BasicKind::Int32), 4, 4),
            (TypeNode::Primitive(BasicKind::Int64), 8, 8),
            (TypeNode::Primitive(BasicKind::Float32), 4, 4),
            (TypeNode::Primitive(BasicKind::Float64), 8, 8),
        ];
        for (node, size, alignment) in seeds {
            let raw = state.records.len() as u32;
            state.index.insert(node.clone(), raw);
            state.records.push(TypeRecord {
                node,
                flags: TypeFlags::empty(),
                size,
                alignment,
            });
        }
        debug_assert_eq!(state.records.len() as u32, TypeId::FIRST_DYNAMIC);
        state
    }
}

/// Canonicalization table for structural type descriptors.
///
/// Guarantees one live record per structural shape within a session:
/// `intern(a) == intern(b)` exactly when `a` and `b` are structurally
/// equal, so all downstream comparisons are O(1) id comparisons.
///
/// Shared read-mostly across all concurrently compiling methods.
pub struct TypeInterner {
    state: RwLock<InternerState>,
}

impl TypeInterner {
    /// Create an interner pre-seeded with void/str/handle and the
    /// primitive types at their fixed `TypeId` indices.
    pub fn new() -> Self {
        TypeInterner {
            state: RwLock::new(InternerState::seeded()),
        }
    }

    /// Reset the table back to the pre-seeded set.
    ///
    /// For use between independent compilation sessions, never mid-session:
    /// every dynamic `TypeId` handed out before the reset is invalidated.
    pub fn clear(&self) {
        *self.state.write() = InternerState::seeded();
    }

    /// Number of interned types, including the seeded set.
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Whether only the pre-seeded types exist.
    pub fn is_empty(&self) -> bool {
        self.len() as u32 <= TypeId::FIRST_DYNAMIC
    }

    fn seeded_id(node: &TypeNode) -> Option<TypeId> {
        match node {
            TypeNode::Void => Some(TypeId::VOID),
            TypeNode::Str => Some(TypeId::STR),
            TypeNode::Handle => Some(TypeId::HANDLE),
            TypeNode::Primitive(kind) => Some(TypeId::for_basic(*kind)),
            _ => None,
        }
    }

    /// Return the canonical id for `node`, inserting it if absent.
    ///
    /// First insertion compares structurally (tag plus recursive children,
    /// all already canonical ids); afterwards the id itself is the
    /// comparison.
    pub fn intern(&self, node: TypeNode) -> TypeId {
        if let Some(id) = Self::seeded_id(&node) {
            return id;
        }

        // Fast path: already interned.
        {
            let state = self.state.read();
            if let Some(&raw) = state.index.get(&node) {
                return TypeId::from_raw(raw);
            }
        }

        // Metrics read children's records; compute them outside the write
        // section so recursive construction cannot self-deadlock.
        let record = self.make_record(node);

        let mut state = self.state.write();
        if let Some(&raw) = state.index.get(&record.node) {
            return TypeId::from_raw(raw);
        }
        let raw = state.records.len() as u32;
        trace!(id = raw, node = ?record.node, "interned type");
        state.index.insert(record.node.clone(), raw);
        state.records.push(record);
        TypeId::from_raw(raw)
    }

    fn make_record(&self, node: TypeNode) -> TypeRecord {
        let (flags, size, alignment) = match &node {
            TypeNode::Void => (TypeFlags::empty(), 0, 1),
            TypeNode::Str | TypeNode::Handle => {
                (TypeFlags::empty(), POINTER_SIZE, POINTER_SIZE)
            }
            TypeNode::Primitive(kind) | TypeNode::Padding(kind) => {
                (TypeFlags::empty(), kind.size(), kind.alignment())
            }
            TypeNode::Pointer { element, .. } => (
                TypeFlags::POINTER_DEPENDENT | TypeFlags::propagate_from(self.flags(*element)),
                POINTER_SIZE,
                POINTER_SIZE,
            ),
            TypeNode::View { element, .. } => (
                TypeFlags::VIEW_DEPENDENT | TypeFlags::propagate_from(self.flags(*element)),
                VIEW_SIZE,
                POINTER_SIZE,
            ),
            TypeNode::Array { element, .. } => (
                // Arrays are lowered through views; both dependence bits.
                TypeFlags::ARRAY_DEPENDENT
                    | TypeFlags::VIEW_DEPENDENT
                    | TypeFlags::propagate_from(self.flags(*element)),
                VIEW_SIZE,
                POINTER_SIZE,
            ),
            TypeNode::Structure(data) => {
                debug_assert!(
                    !data.fields.is_empty(),
                    "structures always carry at least one field"
                );
                let child_flags =
                    TypeFlags::propagate_all(data.fields.iter().map(|&f| self.flags(f)));
                (
                    TypeFlags::STRUCTURE_DEPENDENT | child_flags,
                    data.size,
                    data.alignment,
                )
            }
        };
        TypeRecord {
            node,
            flags,
            size,
            alignment,
        }
    }

    /// The descriptor for an id. Panics on an id this interner never issued.
    pub fn node(&self, id: TypeId) -> TypeNode {
        self.state.read().records[id.raw() as usize].node.clone()
    }

    /// Dependence flags, computed once at intern time.
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.state.read().records[id.raw() as usize].flags
    }

    /// Size in bytes.
    pub fn size(&self, id: TypeId) -> u32 {
        self.state.read().records[id.raw() as usize].size
    }

    /// Alignment in bytes. Non-zero, and divides the offset of every field
    /// placed at this type.
    pub fn alignment(&self, id: TypeId) -> u32 {
        self.state.read().records[id.raw() as usize].alignment
    }

    // Convenience constructors. All go through `intern`, so repeated calls
    // with the same arguments return the identical id.

    pub fn primitive(&self, kind: BasicKind) -> TypeId {
        TypeId::for_basic(kind)
    }

    pub fn padding(&self, kind: BasicKind) -> TypeId {
        self.intern(TypeNode::Padding(kind))
    }

    pub fn pointer(&self, element: TypeId, space: AddressSpace) -> TypeId {
        self.intern(TypeNode::Pointer { element, space })
    }

    pub fn view(&self, element: TypeId, space: AddressSpace) -> TypeId {
        self.intern(TypeNode::View { element, space })
    }

    pub fn array(&self, element: TypeId, dimensions: u32) -> TypeId {
        self.intern(TypeNode::Array {
            element,
            dimensions,
        })
    }

    /// The element behind a pointer/view/array id, if it is one.
    pub fn element(&self, id: TypeId) -> Option<TypeId> {
        self.state.read().records[id.raw() as usize].node.element()
    }

    /// The scalar kind of a primitive id, if it is one.
    pub fn basic_kind(&self, id: TypeId) -> Option<BasicKind> {
        self.state.read().records[id.raw() as usize]
            .node
            .basic_kind()
    }

    /// Whether `id` is a pointer type.
    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(
            self.state.read().records[id.raw() as usize].node,
            TypeNode::Pointer { .. }
        )
    }

    /// Resolve a declared field of a structure: `(field type, flattened
    /// field index)`. The byte offset, when needed, is the structure's
    /// `offsets` entry at that flattened index.
    ///
    /// A non-structure receiver resolves index 0 to itself — the
    /// single-field collapse optimization erases one-field wrappers, so a
    /// field access through a collapsed type degenerates to the value.
    pub fn direct_field(&self, owner: TypeId, index: u32) -> Option<(TypeId, u32)> {
        let state = self.state.read();
        match &state.records[owner.raw() as usize].node {
            TypeNode::Structure(data) => {
                let field = data.direct.get(index as usize)?;
                Some((field.ty, field.flat_start))
            }
            _ if index == 0 => Some((owner, 0)),
            _ => None,
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
