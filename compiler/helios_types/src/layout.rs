//! Structure layout construction.
//!
//! [`StructBuilder`] is a transient, single-writer accumulator: fields are
//! added in declaration order, nested structures are flattened in place, and
//! `seal` finalizes into a canonical structure type (or collapses to the
//! single field's type). [`vector_chunks`] detects contiguous runs of
//! identical scalars that can be grouped into power-of-two vector chunks.

use helios_diagnostic::{FrontendError, FrontendResult};
use helios_ir::{BasicKind, TypeId};

use crate::flags::TypeFlags;
use crate::interner::TypeInterner;
use crate::node::{DirectField, StructureData, TypeNode};

#[inline]
const fn align_up(offset: u32, alignment: u32) -> u32 {
    debug_assert!(alignment > 0);
    (offset + alignment - 1) / alignment * alignment
}

/// Largest power of two dividing `size`, capped at 16. 1 for size 0.
#[inline]
const fn pow2_divisor(size: u32) -> u32 {
    if size == 0 {
        1
    } else {
        let p = 1u32 << size.trailing_zeros();
        if p > 16 {
            16
        } else {
            p
        }
    }
}

/// Accumulates field types and tracks the running offset and alignment for
/// one structure under construction.
pub struct StructBuilder<'a> {
    interner: &'a TypeInterner,
    direct: Vec<DirectField>,
    fields: Vec<TypeId>,
    offsets: Vec<u32>,
    offset: u32,
    alignment: u32,
    flags: TypeFlags,
    explicit_size: Option<u32>,
}

impl<'a> StructBuilder<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        StructBuilder {
            interner,
            direct: Vec::new(),
            fields: Vec::new(),
            offsets: Vec::new(),
            offset: 0,
            alignment: 1,
            flags: TypeFlags::empty(),
            explicit_size: None,
        }
    }

    /// Declare an explicit total size larger than the naturally packed one.
    /// The gap is honored as trailing padding at `seal`.
    pub fn set_explicit_size(&mut self, size: u32) {
        self.explicit_size = Some(size);
    }

    /// Number of declared (direct) fields added so far.
    pub fn direct_count(&self) -> usize {
        self.direct.len()
    }

    /// Alignment a field of type `ty` demands inside an aggregate.
    ///
    /// Nested structures additionally align to the largest power of two
    /// dividing their size (capped at 16), which keeps array-of-aggregate
    /// elements self-aligned.
    fn field_alignment(&self, ty: TypeId, node: &TypeNode) -> u32 {
        match node {
            TypeNode::Structure(data) => data.alignment.max(pow2_divisor(data.size)),
            _ => self.interner.alignment(ty),
        }
    }

    /// Add the next field.
    ///
    /// A nested structure is flattened field-by-field using its own internal
    /// offsets; the running offset afterwards advances by the nested
    /// structure's declared size (which may exceed the sum of its fields),
    /// not merely the fields it contributed.
    pub fn add(&mut self, ty: TypeId) -> FrontendResult<()> {
        let node = self.interner.node(ty);
        match node {
            TypeNode::Void => {
                return Err(FrontendError::structural("void is not a usable field type"))
            }
            TypeNode::Str | TypeNode::Handle => {
                return Err(FrontendError::structural(
                    "reference types cannot be structure fields under the value-type restriction",
                ))
            }
            _ => {}
        }

        let alignment = self.field_alignment(ty, &node);
        let base = align_up(self.offset, alignment);
        let flat_start = self.fields.len() as u32;

        match &node {
            TypeNode::Structure(data) => {
                for (index, &field) in data.fields.iter().enumerate() {
                    self.fields.push(field);
                    self.offsets.push(base + data.offsets[index]);
                }
                self.offset = base + data.size;
            }
            _ => {
                self.fields.push(ty);
                self.offsets.push(base);
                self.offset = base + self.interner.size(ty);
            }
        }

        self.direct.push(DirectField {
            ty,
            flat_start,
            flat_len: self.fields.len() as u32 - flat_start,
        });
        self.alignment = self.alignment.max(alignment);
        self.flags |= TypeFlags::propagate_from(self.interner.flags(ty));
        Ok(())
    }

    fn push_padding(&mut self, kind: BasicKind, offset: u32) {
        let ty = self.interner.padding(kind);
        let flat_start = self.fields.len() as u32;
        self.fields.push(ty);
        self.offsets.push(offset);
        self.direct.push(DirectField {
            ty,
            flat_start,
            flat_len: 1,
        });
    }

    /// Finalize into a canonical type.
    ///
    /// - an empty builder receives one implicit 1-byte padding field, so
    ///   every structure has at least one addressable field
    /// - exactly one non-padding field collapses to that field's type
    /// - otherwise trailing padding brings the size up to the declared (or
    ///   alignment-rounded) size, except for view-dependent aggregates,
    ///   whose size is not meaningful until view lowering
    pub fn seal(mut self) -> FrontendResult<TypeId> {
        if self.fields.is_empty() {
            self.push_padding(BasicKind::Int8, 0);
            self.offset = 1;
        }

        let size = if self.flags.is_view_dependent() {
            self.offset
        } else {
            let natural = align_up(self.offset, self.alignment);
            let target = natural.max(self.explicit_size.unwrap_or(0));
            let mut cursor = self.offset;
            while cursor < target {
                let shortfall = target - cursor;
                let kind = padding_kind(cursor, shortfall);
                self.push_padding(kind, cursor);
                cursor += kind.size();
            }
            target
        };

        // Single-field collapse: a wrapper around exactly one real field is
        // the field itself.
        if self.fields.len() == 1 && !self.interner.node(self.fields[0]).is_padding() {
            return Ok(self.fields[0]);
        }

        Ok(self.interner.intern(TypeNode::Structure(StructureData {
            direct: self.direct.into_boxed_slice(),
            fields: self.fields.into_boxed_slice(),
            offsets: self.offsets.into_boxed_slice(),
            size,
            alignment: self.alignment,
        })))
    }
}

/// Largest basic kind that fits `shortfall` bytes self-aligned at `offset`.
fn padding_kind(offset: u32, shortfall: u32) -> BasicKind {
    for kind in [BasicKind::Int64, BasicKind::Int32, BasicKind::Int16] {
        let size = kind.size();
        if size <= shortfall && offset % size == 0 {
            return kind;
        }
    }
    BasicKind::Int8
}

/// A contiguous group of identical scalar fields usable as one vector.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VectorChunk {
    /// Index of the first field in the chunk.
    pub start: usize,
    /// Number of fields (2 or 4).
    pub len: usize,
}

/// Detect vectorizable field ranges.
///
/// Contiguous runs of identical, contiguously-offset scalar fields are
/// grouped into chunks of 4 or 2 elements, at most `max_bytes` wide. A
/// candidate chunk is accepted only if its base offset is divisible by its
/// own byte size and the midpoint split would leave both halves
/// self-aligned too; a failing candidate is bisected instead.
pub fn vector_chunks(
    fields: &[TypeId],
    offsets: &[u32],
    interner: &TypeInterner,
    max_bytes: u32,
) -> Vec<VectorChunk> {
    debug_assert_eq!(fields.len(), offsets.len());
    let mut chunks = Vec::new();
    let mut i = 0;
    while i < fields.len() {
        let ty = fields[i];
        let Some(kind) = interner.basic_kind(ty) else {
            i += 1;
            continue;
        };
        let size = kind.size();

        // Extend the run of identical, contiguous scalars.
        let mut end = i + 1;
        while end < fields.len() && fields[end] == ty && offsets[end] == offsets[end - 1] + size {
            end += 1;
        }

        let accept = |start: usize, len: usize| -> bool {
            if start + len > end {
                return false;
            }
            let bytes = len as u32 * size;
            if bytes > max_bytes || offsets[start] % bytes != 0 {
                return false;
            }
            let half = len as u32 / 2 * size;
            half == 0 || (offsets[start] % half == 0 && offsets[start + len / 2] % half == 0)
        };

        let mut j = i;
        while j < end {
            if accept(j, 4) {
                chunks.push(VectorChunk { start: j, len: 4 });
                j += 4;
            } else if accept(j, 2) {
                chunks.push(VectorChunk { start: j, len: 2 });
                j += 2;
            } else {
                j += 1;
            }
        }
        i = end;
    }
    chunks
}

#[cfg(test)]
mod tests;
