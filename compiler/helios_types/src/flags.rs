//! Pre-computed type dependence flags.
//!
//! Computed once when a type is interned, as the bitwise union of all
//! nested field flags plus the type's own category bit. Never recomputed.

use bitflags::bitflags;

bitflags! {
    /// What a type transitively contains.
    ///
    /// Used to gate layout decisions (view-dependent aggregates skip
    /// trailing padding) and later lowering stages.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u8 {
        /// Is or contains a pointer.
        const POINTER_DEPENDENT = 1 << 0;
        /// Is or contains a view (size not final until view lowering).
        const VIEW_DEPENDENT = 1 << 1;
        /// Is or contains a structure.
        const STRUCTURE_DEPENDENT = 1 << 2;
        /// Is or contains an array.
        const ARRAY_DEPENDENT = 1 << 3;
    }
}

impl TypeFlags {
    /// All dependence bits propagate from children to parents.
    pub const PROPAGATE_MASK: Self = Self::all();

    /// The child flags a parent inherits.
    #[inline]
    pub const fn propagate_from(child: Self) -> Self {
        Self::from_bits_truncate(child.bits() & Self::PROPAGATE_MASK.bits())
    }

    /// Union of the propagated flags of several children.
    #[inline]
    pub fn propagate_all(children: impl IntoIterator<Item = Self>) -> Self {
        let mut result = Self::empty();
        for child in children {
            result = result.union(Self::propagate_from(child));
        }
        result
    }

    #[inline]
    pub const fn is_view_dependent(self) -> bool {
        self.contains(Self::VIEW_DEPENDENT)
    }

    #[inline]
    pub const fn is_pointer_dependent(self) -> bool {
        self.contains(Self::POINTER_DEPENDENT)
    }
}

#[cfg(test)]
mod tests;
