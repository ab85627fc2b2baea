//! Basic blocks.

use smallvec::SmallVec;
use std::fmt;

use crate::ValueId;

/// A 32-bit index into a method's block list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// Sentinel for "no block".
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE {
            write!(f, "b?")
        } else {
            write!(f, "b{}", self.0)
        }
    }
}

/// One basic block: an ordered value list plus its CFG edges.
///
/// `sealed` is the SSA-construction state: true once all predecessors are
/// known and every deferred phi has been resolved. Every block reachable
/// from the entry must be sealed before the method can be finished.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub instrs: Vec<ValueId>,
    pub successors: SmallVec<[BlockId; 2]>,
    pub predecessors: SmallVec<[BlockId; 2]>,
    pub sealed: bool,
}

impl Block {
    /// The block's terminating value, if it has one yet.
    pub fn terminator(&self) -> Option<ValueId> {
        self.instrs.last().copied()
    }
}
