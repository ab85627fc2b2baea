//! Bytecode locations for diagnostics.

use std::fmt;

/// Position of an instruction inside its method's bytecode.
///
/// Layout: 4 bytes — the instruction offset from the start of the method
/// body. Locations identify instructions for diagnostics only; they carry
/// no semantic meaning in the IR.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(transparent)]
pub struct Location {
    pub offset: u32,
}

impl Location {
    /// Sentinel for synthesized values with no bytecode counterpart.
    pub const UNKNOWN: Location = Location { offset: u32::MAX };

    /// Create a location at the given instruction offset.
    #[inline]
    pub const fn new(offset: u32) -> Self {
        Location { offset }
    }

    /// Check whether this is the unknown sentinel.
    #[inline]
    pub const fn is_known(self) -> bool {
        self.offset != u32::MAX
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "Location({})", self.offset)
        } else {
            write!(f, "Location(?)")
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "offset {}", self.offset)
        } else {
            write!(f, "unknown offset")
        }
    }
}
