//! Machine-level basic value kinds.
//!
//! A [`BasicKind`] is the machine category underlying a primitive type:
//! integer widths, float widths, and the 1-bit boolean. Signedness is not
//! part of the kind; instruction flags carry it.

use std::fmt;

/// The machine-level category of a primitive value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum BasicKind {
    /// 1-bit boolean predicate.
    Int1,
    /// 8-bit integer.
    Int8,
    /// 16-bit integer.
    Int16,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// 32-bit IEEE float.
    Float32,
    /// 64-bit IEEE float.
    Float64,
}

impl BasicKind {
    /// Size in bytes. `Int1` occupies a full byte in memory.
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            BasicKind::Int1 | BasicKind::Int8 => 1,
            BasicKind::Int16 => 2,
            BasicKind::Int32 | BasicKind::Float32 => 4,
            BasicKind::Int64 | BasicKind::Float64 => 8,
        }
    }

    /// Natural alignment in bytes (equal to the size, minimum 1).
    #[inline]
    pub const fn alignment(self) -> u32 {
        self.size()
    }

    /// The integer kind whose size is exactly `size` bytes, if any.
    ///
    /// This is the size table used by pointer-arithmetic folding: a stride
    /// only folds into element addressing when it matches one of these.
    #[inline]
    pub const fn from_size(size: u32) -> Option<BasicKind> {
        match size {
            1 => Some(BasicKind::Int8),
            2 => Some(BasicKind::Int16),
            4 => Some(BasicKind::Int32),
            8 => Some(BasicKind::Int64),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int1 | BasicKind::Int8 | BasicKind::Int16 | BasicKind::Int32 | BasicKind::Int64
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    /// The kind a value takes when loaded onto the evaluation stack.
    ///
    /// Byte and short widen to 32-bit so the stack's kind set stays
    /// minimal; booleans keep their predicate kind, everything else is
    /// unchanged.
    #[inline]
    pub const fn promoted(self) -> BasicKind {
        match self {
            BasicKind::Int8 | BasicKind::Int16 => BasicKind::Int32,
            other => other,
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BasicKind::Int1 => "i1",
            BasicKind::Int8 => "i8",
            BasicKind::Int16 => "i16",
            BasicKind::Int32 => "i32",
            BasicKind::Int64 => "i64",
            BasicKind::Float32 => "f32",
            BasicKind::Float64 => "f64",
        };
        f.write_str(name)
    }
}
