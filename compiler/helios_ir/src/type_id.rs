//! Canonical type handle.
//!
//! `TypeId` is THE type representation flowing through the frontend.
//! Types are stored in the interner's arena (`helios_types`) and referenced
//! by their 32-bit index; equality is O(1) index comparison, which is sound
//! because the interner guarantees one live record per structural shape.

use std::fmt;

use crate::BasicKind;

/// A 32-bit index into the type interner's arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Pre-seeded types (indices 0-9) ===
    // Interned at context construction, never evicted.

    /// The void type (no value).
    pub const VOID: Self = Self(0);
    /// The string handle type.
    pub const STR: Self = Self(1);
    /// The opaque runtime handle type.
    pub const HANDLE: Self = Self(2);
    /// 1-bit boolean.
    pub const BOOL: Self = Self(3);
    /// 8-bit integer.
    pub const INT8: Self = Self(4);
    /// 16-bit integer.
    pub const INT16: Self = Self(5);
    /// 32-bit integer.
    pub const INT32: Self = Self(6);
    /// 64-bit integer.
    pub const INT64: Self = Self(7);
    /// 32-bit float.
    pub const FLOAT32: Self = Self(8);
    /// 64-bit float.
    pub const FLOAT64: Self = Self(9);

    /// First index handed out for dynamically interned types.
    pub const FIRST_DYNAMIC: u32 = 10;

    /// Sentinel for "no type".
    pub const NONE: Self = Self(u32::MAX);

    /// Create a handle from a raw index.
    ///
    /// The caller must ensure the index is valid in the owning interner.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw arena index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check whether this is one of the pre-seeded types.
    #[inline]
    pub const fn is_seeded(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }

    /// Check whether this is the NONE sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// The pre-seeded handle for a primitive kind.
    #[inline]
    pub const fn for_basic(kind: BasicKind) -> Self {
        match kind {
            BasicKind::Int1 => Self::BOOL,
            BasicKind::Int8 => Self::INT8,
            BasicKind::Int16 => Self::INT16,
            BasicKind::Int32 => Self::INT32,
            BasicKind::Int64 => Self::INT64,
            BasicKind::Float32 => Self::FLOAT32,
            BasicKind::Float64 => Self::FLOAT64,
        }
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::VOID => write!(f, "TypeId::VOID"),
            Self::STR => write!(f, "TypeId::STR"),
            Self::HANDLE => write!(f, "TypeId::HANDLE"),
            Self::BOOL => write!(f, "TypeId::BOOL"),
            Self::INT8 => write!(f, "TypeId::INT8"),
            Self::INT16 => write!(f, "TypeId::INT16"),
            Self::INT32 => write!(f, "TypeId::INT32"),
            Self::INT64 => write!(f, "TypeId::INT64"),
            Self::FLOAT32 => write!(f, "TypeId::FLOAT32"),
            Self::FLOAT64 => write!(f, "TypeId::FLOAT64"),
            Self::NONE => write!(f, "TypeId::NONE"),
            _ => write!(f, "TypeId({})", self.0),
        }
    }
}
