//! Stable per-method variable keys.

use std::fmt;

/// Whether a variable is a method argument or a local slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum VariableKind {
    Argument,
    Local,
}

/// A stable key into a method's variable table.
///
/// `(index, kind)` pairs are never reused across methods. The frontend keeps
/// two parallel maps keyed by `VariableRef`: declared type information and
/// the current SSA value (or stack-slot address for address-taken variables).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct VariableRef {
    pub index: u16,
    pub kind: VariableKind,
}

impl VariableRef {
    #[inline]
    pub const fn argument(index: u16) -> Self {
        VariableRef {
            index,
            kind: VariableKind::Argument,
        }
    }

    #[inline]
    pub const fn local(index: u16) -> Self {
        VariableRef {
            index,
            kind: VariableKind::Local,
        }
    }
}

impl fmt::Debug for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            VariableKind::Argument => write!(f, "arg{}", self.index),
            VariableKind::Local => write!(f, "loc{}", self.index),
        }
    }
}
