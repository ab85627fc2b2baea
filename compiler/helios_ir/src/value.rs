//! SSA values.
//!
//! Values live in a per-method arena owned by [`crate::MethodBuilder`] and
//! are referenced by 32-bit [`ValueId`]s. Use edges are the operand id lists
//! stored on the consuming value; there are no back-pointers.

use bitflags::bitflags;
use smallvec::SmallVec;
use std::fmt;

use crate::bytecode::{Const, FieldRef, MethodToken};
use crate::{BlockId, Location, TypeId};

/// A 32-bit index into a method's value arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    /// Sentinel for "no value" (for example an unbound phi operand).
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
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "v?")
        } else {
            write!(f, "v{}", self.0)
        }
    }
}

bitflags! {
    /// The two independent arithmetic flag sets: overflow checking and
    /// signedness. Derived from instruction flags during translation.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ArithFlags: u8 {
        const OVERFLOW_CHECK = 1 << 0;
        const UNSIGNED = 1 << 1;
    }
}

/// Binary arithmetic and bitwise operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Comparison predicates.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CompareKind {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Phi operand list: (predecessor block, incoming value).
pub type PhiOperands = SmallVec<[(BlockId, ValueId); 2]>;

/// The payload of one SSA value.
///
/// Closed tagged union; every consumer matches exhaustively.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueData {
    /// Method parameter `index`, materialized in the entry block.
    Param { index: u16 },
    /// Immediate constant.
    Const(Const),
    Binary {
        op: BinaryOp,
        lhs: ValueId,
        rhs: ValueId,
        flags: ArithFlags,
    },
    Unary {
        op: UnaryOp,
        operand: ValueId,
        flags: ArithFlags,
    },
    Compare {
        kind: CompareKind,
        lhs: ValueId,
        rhs: ValueId,
        flags: ArithFlags,
    },
    /// Numeric conversion; the target kind is the value's stamped type.
    Convert { value: ValueId, flags: ArithFlags },
    /// Confluence value merging differing definitions at a block with
    /// multiple predecessors. `incomplete` marks a placeholder created while
    /// the owning block was unsealed; it must be false in a finished method.
    Phi {
        operands: PhiOperands,
        incomplete: bool,
    },
    /// Entry-block stack slot for an address-taken variable.
    Alloca,
    /// Indirect load through a pointer.
    Load { address: ValueId },
    /// Indirect store through a pointer.
    Store { address: ValueId, value: ValueId },
    /// Direct field extraction from a structure *value* (no address).
    GetField { object: ValueId, field_index: u32 },
    /// Address of a field behind a pointer receiver.
    FieldAddress { address: ValueId, field_index: u32 },
    /// Strided element address: the address of element `index` behind
    /// `address`, with the stride implied by the pointee type. This is the
    /// LEA operation produced by pointer-arithmetic folding.
    ElementAddress { address: ValueId, index: ValueId },
    /// Direct call to a resolved target.
    Call {
        target: MethodToken,
        args: SmallVec<[ValueId; 4]>,
    },
    /// Load of a static field (immutable, or permitted by driver policy).
    LoadStatic { field: FieldRef },
    Return { value: Option<ValueId> },
    Branch { target: BlockId },
    CondBranch {
        condition: ValueId,
        if_true: BlockId,
        if_false: BlockId,
    },
}

impl ValueData {
    /// Whether this value terminates a block.
    #[inline]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            ValueData::Return { .. } | ValueData::Branch { .. } | ValueData::CondBranch { .. }
        )
    }

    /// Visit every value operand in place.
    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut ValueId)) {
        match self {
            ValueData::Param { .. }
            | ValueData::Const(_)
            | ValueData::Alloca
            | ValueData::LoadStatic { .. }
            | ValueData::Branch { .. } => {}
            ValueData::Binary { lhs, rhs, .. } | ValueData::Compare { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            ValueData::Unary { operand, .. } => f(operand),
            ValueData::Convert { value, .. } => f(value),
            ValueData::Phi { operands, .. } => {
                for (_, value) in operands.iter_mut() {
                    f(value);
                }
            }
            ValueData::Load { address } => f(address),
            ValueData::Store { address, value } => {
                f(address);
                f(value);
            }
            ValueData::GetField { object, .. } => f(object),
            ValueData::FieldAddress { address, .. } => f(address),
            ValueData::ElementAddress { address, index } => {
                f(address);
                f(index);
            }
            ValueData::Call { args, .. } => {
                for arg in args.iter_mut() {
                    f(arg);
                }
            }
            ValueData::Return { value } => {
                if let Some(value) = value {
                    f(value);
                }
            }
            ValueData::CondBranch { condition, .. } => f(condition),
        }
    }
}

/// One SSA value: payload plus its stamped type and source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub data: ValueData,
    pub ty: TypeId,
    pub location: Location,
}
