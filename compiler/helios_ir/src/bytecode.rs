//! The decoded bytecode instruction model.
//!
//! The upstream decoder hands the frontend a linear instruction stream per
//! method. Every metadata operand (field, method, type reference) arrives
//! already resolved: field references name their owning type directly and
//! constrained-call prefixes carry the constrained `TypeId`. Branch targets
//! are instruction offsets into the method body.

use bitflags::bitflags;

use crate::value::{BinaryOp, CompareKind, UnaryOp};
use crate::{BasicKind, Location, TypeId, VariableRef};

bitflags! {
    /// Per-instruction modifier flags from the decoder.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct InstrFlags: u8 {
        /// Arithmetic must trap on numeric overflow.
        const OVERFLOW_CHECK = 1 << 0;
        /// Operands are treated as unsigned.
        const UNSIGNED = 1 << 1;
        /// Virtual call constrained to a known receiver type.
        const CONSTRAINED = 1 << 2;
    }
}

/// An immediate constant operand.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Const {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Const {
    /// The machine kind of the constant.
    #[inline]
    pub const fn kind(self) -> BasicKind {
        match self {
            Const::Bool(_) => BasicKind::Int1,
            Const::I32(_) => BasicKind::Int32,
            Const::I64(_) => BasicKind::Int64,
            Const::F32(_) => BasicKind::Float32,
            Const::F64(_) => BasicKind::Float64,
        }
    }

    /// The integer payload, if this is an integer constant.
    #[inline]
    pub const fn as_integer(self) -> Option<i64> {
        match self {
            Const::Bool(b) => Some(b as i64),
            Const::I32(v) => Some(v as i64),
            Const::I64(v) => Some(v),
            Const::F32(_) | Const::F64(_) => None,
        }
    }
}

/// An opaque, decoder-assigned method token.
///
/// Resolution to a callable target goes through the frontend's
/// `MethodResolver` collaborator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MethodToken(pub u32);

/// A metadata-resolved field reference: the owning type plus the field's
/// position in that type's declared (direct) field order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldRef {
    pub owner: TypeId,
    pub index: u32,
}

/// One decoded instruction category.
///
/// Closed set: every variant the decoder can produce is listed here, and the
/// translator matches exhaustively so that adding a category is a
/// compile-time event for every consumer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OpCode {
    Nop,
    /// Push an immediate constant.
    LoadConst(Const),
    /// Push the current value of an argument/local.
    LoadVariable(VariableRef),
    /// Pop a value into an argument/local.
    StoreVariable(VariableRef),
    /// Push the address of an argument/local (forces stack allocation).
    LoadVariableAddress(VariableRef),
    /// Pop two values, push the result.
    Binary(BinaryOp),
    /// Pop one value, push the result.
    Unary(UnaryOp),
    /// Pop two values, push a boolean.
    Compare(CompareKind),
    /// Pop one value, push it converted to the given kind.
    Convert(BasicKind),
    /// Unconditional jump to an instruction offset.
    Branch { target: u32 },
    /// Pop a condition; jump to `if_true` or `if_false`.
    ConditionalBranch { if_true: u32, if_false: u32 },
    /// Return from the method, popping the return value if non-void.
    Return,
    /// Direct call.
    Call(MethodToken),
    /// Virtual/interface call; `constrained` is the receiver type from a
    /// preceding constraint prefix, when one was present.
    CallVirtual {
        token: MethodToken,
        constrained: Option<TypeId>,
    },
    /// Indirect (computed-target) call. Never lowerable.
    CallIndirect,
    /// Pop a receiver (value or pointer), push the field's value.
    LoadField(FieldRef),
    /// Pop a value and a pointer receiver, store into the field.
    StoreField(FieldRef),
    /// Pop a pointer receiver, push the field's address.
    LoadFieldAddress(FieldRef),
    /// Pop an index and a pointer/view, push the element value.
    LoadElement,
    /// Pop a value, an index, and a pointer/view; store the element.
    StoreElement,
    /// Pop an index and a pointer/view, push the element address.
    LoadElementAddress,
    /// Allocate and construct an object via the given constructor token.
    NewObject(MethodToken),
    /// Push the value of a static field.
    LoadStatic(FieldRef),
    /// Dynamic runtime type test. Never lowerable.
    RuntimeTypeTest,
}

impl OpCode {
    /// Whether this instruction ends a basic block.
    #[inline]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            OpCode::Branch { .. } | OpCode::ConditionalBranch { .. } | OpCode::Return
        )
    }
}

/// One decoded instruction: category, modifier flags, and its location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub flags: InstrFlags,
    pub location: Location,
}

impl Instruction {
    /// Create an instruction located at the given offset, without flags.
    pub const fn new(opcode: OpCode, offset: u32) -> Self {
        Instruction {
            opcode,
            flags: InstrFlags::empty(),
            location: Location::new(offset),
        }
    }

    /// Attach modifier flags.
    pub const fn with_flags(mut self, flags: InstrFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Decoded metadata and body for one method.
#[derive(Clone, Debug)]
pub struct MethodInfo {
    /// Diagnostic name (namespace-qualified).
    pub name: String,
    /// Declared parameter types. For instance methods the receiver is
    /// parameter 0, already materialized by the decoder.
    pub params: Vec<TypeId>,
    /// Declared local slot types.
    pub locals: Vec<TypeId>,
    /// Whether the method has no receiver.
    pub is_static: bool,
    /// Return type; `TypeId::VOID` for none.
    pub return_type: TypeId,
    /// The linear instruction stream.
    pub body: Vec<Instruction>,
}
