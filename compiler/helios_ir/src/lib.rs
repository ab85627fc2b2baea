//! Intermediate representation types for the Helios frontend.
//!
//! This crate is the shared leaf of the workspace. It defines:
//! - compact source locations ([`Location`])
//! - machine-level basic value kinds ([`BasicKind`])
//! - the decoded bytecode instruction model consumed by the frontend
//! - the SSA IR (values, blocks, methods) produced by the frontend
//!
//! All handles are 32-bit indices into arenas ([`ValueId`], [`BlockId`],
//! [`TypeId`]); equality on a handle is O(1) and never structural.

mod basic_kind;
mod block;
mod bytecode;
mod location;
mod method;
mod type_id;
mod value;
mod variable;

pub use basic_kind::BasicKind;
pub use block::{Block, BlockId};
pub use bytecode::{
    Const, FieldRef, InstrFlags, Instruction, MethodInfo, MethodToken, OpCode,
};
pub use location::Location;
pub use method::{Method, MethodBuilder, MethodError};
pub use type_id::TypeId;
pub use value::{
    ArithFlags, BinaryOp, CompareKind, PhiOperands, UnaryOp, Value, ValueData, ValueId,
};
pub use variable::{VariableKind, VariableRef};

/// Statically assert the size of a type.
///
/// Keeps hot IR types from accidentally growing.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{BlockId, Location, TypeId, ValueId, VariableRef};
    static_assert_size!(Location, 4);
    static_assert_size!(TypeId, 4);
    static_assert_size!(ValueId, 4);
    static_assert_size!(BlockId, 4);
    static_assert_size!(VariableRef, 4);
}
