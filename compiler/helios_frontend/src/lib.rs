//! Bytecode-to-SSA construction pipeline.
//!
//! For each method the pipeline runs, in order:
//! 1. [`ControlFlow::build`] partitions the instruction stream into basic
//!    blocks and edges, guaranteeing one entry and one unique exit
//! 2. [`VariableModel::analyze`] classifies arguments/locals as
//!    SSA-eligible or address-taken
//! 3. the translator walks blocks in reverse postorder, lowering each
//!    instruction against an explicit evaluation stack and resolving
//!    variable reads/writes through the sealing [`SsaBuilder`]
//!
//! Methods compile independently and in parallel; the shared
//! [`helios_types::TypeInterner`] is the only cross-method resource.

mod cfg;
mod driver;
mod resolver;
mod ssa;
mod translate;
mod variables;

pub use cfg::ControlFlow;
pub use driver::{compile_all, compile_method};
pub use resolver::{CalleeInfo, MethodResolver, Settings, StaticField, StaticLoadMode};
pub use ssa::SsaBuilder;
pub use variables::{VarInfo, VariableModel};
