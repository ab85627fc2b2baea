//! Structural type system for the Helios frontend.
//!
//! A hash-consed universe of canonical type descriptors with byte-exact
//! size/alignment/offset computation:
//! - [`TypeNode`]: the closed descriptor union (primitives, pointers, views,
//!   arrays, structures, padding, void/string/handle)
//! - [`TypeInterner`]: the shared canonicalization table; one live record
//!   per structural shape, so `TypeId` equality is structural equality
//! - [`StructBuilder`]: layout engine that flattens nested aggregates and
//!   appends trailing padding
//! - [`TypeFlags`]: dependence flags computed once at intern time
//!
//! The interner is the one resource shared by all concurrently compiling
//! methods; everything else here is value-like.

mod flags;
mod interner;
mod layout;
mod node;

pub use flags::TypeFlags;
pub use interner::{TypeInterner, TypeRecord};
pub use layout::{vector_chunks, StructBuilder, VectorChunk};
pub use node::{AddressSpace, DirectField, StructureData, TypeNode};
