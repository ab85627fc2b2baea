//! Metadata resolution collaborators.
//!
//! The frontend never owns metadata tables. Method tokens, constructor
//! tokens, and static field references are resolved by the embedder through
//! [`MethodResolver`]; the translator only decides what a failed resolution
//! means (always an `Unsupported` error, never a panic). [`Settings`] carries
//! the driver-level policy knobs.

use helios_ir::{FieldRef, MethodToken, TypeId};

/// Signature of a resolved call target.
///
/// For instance methods the receiver is parameter 0, matching the decoded
/// [`helios_ir::MethodInfo`] convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalleeInfo {
    /// Namespace-qualified name, used for diagnostics and the
    /// forbidden-namespace check.
    pub name: String,
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub is_static: bool,
}

impl CalleeInfo {
    /// Number of stack operands the call pops.
    pub fn arg_count(&self) -> usize {
        self.params.len()
    }
}

/// A resolved static field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticField {
    pub name: String,
    pub ty: TypeId,
    /// Whether the field can be written after initialization. Mutable
    /// statics are only loadable under [`StaticLoadMode::Mutable`].
    pub mutable: bool,
}

/// Policy for loads of static fields.
///
/// Accelerator code cannot observe host-side writes, so a load of a mutable
/// static silently snapshots whatever value the field held at compile time.
/// The default mode rejects that; opting in acknowledges the snapshot
/// semantics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum StaticLoadMode {
    /// Only immutable statics may be loaded.
    #[default]
    ReadOnly,
    /// Mutable statics load their compile-time snapshot.
    Mutable,
}

/// Driver-level translation policy.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub static_load_mode: StaticLoadMode,
    /// Namespace prefixes whose members may not be called (reflection,
    /// host-only runtime services). Matched against the callee's qualified
    /// name by prefix.
    pub forbidden_namespaces: Vec<String>,
}

impl Settings {
    /// Whether `name` falls under a forbidden namespace.
    pub fn is_forbidden(&self, name: &str) -> bool {
        self.forbidden_namespaces
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

/// Embedder-supplied metadata resolution.
///
/// `Sync` because method compilation runs in parallel against one resolver.
pub trait MethodResolver: Sync {
    /// Resolve a direct-call token to its target signature.
    fn resolve_call(&self, token: MethodToken) -> Option<CalleeInfo>;

    /// Resolve a virtual-call token against a constrained receiver type,
    /// yielding the concrete override's token. `None` when the dispatch
    /// cannot be decided at compile time.
    fn devirtualize(&self, token: MethodToken, constrained: TypeId) -> Option<MethodToken>;

    /// Resolve a constructor token for instance creation.
    fn resolve_constructor(&self, token: MethodToken) -> Option<CalleeInfo>;

    /// Resolve a static field reference.
    fn static_field(&self, field: FieldRef) -> Option<StaticField>;
}
