//! Frontend error values.

use std::fmt;

use helios_ir::Location;

/// Result alias used throughout the frontend.
pub type FrontendResult<T> = Result<T, FrontendError>;

/// Why a bytecode pattern has no lowering rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// Indirect (computed-target) call.
    IndirectCall,
    /// Virtual dispatch that could not be devirtualized.
    UnresolvedVirtualCall,
    /// Call token that resolves to no known target.
    UnresolvedCall,
    /// Instance creation with no resolvable constructor.
    UnresolvedConstructor,
    /// Dynamic runtime type test.
    RuntimeTypeTest,
    /// Load of a mutable static outside the permitted mode.
    MutableStaticLoad,
    /// Static field token that resolves to no known field.
    UnresolvedStaticField,
    /// Call into a forbidden runtime/reflection namespace.
    ForbiddenNamespace,
    /// Any other instruction with no lowering rule.
    Instruction,
}

impl UnsupportedReason {
    fn describe(&self) -> &'static str {
        match self {
            UnsupportedReason::IndirectCall => "indirect call",
            UnsupportedReason::UnresolvedVirtualCall => "unresolved virtual call",
            UnsupportedReason::UnresolvedCall => "unresolved call target",
            UnsupportedReason::UnresolvedConstructor => "unresolved constructor",
            UnsupportedReason::RuntimeTypeTest => "runtime type test",
            UnsupportedReason::MutableStaticLoad => "load of mutable static field",
            UnsupportedReason::UnresolvedStaticField => "unresolved static field",
            UnsupportedReason::ForbiddenNamespace => "call into forbidden namespace",
            UnsupportedReason::Instruction => "unsupported instruction",
        }
    }
}

/// One frame of the call-site chain attached to an error: the method being
/// compiled and the call site inside it that led further in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub method: String,
    pub location: Location,
}

/// An error raised during method translation.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontendError {
    /// A bytecode pattern with no lowering rule. Recoverable per
    /// compilation unit; carries the triggering location and, when known,
    /// the offending member's name.
    Unsupported {
        reason: UnsupportedReason,
        member: Option<String>,
        location: Location,
        frames: Vec<CallFrame>,
    },
    /// An invariant violation indicating a defect in an earlier stage.
    /// Propagates without re-wrapping to preserve its precise origin.
    Internal {
        message: String,
        location: Location,
    },
    /// A request to build a type this system cannot represent.
    StructuralType {
        message: String,
        frames: Vec<CallFrame>,
    },
}

impl FrontendError {
    /// Construct an unsupported-construct error.
    pub fn unsupported(reason: UnsupportedReason, location: Location) -> Self {
        FrontendError::Unsupported {
            reason,
            member: None,
            location,
            frames: Vec::new(),
        }
    }

    /// Construct an unsupported-construct error naming the offending member.
    pub fn unsupported_member(
        reason: UnsupportedReason,
        member: impl Into<String>,
        location: Location,
    ) -> Self {
        FrontendError::Unsupported {
            reason,
            member: Some(member.into()),
            location,
            frames: Vec::new(),
        }
    }

    /// Construct an internal-compiler error.
    pub fn internal(message: impl Into<String>, location: Location) -> Self {
        FrontendError::Internal {
            message: message.into(),
            location,
        }
    }

    /// Construct a structural-type error.
    pub fn structural(message: impl Into<String>) -> Self {
        FrontendError::StructuralType {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Whether this error is an internal-compiler error.
    ///
    /// Internal errors bypass all further wrapping once classified.
    pub fn is_internal(&self) -> bool {
        matches!(self, FrontendError::Internal { .. })
    }

    /// Append a call-site frame to the chain.
    ///
    /// Internal errors are returned unchanged: their origin is never
    /// obscured by the methods that happened to inline them.
    pub fn with_frame(mut self, method: impl Into<String>, location: Location) -> Self {
        let frame = CallFrame {
            method: method.into(),
            location,
        };
        match &mut self {
            FrontendError::Unsupported { frames, .. }
            | FrontendError::StructuralType { frames, .. } => frames.push(frame),
            FrontendError::Internal { .. } => {}
        }
        self
    }

    /// The triggering location, when the error class carries one.
    pub fn location(&self) -> Option<Location> {
        match self {
            FrontendError::Unsupported { location, .. }
            | FrontendError::Internal { location, .. } => Some(*location),
            FrontendError::StructuralType { .. } => None,
        }
    }

    /// The call-site chain, innermost first. Empty for internal errors.
    pub fn frames(&self) -> &[CallFrame] {
        match self {
            FrontendError::Unsupported { frames, .. }
            | FrontendError::StructuralType { frames, .. } => frames,
            FrontendError::Internal { .. } => &[],
        }
    }
}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontendError::Unsupported {
                reason,
                member,
                location,
                frames,
            } => {
                write!(f, "{} at {location}", reason.describe())?;
                if let Some(member) = member {
                    write!(f, " ({member})")?;
                }
                write_frames(f, frames)
            }
            FrontendError::Internal { message, location } => {
                write!(f, "internal compiler error: {message} at {location}")
            }
            FrontendError::StructuralType { message, frames } => {
                write!(f, "unrepresentable type: {message}")?;
                write_frames(f, frames)
            }
        }
    }
}

fn write_frames(f: &mut fmt::Formatter<'_>, frames: &[CallFrame]) -> fmt::Result {
    for frame in frames {
        write!(f, "\n  in {} at {}", frame.method, frame.location)?;
    }
    Ok(())
}

impl std::error::Error for FrontendError {}

#[cfg(test)]
mod tests;
