//! Diagnostics for the Helios frontend.
//!
//! Three error classes with distinct recovery semantics:
//! - **unsupported construct** — recoverable at the compilation-unit level;
//!   the driver decides whether one failing method aborts the batch
//! - **internal** — a defect in an earlier stage (malformed CFG, layout
//!   invariant violation); never re-wrapped once classified
//! - **structural type** — a request to build a type this system cannot
//!   represent
//!
//! Errors crossing a method boundary accumulate a call-site chain of
//! `(method, location)` frames, innermost first. The chain is structured
//! data on the error value; nothing is encoded into message strings until
//! `Display`.

mod error;

pub use error::{CallFrame, FrontendError, FrontendResult, UnsupportedReason};
