//! # Interception gate core
//!
//! This crate contains the hot path of the syscall interception layer: the
//! code that runs inline, on whatever thread triggered a hooked syscall, and
//! decides whether the invocation belongs to a traced process.
//!
//! The flow on every invocation is:
//!
//! 1. derive a [`ProcessIdentity`] from the [`ExecutionContext`]
//! 2. consult the [`AdmissionFilter`]; on a miss return immediately
//! 3. on a hit, publish a fixed-size [`EventRecord`] through the
//!    [`EventSink`] and optionally write one [`DiagnosticSink`] line
//!
//! # Hot path discipline
//!
//! An in-kernel gate would run under the verifier's constraints; this crate
//! keeps the same discipline on purpose, even though nothing enforces it
//! here:
//!
//! - no heap allocation between syscall entry and handler return
//! - no unbounded loops, no recursion, no blocking
//! - no error propagation: any failure degrades to "event not observed",
//!   the traced syscall is never affected
//!
//! The seams ([`AdmissionFilter`], [`EventSink`], [`DiagnosticSink`],
//! [`ExecutionContext`]) are traits so the backing structures stay owned by
//! the control plane and the gate is testable in isolation.

mod context;
mod diagnostics;
mod event;
mod filter;
mod handler;
mod identity;
mod sink;
mod time;

pub use context::{CurrentTask, ExecutionContext};
pub use diagnostics::{DiagnosticSink, LogDiagnostics, NoopDiagnostics, TRACE_TARGET};
pub use event::{EventRecord, SyscallTag};
pub use filter::AdmissionFilter;
pub use handler::ProbeHandler;
pub use identity::ProcessIdentity;
pub use sink::{EventSink, SubmitOutcome, TapSink};
pub use time::Timestamp;

pub use nix::unistd::Pid;
