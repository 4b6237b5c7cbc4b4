//! Debug-only trace line for admitted events.
//!
//! Kernel probes would log through a printk-style debug macro that is
//! compiled out of production builds; here the same role is played by a
//! sink the handler is monomorphized over. Production gates use
//! [`NoopDiagnostics`] and pay nothing; a gate deliberately run in debug
//! mode uses [`LogDiagnostics`], which forwards one line per admitted event
//! to the [`log`] facade. The output is for human eyes only; nothing
//! downstream consumes it.

use crate::{ProcessIdentity, SyscallTag};

/// Log target used for diagnostic lines, so they can be filtered
/// independently of the rest of the agent's logging.
pub const TRACE_TARGET: &str = "gate_trace";

pub trait DiagnosticSink: Send + Sync {
    fn trace(&self, tag: SyscallTag, identity: ProcessIdentity);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &T {
    fn trace(&self, tag: SyscallTag, identity: ProcessIdentity) {
        (**self).trace(tag, identity);
    }
}

/// Default diagnostics: does nothing, costs nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    #[inline(always)]
    fn trace(&self, _tag: SyscallTag, _identity: ProcessIdentity) {}
}

/// Forwards one line per admitted event to [`log::trace!`], identity
/// rendered as two integers.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn trace(&self, tag: SyscallTag, identity: ProcessIdentity) {
        log::trace!(target: TRACE_TARGET, "=== {tag} {identity} ===");
    }
}
