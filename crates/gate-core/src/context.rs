//! Seam between the attachment machinery and the gate.
//!
//! The gate is agnostic to how a probe gets attached to a syscall entry
//! point: whatever performs the attachment only has to invoke
//! [`ProbeHandler::on_syscall`] with something implementing
//! [`ExecutionContext`].
//!
//! [`ProbeHandler::on_syscall`]: crate::ProbeHandler::on_syscall

use nix::unistd::{getpid, gettid};

use crate::{ProcessIdentity, Timestamp};

/// The execution context a probe fires in.
///
/// Implementations must answer in constant time and without side effects;
/// both methods run on the syscall hot path.
pub trait ExecutionContext {
    /// Packed `(process_id << 32) | thread_id` of the task executing the
    /// hooked syscall, or 0 when the context has no usable task.
    fn pid_tgid(&self) -> u64;

    /// Monotonic timestamp of this invocation.
    fn timestamp(&self) -> Timestamp;
}

/// Context for probes running synchronously on the calling thread, which is
/// exactly how the hooks fire: inline in whatever thread entered the
/// syscall.
#[derive(Copy, Clone, Debug, Default)]
pub struct CurrentTask;

impl ExecutionContext for CurrentTask {
    fn pid_tgid(&self) -> u64 {
        let pid = getpid().as_raw() as u32;
        let tid = gettid().as_raw() as u32;
        ProcessIdentity::new(pid, tid).as_raw()
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::now()
    }
}
