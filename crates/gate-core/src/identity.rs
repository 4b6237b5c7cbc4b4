use std::fmt;

use nix::unistd::Pid;

use crate::context::ExecutionContext;

/// Composite process/thread identity captured at the moment a probe fires.
///
/// Packed into a single `u64` with the process id in the high 32 bits and
/// the thread id in the low 32 bits, the same layout the kernel returns
/// from `bpf_get_current_pid_tgid`. Derived fresh on every invocation and
/// never stored beyond the handler unless the invocation is admitted.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ProcessIdentity(u64);

impl ProcessIdentity {
    /// Sentinel for contexts that temporarily lack a usable task, e.g.
    /// during process teardown. Process id 0 belongs to the kernel and is
    /// never admitted, so the sentinel naturally fails every filter lookup.
    pub const NONE: ProcessIdentity = ProcessIdentity(0);

    pub const fn new(process_id: u32, thread_id: u32) -> Self {
        Self(((process_id as u64) << 32) | thread_id as u64)
    }

    /// Rebuild an identity from its packed form.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Derive the identity of whatever task triggered `ctx`.
    ///
    /// Deterministic and constant time: extracting twice within the same
    /// invocation context yields the same value.
    pub fn of(ctx: &impl ExecutionContext) -> Self {
        Self::from_raw(ctx.pid_tgid())
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    pub const fn process_id(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn thread_id(self) -> u32 {
        self.0 as u32
    }

    pub fn pid(self) -> Pid {
        Pid::from_raw(self.process_id() as i32)
    }

    /// False only for the teardown sentinel.
    pub const fn is_valid(self) -> bool {
        self.process_id() != 0
    }
}

/// Rendered as two integers, process id first. This is the format the
/// diagnostic channel prints.
impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.process_id(), self.thread_id())
    }
}

impl fmt::Debug for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessIdentity({}/{})",
            self.process_id(),
            self.thread_id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timestamp;

    struct FixedContext(u64);

    impl ExecutionContext for FixedContext {
        fn pid_tgid(&self) -> u64 {
            self.0
        }

        fn timestamp(&self) -> Timestamp {
            Timestamp::from(0)
        }
    }

    #[test]
    fn packing() {
        let identity = ProcessIdentity::new(1234, 7);
        assert_eq!(identity.as_raw(), 0x0000_04D2_0000_0007);
        assert_eq!(identity.process_id(), 1234);
        assert_eq!(identity.thread_id(), 7);
        assert_eq!(identity.pid(), Pid::from_raw(1234));
        assert_eq!(ProcessIdentity::from_raw(0x0000_04D2_0000_0007), identity);
    }

    #[test]
    fn sentinel_is_invalid() {
        assert!(!ProcessIdentity::NONE.is_valid());
        // A thread id alone does not make an identity valid.
        assert!(!ProcessIdentity::new(0, 99).is_valid());
        assert!(ProcessIdentity::new(1, 1).is_valid());
    }

    #[test]
    fn extraction_is_idempotent() {
        let ctx = FixedContext(0x0000_04D2_0000_0007);
        let a = ProcessIdentity::of(&ctx);
        let b = ProcessIdentity::of(&ctx);
        assert_eq!(a, b);
        assert_eq!(a.process_id(), 1234);
    }

    #[test]
    fn display_is_two_integers() {
        assert_eq!(ProcessIdentity::new(1234, 7).to_string(), "1234 7");
    }
}
