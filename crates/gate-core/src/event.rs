use std::fmt;

use crate::{ProcessIdentity, Timestamp};

/// Which hooked syscall produced a record.
///
/// The precise set of hooked syscalls is configuration: the gate attaches
/// the same handler body to each of them and stamps the record with this
/// tag. Consumers demultiplex on it to route records to the right protocol
/// decoder (HTTP, TLS, runtime-specific).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SyscallTag {
    Connect = 0,
    Accept = 1,
    SendTo = 2,
    RecvFrom = 3,
    Close = 4,
}

impl SyscallTag {
    pub const ALL: [SyscallTag; 5] = [
        SyscallTag::Connect,
        SyscallTag::Accept,
        SyscallTag::SendTo,
        SyscallTag::RecvFrom,
        SyscallTag::Close,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SyscallTag::Connect => "connect",
            SyscallTag::Accept => "accept",
            SyscallTag::SendTo => "sendto",
            SyscallTag::RecvFrom => "recvfrom",
            SyscallTag::Close => "close",
        }
    }
}

impl fmt::Display for SyscallTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minimal fixed-size record published for every admitted invocation.
///
/// Just enough for downstream correlation: who (packed identity), when
/// (monotonic timestamp), which syscall (tag). No variable-length fields:
/// the handoff channel works with fixed-size slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct EventRecord {
    pub identity: ProcessIdentity,
    pub timestamp: Timestamp,
    pub tag: SyscallTag,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.timestamp, self.identity, self.tag)
    }
}
