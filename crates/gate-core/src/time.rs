use std::fmt;

use nix::time::{ClockId, clock_gettime};

/// Monotonic timestamp in nanoseconds.
///
/// Uses `CLOCK_MONOTONIC`, the same clock kernel-side tracing stamps events
/// with, so records produced here stay comparable with timestamps coming
/// from other probes. Downstream correlation relies on this value: the gate
/// itself guarantees no cross-event ordering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Read the current monotonic clock.
    ///
    /// A failing clock read yields timestamp 0 rather than an error: the
    /// callers run on the syscall hot path, where nothing is allowed to
    /// fail upward.
    pub fn now() -> Self {
        match clock_gettime(ClockId::CLOCK_MONOTONIC) {
            Ok(t) => Self(t.tv_sec() as u64 * 1_000_000_000 + t.tv_nsec() as u64),
            Err(_) => Self(0),
        }
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }
}

impl From<u64> for Timestamp {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
