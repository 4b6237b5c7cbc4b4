//! # Handoff channel
//!
//! Moves fixed-size event records from the interception gate to
//! asynchronous user-space consumers.
//!
//! The producer side ([`RingChannel::try_send`]) is what probe handlers
//! call inline in the traced syscall path, so it follows the same contract
//! as a kernel perf ring: bounded, allocated up front, never blocking; a
//! full ring drops the record and counts the drop. The consumer side
//! ([`RingChannel::drain`], [`spawn_forwarder`]) runs on the agent's async
//! runtime and is allowed to be lazy, polling the ring on an interval and
//! surfacing producer-side drops as lost-event warnings.

mod forwarder;
mod ring;

pub use forwarder::spawn_forwarder;
pub use ring::{DEFAULT_CAPACITY, Drain, RingChannel};
