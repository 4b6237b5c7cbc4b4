//! The [`EventSink`] trait is used by [`crate::ProbeHandler`] to publish
//! admitted records.
//!
//! [`EventSink::submit`] must not block since it runs inline in the traced
//! syscall path, and on the drain side in async contexts.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::EventRecord;

/// Outcome of a best-effort submission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum SubmitOutcome {
    Delivered,
    Dropped,
}

impl SubmitOutcome {
    pub fn is_delivered(self) -> bool {
        matches!(self, SubmitOutcome::Delivered)
    }
}

pub trait EventSink: Send + Sync {
    /// Publish one record.
    ///
    /// Never blocks or retries: when the backing channel is at capacity the
    /// record is dropped and [`SubmitOutcome::Dropped`] is returned, in O(1)
    /// regardless of occupancy.
    fn submit(&self, record: EventRecord) -> SubmitOutcome;
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn submit(&self, record: EventRecord) -> SubmitOutcome {
        (**self).submit(record)
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn submit(&self, record: EventRecord) -> SubmitOutcome {
        (**self).submit(record)
    }
}

/// Simple implementation for tokio bounded channels.
/// Sending with full channel will drop records.
impl EventSink for mpsc::Sender<EventRecord> {
    fn submit(&self, record: EventRecord) -> SubmitOutcome {
        match self.try_send(record) {
            Ok(()) => SubmitOutcome::Delivered,
            Err(_) => {
                log::warn!("dropping record");
                SubmitOutcome::Dropped
            }
        }
    }
}

/// TapSink wraps an [`EventSink`] with a new one which calls a callback on
/// every record passing through. This is useful for consumers which want to
/// observe emissions without taking over delivery.
#[derive(Clone)]
pub struct TapSink<S, F> {
    cb: F,
    inner: S,
}

impl<S, F> TapSink<S, F> {
    pub fn new(inner: S, cb: F) -> Self {
        Self { inner, cb }
    }
}

impl<S, F> EventSink for TapSink<S, F>
where
    S: EventSink,
    F: Fn(&EventRecord) + Send + Sync,
{
    fn submit(&self, record: EventRecord) -> SubmitOutcome {
        (self.cb)(&record);
        self.inner.submit(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{ProcessIdentity, SyscallTag, Timestamp};

    fn record() -> EventRecord {
        EventRecord {
            identity: ProcessIdentity::new(1234, 7),
            timestamp: Timestamp::from(1),
            tag: SyscallTag::Connect,
        }
    }

    #[test]
    fn bounded_channel_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        assert!(tx.submit(record()).is_delivered());
        assert_eq!(tx.submit(record()), SubmitOutcome::Dropped);
        assert_eq!(rx.try_recv().unwrap(), record());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tap_observes_every_record() {
        let seen = AtomicUsize::new(0);
        let (tx, _rx) = mpsc::channel(8);
        let sink = TapSink::new(tx, |_: &EventRecord| {
            seen.fetch_add(1, Ordering::Relaxed);
        });
        assert!(sink.submit(record()).is_delivered());
        assert!(sink.submit(record()).is_delivered());
        assert_eq!(seen.load(Ordering::Relaxed), 2);
    }
}
