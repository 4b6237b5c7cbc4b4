use std::sync::Arc;
use std::time::Duration;

use gate_core::EventSink;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::RingChannel;

/// How often the ring is checked for new records.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Forward every record in `channel` to `sink` until `shutdown` closes.
///
/// The producer side cannot wake an async task, so the ring is polled on an
/// interval. Producer-side drops are surfaced as a lost-event warning
/// whenever the counter advanced since the previous tick.
///
/// The task stops when the sender half of `shutdown` is dropped, which is
/// how the gate signals detachment.
pub fn spawn_forwarder(
    channel: Arc<RingChannel>,
    sink: impl EventSink + 'static,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        let mut seen_dropped = 0;
        loop {
            tokio::select! {
                Err(_) = shutdown.changed() => break,
                _ = interval.tick() => {
                    for record in channel.drain() {
                        let _ = sink.submit(record);
                    }
                    let dropped = channel.dropped();
                    if dropped > seen_dropped {
                        log::warn!("Lost {} events (total {dropped})", dropped - seen_dropped);
                        seen_dropped = dropped;
                    }
                }
            };
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gate_core::{EventRecord, ProcessIdentity, SyscallTag, Timestamp};
    use tokio::sync::mpsc;

    use super::*;

    fn record(ts: u64) -> EventRecord {
        EventRecord {
            identity: ProcessIdentity::new(1234, 7),
            timestamp: Timestamp::from(ts),
            tag: SyscallTag::Connect,
        }
    }

    #[tokio::test]
    async fn forwards_until_shutdown() -> anyhow::Result<()> {
        let ring = Arc::new(RingChannel::with_capacity(16));
        let (tx_exit, rx_exit) = watch::channel(());
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_forwarder(Arc::clone(&ring), tx, rx_exit);

        for i in 0..3 {
            assert!(ring.try_send(record(i)).is_delivered());
        }
        for i in 0..3 {
            let forwarded = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await?;
            assert_eq!(forwarded, Some(record(i)));
        }

        drop(tx_exit);
        tokio::time::timeout(Duration::from_secs(1), handle).await??;
        Ok(())
    }
}
