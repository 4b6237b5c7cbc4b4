use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use gate_core::{EventRecord, EventSink, SubmitOutcome};

/// Default number of record slots.
pub const DEFAULT_CAPACITY: usize = 4096;

struct Slot {
    sequence: AtomicUsize,
    record: UnsafeCell<MaybeUninit<EventRecord>>,
}

/// Bounded multi-producer ring shared between probe handlers and consumers.
///
/// All memory is allocated at construction; the hot path only touches the
/// slot array. Producers never block: when every slot is occupied the
/// record is dropped and [`RingChannel::dropped`] advances. Within the
/// ring, records keep arrival order as established by the slot sequencing;
/// nothing more is guaranteed across concurrent producers.
///
/// The slot protocol is the sequence-per-slot bounded queue: a slot whose
/// sequence equals the producer position is writable, the producer bumps it
/// by one after writing, the consumer by the capacity after reading.
pub struct RingChannel {
    slots: Box<[Slot]>,
    mask: usize,
    enqueue_pos: AtomicUsize,
    dequeue_pos: AtomicUsize,
    dropped: AtomicU64,
}

// Slot contents are only written by the producer that won the CAS on
// `enqueue_pos` and only read by the consumer that won `dequeue_pos`; the
// per-slot sequence publishes those accesses.
unsafe impl Send for RingChannel {}
unsafe impl Sync for RingChannel {}

impl RingChannel {
    /// Create a ring with `capacity` record slots.
    ///
    /// The capacity must be a power of two; invalid values fall back to
    /// [`DEFAULT_CAPACITY`] with a warning.
    pub fn with_capacity(mut capacity: usize) -> Self {
        if capacity == 0 || (capacity & (capacity - 1) != 0) {
            log::warn!("Invalid value ({capacity}) for ring capacity, which must be a power of 2.");
            log::warn!("The default value {DEFAULT_CAPACITY} will be used.");
            capacity = DEFAULT_CAPACITY;
        }
        let slots = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                record: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Self {
            slots,
            mask: capacity - 1,
            enqueue_pos: AtomicUsize::new(0),
            dequeue_pos: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Records dropped so far because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Approximate number of queued records. Exact only when no producer or
    /// consumer is running concurrently.
    pub fn len(&self) -> usize {
        let tail = self.enqueue_pos.load(Ordering::Relaxed);
        let head = self.dequeue_pos.load(Ordering::Relaxed);
        tail.saturating_sub(head).min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish one record without blocking.
    ///
    /// O(1) regardless of occupancy: a full ring returns
    /// [`SubmitOutcome::Dropped`] immediately after counting the drop.
    pub fn try_send(&self, record: EventRecord) -> SubmitOutcome {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let dif = seq as isize - pos as isize;
            if dif == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*slot.record.get()).write(record) };
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return SubmitOutcome::Delivered;
                    }
                    Err(current) => pos = current,
                }
            } else if dif < 0 {
                // Ring is full: count and move on, never retry.
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return SubmitOutcome::Dropped;
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Take one record, if any is ready.
    pub fn try_recv(&self) -> Option<EventRecord> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let dif = seq as isize - pos.wrapping_add(1) as isize;
            if dif == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let record = unsafe { (*slot.record.get()).assume_init_read() };
                        slot.sequence
                            .store(pos.wrapping_add(self.mask).wrapping_add(1), Ordering::Release);
                        return Some(record);
                    }
                    Err(current) => pos = current,
                }
            } else if dif < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Iterator draining everything currently queued.
    pub fn drain(&self) -> Drain<'_> {
        Drain { channel: self }
    }
}

impl EventSink for RingChannel {
    fn submit(&self, record: EventRecord) -> SubmitOutcome {
        self.try_send(record)
    }
}

pub struct Drain<'a> {
    channel: &'a RingChannel,
}

impl Iterator for Drain<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        self.channel.try_recv()
    }
}
