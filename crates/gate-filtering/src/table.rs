use std::sync::atomic::{AtomicU32, Ordering};

use gate_core::{AdmissionFilter, Pid, ProcessIdentity};
use thiserror::Error;

/// Default slot count of the admission table.
pub const DEFAULT_TABLE_CAPACITY: usize = 1024;

const EMPTY: u32 = 0;
const TOMBSTONE: u32 = u32::MAX;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("admission table full (capacity {0})")]
    TableFull(usize),
    #[error("pid {0} cannot be tracked")]
    InvalidPid(Pid),
}

/// Fixed-capacity set of tracked process ids.
///
/// This is the userspace counterpart of a pinned pid-interest map: every
/// probe consults it inline, only the control plane mutates it. Lookups are
/// wait-free atomic loads over an open-addressed slot array and may run
/// concurrently from every thread on the host; probe chains are bounded by
/// the capacity. Mutations must be serialized by the caller; a lookup
/// racing a mutation sees the entry either present or absent, never torn.
///
/// Pid 0 (the kernel, also the teardown sentinel) and `u32::MAX` are
/// reserved slot markers and can never be tracked.
pub struct PidTable {
    slots: Box<[AtomicU32]>,
    mask: usize,
}

impl PidTable {
    /// Create a table with `capacity` slots, which must be a power of two.
    /// Invalid values fall back to [`DEFAULT_TABLE_CAPACITY`] with a
    /// warning.
    pub fn with_capacity(mut capacity: usize) -> Self {
        if capacity == 0 || (capacity & (capacity - 1) != 0) {
            log::warn!(
                "Invalid value ({capacity}) for admission table capacity, which must be a power of 2."
            );
            log::warn!("The default value {DEFAULT_TABLE_CAPACITY} will be used.");
            capacity = DEFAULT_TABLE_CAPACITY;
        }
        let slots = (0..capacity).map(|_| AtomicU32::new(EMPTY)).collect();
        Self {
            slots,
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of tracked processes. Control-plane use only, not meant to be
    /// exact while a mutation is in flight.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| {
                let v = slot.load(Ordering::Relaxed);
                v != EMPTY && v != TOMBSTONE
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a process to the set. Idempotent for already-tracked pids.
    pub fn insert(&self, pid: Pid) -> Result<(), FilterError> {
        let raw = self.raw_pid(pid)?;
        let mut free: Option<&AtomicU32> = None;
        for i in 0..=self.mask {
            let slot = &self.slots[self.index(raw, i)];
            match slot.load(Ordering::Relaxed) {
                v if v == raw => return Ok(()),
                EMPTY => {
                    free.unwrap_or(slot).store(raw, Ordering::Release);
                    return Ok(());
                }
                TOMBSTONE => free = free.or(Some(slot)),
                _ => {}
            }
        }
        match free {
            Some(slot) => {
                slot.store(raw, Ordering::Release);
                Ok(())
            }
            None => Err(FilterError::TableFull(self.capacity())),
        }
    }

    /// Remove a process from the set. Returns whether it was tracked.
    pub fn remove(&self, pid: Pid) -> bool {
        let Ok(raw) = self.raw_pid(pid) else {
            return false;
        };
        for i in 0..=self.mask {
            let slot = &self.slots[self.index(raw, i)];
            match slot.load(Ordering::Relaxed) {
                v if v == raw => {
                    // Tombstone, not EMPTY: probe chains through this slot
                    // must stay intact.
                    slot.store(TOMBSTONE, Ordering::Release);
                    return true;
                }
                EMPTY => return false,
                _ => {}
            }
        }
        false
    }

    /// Forget everything. Detach-time cleanup; callers must make sure no
    /// probe is running anymore.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.store(EMPTY, Ordering::Relaxed);
        }
    }

    /// The hot-path lookup: wait-free, fail-closed.
    pub fn contains_pid(&self, pid: u32) -> bool {
        if pid == EMPTY || pid == TOMBSTONE {
            return false;
        }
        for i in 0..=self.mask {
            match self.slots[self.index(pid, i)].load(Ordering::Acquire) {
                v if v == pid => return true,
                EMPTY => return false,
                _ => {}
            }
        }
        false
    }

    fn raw_pid(&self, pid: Pid) -> Result<u32, FilterError> {
        let raw = pid.as_raw();
        if raw <= 0 {
            return Err(FilterError::InvalidPid(pid));
        }
        Ok(raw as u32)
    }

    fn index(&self, pid: u32, probe: usize) -> usize {
        // Fibonacci hashing spreads consecutive pids across the table.
        let hash = ((pid as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32) as usize;
        hash.wrapping_add(probe) & self.mask
    }
}

impl AdmissionFilter for PidTable {
    fn contains(&self, identity: ProcessIdentity) -> bool {
        self.contains_pid(identity.process_id())
    }
}
