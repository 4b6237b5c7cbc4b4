//! # Admission filtering
//!
//! This crate owns the shared state behind the gate's admission decision:
//! which processes are currently in scope for tracing.
//!
//! # Requirements
//!
//! - Lookups happen on the probe hot path: O(1), lock-free, safe from every
//!   thread on the host at once
//! - Fail-closed: a process that was never added is out of scope, never an
//!   error
//! - Population and invalidation belong to the control plane, not to the
//!   probes; the gate only reads
//!
//! # General design
//!
//! Filtering is done by process id; the thread half of the identity is
//! ignored. The control plane seeds the table once at attach time:
//!
//! - pid targets go straight into the table
//! - image targets are resolved by scanning procfs for processes whose
//!   `/proc/<pid>/exe` matches
//!
//! and keeps it current afterwards through [`AdmissionControl`]: `track` on
//! traced-process start, `untrack` on exit. Everything absent is invisible
//! to the gate, including the pid 0 sentinel produced for contexts without
//! a usable task.

pub mod procfs;

mod config;
mod initializer;
mod table;

pub use config::{Config, ConfigError};
pub use initializer::{AdmissionControl, setup_admission_set};
pub use table::{DEFAULT_TABLE_CAPACITY, FilterError, PidTable};
