//! Syscall interception gate for process-level auto-instrumentation.
//!
//! The gate hooks low-level network syscalls and decides, inline in the
//! calling thread, whether the invocation belongs to a traced process. On a
//! hit it publishes a minimal fixed-size record into a bounded lock-free
//! ring drained by asynchronous consumers, which demultiplex on the syscall
//! tag to route records to protocol decoders. On a miss it returns
//! immediately; the traced syscall is never affected either way.
//!
//! This crate is the wiring layer. The pieces live in:
//! - `gate-core`: identity extraction, probe handler, seam traits
//! - `gate-filtering`: the shared admission table and its control plane
//! - `gate-channel`: the handoff ring and drain-side forwarding
//!
//! ```no_run
//! use tracegate::{Config, GateBuilder, SyscallTag};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.pid_targets.push(tracegate::Pid::from_raw(1234));
//!
//! let gate = GateBuilder::new(config)
//!     .syscall(SyscallTag::Connect)
//!     .syscall(SyscallTag::RecvFrom)
//!     .install()?;
//!
//! // The attachment machinery calls this on every syscall occurrence:
//! // gate.handler(SyscallTag::Connect).unwrap().on_syscall(&ctx);
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(1024);
//! let _reader = gate.read_events(tx);
//! while let Some(record) = rx.recv().await {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use gate_channel::{DEFAULT_CAPACITY, RingChannel, spawn_forwarder};
pub use gate_core::{
    AdmissionFilter, CurrentTask, DiagnosticSink, EventRecord, EventSink, ExecutionContext,
    LogDiagnostics, NoopDiagnostics, Pid, ProbeHandler, ProcessIdentity, SubmitOutcome, SyscallTag,
    TRACE_TARGET, TapSink, Timestamp,
};
pub use gate_filtering::{
    AdmissionControl, Config, ConfigError, FilterError, PidTable, setup_admission_set,
};

/// The handler type the attachment machinery invokes: shared table as the
/// filter, shared ring as the sink.
pub type GateHandler<D = NoopDiagnostics> = ProbeHandler<Arc<PidTable>, Arc<RingChannel>, D>;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("syscall {0} hooked twice")]
    DuplicateHook(SyscallTag),
    #[error("seeding admission table")]
    Filter(#[from] FilterError),
}

/// Builder assembling a [`Gate`]: which syscalls to hook, how big the
/// handoff ring is, whether the per-event debug line is on.
///
/// Diagnostics are selected by type, not by a runtime flag: the default
/// [`NoopDiagnostics`] gate carries no tracing code at all, while
/// [`diagnostics`] swaps in another sink for deliberate debug runs.
///
/// [`diagnostics`]: GateBuilder::diagnostics
pub struct GateBuilder<D = NoopDiagnostics> {
    config: Config,
    capacity: usize,
    syscalls: Vec<SyscallTag>,
    diagnostics: D,
}

impl GateBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            capacity: DEFAULT_CAPACITY,
            syscalls: Vec::new(),
            diagnostics: NoopDiagnostics,
        }
    }
}

impl<D: DiagnosticSink + Copy> GateBuilder<D> {
    /// Hook one syscall. The same gate body is attached to each registered
    /// entry point; only the tag stamped into the records differs.
    pub fn syscall(mut self, tag: SyscallTag) -> Self {
        self.syscalls.push(tag);
        self
    }

    /// Capacity of the handoff ring, in records. Must be a power of two.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Replace the diagnostic sink, e.g. with [`LogDiagnostics`] when the
    /// agent is deliberately run in debug mode.
    pub fn diagnostics<D2: DiagnosticSink + Copy>(self, diagnostics: D2) -> GateBuilder<D2> {
        GateBuilder {
            config: self.config,
            capacity: self.capacity,
            syscalls: self.syscalls,
            diagnostics,
        }
    }

    /// Seed the admission table, allocate the ring and build one handler
    /// per hooked syscall.
    pub fn install(self) -> Result<Gate<D>, GateError> {
        if let Some(tag) = self
            .syscalls
            .iter()
            .enumerate()
            .find_map(|(i, tag)| self.syscalls[..i].contains(tag).then_some(*tag))
        {
            return Err(GateError::DuplicateHook(tag));
        }

        let admission = setup_admission_set(&self.config)?;
        let channel = Arc::new(RingChannel::with_capacity(self.capacity));
        let handlers = self
            .syscalls
            .iter()
            .map(|tag| {
                ProbeHandler::with_diagnostics(
                    *tag,
                    admission.table(),
                    Arc::clone(&channel),
                    self.diagnostics,
                )
            })
            .collect();
        let (tx_exit, _) = watch::channel(());
        log::debug!(
            "gate installed: {} syscalls hooked, ring capacity {}",
            self.syscalls.len(),
            channel.capacity()
        );
        Ok(Gate {
            admission,
            channel,
            handlers,
            tx_exit,
        })
    }
}

/// An installed gate: the shared admission table, the handoff ring and one
/// probe handler per hooked syscall.
///
/// Lives for the whole attachment period. Dropping the gate signals every
/// reader task spawned by [`read_events`] to stop, which is the detach
/// sequence: disable the hooks first, drop the gate, then release shared
/// state.
///
/// [`read_events`]: Gate::read_events
pub struct Gate<D = NoopDiagnostics> {
    admission: AdmissionControl,
    channel: Arc<RingChannel>,
    handlers: Vec<GateHandler<D>>,
    /// Signals background readers that we're exiting, by being dropped.
    tx_exit: watch::Sender<()>,
}

impl<D: DiagnosticSink> Gate<D> {
    /// Handler for one hooked syscall. The attachment machinery calls
    /// [`ProbeHandler::on_syscall`] on it, with its context object, on
    /// every occurrence of that syscall.
    pub fn handler(&self, tag: SyscallTag) -> Option<&GateHandler<D>> {
        self.handlers.iter().find(|handler| handler.tag() == tag)
    }

    pub fn handlers(&self) -> &[GateHandler<D>] {
        &self.handlers
    }

    /// Control-plane handle for tracking/untracking processes while
    /// attached.
    pub fn admission(&self) -> &AdmissionControl {
        &self.admission
    }

    /// Direct access to the ring, for synchronous consumers that prefer
    /// [`RingChannel::drain`] over a forwarding task.
    pub fn channel(&self) -> &Arc<RingChannel> {
        &self.channel
    }

    /// Forward records to `sink` until the gate is dropped.
    pub fn read_events(&self, sink: impl EventSink + 'static) -> JoinHandle<()> {
        spawn_forwarder(Arc::clone(&self.channel), sink, self.tx_exit.subscribe())
    }

    /// Records dropped so far because the ring was full. Exposed for the
    /// control plane's observability; the probes themselves never report
    /// errors.
    pub fn dropped(&self) -> u64 {
        self.channel.dropped()
    }
}
