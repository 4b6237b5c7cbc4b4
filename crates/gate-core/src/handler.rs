use crate::{
    AdmissionFilter, DiagnosticSink, EventRecord, EventSink, ExecutionContext, NoopDiagnostics,
    ProcessIdentity, SyscallTag,
};

/// The entry point invoked on every occurrence of one hooked syscall.
///
/// A handler is installed per syscall entry point and shared by every
/// thread on the host; [`on_syscall`] may run on all of them at once. It is
/// observational only: it never alters the syscall's execution or return
/// value, never blocks, never allocates, and completes in bounded time
/// regardless of channel occupancy.
///
/// There are no recoverable errors on this path. A context without a usable
/// task yields the sentinel identity, which fails admission; a full channel
/// drops the record. Either way the handler returns and the syscall
/// proceeds unmodified.
///
/// [`on_syscall`]: ProbeHandler::on_syscall
pub struct ProbeHandler<F, S, D = NoopDiagnostics> {
    tag: SyscallTag,
    filter: F,
    sink: S,
    diagnostics: D,
}

impl<F, S> ProbeHandler<F, S>
where
    F: AdmissionFilter,
    S: EventSink,
{
    pub fn new(tag: SyscallTag, filter: F, sink: S) -> Self {
        Self {
            tag,
            filter,
            sink,
            diagnostics: NoopDiagnostics,
        }
    }
}

impl<F, S, D> ProbeHandler<F, S, D>
where
    F: AdmissionFilter,
    S: EventSink,
    D: DiagnosticSink,
{
    pub fn with_diagnostics(tag: SyscallTag, filter: F, sink: S, diagnostics: D) -> Self {
        Self {
            tag,
            filter,
            sink,
            diagnostics,
        }
    }

    pub fn tag(&self) -> SyscallTag {
        self.tag
    }

    /// The gate body: extract, filter, emit.
    pub fn on_syscall(&self, ctx: &impl ExecutionContext) {
        let identity = ProcessIdentity::of(ctx);
        if !self.filter.contains(identity) {
            // Out of scope: return before doing any further work.
            return;
        }
        let record = EventRecord {
            identity,
            timestamp: ctx.timestamp(),
            tag: self.tag,
        };
        // Best effort: a full channel drops the record, never the syscall.
        let _ = self.sink.submit(record);
        self.diagnostics.trace(self.tag, identity);
    }
}
