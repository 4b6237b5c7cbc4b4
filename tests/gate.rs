use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracegate::{
    Config, DiagnosticSink, EventRecord, ExecutionContext, GateBuilder, GateError, Pid,
    ProcessIdentity, SyscallTag, Timestamp,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Context as the attachment machinery would provide it: a frozen snapshot
/// of who fired the probe and when.
struct FixedContext {
    pid_tgid: u64,
    timestamp: u64,
}

impl FixedContext {
    fn new(pid: u32, tid: u32, timestamp: u64) -> Self {
        Self {
            pid_tgid: ProcessIdentity::new(pid, tid).as_raw(),
            timestamp,
        }
    }
}

impl ExecutionContext for FixedContext {
    fn pid_tgid(&self) -> u64 {
        self.pid_tgid
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::from(self.timestamp)
    }
}

fn config_tracking(pids: &[i32]) -> Config {
    Config {
        pid_targets: pids.iter().copied().map(Pid::from_raw).collect(),
        ..Default::default()
    }
}

#[test]
fn admitted_invocation_emits_one_record() {
    init();
    let gate = GateBuilder::new(config_tracking(&[1234]))
        .syscall(SyscallTag::RecvFrom)
        .install()
        .unwrap();

    let handler = gate.handler(SyscallTag::RecvFrom).unwrap();
    handler.on_syscall(&FixedContext::new(1234, 7, 55));

    assert_eq!(gate.channel().len(), 1);
    let record = gate.channel().try_recv().unwrap();
    assert_eq!(record.identity.as_raw(), 0x0000_04D2_0000_0007);
    assert_eq!(record.timestamp, Timestamp::from(55));
    assert_eq!(record.tag, SyscallTag::RecvFrom);
    assert_eq!(gate.dropped(), 0);
}

#[test]
fn empty_admission_set_emits_nothing() {
    init();
    let mut builder = GateBuilder::new(Config::default());
    for tag in SyscallTag::ALL {
        builder = builder.syscall(tag);
    }
    let gate = builder.install().unwrap();

    for handler in gate.handlers() {
        handler.on_syscall(&FixedContext::new(1234, 7, 1));
        handler.on_syscall(&FixedContext::new(0, 0, 2));
    }
    assert!(gate.channel().is_empty());
    assert_eq!(gate.dropped(), 0);
}

#[test]
fn full_channel_drops_without_blocking() {
    init();
    let gate = GateBuilder::new(config_tracking(&[10]))
        .syscall(SyscallTag::SendTo)
        .channel_capacity(4)
        .install()
        .unwrap();

    let handler = gate.handler(SyscallTag::SendTo).unwrap();
    for i in 0..6 {
        handler.on_syscall(&FixedContext::new(10, 1, i));
    }
    assert_eq!(gate.channel().len(), 4);
    assert_eq!(gate.dropped(), 2);
    // Records that made it are intact and in order.
    let timestamps: Vec<u64> = gate
        .channel()
        .drain()
        .map(|r| r.timestamp.as_nanos())
        .collect();
    assert_eq!(timestamps, vec![0, 1, 2, 3]);
}

#[test]
fn untracking_stops_emission() {
    init();
    let gate = GateBuilder::new(Config::default())
        .syscall(SyscallTag::Close)
        .install()
        .unwrap();
    let handler = gate.handler(SyscallTag::Close).unwrap();
    let ctx = FixedContext::new(77, 1, 1);

    handler.on_syscall(&ctx);
    assert!(gate.channel().is_empty());

    gate.admission().track(Pid::from_raw(77)).unwrap();
    handler.on_syscall(&ctx);
    assert_eq!(gate.channel().len(), 1);

    assert!(gate.admission().untrack(Pid::from_raw(77)));
    handler.on_syscall(&ctx);
    assert_eq!(gate.channel().len(), 1);
}

#[test]
fn concurrent_invocations_account_exactly() {
    init();
    const PER_THREAD: u64 = 200;
    // Even pids are tracked, odd ones are not.
    let tracked: Vec<i32> = (100..116).step_by(2).collect();
    let gate = GateBuilder::new(config_tracking(&tracked))
        .syscall(SyscallTag::RecvFrom)
        .channel_capacity(4096)
        .install()
        .unwrap();
    let handler = gate.handler(SyscallTag::RecvFrom).unwrap();

    std::thread::scope(|s| {
        for pid in 100u32..116 {
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    handler.on_syscall(&FixedContext::new(pid, pid, i));
                }
            });
        }
    });

    let records: Vec<EventRecord> = gate.channel().drain().collect();
    assert_eq!(records.len() as u64, tracked.len() as u64 * PER_THREAD);
    assert_eq!(gate.dropped(), 0);
    for record in records {
        assert_eq!(record.identity.process_id() % 2, 0);
        assert_eq!(record.tag, SyscallTag::RecvFrom);
    }
}

#[test]
fn duplicate_hook_is_rejected() {
    let result = GateBuilder::new(Config::default())
        .syscall(SyscallTag::Connect)
        .syscall(SyscallTag::Connect)
        .install();
    assert!(matches!(result, Err(GateError::DuplicateHook(tag)) if tag == SyscallTag::Connect));
}

static TRACES: AtomicUsize = AtomicUsize::new(0);

#[derive(Copy, Clone)]
struct CountingDiagnostics;

impl DiagnosticSink for CountingDiagnostics {
    fn trace(&self, _tag: SyscallTag, _identity: ProcessIdentity) {
        TRACES.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn diagnostics_trace_admitted_events_only() {
    init();
    let gate = GateBuilder::new(config_tracking(&[500]))
        .syscall(SyscallTag::Accept)
        .diagnostics(CountingDiagnostics)
        .install()
        .unwrap();
    let handler = gate.handler(SyscallTag::Accept).unwrap();

    handler.on_syscall(&FixedContext::new(500, 1, 1));
    handler.on_syscall(&FixedContext::new(501, 1, 2));
    handler.on_syscall(&FixedContext::new(500, 2, 3));

    assert_eq!(TRACES.load(Ordering::Relaxed), 2);
    assert_eq!(gate.channel().len(), 2);
}

#[tokio::test]
async fn forwarder_delivers_and_stops_on_detach() -> anyhow::Result<()> {
    init();
    let gate = GateBuilder::new(config_tracking(&[1234]))
        .syscall(SyscallTag::Connect)
        .install()?;
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let reader = gate.read_events(tx);

    let handler = gate.handler(SyscallTag::Connect).unwrap();
    for i in 0..3 {
        handler.on_syscall(&FixedContext::new(1234, 7, i));
    }
    for i in 0..3 {
        let record = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await?;
        let record = record.expect("forwarder closed early");
        assert_eq!(record.timestamp, Timestamp::from(i));
        assert_eq!(record.identity, ProcessIdentity::new(1234, 7));
    }

    drop(gate);
    tokio::time::timeout(Duration::from_secs(1), reader).await??;
    Ok(())
}
