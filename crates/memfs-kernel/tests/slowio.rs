//! Deferred completion through `SlowIo`.
//!
//! The sink forwards every completion over a tokio unbounded channel so the
//! test thread can wait on it with `blocking_recv`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use memfs_kernel::{
    CompletionSink, CreateRequest, DirEntry, FileInfo, FileSystemOps, IoOutcome, MemFs,
    MemFsConfig, RequestToken, SlowIo, SlowIoConfig, Status,
};

#[derive(Debug)]
enum Completion {
    Read(RequestToken, Status, Vec<u8>),
    Write(RequestToken, Status, u32, Option<FileInfo>),
    ReadDirectory(RequestToken, Status, Vec<DirEntry>),
}

struct ChannelSink {
    next_token: AtomicU64,
    tx: mpsc::UnboundedSender<Completion>,
}

impl ChannelSink {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Arc::new(Self {
            next_token: AtomicU64::new(1),
            tx,
        });
        (sink, rx)
    }
}

impl CompletionSink for ChannelSink {
    fn allocate_request_token(&self) -> RequestToken {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    fn complete_read(&self, token: RequestToken, status: Status, data: Vec<u8>) {
        let _ = self.tx.send(Completion::Read(token, status, data));
    }

    fn complete_write(
        &self,
        token: RequestToken,
        status: Status,
        bytes_transferred: u32,
        info: Option<FileInfo>,
    ) {
        let _ = self
            .tx
            .send(Completion::Write(token, status, bytes_transferred, info));
    }

    fn complete_read_directory(
        &self,
        token: RequestToken,
        status: Status,
        entries: Vec<DirEntry>,
    ) {
        let _ = self
            .tx
            .send(Completion::ReadDirectory(token, status, entries));
    }
}

fn always_defer(max_delay_ms: u64) -> SlowIoConfig {
    MemFsConfig::default()
        .with_slowio(max_delay_ms, 100, 0)
        .slowio()
}

fn setup(
    config: SlowIoConfig,
) -> (
    Arc<MemFs>,
    SlowIo<MemFs>,
    mpsc::UnboundedReceiver<Completion>,
) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let fs = Arc::new(MemFs::new(MemFsConfig::default()).unwrap());
    let (sink, rx) = ChannelSink::new();
    let slow = SlowIo::new(Arc::clone(&fs), sink, config).unwrap();
    (fs, slow, rx)
}

#[test]
fn every_read_is_pending_and_completes() {
    let (fs, slow, mut rx) = setup(always_defer(5));
    let f = fs.create("\\f", CreateRequest::file()).unwrap().handle;
    fs.write(&f, 0, b"deferred bytes", false, false).unwrap();

    let mut tokens = Vec::new();
    for _ in 0..10 {
        match slow.read(&f, 0, 8) {
            IoOutcome::Pending(token) => tokens.push(token),
            IoOutcome::Complete(result) => panic!("read was not deferred: {result:?}"),
        }
    }

    let mut completed = Vec::new();
    for _ in 0..tokens.len() {
        match rx.blocking_recv().unwrap() {
            Completion::Read(token, status, data) => {
                assert_eq!(status, Status::Success);
                assert_eq!(data, b"deferred");
                completed.push(token);
            }
            other => panic!("unexpected completion {other:?}"),
        }
    }
    completed.sort_unstable();
    assert_eq!(completed, tokens);
    slow.shutdown();
}

#[test]
fn deferred_errors_reach_the_sink() {
    let (fs, slow, mut rx) = setup(always_defer(1));
    let f = fs.create("\\empty", CreateRequest::file()).unwrap().handle;

    let outcome = slow.read(&f, 0, 1);
    assert_eq!(outcome.status(), Status::Pending);
    match rx.blocking_recv().unwrap() {
        Completion::Read(_, status, data) => {
            assert_eq!(status, Status::EndOfFile);
            assert!(data.is_empty());
        }
        other => panic!("unexpected completion {other:?}"),
    }
}

#[test]
fn deferred_write_and_listing() {
    let (fs, slow, mut rx) = setup(always_defer(2));
    let dir = fs.create("\\d", CreateRequest::directory()).unwrap().handle;
    let f = fs.create("\\d\\f", CreateRequest::file()).unwrap().handle;

    assert!(slow.write(&f, 0, b"abc", false, false).is_pending());
    match rx.blocking_recv().unwrap() {
        Completion::Write(_, status, bytes, info) => {
            assert_eq!(status, Status::Success);
            assert_eq!(bytes, 3);
            assert_eq!(info.unwrap().file_size, 3);
        }
        other => panic!("unexpected completion {other:?}"),
    }

    assert!(slow.read_directory(&dir, Some("..")).is_pending());
    match rx.blocking_recv().unwrap() {
        Completion::ReadDirectory(_, status, entries) => {
            assert_eq!(status, Status::Success);
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].name, "f");
            assert_eq!(entries[0].info.file_size, 3);
        }
        other => panic!("unexpected completion {other:?}"),
    }
}

#[test]
fn shutdown_drains_in_flight() {
    let (fs, slow, mut rx) = setup(always_defer(30));
    let f = fs.create("\\f", CreateRequest::file()).unwrap().handle;
    fs.write(&f, 0, b"x", false, false).unwrap();

    for _ in 0..20 {
        assert!(slow.read(&f, 0, 1).is_pending());
    }
    let in_flight = Arc::clone(slow.in_flight());
    slow.shutdown();
    assert_eq!(in_flight.count(), 0);

    let mut received = 0;
    while let Ok(completion) = rx.try_recv() {
        assert!(matches!(completion, Completion::Read(_, Status::Success, _)));
        received += 1;
    }
    assert_eq!(received, 20);
}

#[test]
fn disabled_scheduler_completes_inline() {
    let (fs, slow, mut rx) = setup(SlowIoConfig::default());
    let f = fs.create("\\f", CreateRequest::file()).unwrap().handle;

    let outcome = slow.write(&f, 0, b"inline", false, false);
    assert!(!outcome.is_pending());
    assert_eq!(outcome.status(), Status::Success);
    match slow.read(&f, 0, 6) {
        IoOutcome::Complete(Ok(data)) => assert_eq!(data, b"inline"),
        other => panic!("expected inline completion, got {other:?}"),
    }
    drop(slow);
    assert!(rx.try_recv().is_err());
}

#[test]
fn runtime_handle_variant() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap();
    let fs = Arc::new(MemFs::new(MemFsConfig::default()).unwrap());
    let (sink, mut rx) = ChannelSink::new();
    let slow = SlowIo::with_runtime_handle(
        Arc::clone(&fs),
        sink,
        SlowIoConfig {
            max_delay: Duration::from_millis(3),
            percent_delay: 100,
            rarefy_delay: 1,
        },
        runtime.handle().clone(),
    );
    let f = fs.create("\\f", CreateRequest::file()).unwrap().handle;
    fs.write(&f, 0, b"rt", false, false).unwrap();

    assert!(slow.read(&f, 0, 2).is_pending());
    slow.shutdown();
    assert!(matches!(
        rx.try_recv(),
        Ok(Completion::Read(_, Status::Success, _))
    ));
}
