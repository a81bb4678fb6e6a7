//! Deferred completion of reads, writes and directory listings.
//!
//! [`SlowIo`] wraps any [`FileSystemOps`] and, for a configurable share of
//! calls, answers `Pending` at once and finishes the operation later on a
//! tokio runtime, reporting through a [`CompletionSink`]. This mimics a
//! driver that completes I/O asynchronously.
//!
//! Every deferred task is counted in an [`InFlight`] gauge; dropping the
//! scheduler blocks until the gauge is back to zero.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use rand::Rng;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, trace};

use memfs_types::{DirEntry, FileInfo, FsResult, Status, Written};

use crate::vfs::FileSystemOps;

/// Identifies one deferred request to the dispatcher.
pub type RequestToken = u64;

/// Receiver of deferred completions, owned by the dispatcher.
pub trait CompletionSink: Send + Sync + 'static {
    /// Hint for the request about to be deferred.
    fn allocate_request_token(&self) -> RequestToken;

    fn complete_read(&self, token: RequestToken, status: Status, data: Vec<u8>);

    fn complete_write(
        &self,
        token: RequestToken,
        status: Status,
        bytes_transferred: u32,
        info: Option<FileInfo>,
    );

    fn complete_read_directory(
        &self,
        token: RequestToken,
        status: Status,
        entries: Vec<DirEntry>,
    );
}

/// Immediate answer of a wrapped operation.
#[derive(Debug)]
pub enum IoOutcome<T> {
    Complete(FsResult<T>),
    /// The result will arrive at the sink under this token.
    Pending(RequestToken),
}

impl<T> IoOutcome<T> {
    pub fn status(&self) -> Status {
        match self {
            IoOutcome::Complete(result) => Status::of(result),
            IoOutcome::Pending(_) => Status::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, IoOutcome::Pending(_))
    }
}

/// When and how long to defer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlowIoConfig {
    /// Zero disables deferral.
    pub max_delay: Duration,
    /// Chance in percent that a call is deferred.
    pub percent_delay: u8,
    /// Right shift applied to the random delay in milliseconds.
    pub rarefy_delay: u32,
}

impl SlowIoConfig {
    pub fn is_enabled(&self) -> bool {
        !self.max_delay.is_zero() && self.percent_delay > 0
    }

    pub fn should_defer<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.is_enabled() && rng.gen_range(0..100u8) < self.percent_delay
    }

    /// A delay in `0..=max_delay`, shifted right by `rarefy_delay`.
    pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let ms = rng.gen_range(0..=max_ms);
        Duration::from_millis(ms.checked_shr(self.rarefy_delay).unwrap_or(0))
    }
}

/// Counter of outstanding deferred tasks that can be waited on.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    lock: Mutex<()>,
    idle: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more task until the returned guard is dropped.
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        InFlightGuard {
            in_flight: Arc::clone(self),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Block until no task is outstanding.
    pub fn wait_idle(&self) {
        let mut guard = self.lock.lock();
        while self.count.load(Ordering::Acquire) != 0 {
            self.idle.wait(&mut guard);
        }
    }
}

/// Decrements its [`InFlight`] on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _lock = self.in_flight.lock.lock();
            self.in_flight.idle.notify_all();
        }
    }
}

/// Deferred-completion wrapper around a filesystem.
///
/// Operations other than read, write and read_directory go straight to
/// [`SlowIo::fs`].
pub struct SlowIo<F: FileSystemOps + 'static> {
    fs: Arc<F>,
    sink: Arc<dyn CompletionSink>,
    config: SlowIoConfig,
    runtime: Option<Runtime>,
    handle: Handle,
    in_flight: Arc<InFlight>,
}

impl<F: FileSystemOps + 'static> SlowIo<F> {
    /// Start a dedicated runtime for deferred work.
    pub fn new(
        fs: Arc<F>,
        sink: Arc<dyn CompletionSink>,
        config: SlowIoConfig,
    ) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .thread_name("memfs-slowio")
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            fs,
            sink,
            config,
            runtime: Some(runtime),
            handle,
            in_flight: Arc::new(InFlight::new()),
        })
    }

    /// Run deferred work on an existing runtime.
    ///
    /// The runtime needs the time driver, and must keep running tasks while
    /// the scheduler is dropped: dropping blocks until they finish.
    pub fn with_runtime_handle(
        fs: Arc<F>,
        sink: Arc<dyn CompletionSink>,
        config: SlowIoConfig,
        handle: Handle,
    ) -> Self {
        Self {
            fs,
            sink,
            config,
            runtime: None,
            handle,
            in_flight: Arc::new(InFlight::new()),
        }
    }

    pub fn fs(&self) -> &Arc<F> {
        &self.fs
    }

    pub fn config(&self) -> &SlowIoConfig {
        &self.config
    }

    pub fn in_flight(&self) -> &Arc<InFlight> {
        &self.in_flight
    }

    fn pick_delay(&self) -> Option<Duration> {
        let mut rng = rand::thread_rng();
        if self.config.should_defer(&mut rng) {
            Some(self.config.delay(&mut rng))
        } else {
            None
        }
    }

    fn submit(
        &self,
        delay: Duration,
        work: impl FnOnce(&F, &dyn CompletionSink) + Send + 'static,
    ) {
        let guard = self.in_flight.enter();
        let fs = Arc::clone(&self.fs);
        let sink = Arc::clone(&self.sink);
        self.handle.spawn(async move {
            let _guard = guard;
            tokio::time::sleep(delay).await;
            work(&fs, sink.as_ref());
        });
    }

    pub fn read(&self, handle: &F::Handle, offset: u64, length: u32) -> IoOutcome<Vec<u8>> {
        let Some(delay) = self.pick_delay() else {
            return IoOutcome::Complete(self.fs.read(handle, offset, length));
        };
        let token = self.sink.allocate_request_token();
        let handle = handle.clone();
        self.submit(delay, move |fs, sink| {
            let result = fs.read(&handle, offset, length);
            let status = Status::of(&result);
            trace!(token, %status, "deferred read complete");
            sink.complete_read(token, status, result.unwrap_or_default());
        });
        debug!(token, ?delay, "read deferred");
        IoOutcome::Pending(token)
    }

    pub fn write(
        &self,
        handle: &F::Handle,
        offset: u64,
        data: &[u8],
        write_to_end_of_file: bool,
        constrained_io: bool,
    ) -> IoOutcome<Written> {
        let Some(delay) = self.pick_delay() else {
            return IoOutcome::Complete(self.fs.write(
                handle,
                offset,
                data,
                write_to_end_of_file,
                constrained_io,
            ));
        };
        let token = self.sink.allocate_request_token();
        let handle = handle.clone();
        let data = data.to_vec();
        self.submit(delay, move |fs, sink| {
            let result = fs.write(&handle, offset, &data, write_to_end_of_file, constrained_io);
            let status = Status::of(&result);
            trace!(token, %status, "deferred write complete");
            match result {
                Ok(written) => {
                    sink.complete_write(token, status, written.bytes_written, Some(written.info))
                }
                Err(_) => sink.complete_write(token, status, 0, None),
            }
        });
        debug!(token, ?delay, "write deferred");
        IoOutcome::Pending(token)
    }

    pub fn read_directory(
        &self,
        handle: &F::Handle,
        marker: Option<&str>,
    ) -> IoOutcome<Vec<DirEntry>> {
        let Some(delay) = self.pick_delay() else {
            return IoOutcome::Complete(self.fs.read_directory(handle, marker));
        };
        let token = self.sink.allocate_request_token();
        let handle = handle.clone();
        let marker = marker.map(str::to_owned);
        self.submit(delay, move |fs, sink| {
            let result = fs.read_directory(&handle, marker.as_deref());
            let status = Status::of(&result);
            trace!(token, %status, "deferred read_directory complete");
            sink.complete_read_directory(token, status, result.unwrap_or_default());
        });
        debug!(token, ?delay, "read_directory deferred");
        IoOutcome::Pending(token)
    }

    /// Wait for every deferred task, then stop the runtime.
    pub fn shutdown(self) {
        drop(self);
    }

    fn drain(&self) {
        let pending = self.in_flight.count();
        if pending > 0 {
            debug!(pending, "draining deferred io");
        }
        self.in_flight.wait_idle();
    }
}

impl<F: FileSystemOps + 'static> Drop for SlowIo<F> {
    fn drop(&mut self) {
        self.drain();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::thread;

    use crate::config::MemFsConfig;
    use crate::vfs::MemFs;
    use memfs_types::CreateRequest;

    #[test]
    fn test_disabled_never_defers() {
        let mut rng = StdRng::seed_from_u64(7);
        let off = SlowIoConfig {
            max_delay: Duration::ZERO,
            percent_delay: 100,
            rarefy_delay: 0,
        };
        assert!(!off.is_enabled());
        assert!((0..100).all(|_| !off.should_defer(&mut rng)));

        let never = SlowIoConfig {
            max_delay: Duration::from_millis(10),
            percent_delay: 0,
            rarefy_delay: 0,
        };
        assert!((0..100).all(|_| !never.should_defer(&mut rng)));
    }

    #[test]
    fn test_always_defers_at_full_percent() {
        let mut rng = StdRng::seed_from_u64(7);
        let always = SlowIoConfig {
            max_delay: Duration::from_millis(10),
            percent_delay: 100,
            rarefy_delay: 0,
        };
        assert!(always.is_enabled());
        assert!((0..100).all(|_| always.should_defer(&mut rng)));
    }

    #[test]
    fn test_delay_bounds_and_rarefy() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = SlowIoConfig {
            max_delay: Duration::from_millis(40),
            percent_delay: 100,
            rarefy_delay: 2,
        };
        for _ in 0..200 {
            assert!(config.delay(&mut rng) <= Duration::from_millis(10));
        }
        let flattened = SlowIoConfig {
            rarefy_delay: 64,
            ..config
        };
        assert_eq!(flattened.delay(&mut rng), Duration::ZERO);
    }

    #[test]
    fn test_in_flight_wait_idle() {
        let in_flight = Arc::new(InFlight::new());
        let guards: Vec<_> = (0..4).map(|_| in_flight.enter()).collect();
        assert_eq!(in_flight.count(), 4);

        let releaser = thread::spawn(move || {
            for guard in guards {
                thread::sleep(Duration::from_millis(5));
                drop(guard);
            }
        });
        in_flight.wait_idle();
        assert_eq!(in_flight.count(), 0);
        releaser.join().unwrap();
    }

    struct NullSink;

    impl CompletionSink for NullSink {
        fn allocate_request_token(&self) -> RequestToken {
            0
        }
        fn complete_read(&self, _: RequestToken, _: Status, _: Vec<u8>) {}
        fn complete_write(&self, _: RequestToken, _: Status, _: u32, _: Option<FileInfo>) {}
        fn complete_read_directory(&self, _: RequestToken, _: Status, _: Vec<DirEntry>) {}
    }

    #[test]
    fn test_passthrough_when_disabled() {
        let fs = Arc::new(MemFs::new(MemFsConfig::default()).unwrap());
        let slow =
            SlowIo::new(Arc::clone(&fs), Arc::new(NullSink), SlowIoConfig::default()).unwrap();
        let f = fs.create("\\f", CreateRequest::file()).unwrap().handle;

        let written = slow.write(&f, 0, b"abc", false, false);
        assert_eq!(written.status(), Status::Success);
        match slow.read(&f, 0, 3) {
            IoOutcome::Complete(Ok(data)) => assert_eq!(data, b"abc"),
            other => panic!("expected completed read, got {other:?}"),
        }
        assert_eq!(slow.read(&f, 9, 1).status(), Status::EndOfFile);
        slow.shutdown();
    }
}
