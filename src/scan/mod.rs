//! Background scans
//!
//! A [`BackgroundScan`] runs one [`BlockParser`] over one snapshot on its own
//! worker thread. Cancellation is cooperative: the parser polls the scan's
//! [`CancellationToken`] between characters, and the token is checked once
//! more right before the completion callback, so a scan aborted before it
//! finishes never delivers a tree.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::block::BlockTree;
use crate::buffer::TextSnapshot;
use crate::syntax::BlockParser;

/// Name of scan worker threads
pub const SCAN_THREAD_NAME: &str = "block-scan";

/// Shared abort flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Lifecycle of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanState {
    Idle = 0,
    Scanning = 1,
    Published = 2,
    Aborted = 3,
}

impl ScanState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ScanState::Scanning,
            2 => ScanState::Published,
            3 => ScanState::Aborted,
            _ => ScanState::Idle,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, ScanState::Published | ScanState::Aborted)
    }
}

/// Handle to a scan running on a worker thread
#[derive(Debug)]
pub struct BackgroundScan {
    token: CancellationToken,
    state: Arc<AtomicU8>,
    version: u64,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundScan {
    /// Start scanning `snapshot`. `on_complete` runs on the worker thread and
    /// only for a scan that finished without being aborted.
    pub fn spawn<F>(
        snapshot: TextSnapshot,
        parser: Arc<dyn BlockParser>,
        on_complete: F,
    ) -> io::Result<Self>
    where
        F: FnOnce(BlockTree) + Send + 'static,
    {
        let token = CancellationToken::new();
        let state = Arc::new(AtomicU8::new(ScanState::Idle as u8));
        let version = snapshot.version_number();

        let worker_token = token.clone();
        let worker_state = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name(SCAN_THREAD_NAME.to_string())
            .spawn(move || {
                #[cfg(feature = "profile-tracing")]
                let _span = tracing::info_span!("block_scan", version).entered();

                worker_state.store(ScanState::Scanning as u8, Ordering::Release);
                let started = Instant::now();
                let abort = || worker_token.is_cancelled();
                let result = parser.parse(&snapshot, &abort);

                match result {
                    Some(tree) if !worker_token.is_cancelled() => {
                        tracing::debug!(
                            "Scan of v{} finished in {:?}: {} blocks over {} chars",
                            version,
                            started.elapsed(),
                            tree.block_count(),
                            snapshot.len_chars()
                        );
                        worker_state.store(ScanState::Published as u8, Ordering::Release);
                        on_complete(tree);
                    }
                    _ => {
                        tracing::trace!(
                            "Scan of v{} aborted after {:?}",
                            version,
                            started.elapsed()
                        );
                        worker_state.store(ScanState::Aborted as u8, Ordering::Release);
                    }
                }
            })?;

        Ok(Self {
            token,
            state,
            version,
            handle: Some(handle),
        })
    }

    /// Ask the scan to stop. Advisory and idempotent.
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn state(&self) -> ScanState {
        ScanState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Version number of the scanned snapshot
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Block until the worker has exited, returning its final state
    pub fn wait(mut self) -> ScanState {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Scan worker for v{} panicked", self.version);
            }
        }
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::syntax::{BraceParser, FilterOptions, KeywordTable};
    use std::sync::mpsc;
    use std::time::Duration;

    fn csharp_parser() -> Arc<dyn BlockParser> {
        Arc::new(BraceParser::new(
            KeywordTable::csharp(),
            FilterOptions::default(),
        ))
    }

    /// Parser that blocks until released, then honors abort
    struct GatedParser {
        gate: std::sync::Mutex<mpsc::Receiver<()>>,
    }

    impl BlockParser for GatedParser {
        fn parse(&self, snapshot: &TextSnapshot, abort: &dyn Fn() -> bool) -> Option<BlockTree> {
            if let Ok(gate) = self.gate.lock() {
                let _ = gate.recv_timeout(Duration::from_secs(5));
            }
            csharp_parser().parse(snapshot, abort)
        }
    }

    #[test]
    fn test_token_cancel_is_idempotent() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_scan_publishes_tree() {
        let snapshot = TextBuffer::new("class A { }").current_snapshot();
        let (tx, rx) = mpsc::channel();
        let scan = BackgroundScan::spawn(snapshot, csharp_parser(), move |tree| {
            let _ = tx.send(tree.block_count());
        })
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(1));
        assert_eq!(scan.wait(), ScanState::Published);
    }

    #[test]
    fn test_aborted_scan_never_completes() {
        let snapshot = TextBuffer::new("class A { void f() { } }").current_snapshot();
        let (gate_tx, gate_rx) = mpsc::channel();
        let parser = Arc::new(GatedParser {
            gate: std::sync::Mutex::new(gate_rx),
        });

        let (tx, rx) = mpsc::channel::<()>();
        let scan = BackgroundScan::spawn(snapshot, parser, move |_| {
            let _ = tx.send(());
        })
        .unwrap();

        scan.abort();
        scan.abort();
        gate_tx.send(()).unwrap();

        assert_eq!(scan.wait(), ScanState::Aborted);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_scan_runs_on_named_thread() {
        let snapshot = TextBuffer::new("{}").current_snapshot();
        let (tx, rx) = mpsc::channel();
        let scan = BackgroundScan::spawn(snapshot, csharp_parser(), move |_| {
            let name = thread::current().name().map(str::to_string);
            let _ = tx.send(name);
        })
        .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(SCAN_THREAD_NAME));
        scan.wait();
    }
}
