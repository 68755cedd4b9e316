//! Per-buffer block tagging
//!
//! A [`BlockTagger`] lives on the interactive thread. It keeps the current
//! [`BlockTree`] of one buffer, restarts a background scan whenever the text
//! really changes, and tells subscribers when a fresh tree is in place.
//!
//! Finished scans come back over an `mpsc` channel tagged with the generation
//! they were started under; only the newest generation is accepted, so a
//! superseded scan that still completes is dropped on receipt.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::block::{BlockId, BlockKind, BlockNode, BlockTree};
use crate::buffer::{BufferId, SnapshotSpan, Span, TextChangeEvent, TextSnapshot};
use crate::scan::BackgroundScan;
use crate::syntax::BlockParser;

/// A new tree was published; everything in `span` should be re-queried
#[derive(Debug, Clone)]
pub struct BlocksChanged {
    pub span: SnapshotSpan,
}

/// A block returned from a query, kept alive by its tree
#[derive(Debug, Clone)]
pub struct BlockTag {
    tree: Arc<BlockTree>,
    id: BlockId,
}

impl BlockTag {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn tree(&self) -> &Arc<BlockTree> {
        &self.tree
    }

    pub fn block(&self) -> &BlockNode {
        &self.tree[self.id]
    }

    pub fn kind(&self) -> BlockKind {
        self.block().kind
    }

    /// The block's span on the snapshot the tree was built from
    pub fn span(&self) -> SnapshotSpan {
        SnapshotSpan::new(self.tree.snapshot().clone(), self.block().span)
    }

    pub fn context_text(&self) -> String {
        self.tree.context_text(self.id)
    }
}

struct ScanResult {
    generation: u64,
    tree: BlockTree,
}

pub struct BlockTagger {
    parser: Arc<dyn BlockParser>,
    buffer: BufferId,
    snapshot: TextSnapshot,
    current: Option<Arc<BlockTree>>,
    scan: Option<BackgroundScan>,
    generation: u64,
    results_tx: Sender<ScanResult>,
    results_rx: Receiver<ScanResult>,
    subscribers: Vec<Sender<BlocksChanged>>,
}

impl BlockTagger {
    /// A tagger for the buffer `snapshot` belongs to. Nothing is scanned
    /// until the first subscriber arrives.
    pub fn new(parser: Arc<dyn BlockParser>, snapshot: TextSnapshot) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            parser,
            buffer: snapshot.buffer(),
            snapshot,
            current: None,
            scan: None,
            generation: 0,
            results_tx,
            results_rx,
            subscribers: Vec::new(),
        }
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Latest snapshot the tagger has been told about
    pub fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    /// Listen for published trees. The first subscriber starts a scan of the
    /// latest snapshot.
    pub fn subscribe(&mut self) -> Receiver<BlocksChanged> {
        let (tx, rx) = mpsc::channel();
        let first = self.subscribers.is_empty();
        self.subscribers.push(tx);
        if first {
            self.start_scan();
        }
        rx
    }

    pub fn is_active(&self) -> bool {
        !self.subscribers.is_empty()
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.is_some()
    }

    pub fn current_tree(&self) -> Option<Arc<BlockTree>> {
        self.current.clone()
    }

    /// React to a buffer change: rescan only if some edit happened between
    /// the two versions
    pub fn on_text_changed(&mut self, event: &TextChangeEvent) {
        if event.after.buffer() != self.buffer {
            tracing::warn!(
                "Tagger for buffer {} got a change event for buffer {}",
                self.buffer.0,
                event.after.buffer().0
            );
            return;
        }

        self.snapshot = event.after.clone();
        if !event.has_text_changes() {
            tracing::trace!(
                "No text changes between v{} and v{}, keeping tree",
                event.before.version_number(),
                event.after.version_number()
            );
            return;
        }

        if self.is_active() {
            self.start_scan();
        }
    }

    fn start_scan(&mut self) {
        if let Some(old) = self.scan.take() {
            old.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        let tx = self.results_tx.clone();
        let spawned = BackgroundScan::spawn(
            self.snapshot.clone(),
            Arc::clone(&self.parser),
            move |tree| {
                // The tagger may be gone already
                let _ = tx.send(ScanResult { generation, tree });
            },
        );

        match spawned {
            Ok(scan) => {
                tracing::debug!(
                    "Started scan #{} of buffer {} v{}",
                    generation,
                    self.buffer.0,
                    self.snapshot.version_number()
                );
                self.scan = Some(scan);
            }
            Err(e) => {
                tracing::error!("Failed to spawn scan thread: {}", e);
            }
        }
    }

    /// Accept finished scans without blocking. Returns true if a new tree was
    /// published.
    pub fn process_pending(&mut self) -> bool {
        let mut published = false;
        while let Ok(result) = self.results_rx.try_recv() {
            published |= self.accept(result);
        }
        published
    }

    /// Block until a new tree is published or `timeout` runs out
    pub fn wait_for_update(&mut self, timeout: Duration) -> bool {
        if self.process_pending() {
            return true;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_scanning() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results_rx.recv_timeout(remaining) {
                Ok(result) => {
                    if self.accept(result) {
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
    }

    fn accept(&mut self, result: ScanResult) -> bool {
        if result.generation != self.generation || !self.is_active() {
            tracing::trace!(
                "Dropping stale scan #{} (current #{})",
                result.generation,
                self.generation
            );
            return false;
        }

        self.scan = None;
        let tree = Arc::new(result.tree);
        let event = BlocksChanged {
            span: SnapshotSpan::full(tree.snapshot()),
        };
        self.current = Some(tree);

        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if self.subscribers.is_empty() {
            tracing::debug!("All subscribers of buffer {} gone, detaching", self.buffer.0);
            self.detach();
            return false;
        }
        true
    }

    /// Blocks intersecting any of `spans`, in document order. Spans from
    /// other versions of the buffer are translated to the tree's snapshot.
    pub fn get_blocks(&self, spans: &[SnapshotSpan]) -> Vec<BlockTag> {
        let Some(tree) = &self.current else {
            return Vec::new();
        };

        let target = tree.snapshot();
        let local: Vec<Span> = spans
            .iter()
            .filter(|s| s.snapshot.buffer() == target.buffer())
            .map(|s| s.translate_to(target).span)
            .collect();

        tree.intersecting(&local)
            .into_iter()
            .map(|id| BlockTag {
                tree: Arc::clone(tree),
                id,
            })
            .collect()
    }

    /// Stop scanning and forget the tree and all subscribers
    pub fn detach(&mut self) {
        if let Some(scan) = self.scan.take() {
            scan.abort();
        }
        self.current = None;
        self.subscribers.clear();
    }
}

impl Drop for BlockTagger {
    fn drop(&mut self) {
        if let Some(scan) = &self.scan {
            scan.abort();
        }
    }
}

/// One tagger per buffer, created on first use
#[derive(Default)]
pub struct TaggerRegistry {
    taggers: HashMap<BufferId, BlockTagger>,
}

impl TaggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tagger for `snapshot`'s buffer, creating it with `make_parser` if
    /// needed. Returns None when no parser applies.
    pub fn get_or_create<F>(&mut self, snapshot: &TextSnapshot, make_parser: F) -> Option<&mut BlockTagger>
    where
        F: FnOnce() -> Option<Arc<dyn BlockParser>>,
    {
        let buffer = snapshot.buffer();
        if !self.taggers.contains_key(&buffer) {
            let parser = make_parser()?;
            self.taggers
                .insert(buffer, BlockTagger::new(parser, snapshot.clone()));
        }
        self.taggers.get_mut(&buffer)
    }

    pub fn get(&self, buffer: BufferId) -> Option<&BlockTagger> {
        self.taggers.get(&buffer)
    }

    pub fn get_mut(&mut self, buffer: BufferId) -> Option<&mut BlockTagger> {
        self.taggers.get_mut(&buffer)
    }

    /// Route a change event to its buffer's tagger
    pub fn on_text_changed(&mut self, event: &TextChangeEvent) {
        if let Some(tagger) = self.taggers.get_mut(&event.after.buffer()) {
            tagger.on_text_changed(event);
        }
    }

    /// Drop the tagger of a closed buffer
    pub fn remove(&mut self, buffer: BufferId) -> Option<BlockTagger> {
        self.taggers.remove(&buffer)
    }

    /// Drop taggers that have no subscribers left
    pub fn prune_inactive(&mut self) {
        self.taggers.retain(|_, tagger| tagger.is_active());
    }

    pub fn len(&self) -> usize {
        self.taggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::syntax::{BraceParser, FilterOptions, KeywordTable};

    const WAIT: Duration = Duration::from_secs(5);

    fn parser() -> Arc<dyn BlockParser> {
        Arc::new(BraceParser::new(
            KeywordTable::csharp(),
            FilterOptions::default(),
        ))
    }

    #[test]
    fn test_no_scan_without_subscribers() {
        let buffer = TextBuffer::new("class A { }");
        let mut tagger = BlockTagger::new(parser(), buffer.current_snapshot());
        assert!(!tagger.is_scanning());
        assert!(!tagger.wait_for_update(Duration::from_millis(20)));
        assert!(tagger.current_tree().is_none());
    }

    #[test]
    fn test_subscribe_publishes_tree() {
        let buffer = TextBuffer::new("class A { }");
        let mut tagger = BlockTagger::new(parser(), buffer.current_snapshot());
        let rx = tagger.subscribe();

        assert!(tagger.wait_for_update(WAIT));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.span.span, Span::new(0, 11));
        assert_eq!(tagger.current_tree().unwrap().block_count(), 1);
    }

    #[test]
    fn test_touch_does_not_rescan() {
        let mut buffer = TextBuffer::new("class A { }");
        let mut tagger = BlockTagger::new(parser(), buffer.current_snapshot());
        let _rx = tagger.subscribe();
        assert!(tagger.wait_for_update(WAIT));

        let event = buffer.touch();
        tagger.on_text_changed(&event);
        assert!(!tagger.is_scanning());
    }

    #[test]
    fn test_detaches_when_subscribers_dropped() {
        let buffer = TextBuffer::new("class A { }");
        let mut tagger = BlockTagger::new(parser(), buffer.current_snapshot());
        drop(tagger.subscribe());

        // The result is dropped: nobody is listening anymore
        assert!(!tagger.wait_for_update(WAIT));
        assert!(!tagger.is_active());
        assert!(tagger.current_tree().is_none());
    }

    #[test]
    fn test_registry_creates_once() {
        let buffer = TextBuffer::new("x");
        let snapshot = buffer.current_snapshot();
        let mut registry = TaggerRegistry::new();

        assert!(registry.get_or_create(&snapshot, || None).is_none());
        assert!(registry.get_or_create(&snapshot, || Some(parser())).is_some());

        let mut created_again = false;
        registry.get_or_create(&snapshot, || {
            created_again = true;
            Some(parser())
        });
        assert!(!created_again);
        assert_eq!(registry.len(), 1);

        registry.prune_inactive();
        assert!(registry.is_empty());
    }
}
