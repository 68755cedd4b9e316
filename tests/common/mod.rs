//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::time::Duration;

use blockscan::block::{BlockKind, BlockTree};
use blockscan::buffer::{TextBuffer, TextSnapshot};
use blockscan::config::ScanConfig;
use blockscan::syntax::{parser_for, LanguageId};

/// Upper bound for waiting on background scans
pub const WAIT: Duration = Duration::from_secs(10);

pub fn snapshot(text: &str) -> TextSnapshot {
    TextBuffer::new(text).current_snapshot()
}

/// Parse `text` synchronously with the default configuration
pub fn parse(language: LanguageId, text: &str) -> BlockTree {
    let parser = parser_for(language, &ScanConfig::default()).expect("language has a parser");
    parser
        .parse(&snapshot(text), &|| false)
        .expect("parse without abort returns a tree")
}

/// (kind, level, statement) for every block in document order
pub fn outline(tree: &BlockTree) -> Vec<(BlockKind, usize, String)> {
    tree.blocks()
        .map(|(_, b)| (b.kind, b.level, b.statement().to_string()))
        .collect()
}

pub fn kinds(tree: &BlockTree) -> Vec<BlockKind> {
    tree.blocks().map(|(_, b)| b.kind).collect()
}

/// Root covers the snapshot; children are ordered, disjoint and nested
pub fn assert_well_formed(tree: &BlockTree) {
    let root = tree.root();
    assert_eq!(root.kind, BlockKind::Root);
    assert_eq!(root.level, 0);
    assert_eq!(root.span, tree.snapshot().span());
    assert!(root.parent.is_none());

    let mut pending = vec![blockscan::block::BlockId::ROOT];
    while let Some(id) = pending.pop() {
        let node = &tree[id];
        assert!(node.span.end >= node.span.start, "inverted span {:?}", node.span);

        let mut previous_end = node.span.start;
        for &child in &node.children {
            let span = tree[child].span;
            assert_eq!(tree[child].parent, Some(id));
            assert!(
                node.span.contains_span(span),
                "{:?} not inside parent {:?}",
                span,
                node.span
            );
            assert!(
                span.start >= previous_end,
                "{:?} overlaps or precedes its sibling",
                span
            );
            previous_end = span.end;
            pending.push(child);
        }
    }
}

/// Contents of a file under `samples/`
pub fn sample(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

/// Small deterministic generator for property-style tests
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}
