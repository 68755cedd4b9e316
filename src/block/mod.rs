//! Block tree model
//!
//! A [`BlockTree`] is the published result of one scan: an arena of
//! [`BlockNode`]s rooted at a synthetic Root block that spans the whole
//! snapshot it was built from. Parents own their children by index; the
//! `parent` field is a plain back-reference.
//!
//! Trees are only created through [`TreeBuilder`], which keeps block ends
//! open while scanning and settles every one of them in [`TreeBuilder::finish`].

mod context;

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::buffer::{Span, TextSnapshot};

pub use context::{keyword_highlights, KeywordHighlight};

/// Block category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Root,
    Loop,
    Conditional,
    Method,
    Class,
    Namespace,
    Other,
    Unknown,
}

impl BlockKind {
    /// Short label for tree dumps
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Root => "root",
            BlockKind::Loop => "loop",
            BlockKind::Conditional => "cond",
            BlockKind::Method => "method",
            BlockKind::Class => "class",
            BlockKind::Namespace => "ns",
            BlockKind::Other => "other",
            BlockKind::Unknown => "?",
        }
    }
}

/// Index of a block in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl BlockId {
    pub const ROOT: BlockId = BlockId(0);
}

/// A single block
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub kind: BlockKind,
    pub span: Span,
    /// First non-whitespace char of the statement that introduced the block
    pub statement_start: usize,
    pub level: usize,
    pub parent: Option<BlockId>,
    pub children: Vec<BlockId>,
    /// Whitespace-compressed introducing statement (None for Root)
    pub statement: Option<String>,
}

impl BlockNode {
    pub fn is_root(&self) -> bool {
        self.kind == BlockKind::Root
    }

    pub fn statement(&self) -> &str {
        self.statement.as_deref().unwrap_or("")
    }
}

/// Block structure of one snapshot
#[derive(Debug, Clone)]
pub struct BlockTree {
    snapshot: TextSnapshot,
    nodes: Vec<BlockNode>,
}

impl BlockTree {
    /// The snapshot this tree was built from
    pub fn snapshot(&self) -> &TextSnapshot {
        &self.snapshot
    }

    pub fn root(&self) -> &BlockNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockNode> {
        self.nodes.get(id.0)
    }

    /// Number of blocks, Root excluded
    pub fn block_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// All blocks except Root, in document order
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BlockNode)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, node)| (BlockId(i), node))
    }

    pub fn ancestors(&self, id: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, |parent| {
            self.nodes[parent.0].parent
        })
    }

    /// Innermost block whose span contains `pos` (Root if none)
    pub fn innermost_at(&self, pos: usize) -> BlockId {
        let mut current = BlockId::ROOT;
        'descend: loop {
            for &child in &self.nodes[current.0].children {
                let span = self.nodes[child.0].span;
                if span.start <= pos && pos < span.end {
                    current = child;
                    continue 'descend;
                }
                if span.start > pos {
                    break;
                }
            }
            return current;
        }
    }

    /// Every block below Root intersecting any of `spans` (touching counts),
    /// in document order. A block is only visited when its parent matched.
    pub fn intersecting(&self, spans: &[Span]) -> Vec<BlockId> {
        let spans = normalize_spans(spans);
        let mut found = Vec::new();
        if spans.is_empty() {
            return found;
        }

        let mut stack: Vec<BlockId> = self.root().children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if spans.iter().any(|span| span.intersects(node.span)) {
                found.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    /// Tooltip text for a block: the statements of its enclosing blocks,
    /// outermost first, each line indented two spaces deeper.
    ///
    /// Unknown blocks are skipped and the walk stops at Root or once it has
    /// stepped onto a Namespace.
    pub fn context_text(&self, id: BlockId) -> String {
        let mut chain = Vec::new();
        let mut current = id;
        loop {
            let node = &self.nodes[current.0];
            if node.kind == BlockKind::Root {
                break;
            }
            if node.kind != BlockKind::Unknown {
                chain.push(node.statement());
            }

            let Some(parent) = node.parent else {
                break;
            };
            current = parent;
            if self.nodes[current.0].kind == BlockKind::Namespace {
                break;
            }
        }

        let mut text = String::new();
        for (depth, statement) in chain.iter().rev().enumerate() {
            if depth > 0 {
                text.push('\n');
                text.push_str(&" ".repeat(depth * 2));
            }
            text.push_str(statement);
        }
        text
    }
}

impl Index<BlockId> for BlockTree {
    type Output = BlockNode;

    fn index(&self, id: BlockId) -> &BlockNode {
        &self.nodes[id.0]
    }
}

/// Sort and merge overlapping or abutting spans
fn normalize_spans(spans: &[Span]) -> Vec<Span> {
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|span| (span.start, span.end));

    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

struct PendingBlock {
    kind: BlockKind,
    start: usize,
    end: Option<usize>,
    statement_start: usize,
    level: usize,
    parent: Option<BlockId>,
    children: Vec<BlockId>,
    statement: Option<String>,
}

/// Accumulates blocks during a scan
pub(crate) struct TreeBuilder {
    snapshot: TextSnapshot,
    blocks: Vec<PendingBlock>,
}

impl TreeBuilder {
    pub fn new(snapshot: &TextSnapshot) -> Self {
        let root = PendingBlock {
            kind: BlockKind::Root,
            start: 0,
            end: Some(snapshot.len_chars()),
            statement_start: 0,
            level: 0,
            parent: None,
            children: Vec::new(),
            statement: None,
        };
        Self {
            snapshot: snapshot.clone(),
            blocks: vec![root],
        }
    }

    pub fn kind(&self, id: BlockId) -> BlockKind {
        self.blocks[id.0].kind
    }

    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.blocks[id.0].parent
    }

    pub fn open(
        &mut self,
        parent: BlockId,
        kind: BlockKind,
        statement: String,
        start: usize,
        statement_start: usize,
        level: usize,
    ) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(PendingBlock {
            kind,
            start,
            end: None,
            statement_start,
            level,
            parent: Some(parent),
            children: Vec::new(),
            statement: Some(statement),
        });
        self.blocks[parent.0].children.push(id);
        id
    }

    pub fn close(&mut self, id: BlockId, end: usize) {
        let block = &mut self.blocks[id.0];
        block.end = Some(end.max(block.start));
    }

    /// Settle the tree. Blocks still open end at the end of input.
    pub fn finish(self) -> BlockTree {
        let len = self.snapshot.len_chars();
        let unclosed = self.blocks.iter().filter(|b| b.end.is_none()).count();
        if unclosed > 0 {
            tracing::trace!("Closing {} unterminated blocks at end of input", unclosed);
        }

        let nodes = self
            .blocks
            .into_iter()
            .map(|block| BlockNode {
                kind: block.kind,
                span: Span::new(block.start, block.end.unwrap_or(len).max(block.start)),
                statement_start: block.statement_start,
                level: block.level,
                parent: block.parent,
                children: block.children,
                statement: block.statement,
            })
            .collect();

        BlockTree {
            snapshot: self.snapshot,
            nodes,
        }
    }
}
