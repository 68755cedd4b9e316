//! Tree dumps for the command line

use serde::Serialize;

use crate::block::{BlockKind, BlockTree};
use crate::syntax::LanguageId;

/// One block, flattened; `parent` indexes into [`TreeReport::blocks`]
#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub kind: BlockKind,
    pub level: usize,
    pub start: usize,
    pub end: usize,
    pub statement_start: usize,
    /// 1-based first and last line
    pub lines: (usize, usize),
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeReport {
    pub language: LanguageId,
    pub version: u64,
    pub chars: usize,
    pub blocks: Vec<BlockReport>,
}

impl TreeReport {
    pub fn new(tree: &BlockTree, language: LanguageId, with_context: bool) -> Self {
        let snapshot = tree.snapshot();
        let blocks = tree
            .blocks()
            .map(|(id, block)| {
                let last = block.span.end.saturating_sub(1).max(block.span.start);
                BlockReport {
                    kind: block.kind,
                    level: block.level,
                    start: block.span.start,
                    end: block.span.end,
                    statement_start: block.statement_start,
                    lines: (
                        snapshot.line_of(block.statement_start) + 1,
                        snapshot.line_of(last) + 1,
                    ),
                    statement: block.statement().to_string(),
                    // Arena index 0 is Root, which is not listed
                    parent: block.parent.filter(|p| p.0 > 0).map(|p| p.0 - 1),
                    context: with_context.then(|| tree.context_text(id)),
                }
            })
            .collect();

        Self {
            language,
            version: snapshot.version_number(),
            chars: snapshot.len_chars(),
            blocks,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One line per block, indented by nesting depth
    pub fn to_text(&self) -> String {
        let mut depths: Vec<usize> = Vec::with_capacity(self.blocks.len());
        let mut out = String::new();
        for block in &self.blocks {
            let depth = block.parent.map_or(0, |p| depths[p] + 1);
            depths.push(depth);

            let indent = "  ".repeat(depth);
            out.push_str(&format!(
                "{}{:<6} L{} {}-{}  {}\n",
                indent,
                block.kind.label(),
                block.level,
                block.lines.0,
                block.lines.1,
                block.statement
            ));
            if let Some(context) = &block.context {
                for line in context.lines() {
                    out.push_str(&format!("{}  | {}\n", indent, line));
                }
            }
        }
        if self.blocks.is_empty() {
            out.push_str("(no blocks)\n");
        }
        out
    }
}
