//! Block structure from indentation

use super::filter::BasicFilter;
use super::keywords::KeywordTable;
use super::parser::BlockParser;
use super::statement::StatementAccumulator;
use crate::block::{BlockId, BlockTree, TreeBuilder};
use crate::buffer::TextSnapshot;
use crate::util::text::advance_indent;
use crate::util::{compress_whitespace, DEFAULT_TAB_SIZE};

/// Parser for Visual Basic style languages.
///
/// A line indented deeper than the previous non-blank line opens a block
/// introduced by that previous line; a shallower line closes blocks until
/// the indentation realigns.
#[derive(Debug, Clone)]
pub struct IndentParser {
    table: KeywordTable,
    tab_size: usize,
}

/// The last non-blank logical line
struct PreviousLine {
    statement: String,
    /// Compressed text with string literals removed
    code: String,
    start: usize,
    indent: usize,
}

impl IndentParser {
    pub fn new(table: KeywordTable, tab_size: usize) -> Self {
        Self {
            table,
            tab_size: tab_size.max(1),
        }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }
}

impl Default for IndentParser {
    fn default() -> Self {
        Self::new(KeywordTable::visual_basic(), DEFAULT_TAB_SIZE)
    }
}

impl BlockParser for IndentParser {
    fn parse(&self, snapshot: &TextSnapshot, abort: &dyn Fn() -> bool) -> Option<BlockTree> {
        let mut builder = TreeBuilder::new(snapshot);
        let mut open: Vec<(usize, BlockId)> = Vec::new();
        let mut parent = BlockId::ROOT;
        let mut previous: Option<PreviousLine> = None;

        let mut statement = StatementAccumulator::new();
        let mut code = String::new();
        let mut indent = 0;

        let mut filter = BasicFilter::new(snapshot);
        loop {
            if abort() {
                return None;
            }
            let Some(sc) = filter.next() else {
                break;
            };

            if sc.ch == '\n' && !sc.in_quote {
                if let Some(start) = statement.start() {
                    previous = Some(PreviousLine {
                        statement: statement.take(),
                        code: compress_whitespace(&code),
                        start,
                        indent,
                    });
                }
                statement.clear();
                code.clear();
                indent = 0;
                continue;
            }

            if statement.is_blank() {
                if !sc.in_quote && sc.ch.is_whitespace() {
                    indent = advance_indent(indent, sc.ch, self.tab_size);
                } else if let Some(prev) = &previous {
                    if indent > prev.indent {
                        let kind = self.table.classify(builder.kind(parent), &prev.code);
                        let id = builder.open(
                            parent,
                            kind,
                            prev.statement.clone(),
                            sc.position,
                            prev.start,
                            open.len(),
                        );
                        open.push((prev.indent, id));
                        parent = id;
                    } else if indent < prev.indent {
                        while let Some((opened_at, id)) = open.pop() {
                            builder.close(id, sc.position);
                            parent = builder.parent(id).unwrap_or(BlockId::ROOT);
                            if opened_at <= indent {
                                break;
                            }
                        }
                    }
                }
            }

            if !sc.in_quote {
                code.push(sc.ch);
            }
            statement.push(sc.position, sc.ch);
        }

        Some(builder.finish())
    }
}
