//! Block structure from `{` and `}`

use super::filter::FilterOptions;
use super::keywords::KeywordTable;
use super::parser::BlockParser;
use super::statement::{StatementAccumulator, StatementScanner};
use crate::block::{BlockId, BlockTree, TreeBuilder};
use crate::buffer::TextSnapshot;

/// Parser for C-family languages
#[derive(Debug, Clone)]
pub struct BraceParser {
    table: KeywordTable,
    options: FilterOptions,
}

impl BraceParser {
    pub fn new(table: KeywordTable, options: FilterOptions) -> Self {
        Self { table, options }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }
}

impl BlockParser for BraceParser {
    fn parse(&self, snapshot: &TextSnapshot, abort: &dyn Fn() -> bool) -> Option<BlockTree> {
        let mut builder = TreeBuilder::new(snapshot);
        let mut open: Vec<BlockId> = Vec::new();
        let mut parent = BlockId::ROOT;
        let mut statement = StatementAccumulator::new();
        let mut scanner = StatementScanner::new(snapshot, self.options);

        loop {
            if abort() {
                return None;
            }
            let Some(sc) = scanner.next() else {
                break;
            };

            if !sc.in_quote {
                match sc.ch {
                    '{' => {
                        let statement_start = statement.start().unwrap_or(sc.position);
                        let text = statement.take();
                        let kind = self.table.classify(builder.kind(parent), &text);
                        let id = builder.open(
                            parent,
                            kind,
                            text,
                            sc.position,
                            statement_start,
                            open.len() + 1,
                        );
                        open.push(id);
                        parent = id;
                    }
                    '}' => {
                        // Unmatched closers are not structural
                        if let Some(id) = open.pop() {
                            builder.close(id, sc.position + 1);
                            parent = builder.parent(id).unwrap_or(BlockId::ROOT);
                        }
                    }
                    _ => {}
                }
            }

            if sc.end_of_statement {
                statement.clear();
            } else {
                statement.push(sc.position, sc.ch);
            }
        }

        Some(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::buffer::{Span, TextBuffer};

    fn parse_csharp(text: &str) -> BlockTree {
        let snapshot = TextBuffer::new(text).current_snapshot();
        let parser = BraceParser::new(
            KeywordTable::csharp(),
            FilterOptions {
                preprocessor: true,
                verbatim_strings: true,
            },
        );
        parser.parse(&snapshot, &|| false).unwrap()
    }

    fn shape(tree: &BlockTree) -> Vec<(BlockKind, usize, String)> {
        tree.blocks()
            .map(|(_, b)| (b.kind, b.level, b.statement().to_string()))
            .collect()
    }

    #[test]
    fn test_class_method_if() {
        let text = "class Foo {\n  void Bar() {\n    if (x) { y(); }\n  }\n}";
        let tree = parse_csharp(text);
        assert_eq!(
            shape(&tree),
            vec![
                (BlockKind::Class, 1, "class Foo".to_string()),
                (BlockKind::Method, 2, "void Bar()".to_string()),
                (BlockKind::Conditional, 3, "if (x)".to_string()),
            ]
        );

        let (_, cond) = tree.blocks().nth(2).unwrap();
        assert_eq!(tree.snapshot().slice_to_string(cond.span), "{ y(); }");
        assert_eq!(tree.snapshot().char_at(cond.statement_start), Some('i'));
    }

    #[test]
    fn test_for_loop_is_one_block() {
        let tree = parse_csharp("for (int i = 0; i < 10; ++i) { body(); }");
        assert_eq!(
            shape(&tree),
            vec![(BlockKind::Loop, 1, "for (int i = 0; i < 10; ++i)".to_string())]
        );
    }

    #[test]
    fn test_statement_start_points_at_first_non_whitespace() {
        let tree = parse_csharp("x();\n   while (a) {}");
        let (_, block) = tree.blocks().next().unwrap();
        assert_eq!(block.statement_start, 8);
        assert_eq!(block.span, Span::new(18, 20));
    }

    #[test]
    fn test_empty_statement_starts_at_brace() {
        let tree = parse_csharp("{ }");
        let (_, block) = tree.blocks().next().unwrap();
        assert_eq!(block.statement_start, 0);
        assert_eq!(block.statement(), "");
        assert_eq!(block.kind, BlockKind::Unknown);
    }

    #[test]
    fn test_unmatched_close_ignored() {
        let tree = parse_csharp("} class A { }");
        assert_eq!(tree.block_count(), 1);
        assert_eq!(tree.blocks().next().unwrap().1.kind, BlockKind::Class);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let tree = parse_csharp("class A { } /* comment");
        assert_eq!(tree.block_count(), 1);
        assert_eq!(tree.root().span, Span::new(0, 22));

        let tree = parse_csharp("/* { class A {");
        assert_eq!(tree.block_count(), 0);
    }

    #[test]
    fn test_unclosed_blocks_end_at_input_end() {
        let tree = parse_csharp("namespace N {\n class C {");
        let spans: Vec<Span> = tree.blocks().map(|(_, b)| b.span).collect();
        assert_eq!(spans, vec![Span::new(12, 24), Span::new(23, 24)]);
    }

    #[test]
    fn test_else_after_close() {
        let tree = parse_csharp("if (a) { } else { }");
        let kinds: Vec<BlockKind> = tree.blocks().map(|(_, b)| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::Conditional, BlockKind::Conditional]);
        assert_eq!(tree.blocks().nth(1).unwrap().1.statement(), "else");
    }

    #[test]
    fn test_abort_returns_none() {
        let snapshot = TextBuffer::new("class A { }").current_snapshot();
        let parser = BraceParser::new(KeywordTable::csharp(), FilterOptions::default());
        assert!(parser.parse(&snapshot, &|| true).is_none());
    }

    #[test]
    fn test_abort_midway() {
        use std::cell::Cell;

        let snapshot = TextBuffer::new("class A { void f() { } }").current_snapshot();
        let parser = BraceParser::new(KeywordTable::csharp(), FilterOptions::default());
        let calls = Cell::new(0);
        let abort = || {
            calls.set(calls.get() + 1);
            calls.get() > 5
        };
        assert!(parser.parse(&snapshot, &abort).is_none());
        assert_eq!(calls.get(), 6);
    }
}
