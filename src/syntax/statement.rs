//! Statement boundaries for brace languages

use super::filter::{FilterOptions, QuoteFilter};
use crate::buffer::TextSnapshot;
use crate::util::compress_whitespace;

/// A filtered character with its end-of-statement flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementChar {
    pub position: usize,
    pub ch: char,
    pub in_quote: bool,
    pub end_of_statement: bool,
}

/// Marks statement terminators in the filtered character stream.
///
/// `{` and `}` always terminate. `;` terminates unless it sits inside a
/// parenthesis group opened at the current brace depth, so the clauses of
/// `for (a; b; c)` stay together while a `;` inside a braced lambda body
/// within parentheses still ends its statement.
pub struct StatementScanner<'a> {
    filter: QuoteFilter<'a>,
    brace_depth: usize,
    paren_depths: Vec<usize>,
}

impl<'a> StatementScanner<'a> {
    pub fn new(snapshot: &'a TextSnapshot, options: FilterOptions) -> Self {
        Self {
            filter: QuoteFilter::new(snapshot, options),
            brace_depth: 0,
            paren_depths: Vec::new(),
        }
    }

    pub fn brace_depth(&self) -> usize {
        self.brace_depth
    }
}

impl Iterator for StatementScanner<'_> {
    type Item = StatementChar;

    fn next(&mut self) -> Option<StatementChar> {
        let scanned = self.filter.next()?;

        let mut end_of_statement = false;
        if !scanned.in_quote {
            match scanned.ch {
                ';' => {
                    end_of_statement = self
                        .paren_depths
                        .last()
                        .map_or(true, |&depth| depth < self.brace_depth);
                }
                '(' => self.paren_depths.push(self.brace_depth),
                ')' => {
                    self.paren_depths.pop();
                }
                '{' => {
                    self.brace_depth += 1;
                    end_of_statement = true;
                }
                '}' => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    end_of_statement = true;
                }
                _ => {}
            }
        }

        Some(StatementChar {
            position: scanned.position,
            ch: scanned.ch,
            in_quote: scanned.in_quote,
            end_of_statement,
        })
    }
}

/// Raw text of the statement being read
#[derive(Debug, Default)]
pub struct StatementAccumulator {
    raw: String,
    start: Option<usize>,
}

impl StatementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: usize, ch: char) {
        if self.start.is_none() && !ch.is_whitespace() {
            self.start = Some(position);
        }
        self.raw.push(ch);
    }

    /// Offset of the first non-whitespace character, if any
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn is_blank(&self) -> bool {
        self.start.is_none()
    }

    /// Compressed statement text; resets for the next statement
    pub fn take(&mut self) -> String {
        let text = compress_whitespace(&self.raw);
        self.clear();
        text
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    /// Statements split at terminators, terminators dropped
    fn statements(text: &str) -> Vec<String> {
        let snapshot = TextBuffer::new(text).current_snapshot();
        let mut acc = StatementAccumulator::new();
        let mut out = Vec::new();
        for sc in StatementScanner::new(&snapshot, FilterOptions::default()) {
            if sc.end_of_statement {
                out.push(acc.take());
            } else {
                acc.push(sc.position, sc.ch);
            }
        }
        out
    }

    #[test]
    fn test_semicolons_split_statements() {
        assert_eq!(statements("a(); b();"), vec!["a()", "b()"]);
    }

    #[test]
    fn test_for_header_stays_together() {
        assert_eq!(
            statements("for (int i = 0; i < 10; ++i) {"),
            vec!["for (int i = 0; i < 10; ++i)"]
        );
    }

    #[test]
    fn test_semicolon_inside_lambda_body_terminates() {
        assert_eq!(
            statements("run(delegate { x(); });"),
            vec!["run(delegate", "x()", "", ")"]
        );
    }

    #[test]
    fn test_quoted_semicolon_ignored() {
        assert_eq!(statements("s = \"a;b\";"), vec!["s = \"a;b\""]);
    }

    #[test]
    fn test_unmatched_close_paren_ignored() {
        assert_eq!(statements(") a; b;"), vec![") a", "b"]);
    }

    #[test]
    fn test_brace_depth_saturates() {
        let snapshot = TextBuffer::new("}} {").current_snapshot();
        let mut scanner = StatementScanner::new(&snapshot, FilterOptions::default());
        while scanner.next().is_some() {}
        assert_eq!(scanner.brace_depth(), 1);
    }

    #[test]
    fn test_accumulator_start_skips_whitespace() {
        let mut acc = StatementAccumulator::new();
        for (i, ch) in "  \n class  Foo ".chars().enumerate() {
            acc.push(i, ch);
        }
        assert_eq!(acc.start(), Some(4));
        assert_eq!(acc.take(), "class Foo");
        assert!(acc.is_blank());
    }
}
