//! Character filters
//!
//! Cursors over a snapshot that hide comments and directives and mark the
//! characters that sit inside string or char literals. Both filters always
//! make forward progress: unterminated literals and comments degrade to
//! "rest of line" or "rest of input" instead of failing.

use serde::{Deserialize, Serialize};

use crate::buffer::TextSnapshot;
use crate::util::text::{is_line_break, is_word_char};

/// One significant character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    pub position: usize,
    pub ch: char,
    pub in_quote: bool,
}

/// Lexical features that vary between brace languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// `#` at top level skips the rest of the line
    pub preprocessor: bool,
    /// `@"..."` strings without backslash escapes
    pub verbatim_strings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    Verbatim,
}

impl Quote {
    fn closes_with(self, ch: char) -> bool {
        match self {
            Quote::Single => ch == '\'',
            Quote::Double | Quote::Verbatim => ch == '"',
        }
    }
}

/// Filter for C-family languages
pub struct QuoteFilter<'a> {
    snapshot: &'a TextSnapshot,
    len: usize,
    pos: usize,
    quote: Option<Quote>,
    escape: bool,
    options: FilterOptions,
}

impl<'a> QuoteFilter<'a> {
    pub fn new(snapshot: &'a TextSnapshot, options: FilterOptions) -> Self {
        Self {
            snapshot,
            len: snapshot.len_chars(),
            pos: 0,
            quote: None,
            escape: false,
            options,
        }
    }

    pub fn in_quote(&self) -> bool {
        self.quote.is_some()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.snapshot.char_at(self.pos + offset)
    }

    /// Position just past the `*/` closing a block comment whose body starts
    /// at `from`, or the end of input
    fn block_comment_end(&self, from: usize) -> usize {
        if from >= self.len {
            return self.len;
        }
        let mut prev = '\0';
        for (i, ch) in self.snapshot.text().chars_at(from).enumerate() {
            if prev == '*' && ch == '/' {
                return from + i + 1;
            }
            prev = ch;
        }
        self.len
    }

    /// Move to `target`, always advancing at least one char
    fn jump_to(&mut self, target: usize) {
        self.pos = target.max(self.pos + 1);
    }
}

impl Iterator for QuoteFilter<'_> {
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        loop {
            let position = self.pos;
            let ch = self.snapshot.char_at(position)?;

            let Some(quote) = self.quote else {
                match ch {
                    '#' if self.options.preprocessor => {
                        let end = self.snapshot.line_end(position);
                        self.jump_to(end);
                        continue;
                    }
                    '/' if self.peek(1) == Some('/') => {
                        let end = self.snapshot.line_end(position);
                        self.jump_to(end);
                        continue;
                    }
                    '/' if self.peek(1) == Some('*') => {
                        let end = self.block_comment_end(position + 2);
                        self.jump_to(end);
                        continue;
                    }
                    '@' if self.options.verbatim_strings && self.peek(1) == Some('"') => {
                        // The opening '"' is reported in place of the '@'
                        self.quote = Some(Quote::Verbatim);
                        self.pos += 2;
                        return Some(Scanned {
                            position: position + 1,
                            ch: '"',
                            in_quote: true,
                        });
                    }
                    '\'' => self.quote = Some(Quote::Single),
                    '"' => self.quote = Some(Quote::Double),
                    _ => {}
                }
                self.pos += 1;
                return Some(Scanned {
                    position,
                    ch,
                    in_quote: self.quote.is_some(),
                });
            };

            // Delimiters count as part of the literal, a line break does not
            let mut in_quote = true;
            let was_escaped = std::mem::take(&mut self.escape);
            if quote != Quote::Verbatim && ch == '\\' && !was_escaped {
                self.escape = true;
            } else if quote.closes_with(ch) && !was_escaped {
                self.quote = None;
            } else if quote != Quote::Verbatim && is_line_break(ch) {
                // Unterminated literal ends with its line
                self.quote = None;
                in_quote = false;
            }

            self.pos += 1;
            return Some(Scanned {
                position,
                ch,
                in_quote,
            });
        }
    }
}

/// Filter for Visual Basic style languages.
///
/// Line breaks are reported once per line as `'\n'` at the line-end offset,
/// outside any quote. Line comments (`'`, `REM`) and directive lines vanish
/// up to that break; a trailing `_` swallows the break entirely.
pub struct BasicFilter<'a> {
    snapshot: &'a TextSnapshot,
    pos: usize,
    in_quote: bool,
    line_blank: bool,
}

impl<'a> BasicFilter<'a> {
    pub fn new(snapshot: &'a TextSnapshot) -> Self {
        Self {
            snapshot,
            pos: 0,
            in_quote: false,
            line_blank: true,
        }
    }

    pub fn in_quote(&self) -> bool {
        self.in_quote
    }

    fn is_rem_at(&self, pos: usize) -> bool {
        let text = self.snapshot;
        let before_ok = pos == 0 || !text.char_at(pos - 1).is_some_and(is_word_char);
        before_ok
            && text.char_at(pos + 1) == Some('E')
            && text.char_at(pos + 2) == Some('M')
            && !text.char_at(pos + 3).is_some_and(is_word_char)
    }

    /// `_` as the last char of a line that has a break after it
    fn is_continuation_at(&self, pos: usize) -> bool {
        let line_end = self.snapshot.line_end(pos);
        pos + 1 == line_end && line_end < self.snapshot.len_chars()
    }

    /// End of the logical line containing `pos`, following continuations
    fn logical_line_end(&self, pos: usize) -> usize {
        let mut end = self.snapshot.line_end(pos);
        while end > 0
            && end < self.snapshot.len_chars()
            && self.snapshot.char_at(end - 1) == Some('_')
        {
            end = self
                .snapshot
                .line_end(self.snapshot.line_end_including_break(end));
        }
        end
    }

    fn jump_to(&mut self, target: usize) {
        self.pos = target.max(self.pos + 1);
    }
}

impl Iterator for BasicFilter<'_> {
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        loop {
            let position = self.pos;
            let ch = self.snapshot.char_at(position)?;

            if is_line_break(ch) {
                let next = self.snapshot.line_end_including_break(position);
                self.jump_to(next);
                self.in_quote = false;
                self.line_blank = true;
                return Some(Scanned {
                    position,
                    ch: '\n',
                    in_quote: false,
                });
            }

            if self.in_quote {
                if ch == '"' {
                    self.in_quote = false;
                }
                self.pos += 1;
                return Some(Scanned {
                    position,
                    ch,
                    in_quote: true,
                });
            }

            match ch {
                '\'' => {
                    let end = self.snapshot.line_end(position);
                    self.jump_to(end);
                    continue;
                }
                'R' if self.is_rem_at(position) => {
                    let end = self.snapshot.line_end(position);
                    self.jump_to(end);
                    continue;
                }
                '_' if self.is_continuation_at(position) => {
                    let next = self.snapshot.line_end_including_break(position);
                    self.jump_to(next);
                    continue;
                }
                '#' if self.line_blank => {
                    let end = self.logical_line_end(position);
                    self.jump_to(end);
                    continue;
                }
                '"' => {
                    self.in_quote = true;
                    self.line_blank = false;
                    self.pos += 1;
                    return Some(Scanned {
                        position,
                        ch,
                        in_quote: true,
                    });
                }
                _ => {}
            }

            if !ch.is_whitespace() {
                self.line_blank = false;
            }
            self.pos += 1;
            return Some(Scanned {
                position,
                ch,
                in_quote: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    fn snapshot(text: &str) -> TextSnapshot {
        TextBuffer::new(text).current_snapshot()
    }

    fn csharp() -> FilterOptions {
        FilterOptions {
            preprocessor: true,
            verbatim_strings: true,
        }
    }

    /// Characters reported outside quotes
    fn code(text: &str, options: FilterOptions) -> String {
        let snap = snapshot(text);
        QuoteFilter::new(&snap, options)
            .filter(|s| !s.in_quote)
            .map(|s| s.ch)
            .collect()
    }

    fn basic_code(text: &str) -> String {
        let snap = snapshot(text);
        BasicFilter::new(&snap)
            .filter(|s| !s.in_quote)
            .map(|s| s.ch)
            .collect()
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(code("a // { b\nc", csharp()), "a \nc");
    }

    #[test]
    fn test_block_comment_skipped() {
        assert_eq!(code("a /* { */ b", csharp()), "a  b");
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(code("x { /* comment", csharp()), "x { ");
    }

    #[test]
    fn test_landing_char_after_comment_is_classified() {
        // The '"' right after the comment still opens a string
        let snap = snapshot("/**/\"{\"");
        let scanned: Vec<Scanned> = QuoteFilter::new(&snap, csharp()).collect();
        assert_eq!(scanned.len(), 3);
        assert!(scanned.iter().take(2).all(|s| s.in_quote));
        assert!(!scanned[2].in_quote);
    }

    #[test]
    fn test_braces_in_strings_are_quoted() {
        assert_eq!(code("f(\"{\") { }", csharp()), "f() { }");
        assert_eq!(code("c = '}';", csharp()), "c = ;");
    }

    #[test]
    fn test_escaped_delimiter_does_not_close() {
        assert_eq!(code(r#"s = "a\"{"; {"#, csharp()), "s = ; {");
    }

    #[test]
    fn test_escaped_backslash_then_close() {
        assert_eq!(code(r#""\\" {"#, csharp()), " {");
    }

    #[test]
    fn test_verbatim_string_ignores_backslash() {
        assert_eq!(code(r#"@"c:\" {"#, csharp()), " {");
    }

    #[test]
    fn test_verbatim_disabled_treats_at_as_code() {
        let plain = FilterOptions::default();
        assert_eq!(code(r#"@"c:\" {"#, plain), "@");
    }

    #[test]
    fn test_unterminated_string_closes_at_line_break() {
        assert_eq!(code("s = \"abc\n{", csharp()), "s = \n{");
    }

    #[test]
    fn test_preprocessor_line_skipped() {
        assert_eq!(code("#if DEBUG {\nx", csharp()), "\nx");
        assert_eq!(code("#if DEBUG {\nx", FilterOptions::default()), "#if DEBUG {\nx");
    }

    #[test]
    fn test_positions_are_snapshot_offsets() {
        let snap = snapshot("a/*x*/b");
        let positions: Vec<usize> = QuoteFilter::new(&snap, csharp())
            .map(|s| s.position)
            .collect();
        assert_eq!(positions, vec![0, 6]);
    }

    #[test]
    fn test_basic_comment_and_rem() {
        assert_eq!(basic_code("x = 1 ' note\ny"), "x = 1 \ny");
        assert_eq!(basic_code("REM note\ny"), "\ny");
        assert_eq!(basic_code("REMARK = 1"), "REMARK = 1");
    }

    #[test]
    fn test_basic_quotes_have_no_escapes() {
        assert_eq!(basic_code("s = \"a\\\" x"), "s =  x");
    }

    #[test]
    fn test_basic_continuation_joins_lines() {
        assert_eq!(basic_code("a _\n  b\nc"), "a   b\nc");
    }

    #[test]
    fn test_basic_directive_skipped() {
        assert_eq!(basic_code("#If DEBUG Then\nx"), "\nx");
        assert_eq!(basic_code("  #Region \"a\"\nx"), "  \nx");
        // Not at line start: an ordinary char (date literal and the like)
        assert_eq!(basic_code("d = #1/1/2000#"), "d = #1/1/2000#");
    }

    #[test]
    fn test_basic_crlf_reported_once() {
        let snap = snapshot("a\r\nb");
        let scanned: Vec<(usize, char)> = BasicFilter::new(&snap)
            .map(|s| (s.position, s.ch))
            .collect();
        assert_eq!(scanned, vec![(0, 'a'), (1, '\n'), (3, 'b')]);
    }
}
