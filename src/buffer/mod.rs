//! Versioned text buffer
//!
//! The scanner never sees a live buffer. It works on immutable
//! [`TextSnapshot`]s (a cheap `Rope` clone plus the version it was taken at).
//! Versions form a forward chain: each [`TextVersion`] learns about its
//! successor and the [`TextChange`]s leading to it when the buffer advances,
//! which is what lets positions be translated between snapshots.
//!
//! All offsets are char offsets into the rope.

mod diff;
mod tracking;

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use ropey::Rope;

use crate::util::text::is_line_break;

pub use diff::compute_change;
pub use tracking::{track_point, track_span, translate_span, PointTracking};

/// Identity of a text buffer (stable for the buffer's lifetime)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

impl BufferId {
    fn next() -> Self {
        BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Half-open range of char offsets
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {} after end {}", start, end);
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the spans overlap or touch
    pub fn intersects(&self, other: Span) -> bool {
        other.start <= self.end && other.end >= self.start
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// A single replacement: `old_len` chars at `offset` became `new_len` chars.
///
/// Changes within one version apply in order, each against the text left by
/// the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChange {
    pub offset: usize,
    pub old_len: usize,
    pub new_len: usize,
}

impl TextChange {
    /// The change that undoes this one
    pub fn inverse(&self) -> Self {
        Self {
            offset: self.offset,
            old_len: self.new_len,
            new_len: self.old_len,
        }
    }
}

/// An edit request against the buffer's current text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub delete_len: usize,
    pub text: String,
}

impl Edit {
    pub fn insert(offset: usize, text: &str) -> Self {
        Self {
            offset,
            delete_len: 0,
            text: text.to_string(),
        }
    }

    pub fn delete(offset: usize, len: usize) -> Self {
        Self {
            offset,
            delete_len: len,
            text: String::new(),
        }
    }

    pub fn replace(offset: usize, delete_len: usize, text: &str) -> Self {
        Self {
            offset,
            delete_len,
            text: text.to_string(),
        }
    }
}

/// One version of a buffer and, once the buffer moves on, the link to the next
pub struct TextVersion {
    buffer: BufferId,
    number: u64,
    next: OnceLock<VersionLink>,
}

struct VersionLink {
    changes: Vec<TextChange>,
    version: Arc<TextVersion>,
}

impl TextVersion {
    fn first(buffer: BufferId) -> Arc<Self> {
        Arc::new(Self {
            buffer,
            number: 0,
            next: OnceLock::new(),
        })
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Changes leading from this version to the next, if there is a next yet
    pub fn changes(&self) -> Option<&[TextChange]> {
        self.next.get().map(|link| link.changes.as_slice())
    }

    pub fn next(&self) -> Option<&Arc<TextVersion>> {
        self.next.get().map(|link| &link.version)
    }

    /// Change lists from this version up to (not including) version `until`.
    /// Stops early if the chain ends first.
    fn changes_until(&self, until: u64) -> Vec<&[TextChange]> {
        let mut lists = Vec::new();
        let mut version = self;
        while version.number < until {
            let Some(link) = version.next.get() else {
                break;
            };
            lists.push(link.changes.as_slice());
            version = &link.version;
        }
        lists
    }
}

impl Drop for TextVersion {
    // Unlink iteratively so a long edit history can't blow the stack.
    fn drop(&mut self) {
        let mut link = self.next.take();
        while let Some(VersionLink { version, .. }) = link {
            match Arc::try_unwrap(version) {
                Ok(mut version) => link = version.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for TextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextVersion")
            .field("buffer", &self.buffer.0)
            .field("number", &self.number)
            .finish()
    }
}

/// Whether any edit happened between two versions of the same buffer.
///
/// A new version does not imply changed text (a reload with identical
/// content bumps the version with an empty change list), so the chain is
/// walked rather than the versions compared.
pub fn any_text_changes(old: &TextVersion, new: &TextVersion) -> bool {
    if old.buffer != new.buffer {
        return true;
    }

    let mut version = old;
    while version.number < new.number {
        let Some(link) = version.next.get() else {
            return false;
        };
        if !link.changes.is_empty() {
            return true;
        }
        version = &link.version;
    }
    false
}

/// Immutable view of a buffer at one version
#[derive(Clone)]
pub struct TextSnapshot {
    text: Rope,
    version: Arc<TextVersion>,
}

impl TextSnapshot {
    pub fn buffer(&self) -> BufferId {
        self.version.buffer
    }

    pub fn version(&self) -> &Arc<TextVersion> {
        &self.version
    }

    pub fn version_number(&self) -> u64 {
        self.version.number
    }

    pub fn text(&self) -> &Rope {
        &self.text
    }

    pub fn contents(&self) -> String {
        self.text.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len_chars() == 0
    }

    /// The whole snapshot as a span
    pub fn span(&self) -> Span {
        Span::new(0, self.len_chars())
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        (pos < self.len_chars()).then(|| self.text.char(pos))
    }

    /// Zero-based line containing `pos` (clamped to the end of text)
    pub fn line_of(&self, pos: usize) -> usize {
        self.text.char_to_line(pos.min(self.len_chars()))
    }

    /// Offset of the line break ending the line that contains `pos`, or the
    /// end of text on the last line
    pub fn line_end(&self, pos: usize) -> usize {
        let len = self.len_chars();
        if pos >= len {
            return len;
        }

        let line_idx = self.text.char_to_line(pos);
        let start = self.text.line_to_char(line_idx);
        let line = self.text.line(line_idx);
        let n = line.len_chars();

        let last = (n > 0).then(|| line.char(n - 1));
        let break_len = match last {
            Some('\n') if n >= 2 && line.char(n - 2) == '\r' => 2,
            Some(ch) if is_line_break(ch) => 1,
            _ => 0,
        };
        start + n - break_len
    }

    /// Offset just past the line break ending the line that contains `pos`
    pub fn line_end_including_break(&self, pos: usize) -> usize {
        let len = self.len_chars();
        if pos >= len {
            return len;
        }

        let line_idx = self.text.char_to_line(pos);
        self.text.line_to_char(line_idx) + self.text.line(line_idx).len_chars()
    }

    pub fn slice_to_string(&self, span: Span) -> String {
        let len = self.len_chars();
        let start = span.start.min(len);
        let end = span.end.clamp(start, len);
        self.text.slice(start..end).to_string()
    }

    /// Same buffer, same version
    pub fn is_same_version(&self, other: &TextSnapshot) -> bool {
        self.buffer() == other.buffer() && self.version_number() == other.version_number()
    }

    /// Translate a span of this snapshot into `target` (either direction),
    /// edge-inclusive
    pub fn translate_span_to(&self, span: Span, target: &TextSnapshot) -> Span {
        translate_span(span, &self.version, &target.version)
    }
}

impl fmt::Debug for TextSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSnapshot")
            .field("buffer", &self.buffer().0)
            .field("version", &self.version_number())
            .field("len_chars", &self.len_chars())
            .finish()
    }
}

/// A span bound to the snapshot it refers to
#[derive(Debug, Clone)]
pub struct SnapshotSpan {
    pub snapshot: TextSnapshot,
    pub span: Span,
}

impl SnapshotSpan {
    pub fn new(snapshot: TextSnapshot, span: Span) -> Self {
        Self { snapshot, span }
    }

    /// The span covering the whole snapshot
    pub fn full(snapshot: &TextSnapshot) -> Self {
        Self {
            span: snapshot.span(),
            snapshot: snapshot.clone(),
        }
    }

    pub fn translate_to(&self, target: &TextSnapshot) -> SnapshotSpan {
        if self.snapshot.is_same_version(target) {
            return self.clone();
        }
        SnapshotSpan {
            span: self.snapshot.translate_span_to(self.span, target),
            snapshot: target.clone(),
        }
    }
}

/// Delivered after every buffer edit
#[derive(Debug, Clone)]
pub struct TextChangeEvent {
    pub before: TextSnapshot,
    pub after: TextSnapshot,
}

impl TextChangeEvent {
    pub fn has_text_changes(&self) -> bool {
        any_text_changes(self.before.version(), self.after.version())
    }
}

/// The mutable side of the buffer: applies edits and hands out snapshots
pub struct TextBuffer {
    current: TextSnapshot,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            current: TextSnapshot {
                text: Rope::from_str(text),
                version: TextVersion::first(BufferId::next()),
            },
        }
    }

    pub fn id(&self) -> BufferId {
        self.current.buffer()
    }

    pub fn current_snapshot(&self) -> TextSnapshot {
        self.current.clone()
    }

    /// Apply edits in order. Offsets and lengths are clamped to the text.
    pub fn apply(&mut self, edits: &[Edit]) -> TextChangeEvent {
        let mut text = self.current.text.clone();
        let mut changes = Vec::with_capacity(edits.len());

        for edit in edits {
            let len = text.len_chars();
            let offset = edit.offset.min(len);
            let delete_len = edit.delete_len.min(len - offset);
            if delete_len == 0 && edit.text.is_empty() {
                continue;
            }

            text.remove(offset..offset + delete_len);
            text.insert(offset, &edit.text);
            changes.push(TextChange {
                offset,
                old_len: delete_len,
                new_len: edit.text.chars().count(),
            });
        }

        self.advance(text, changes)
    }

    pub fn edit(&mut self, offset: usize, delete_len: usize, text: &str) -> TextChangeEvent {
        self.apply(&[Edit::replace(offset, delete_len, text)])
    }

    /// Replace the whole text, recording only the region that differs
    pub fn replace_all(&mut self, text: &str) -> TextChangeEvent {
        match compute_change(&self.current.contents(), text) {
            Some(change) => self.advance(Rope::from_str(text), vec![change]),
            None => self.touch(),
        }
    }

    /// Bump the version without changing the text
    pub fn touch(&mut self) -> TextChangeEvent {
        let text = self.current.text.clone();
        self.advance(text, Vec::new())
    }

    fn advance(&mut self, text: Rope, changes: Vec<TextChange>) -> TextChangeEvent {
        let old_version = &self.current.version;
        let version = Arc::new(TextVersion {
            buffer: old_version.buffer,
            number: old_version.number + 1,
            next: OnceLock::new(),
        });

        let link = VersionLink {
            changes,
            version: Arc::clone(&version),
        };
        if old_version.next.set(link).is_err() {
            tracing::error!(
                "Version {} of buffer {} already has a successor",
                old_version.number,
                old_version.buffer.0
            );
        }

        let after = TextSnapshot { text, version };
        let before = std::mem::replace(&mut self.current, after.clone());
        TextChangeEvent { before, after }
    }
}
