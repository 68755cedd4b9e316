//! Position translation between versions of one buffer

use super::{Span, TextChange, TextVersion};

/// Which way a point moves when text is inserted exactly at it, or when the
/// region around it is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTracking {
    /// Stays before the new text
    Negative,
    /// Moves after the new text
    Positive,
}

/// Move a point across one change
pub fn track_point(point: usize, change: &TextChange, tracking: PointTracking) -> usize {
    let old_end = change.offset + change.old_len;
    match tracking {
        PointTracking::Negative => {
            if point <= change.offset {
                point
            } else if point >= old_end {
                point - change.old_len + change.new_len
            } else {
                change.offset
            }
        }
        PointTracking::Positive => {
            if point < change.offset {
                point
            } else if point >= old_end {
                point - change.old_len + change.new_len
            } else {
                change.offset + change.new_len
            }
        }
    }
}

/// Move a span across one change, edge-inclusive: text inserted at either
/// edge ends up inside the span
pub fn track_span(span: Span, change: &TextChange) -> Span {
    let start = track_point(span.start, change, PointTracking::Negative);
    let end = track_point(span.end, change, PointTracking::Positive).max(start);
    Span::new(start, end)
}

/// Translate a span from one version to another of the same buffer.
///
/// Going forward replays the recorded changes; going backward replays their
/// inverses in reverse order. Versions of different buffers leave the span
/// as it is.
pub fn translate_span(span: Span, from: &TextVersion, to: &TextVersion) -> Span {
    if from.buffer() != to.buffer() {
        tracing::warn!(
            "Cannot translate span between buffers {} and {}",
            from.buffer().0,
            to.buffer().0
        );
        return span;
    }

    if from.number() <= to.number() {
        from.changes_until(to.number())
            .into_iter()
            .flatten()
            .fold(span, |span, change| track_span(span, change))
    } else {
        to.changes_until(from.number())
            .into_iter()
            .rev()
            .flat_map(|changes| changes.iter().rev())
            .fold(span, |span, change| track_span(span, &change.inverse()))
    }
}
