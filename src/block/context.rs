//! Keyword coloring for tooltip context text

use std::ops::Range;

use super::BlockKind;
use crate::util::text::find_words;

const LOOP_KEYWORDS: &[&str] = &[
    "for", "while", "do", "foreach", "For", "While", "Do", "Loop", "Until", "End While",
];

const CONDITIONAL_KEYWORDS: &[&str] = &["if", "else", "switch", "If", "Else", "ElseIf", "End If"];

const METHOD_KEYWORDS: &[&str] = &[
    "private",
    "public",
    "protected",
    "internal",
    "sealed",
    "static",
    "new",
    "override",
    "int",
    "double",
    "void",
    "bool",
    "Sub",
    "Function",
    "Module",
    "Class",
    "Property",
    "Get",
    "Set",
    "Private",
    "Public",
    "End Sub",
    "End Function",
    "End Module",
    "End Class",
    "End Property",
    "End Get",
    "End Set",
];

/// A keyword occurrence in tooltip text, colored like blocks of `kind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHighlight {
    /// Byte range into the text
    pub range: Range<usize>,
    pub kind: BlockKind,
}

/// Whole-word keyword ranges in `text`, sorted by position.
///
/// Ranges may overlap (`End If` and `If`); where they share a start, the
/// later entry takes precedence when painting.
pub fn keyword_highlights(text: &str) -> Vec<KeywordHighlight> {
    let groups = [
        (BlockKind::Loop, LOOP_KEYWORDS),
        (BlockKind::Conditional, CONDITIONAL_KEYWORDS),
        (BlockKind::Method, METHOD_KEYWORDS),
    ];

    let mut highlights: Vec<KeywordHighlight> = groups
        .iter()
        .flat_map(|&(kind, keywords)| {
            keywords.iter().flat_map(move |keyword| {
                find_words(text, keyword).map(move |start| KeywordHighlight {
                    range: start..start + keyword.len(),
                    kind,
                })
            })
        })
        .collect();

    // Stable: equal starts keep group order
    highlights.sort_by_key(|h| h.range.start);
    highlights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlights_method_and_conditional() {
        let highlights = keyword_highlights("public void Run()\n  if (x)");
        let found: Vec<(&str, BlockKind)> = highlights
            .iter()
            .map(|h| (&"public void Run()\n  if (x)"[h.range.clone()], h.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("public", BlockKind::Method),
                ("void", BlockKind::Method),
                ("if", BlockKind::Conditional),
            ]
        );
    }

    #[test]
    fn test_highlights_whole_words_only() {
        assert!(keyword_highlights("format(x)").is_empty());
        assert!(keyword_highlights("ifdef").is_empty());
    }

    #[test]
    fn test_highlights_every_occurrence() {
        let highlights = keyword_highlights("for a for b");
        let starts: Vec<usize> = highlights.iter().map(|h| h.range.start).collect();
        assert_eq!(starts, vec![0, 6]);
        assert!(highlights.iter().all(|h| h.kind == BlockKind::Loop));
    }

    #[test]
    fn test_highlights_multi_word_keyword() {
        let highlights = keyword_highlights("End If");
        assert!(highlights
            .iter()
            .any(|h| h.range == (0..6) && h.kind == BlockKind::Conditional));
        assert!(highlights
            .iter()
            .any(|h| h.range == (4..6) && h.kind == BlockKind::Conditional));
    }
}
