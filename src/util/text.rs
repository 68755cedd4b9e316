//! Text helpers shared by the scanners and the classifier

/// Tab width used for indentation measurement unless configured otherwise
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Characters that can be part of an identifier or keyword
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Line break characters recognized by the rope
pub fn is_line_break(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Indentation after consuming `ch`: tabs round up to the next multiple of
/// `tab_size`, anything else counts one column
pub fn advance_indent(indent: usize, ch: char, tab_size: usize) -> usize {
    let tab_size = tab_size.max(1);
    if ch == '\t' {
        (indent / tab_size + 1) * tab_size
    } else {
        indent + 1
    }
}

/// Collapse whitespace runs to a single space and trim both ends
pub fn compress_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offsets of every whole-word occurrence of `word` in `text`
pub fn find_words<'a>(text: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    let mut from = 0;
    std::iter::from_fn(move || {
        if word.is_empty() {
            return None;
        }
        while from <= text.len() {
            let index = from + text.get(from..)?.find(word)?;
            from = index + next_char_len(text, index);
            if is_whole_word_at(text, index, word.len()) {
                return Some(index);
            }
        }
        None
    })
}

/// Whether `word` occurs in `text` with no word characters on either side
pub fn contains_word(text: &str, word: &str) -> bool {
    find_words(text, word).next().is_some()
}

/// Whether `text` starts with `word` followed by a non-word character or the
/// end of text
pub fn starts_with_word(text: &str, word: &str) -> bool {
    !word.is_empty() && text.starts_with(word) && is_whole_word_at(text, 0, word.len())
}

fn is_whole_word_at(text: &str, index: usize, len: usize) -> bool {
    let before = text[..index].chars().next_back();
    let after = text[index + len..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn next_char_len(text: &str, index: usize) -> usize {
    text[index..].chars().next().map_or(1, char::len_utf8)
}
