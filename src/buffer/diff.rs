//! Minimal change detection between two texts

use super::TextChange;

/// Compute the single replacement that turns `old` into `new`.
/// Returns None if the texts are identical.
///
/// The result covers everything between the common prefix and the common
/// suffix, measured in chars.
pub fn compute_change(old: &str, new: &str) -> Option<TextChange> {
    if old == new {
        return None;
    }

    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    // Find common prefix length
    let mut start = 0;
    let max_start = old_chars.len().min(new_chars.len());
    while start < max_start && old_chars[start] == new_chars[start] {
        start += 1;
    }

    // Find common suffix length, not overlapping prefix
    let mut old_end = old_chars.len();
    let mut new_end = new_chars.len();
    while old_end > start && new_end > start && old_chars[old_end - 1] == new_chars[new_end - 1]
    {
        old_end -= 1;
        new_end -= 1;
    }

    Some(TextChange {
        offset: start,
        old_len: old_end - start,
        new_len: new_end - start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_change_insert() {
        let change = compute_change("fn main() {}", "fn main() { x }").unwrap();
        assert_eq!(change.offset, 11);
        assert_eq!(change.old_len, 0);
        assert_eq!(change.new_len, 3);
    }

    #[test]
    fn test_compute_change_delete() {
        let change = compute_change("if (x) { y(); }", "if (x) { }").unwrap();
        assert_eq!(change.offset, 9);
        assert_eq!(change.old_len, 5);
        assert_eq!(change.new_len, 0);
    }

    #[test]
    fn test_compute_change_counts_chars_not_bytes() {
        let change = compute_change("é{}", "é{x}").unwrap();
        assert_eq!(change.offset, 2);
        assert_eq!(change.new_len, 1);
    }

    #[test]
    fn test_compute_change_repeated_chars() {
        // Prefix and suffix must not overlap
        let change = compute_change("aaa", "aaaa").unwrap();
        assert_eq!(change.old_len, 0);
        assert_eq!(change.new_len, 1);
    }

    #[test]
    fn test_compute_change_identical() {
        assert!(compute_change("same", "same").is_none());
    }
}
