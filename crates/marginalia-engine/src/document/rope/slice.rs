use std::ops::Range;

use xi_rope::Rope;

/// Extracts the text for a byte range from the rope as an owned String.
///
/// The range is clamped to the rope so stale ranges never panic inside xi-rope.
pub fn slice_to_string(rope: &Rope, range: Range<usize>) -> String {
    let len = rope.len();
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    rope.slice_to_cow(start..end).into_owned()
}

/// Truncates text to `max` characters with a "..." suffix if needed.
///
/// Used for log lines and human-readable dumps.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_text_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn preview_exact_length_unchanged() {
        assert_eq!(preview("hello", 5), "hello");
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("hello world", 5), "hello...");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(preview("héllo wörld", 4), "héll...");
    }

    #[test]
    fn slice_to_string_partial_range() {
        let rope = Rope::from("hello world");
        assert_eq!(slice_to_string(&rope, 6..11), "world");
    }

    #[test]
    fn slice_to_string_clamps_stale_range() {
        let rope = Rope::from("hello");
        assert_eq!(slice_to_string(&rope, 3..40), "lo");
        assert_eq!(slice_to_string(&rope, 40..50), "");
    }
}
