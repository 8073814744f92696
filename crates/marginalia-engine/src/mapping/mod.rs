//! Position mapper: character offsets ↔ tree positions, literal search and
//! boundary expansion over a [`Document`].
//!
//! Out-of-range input yields `None`; only the `_clamped` variants snap.

use crate::document::{Document, Span};
use crate::text::NormalizedText;

/// Tree position of a character offset, `None` past the end.
pub fn offset_to_position(doc: &Document, offset: usize) -> Option<usize> {
    doc.layout().offset_to_position(offset)
}

pub fn offset_to_position_clamped(doc: &Document, offset: usize) -> usize {
    doc.layout().offset_to_position_clamped(offset)
}

/// Character offset of a tree position, `None` on block tokens or past the end.
pub fn position_to_offset(doc: &Document, pos: usize) -> Option<usize> {
    doc.layout().position_to_offset(pos)
}

/// Outcome of projecting an offset range onto tree positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValidation {
    pub is_valid: bool,
    pub start_pos: Option<usize>,
    pub end_pos: Option<usize>,
}

impl RangeValidation {
    /// The position span, when valid.
    pub fn span(&self) -> Option<Span> {
        match (self.is_valid, self.start_pos, self.end_pos) {
            (true, Some(start), Some(end)) => Some(Span::new(start, end)),
            _ => None,
        }
    }
}

/// Valid iff both offsets resolve and the start position precedes the end.
pub fn validate_range(doc: &Document, start: usize, end: usize) -> RangeValidation {
    let start_pos = offset_to_position(doc, start);
    let end_pos = offset_to_position(doc, end);
    RangeValidation {
        is_valid: matches!((start_pos, end_pos), (Some(s), Some(e)) if s < e),
        start_pos,
        end_pos,
    }
}

/// Same as [`validate_range`] with both offsets clamped into the document.
pub fn validate_range_clamped(doc: &Document, start: usize, end: usize) -> RangeValidation {
    let start_pos = offset_to_position_clamped(doc, start);
    let end_pos = offset_to_position_clamped(doc, end);
    RangeValidation {
        is_valid: start_pos < end_pos,
        start_pos: Some(start_pos),
        end_pos: Some(end_pos),
    }
}

/// Character-offset spans of every non-overlapping occurrence of `needle`,
/// left to right.
pub fn find_all_offsets(doc: &Document, needle: &str) -> Vec<Span> {
    if needle.is_empty() {
        return Vec::new();
    }
    let layout = doc.layout();
    let needle_len = needle.chars().count();
    doc.flat_text()
        .match_indices(needle)
        .map(|(byte, _)| {
            let start = layout.offset_of_byte(byte);
            Span::new(start, start + needle_len)
        })
        .collect()
}

/// Tree-position spans of every non-overlapping occurrence of `needle`.
pub fn find_all_occurrences(doc: &Document, needle: &str) -> Vec<Span> {
    find_all_offsets(doc, needle)
        .into_iter()
        .filter_map(|offsets| validate_range(doc, offsets.start, offsets.end).span())
        .collect()
}

/// Character-offset span of the first occurrence of `needle` once both
/// sides are normalised (whitespace runs, quote/dash variants, case).
pub fn find_normalized(doc: &Document, needle: &str) -> Option<Span> {
    let needle = NormalizedText::new(needle);
    let haystack = NormalizedText::new(&doc.flat_text());
    let start = haystack.find(needle.as_chars())?;
    haystack.source_span(start, start + needle.len())
}

/// Flattened text between two tree positions.
pub fn text_between(doc: &Document, from: usize, to: usize) -> Option<String> {
    let start = position_to_offset(doc, from)?;
    let end = position_to_offset(doc, to)?;
    doc.slice(Span::new(start, end))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '\u{2019}'
}

/// The word around `pos`, in tree positions. A position between two
/// non-word characters yields an empty span at `pos`.
pub fn word_boundaries(doc: &Document, pos: usize) -> Option<Span> {
    let block = doc.layout().block_at_position(pos)?;
    let chars: Vec<char> = block.text.chars().collect();
    let local = pos - block.positions.start;

    let start = chars[..local]
        .iter()
        .rposition(|c| !is_word_char(*c))
        .map_or(0, |i| i + 1);
    let end = chars[local..]
        .iter()
        .position(|c| !is_word_char(*c))
        .map_or(chars.len(), |i| local + i);

    Some(Span::new(
        block.positions.start + start,
        block.positions.start + end,
    ))
}

/// The content span of the block containing `pos`, in tree positions.
pub fn paragraph_boundaries(doc: &Document, pos: usize) -> Option<Span> {
    doc.layout()
        .block_at_position(pos)
        .map(|block| block.positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn doc() -> Document {
        // flattened: "The cat sat.\nIt purred." ; block 1 starts at offset 13
        Document::from_text("The cat sat.\n\nIt purred.")
    }

    #[rstest]
    #[case(0, Some(1))]
    #[case(12, Some(13))]
    #[case(13, Some(15))]
    #[case(23, Some(25))]
    #[case(24, None)]
    fn offsets_project_onto_positions(#[case] offset: usize, #[case] pos: Option<usize>) {
        assert_eq!(offset_to_position(&doc(), offset), pos);
    }

    #[test]
    fn positions_on_tokens_do_not_resolve() {
        let doc = doc();
        assert_eq!(position_to_offset(&doc, 0), None);
        assert_eq!(position_to_offset(&doc, 14), None);
        assert_eq!(position_to_offset(&doc, 15), Some(13));
        assert_eq!(position_to_offset(&doc, 26), None);
    }

    #[test]
    fn range_validation() {
        let doc = doc();
        let ok = validate_range(&doc, 4, 7);
        assert_eq!(ok.span(), Some(Span::new(5, 8)));
        assert!(!validate_range(&doc, 7, 7).is_valid);
        assert!(!validate_range(&doc, 7, 4).is_valid);
        let past = validate_range(&doc, 20, 99);
        assert!(!past.is_valid);
        assert_eq!(past.end_pos, None);
        assert_eq!(validate_range_clamped(&doc, 20, 99).span(), Some(Span::new(22, 25)));
    }

    #[test]
    fn occurrences_are_left_to_right_and_non_overlapping() {
        let doc = Document::from_text("aaaa\n\naa");
        assert_eq!(
            find_all_occurrences(&doc, "aa"),
            vec![Span::new(1, 3), Span::new(3, 5), Span::new(7, 9)]
        );
        assert!(find_all_occurrences(&doc, "").is_empty());
        assert!(find_all_occurrences(&doc, "b").is_empty());
    }

    #[test]
    fn occurrences_count_characters_not_bytes() {
        let doc = Document::from_text("Caf\u{e9} caf\u{e9}");
        assert_eq!(find_all_offsets(&doc, "caf\u{e9}"), vec![Span::new(5, 9)]);
    }

    #[test]
    fn normalized_search_maps_back_to_source_offsets() {
        let doc = Document::from_text("She said \u{201C}Quick  fix\u{201D} twice.");
        assert_eq!(find_normalized(&doc, "\"quick fix\""), Some(Span::new(9, 21)));
        assert_eq!(find_normalized(&doc, "slow fix"), None);
    }

    #[test]
    fn text_between_positions() {
        let doc = doc();
        assert_eq!(text_between(&doc, 5, 8).as_deref(), Some("cat"));
        assert_eq!(text_between(&doc, 0, 8), None);
    }

    #[test]
    fn word_and_paragraph_boundaries() {
        let doc = doc();
        // position 6 is inside "cat"
        assert_eq!(word_boundaries(&doc, 6), Some(Span::new(5, 8)));
        // end of "sat" before the full stop
        assert_eq!(word_boundaries(&doc, 12), Some(Span::new(9, 12)));
        assert_eq!(word_boundaries(&doc, 0), None);
        assert_eq!(paragraph_boundaries(&doc, 6), Some(Span::new(1, 13)));
        assert_eq!(paragraph_boundaries(&doc, 17), Some(Span::new(15, 25)));
    }
}
