use std::ops::Range;

use xi_rope::Rope;

/// One block of the flattened buffer: a line without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLine {
    /// Byte range of the block content in the rope (newline excluded).
    pub bytes: Range<usize>,
    /// The block text.
    pub text: String,
}

/// Splits the flattened buffer into its blocks.
///
/// Every `'\n'` separates two blocks, so a buffer ending in a newline (or an
/// empty buffer) has an empty final block. `lines_raw` does not yield that
/// trailing empty line, so it is appended here.
pub fn block_lines(rope: &Rope) -> Vec<BlockLine> {
    let mut blocks = Vec::new();
    let mut offset = 0usize;
    let mut ends_with_newline = true;

    for raw in rope.lines_raw(..) {
        let start = offset;
        offset += raw.len();
        let (text, had_newline) = match raw.strip_suffix('\n') {
            Some(stripped) => (stripped.to_string(), true),
            None => (raw.to_string(), false),
        };
        ends_with_newline = had_newline;
        blocks.push(BlockLine {
            bytes: start..start + text.len(),
            text,
        });
    }

    if ends_with_newline {
        blocks.push(BlockLine {
            bytes: offset..offset,
            text: String::new(),
        });
    }

    blocks
}
