use xi_rope::Rope;

use super::NODE_OPEN_COST;
use super::rope::{Span, block_lines};

/// A block node of the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    /// Zero-based block index.
    pub index: usize,
    /// Inline text of the block.
    pub text: String,
    /// Character offsets of the content in the flattened text.
    pub offsets: Span,
    /// Tree positions of the content (first position inside the block to the
    /// position just before its close token).
    pub positions: Span,
    /// Byte offset of the content in the rope.
    pub(crate) byte_start: usize,
}

impl BlockNode {
    /// Byte offset in the rope of the `local`-th character of this block.
    pub(crate) fn byte_at(&self, local: usize) -> usize {
        let within = self
            .text
            .char_indices()
            .nth(local)
            .map(|(byte, _)| byte)
            .unwrap_or(self.text.len());
        self.byte_start + within
    }

    fn byte_end(&self) -> usize {
        self.byte_start + self.text.len()
    }
}

/// Position-indexed view of a document: one entry per block, with the
/// offset and tree-position coordinates of each.
///
/// Built once per document version; all conversions are binary searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    blocks: Vec<BlockNode>,
    char_len: usize,
}

impl Layout {
    pub fn build(rope: &Rope) -> Self {
        let mut blocks = Vec::new();
        let mut offset = 0usize;
        let mut position = NODE_OPEN_COST;

        for (index, line) in block_lines(rope).into_iter().enumerate() {
            let len = line.text.chars().count();
            blocks.push(BlockNode {
                index,
                offsets: Span::new(offset, offset + len),
                positions: Span::new(position, position + len),
                byte_start: line.bytes.start,
                text: line.text,
            });
            // one phantom boundary character in offset space, a close and an
            // open token in position space
            offset += len + 1;
            position += len + 1 + NODE_OPEN_COST;
        }

        let char_len = blocks.last().map(|b| b.offsets.end).unwrap_or(0);
        Self { blocks, char_len }
    }

    pub fn blocks(&self) -> &[BlockNode] {
        &self.blocks
    }

    /// Length of the flattened text in characters, boundaries included.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Total size of the tree in positions.
    pub fn content_size(&self) -> usize {
        self.char_len + self.blocks.len() + 1
    }

    pub fn block_at_offset(&self, offset: usize) -> Option<&BlockNode> {
        if offset > self.char_len {
            return None;
        }
        let index = self.blocks.partition_point(|b| b.offsets.end < offset);
        self.blocks.get(index)
    }

    pub fn block_at_position(&self, pos: usize) -> Option<&BlockNode> {
        let index = self.blocks.partition_point(|b| b.positions.end < pos);
        self.blocks
            .get(index)
            .filter(|b| b.positions.start <= pos)
    }

    pub fn offset_to_position(&self, offset: usize) -> Option<usize> {
        self.block_at_offset(offset)
            .map(|b| offset + b.index + NODE_OPEN_COST)
    }

    /// Like `offset_to_position`, but offsets past the end land on the last
    /// text position.
    pub fn offset_to_position_clamped(&self, offset: usize) -> usize {
        let offset = offset.min(self.char_len);
        self.offset_to_position(offset)
            .unwrap_or(NODE_OPEN_COST)
    }

    /// Returns `None` for positions that sit on block open/close tokens or
    /// outside the document.
    pub fn position_to_offset(&self, pos: usize) -> Option<usize> {
        self.block_at_position(pos)
            .map(|b| pos - b.index - NODE_OPEN_COST)
    }

    /// Snaps a position to the nearest text position before converting.
    pub fn position_to_offset_clamped(&self, pos: usize) -> usize {
        if let Some(offset) = self.position_to_offset(pos) {
            return offset;
        }
        let index = self.blocks.partition_point(|b| b.positions.end < pos);
        match self.blocks.get(index) {
            // pos is on the open token of this block
            Some(block) => block.offsets.start,
            None => self.char_len,
        }
    }

    pub(crate) fn byte_of_offset(&self, offset: usize) -> Option<usize> {
        self.block_at_offset(offset)
            .map(|b| b.byte_at(offset - b.offsets.start))
    }

    pub(crate) fn offset_of_byte(&self, byte: usize) -> usize {
        let index = self.blocks.partition_point(|b| b.byte_end() < byte);
        let Some(block) = self.blocks.get(index) else {
            return self.char_len;
        };
        let within = byte.saturating_sub(block.byte_start);
        let local = block
            .text
            .get(..within)
            .map(|prefix| prefix.chars().count())
            .unwrap_or_else(|| block.text.chars().count());
        block.offsets.start + local
    }
}
