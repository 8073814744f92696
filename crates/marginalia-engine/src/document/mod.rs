//! Document model adapter.
//!
//! A manuscript is an ordered list of blocks, each holding one run of inline
//! text. The whole document is stored as a single `xi_rope::Rope` holding the
//! *flattened* text: block contents joined by one `'\n'`, the phantom
//! boundary character of the offset space.
//!
//! Two coordinate systems are exposed:
//!
//! - **character offsets** into the flattened text (what external proposals
//!   carry), counted in Unicode scalar values;
//! - **tree positions**, where entering a block costs [`NODE_OPEN_COST`] and
//!   leaving it costs one more, so `pos = offset + block_index + 1`.
//!
//! Edits arrive as [`Transaction`]s in tree positions, compile to xi-rope
//! deltas, and produce a [`Patch`] whose [`Mapping`] carries positions from
//! the old document to the new one.

pub mod layout;
pub mod patch;
pub mod rope;
pub mod transaction;

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::error::EngineError;

pub use layout::{BlockNode, Layout};
pub use patch::Patch;
pub use rope::Span;
pub use transaction::{Bias, Mapping, Origin, Step, Transaction};

use transaction::MapStep;

/// Tree positions consumed by entering a block node.
pub const NODE_OPEN_COST: usize = 1;

/// Separator between blocks in the serialized (`to_text`) form.
pub const BLOCK_SEPARATOR: &str = "\n\n";

fn blank_line_regex() -> &'static Regex {
    static BLANK_LINE: OnceLock<Regex> = OnceLock::new();
    BLANK_LINE.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)*").expect("Invalid blank line regex"))
}

fn soft_break_regex() -> &'static Regex {
    static SOFT_BREAK: OnceLock<Regex> = OnceLock::new();
    SOFT_BREAK.get_or_init(|| Regex::new(r"[ \t]*\n[ \t]*").expect("Invalid soft break regex"))
}

/// Splits serialized text into block contents: blank lines separate blocks,
/// soft line breaks inside a block fold to one space, blocks are trimmed and
/// empty ones dropped.
fn split_blocks(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    blank_line_regex()
        .split(&text)
        .map(|piece| soft_break_regex().replace_all(piece.trim(), " ").into_owned())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Brings inserted text into flattened form without trimming it: a blank
/// line becomes a block boundary, a soft line break becomes a space.
pub(crate) fn flatten_inserted(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = blank_line_regex().replace_all(&text, "\u{0}");
    let text = soft_break_regex().replace_all(&text, " ");
    text.replace('\u{0}', "\n")
}

/// The manuscript: a rope of flattened text plus its block layout.
#[derive(Clone)]
pub struct Document {
    buffer: Rope,
    layout: Arc<Layout>,
    version: u64,
}

impl Document {
    /// Builds a document from serialized text. Never fails: empty or
    /// whitespace-only input yields one empty block.
    pub fn from_text(text: &str) -> Self {
        let flattened = split_blocks(text).join("\n");
        Self::from_flattened(Rope::from(flattened.as_str()), 0)
    }

    fn from_flattened(buffer: Rope, version: u64) -> Self {
        let layout = Arc::new(Layout::build(&buffer));
        Self {
            buffer,
            layout,
            version,
        }
    }

    /// Serialized form: block contents separated by blank lines.
    pub fn to_text(&self) -> String {
        self.layout
            .blocks()
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }

    /// The flattened text that character offsets index into.
    pub fn flat_text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn blocks(&self) -> &[BlockNode] {
        self.layout.blocks()
    }

    pub fn block_count(&self) -> usize {
        self.layout.blocks().len()
    }

    pub fn char_len(&self) -> usize {
        self.layout.char_len()
    }

    pub fn content_size(&self) -> usize {
        self.layout.content_size()
    }

    /// Version counter incremented on each applied transaction.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Flattened text for a span of character offsets, `None` when out of range.
    pub fn slice(&self, span: Span) -> Option<String> {
        if span.start > span.end {
            return None;
        }
        let start = self.layout.byte_of_offset(span.start)?;
        let end = self.layout.byte_of_offset(span.end)?;
        Some(rope::slice_to_string(&self.buffer, start..end))
    }

    /// Applies a transaction atomically.
    ///
    /// Every step is compiled against the document produced by the previous
    /// one; if any step fails to resolve the document is left untouched.
    pub fn apply(&mut self, tr: &Transaction) -> Result<Patch, EngineError> {
        let mut buffer = self.buffer.clone();
        let mut layout = Arc::clone(&self.layout);
        let mut mapping = Mapping::default();
        let mut changed = Vec::new();

        for (index, step) in tr.steps.iter().enumerate() {
            let Step::Replace { from, to, text } = step;
            let invalid = |reason: String| EngineError::InvalidTransaction {
                step: index,
                reason,
            };

            let from_offset = layout
                .position_to_offset(*from)
                .ok_or_else(|| invalid(format!("position {from} is not inside a block")))?;
            let to_offset = layout
                .position_to_offset(*to)
                .ok_or_else(|| invalid(format!("position {to} is not inside a block")))?;
            if from_offset > to_offset {
                return Err(invalid(format!("range {from}..{to} is reversed")));
            }

            let start = layout
                .byte_of_offset(from_offset)
                .ok_or_else(|| invalid(format!("offset {from_offset} out of range")))?;
            let end = layout
                .byte_of_offset(to_offset)
                .ok_or_else(|| invalid(format!("offset {to_offset} out of range")))?;

            let inserted = flatten_inserted(text);
            let mut builder = Builder::new(buffer.len());
            if inserted.is_empty() {
                builder.delete(start..end);
            } else {
                builder.replace(start..end, Rope::from(inserted.as_str()));
            }
            let delta = builder.build();

            buffer = delta.apply(&buffer);
            let next = Arc::new(Layout::build(&buffer));
            changed.push(Span::new(
                from_offset,
                from_offset + inserted.chars().count(),
            ));
            mapping.push(MapStep {
                before: layout,
                delta,
                after: Arc::clone(&next),
            });
            layout = next;
        }

        self.buffer = buffer;
        self.layout = layout;
        self.version += 1;

        log::trace!(
            "applied {} step(s) ({:?}), document now at version {}",
            tr.steps.len(),
            tr.origin,
            self.version
        );

        Ok(Patch {
            changed,
            version: self.version,
            mapping,
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("text", &self.flat_text())
            .field("blocks", &self.block_count())
            .field("version", &self.version)
            .finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // the layout is derived from the buffer
        self.buffer.to_string() == other.buffer.to_string() && self.version == other.version
    }
}
