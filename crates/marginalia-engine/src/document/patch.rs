use super::rope::Span;
use super::transaction::Mapping;

/// Result of applying a transaction
#[derive(Debug, Clone)]
pub struct Patch {
    /// Inserted text of each step, as character offsets in the document that
    /// step produced.
    pub changed: Vec<Span>,
    /// Document version after the transaction.
    pub version: u64,
    /// Position mapping from the old document to the new one.
    pub mapping: Mapping,
}
