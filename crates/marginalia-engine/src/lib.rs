//! Suggestion engine for a live manuscript.
//!
//! External proposals arrive as character offsets or bare text, get anchored
//! onto tree positions of a [`Document`], grouped into explicit conflict
//! choices when they overlap, and stay anchored as the document is edited.
//! When the proposal list and the live state diverge, the [`Matcher`] and
//! [`Reconciler`] bring them back together.

pub mod config;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod error;
pub mod io;
pub mod mapping;
pub mod matching;
pub mod suggestion;
pub mod text;

// Re-export key types for easier usage
pub use config::{DegeneratePolicy, EngineConfig, MatcherConfig, ReconcileConfig};
pub use diagnostics::{DiagnosticEvent, Diagnostics, LogDiagnostics, MemoryDiagnostics, NoopDiagnostics};
pub use document::{Bias, Document, Mapping, Origin, Patch, Span, Step, Transaction};
pub use engine::{Snapshot, SuggestionEngine};
pub use error::EngineError;
pub use io::{IoError, parse_proposals, read_manuscript, read_proposals, write_manuscript};
pub use matching::{MatchResult, MatchStrategy, Matcher, ReconcileReport, Reconciler, RecreationMethod};
pub use suggestion::{
    ConflictGroup, Decoration, DecorationSet, EditType, LiveEntry, Proposal, RawProposal, SetReport,
    Suggestion, SuggestionId, SuggestionState, SuggestionStatus, format_decorations, group_overlaps,
};
