//! Suggestions: identity, grouping, decorations and the live state machine.

pub mod decoration;
pub mod grouping;
pub mod identity;
pub mod proposal;
pub mod state;
pub mod types;

pub use decoration::{Decoration, DecorationSet, format_decorations};
pub use grouping::group_overlaps;
pub use identity::{ChangeKind, classify_change, generate_fingerprint, generate_id, text_complexity};
pub use proposal::{Anchor, Proposal, RawProposal};
pub use state::{Acceptance, Context, Resolution, SetReport, SuggestionState};
pub use types::{ConflictGroup, EditType, LiveEntry, Suggestion, SuggestionId, SuggestionStatus};
