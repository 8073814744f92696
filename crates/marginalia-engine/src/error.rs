use crate::suggestion::SuggestionId;

/// Data-quality failures inside the engine.
///
/// None of these cross the public verbs as an `Err`: they are collected into
/// reports and logged, and the rest of the batch carries on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("could not resolve {what} to a document position")]
    PositionResolution { what: String },

    #[error("invalid range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("unknown suggestion id {0}")]
    UnknownSuggestionId(SuggestionId),

    #[error("no live suggestion matched at or above {threshold:.2} (best {best:.2})")]
    MatchNotFound { threshold: f64, best: f64 },

    #[error("could not locate {original:?} in the document")]
    RecreationFailed { original: String },

    #[error("transaction step {step} does not apply: {reason}")]
    InvalidTransaction { step: usize, reason: String },
}
