//! Confidence-scored correlation of externally described suggestions with
//! live ones.
//!
//! Positions are unstable across independent renders, content usually is
//! not. The [`Matcher`] walks the strategy ladder in priority order, stops as
//! soon as one strategy is confident enough, and otherwise keeps the single
//! best candidate if it clears the global threshold.

pub mod reconcile;
mod strategies;

use serde::Serialize;

use crate::config::MatcherConfig;
use crate::error::EngineError;
use crate::suggestion::{ChangeKind, Proposal, Suggestion, classify_change, text_complexity};

use strategies::{Candidate, Features, LADDER, Probe, Scored};

pub use reconcile::{ReconcileReport, Reconciler, RecreationMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    ExactId,
    Fingerprint,
    NormalizedOriginal,
    FuzzyOriginal,
    PositionContext,
    WordOverlap,
}

impl MatchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactId => "exact-id",
            Self::Fingerprint => "fingerprint",
            Self::NormalizedOriginal => "normalized-original",
            Self::FuzzyOriginal => "fuzzy-original",
            Self::PositionContext => "position-context",
            Self::WordOverlap => "word-overlap",
        }
    }
}

/// Context about the external item; informational only, never part of
/// the confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchMetadata {
    pub change_kind: ChangeKind,
    pub complexity: f64,
    /// Live suggestions considered.
    pub candidates: usize,
    /// Strategies that ran before the search stopped.
    pub strategies_tried: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub suggestion: Suggestion,
    pub confidence: f64,
    pub strategy: MatchStrategy,
    pub reason: String,
    pub metadata: MatchMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// The best live match for `external`, or `None` below the threshold.
    pub fn find_match<'a>(
        &self,
        external: &Proposal,
        live: impl IntoIterator<Item = &'a Suggestion>,
    ) -> Option<MatchResult> {
        self.try_match(external, live).ok()
    }

    /// Like [`Matcher::find_match`], reporting the best confidence seen on
    /// failure.
    pub fn try_match<'a>(
        &self,
        external: &Proposal,
        live: impl IntoIterator<Item = &'a Suggestion>,
    ) -> Result<MatchResult, EngineError> {
        let config = &self.config;
        let probe = Probe {
            id: external.id.as_ref(),
            features: Features::new(&external.original, &external.replacement, None, config),
        };
        let candidates: Vec<Candidate<'_>> = live
            .into_iter()
            .filter(|suggestion| !suggestion.is_degenerate())
            .map(|suggestion| Candidate::new(suggestion, config))
            .collect();

        let mut best: Option<(MatchStrategy, usize, Scored)> = None;
        let mut strategies_tried = 0;

        for rule in LADDER {
            if !(rule.applies)(&probe, config) {
                continue;
            }
            strategies_tried += 1;
            for (index, candidate) in candidates.iter().enumerate() {
                let Some(scored) = (rule.score)(&probe, candidate, config) else {
                    continue;
                };
                // strict: on a tie the earlier strategy and candidate win
                if best
                    .as_ref()
                    .is_none_or(|(_, _, b)| scored.confidence.total_cmp(&b.confidence).is_gt())
                {
                    best = Some((rule.strategy, index, scored));
                }
            }
            if best
                .as_ref()
                .is_some_and(|(_, _, b)| b.confidence >= config.early_exit)
            {
                break;
            }
        }

        let best_confidence = best.as_ref().map_or(0.0, |(_, _, b)| b.confidence);
        match best {
            Some((strategy, index, scored)) if scored.confidence >= config.threshold => {
                log::trace!(
                    "matched {:?} via {} at {:.2}",
                    external.original,
                    strategy.as_str(),
                    scored.confidence
                );
                Ok(MatchResult {
                    suggestion: candidates[index].suggestion.clone(),
                    confidence: scored.confidence,
                    strategy,
                    reason: scored.reason,
                    metadata: MatchMetadata {
                        change_kind: classify_change(&external.original, &external.replacement),
                        complexity: text_complexity(&external.original),
                        candidates: candidates.len(),
                        strategies_tried,
                    },
                })
            }
            _ => Err(EngineError::MatchNotFound {
                threshold: config.threshold,
                best: best_confidence,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::{EditType, SuggestionId, SuggestionStatus, generate_fingerprint};

    fn live(id: &str, original: &str, replacement: &str) -> Suggestion {
        Suggestion {
            id: SuggestionId::from(id),
            from: 1,
            to: 1 + original.chars().count(),
            original: original.to_string(),
            replacement: replacement.to_string(),
            edit_type: EditType::General,
            status: SuggestionStatus::Pending,
            confidence: None,
            fingerprint: generate_fingerprint(original, replacement),
        }
    }

    #[test]
    fn exact_id_wins_outright() {
        let matcher = Matcher::default();
        let pool = vec![live("a", "quick fix", "rapid fix"), live("b", "other", "text")];
        let result = matcher
            .find_match(&Proposal::literal("changed", "entirely").with_id("b"), &pool)
            .unwrap();
        assert_eq!(result.strategy, MatchStrategy::ExactId);
        assert_eq!(result.suggestion.id.as_str(), "b");
        assert_eq!(result.confidence, 0.99);
        assert_eq!(result.metadata.strategies_tried, 1);
    }

    #[test]
    fn identical_content_matches_by_fingerprint() {
        let matcher = Matcher::default();
        let pool = vec![
            live("near", "quick fixes", "rapid fix"),
            live("same", "Quick  fix", "Rapid fix"),
        ];
        let result = matcher
            .find_match(&Proposal::literal("quick fix", "rapid fix"), &pool)
            .unwrap();
        assert_eq!(result.strategy, MatchStrategy::Fingerprint);
        assert_eq!(result.suggestion.id.as_str(), "same");
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn same_original_blends_replacement_similarity() {
        let matcher = Matcher::default();
        let pool = vec![live("a", "Quick fix", "rapid fixes")];
        let result = matcher
            .find_match(&Proposal::literal("quick fix", "rapid fix"), &pool)
            .unwrap();
        assert_eq!(result.strategy, MatchStrategy::NormalizedOriginal);
        let expected = 0.9 * (0.7 + 0.3 * (9.0 / 11.0));
        assert!((result.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn near_identical_original_matches_fuzzily() {
        let matcher = Matcher::default();
        let pool = vec![live("a", "the wind was blowing hard.", "howled")];
        let result = matcher
            .find_match(&Proposal::literal("the wind was blowing hard", "howled"), &pool)
            .unwrap();
        assert_eq!(result.strategy, MatchStrategy::FuzzyOriginal);
        assert!(result.confidence >= 0.75);
    }

    #[test]
    fn weak_matches_are_rejected_with_the_best_score() {
        let matcher = Matcher::default();
        let pool = vec![live("a", "storm battered the harbour walls", "x")];
        let err = matcher
            .try_match(&Proposal::literal("harbour walls the storm battered", "y"), &pool)
            .unwrap_err();
        let EngineError::MatchNotFound { threshold, best } = err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(threshold, 0.75);
        assert!(best > 0.0 && best < 0.75);
    }

    #[test]
    fn lowered_threshold_admits_weak_strategies() {
        let matcher = Matcher::new(MatcherConfig {
            threshold: 0.5,
            ..MatcherConfig::default()
        });
        let pool = vec![live("a", "storm battered the harbour walls", "x")];
        let result = matcher
            .find_match(&Proposal::literal("harbour walls the storm battered", "y"), &pool)
            .unwrap();
        assert!(matches!(
            result.strategy,
            MatchStrategy::PositionContext | MatchStrategy::WordOverlap
        ));
    }

    #[test]
    fn collapsed_suggestions_are_not_candidates() {
        let matcher = Matcher::default();
        let mut collapsed = live("gone", "quick fix", "rapid fix");
        collapsed.to = collapsed.from;
        let pool = vec![collapsed, live("other", "the storm raged", "it raged")];
        let err = matcher
            .try_match(&Proposal::literal("quick fix", "rapid fix").with_id("gone"), &pool)
            .unwrap_err();
        assert!(matches!(err, EngineError::MatchNotFound { .. }));
    }

    #[test]
    fn empty_pool_never_matches() {
        let matcher = Matcher::default();
        let pool: Vec<Suggestion> = Vec::new();
        assert!(matcher.find_match(&Proposal::literal("a", "b"), &pool).is_none());
    }
}
