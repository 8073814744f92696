//! The strategy ladder: ordered `(applies, score)` pairs.
//!
//! Adding or reordering a strategy means editing [`LADDER`]; the search
//! loop in [`super::Matcher`] never changes.

use std::collections::BTreeSet;

use crate::config::MatcherConfig;
use crate::suggestion::{Suggestion, SuggestionId, generate_fingerprint};
use crate::text::{NormalizedText, ratio, significant_words, similarity_chars};

use super::MatchStrategy;

/// Normalised forms computed once per side of a comparison.
pub(crate) struct Features {
    pub(crate) original: NormalizedText,
    pub(crate) replacement: NormalizedText,
    pub(crate) fingerprint: String,
    pub(crate) word_count: usize,
    pub(crate) significant: BTreeSet<String>,
}

impl Features {
    pub(crate) fn new(
        original: &str,
        replacement: &str,
        fingerprint: Option<&str>,
        config: &MatcherConfig,
    ) -> Self {
        let normalized = NormalizedText::new(original);
        Self {
            word_count: normalized.word_starts().count(),
            original: normalized,
            replacement: NormalizedText::new(replacement),
            fingerprint: fingerprint
                .map(str::to_string)
                .unwrap_or_else(|| generate_fingerprint(original, replacement)),
            significant: significant_words(original, config.significant_word_len),
        }
    }

    fn original_similarity(&self, other: &Features) -> f64 {
        similarity_chars(self.original.as_chars(), other.original.as_chars())
    }

    fn replacement_similarity(&self, other: &Features) -> f64 {
        similarity_chars(self.replacement.as_chars(), other.replacement.as_chars())
    }

    fn length_ratio(&self, other: &Features) -> f64 {
        ratio(self.original.len(), other.original.len())
    }
}

/// The externally described suggestion being looked up.
pub(crate) struct Probe<'a> {
    pub(crate) id: Option<&'a SuggestionId>,
    pub(crate) features: Features,
}

/// A live suggestion under consideration.
pub(crate) struct Candidate<'a> {
    pub(crate) suggestion: &'a Suggestion,
    pub(crate) features: Features,
}

impl<'a> Candidate<'a> {
    pub(crate) fn new(suggestion: &'a Suggestion, config: &MatcherConfig) -> Self {
        Self {
            features: Features::new(
                &suggestion.original,
                &suggestion.replacement,
                Some(&suggestion.fingerprint),
                config,
            ),
            suggestion,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scored {
    pub(crate) confidence: f64,
    pub(crate) reason: String,
}

type Applies = fn(&Probe<'_>, &MatcherConfig) -> bool;
type Score = fn(&Probe<'_>, &Candidate<'_>, &MatcherConfig) -> Option<Scored>;

pub(crate) struct StrategyRule {
    pub(crate) strategy: MatchStrategy,
    pub(crate) applies: Applies,
    pub(crate) score: Score,
}

/// Priority order, strongest signal first.
pub(crate) const LADDER: &[StrategyRule] = &[
    StrategyRule {
        strategy: MatchStrategy::ExactId,
        applies: has_id,
        score: exact_id,
    },
    StrategyRule {
        strategy: MatchStrategy::Fingerprint,
        applies: always,
        score: fingerprint,
    },
    StrategyRule {
        strategy: MatchStrategy::NormalizedOriginal,
        applies: has_original,
        score: normalized_original,
    },
    StrategyRule {
        strategy: MatchStrategy::FuzzyOriginal,
        applies: has_original,
        score: fuzzy_original,
    },
    StrategyRule {
        strategy: MatchStrategy::PositionContext,
        applies: has_original,
        score: position_context,
    },
    StrategyRule {
        strategy: MatchStrategy::WordOverlap,
        applies: has_significant_words,
        score: word_overlap,
    },
];

fn always(_: &Probe<'_>, _: &MatcherConfig) -> bool {
    true
}

fn has_id(probe: &Probe<'_>, _: &MatcherConfig) -> bool {
    probe.id.is_some()
}

fn has_original(probe: &Probe<'_>, _: &MatcherConfig) -> bool {
    !probe.features.original.is_empty()
}

fn has_significant_words(probe: &Probe<'_>, config: &MatcherConfig) -> bool {
    probe.features.significant.len() >= config.min_significant_words
}

fn exact_id(probe: &Probe<'_>, candidate: &Candidate<'_>, _: &MatcherConfig) -> Option<Scored> {
    (probe.id? == &candidate.suggestion.id).then(|| Scored {
        confidence: 0.99,
        reason: "identical id".to_string(),
    })
}

fn fingerprint(probe: &Probe<'_>, candidate: &Candidate<'_>, _: &MatcherConfig) -> Option<Scored> {
    (probe.features.fingerprint == candidate.features.fingerprint).then(|| Scored {
        confidence: 0.95,
        reason: "identical content fingerprint".to_string(),
    })
}

fn normalized_original(
    probe: &Probe<'_>,
    candidate: &Candidate<'_>,
    _: &MatcherConfig,
) -> Option<Scored> {
    if probe.features.original != candidate.features.original {
        return None;
    }
    let replacement = probe.features.replacement_similarity(&candidate.features);
    Some(Scored {
        confidence: 0.9 * (0.7 + 0.3 * replacement),
        reason: format!("same normalised original, replacement similarity {replacement:.2}"),
    })
}

fn fuzzy_original(
    probe: &Probe<'_>,
    candidate: &Candidate<'_>,
    config: &MatcherConfig,
) -> Option<Scored> {
    // similarity can never exceed the length ratio
    if probe.features.length_ratio(&candidate.features) < config.fuzzy_threshold {
        return None;
    }
    let original = probe.features.original_similarity(&candidate.features);
    if original < config.fuzzy_threshold {
        return None;
    }
    let replacement = probe.features.replacement_similarity(&candidate.features);
    Some(Scored {
        confidence: 0.85 * (0.8 * original + 0.2 * replacement),
        reason: format!("original similarity {original:.2}, replacement similarity {replacement:.2}"),
    })
}

fn position_context(
    probe: &Probe<'_>,
    candidate: &Candidate<'_>,
    config: &MatcherConfig,
) -> Option<Scored> {
    let length = probe.features.length_ratio(&candidate.features);
    let words = ratio(probe.features.word_count, candidate.features.word_count);
    if 0.3 * length + 0.3 * words + 0.4 * length < config.context_threshold {
        return None;
    }
    let text = probe.features.original_similarity(&candidate.features);
    let combined = 0.3 * length + 0.3 * words + 0.4 * text;
    if combined < config.context_threshold {
        return None;
    }
    Some(Scored {
        confidence: 0.7 * combined,
        reason: format!(
            "context: length {length:.2}, word count {words:.2}, text {text:.2}"
        ),
    })
}

fn word_overlap(probe: &Probe<'_>, candidate: &Candidate<'_>, config: &MatcherConfig) -> Option<Scored> {
    let (ours, theirs) = (&probe.features.significant, &candidate.features.significant);
    if theirs.len() < config.min_significant_words {
        return None;
    }
    let shared = ours.intersection(theirs).count();
    let overlap = shared as f64 / ours.len().max(theirs.len()) as f64;
    if overlap < config.overlap_ratio {
        return None;
    }
    Some(Scored {
        confidence: 0.6 * overlap,
        reason: format!("{shared} shared significant words ({overlap:.2})"),
    })
}
