//! Bulk reconciliation of an external proposal list against live state.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::ReconcileConfig;
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::document::{Document, Span};
use crate::error::EngineError;
use crate::mapping;
use crate::suggestion::{
    Proposal, Suggestion, SuggestionId, SuggestionStatus, generate_fingerprint, generate_id,
};
use crate::text::{NormalizedText, char_counts, shared_chars, similarity_chars, words_with_spans};

use super::{MatchResult, Matcher};

/// How a missing suggestion's text was found again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecreationMethod {
    NormalizedExact,
    WordSequence,
    SlidingWindow,
}

impl RecreationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NormalizedExact => "normalized-exact",
            Self::WordSequence => "word-sequence",
            Self::SlidingWindow => "sliding-window",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matched {
    /// Index into the external list.
    pub index: usize,
    pub result: MatchResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recreated {
    pub index: usize,
    pub suggestion: Suggestion,
    pub method: RecreationMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileFailure {
    pub index: usize,
    pub error: EngineError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub matched: Vec<Matched>,
    pub recreated: Vec<Recreated>,
    /// Live suggestions no external item claimed. Reported, never removed.
    pub orphaned: Vec<SuggestionId>,
    pub errors: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.errors.is_empty()
    }
}

pub struct Reconciler<'a> {
    matcher: &'a Matcher,
    config: &'a ReconcileConfig,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> Reconciler<'a> {
    pub fn new(matcher: &'a Matcher, config: &'a ReconcileConfig, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            matcher,
            config,
            diagnostics,
        }
    }

    /// Correlates every external item with `live`, recreating the ones that
    /// have no live counterpart from `doc`. Each live suggestion is claimed
    /// at most once. One item's failure never affects the others.
    pub fn reconcile(&self, doc: &Document, live: &[Suggestion], external: &[Proposal]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut claimed: HashSet<&SuggestionId> = HashSet::new();
        let mut used_ids: HashSet<SuggestionId> = live.iter().map(|s| s.id.clone()).collect();

        for (index, item) in external.iter().enumerate() {
            let unclaimed = live.iter().filter(|s| !claimed.contains(&s.id));
            let miss = match self.matcher.try_match(item, unclaimed) {
                Ok(result) => {
                    if let Some(live_match) = live.iter().find(|s| s.id == result.suggestion.id) {
                        claimed.insert(&live_match.id);
                    }
                    self.diagnostics.record(DiagnosticEvent::Matched {
                        index,
                        id: result.suggestion.id.clone(),
                        confidence: result.confidence,
                    });
                    report.matched.push(Matched { index, result });
                    continue;
                }
                Err(miss) => miss,
            };
            log::debug!("external item {index} unmatched ({miss}), trying recreation");

            match self.recreate(doc, item, &used_ids) {
                Ok((suggestion, method)) => {
                    used_ids.insert(suggestion.id.clone());
                    self.diagnostics.record(DiagnosticEvent::Recreated {
                        index,
                        id: suggestion.id.clone(),
                        method: method.as_str(),
                    });
                    report.recreated.push(Recreated {
                        index,
                        suggestion,
                        method,
                    });
                }
                Err(error) => {
                    log::warn!("could not reconcile external item {index}: {error}");
                    self.diagnostics.record(DiagnosticEvent::RecreationFailed {
                        index,
                        error: error.clone(),
                    });
                    report.errors.push(ReconcileFailure { index, error });
                }
            }
        }

        for suggestion in live.iter().filter(|s| !claimed.contains(&s.id)) {
            self.diagnostics.record(DiagnosticEvent::Orphaned {
                id: suggestion.id.clone(),
            });
            report.orphaned.push(suggestion.id.clone());
        }

        log::debug!(
            "reconciled {} item(s): {} matched, {} recreated, {} orphaned, {} failed",
            external.len(),
            report.matched.len(),
            report.recreated.len(),
            report.orphaned.len(),
            report.errors.len()
        );
        report
    }

    /// Locates `item.original` in the document and anchors a new pending
    /// suggestion there.
    fn recreate(
        &self,
        doc: &Document,
        item: &Proposal,
        used_ids: &HashSet<SuggestionId>,
    ) -> Result<(Suggestion, RecreationMethod), EngineError> {
        let failed = || EngineError::RecreationFailed {
            original: item.original.clone(),
        };
        let (offsets, method) = self.locate(doc, &item.original).ok_or_else(failed)?;
        let positions = mapping::validate_range(doc, offsets.start, offsets.end)
            .span()
            .ok_or_else(failed)?;
        let original = doc.slice(offsets).ok_or_else(failed)?;

        let id = item
            .id
            .clone()
            .filter(|id| id.is_well_formed() && !used_ids.contains(id))
            .unwrap_or_else(|| generate_id(&original, &item.replacement, item.edit_type, item.confidence));

        Ok((
            Suggestion {
                id,
                from: positions.start,
                to: positions.end,
                fingerprint: generate_fingerprint(&original, &item.replacement),
                original,
                replacement: item.replacement.clone(),
                edit_type: item.edit_type,
                status: SuggestionStatus::Pending,
                confidence: item.confidence,
            },
            method,
        ))
    }

    /// Character offsets of `original`, trying the cheap searches first.
    fn locate(&self, doc: &Document, original: &str) -> Option<(Span, RecreationMethod)> {
        if original.trim().is_empty() {
            return None;
        }
        if let Some(span) = mapping::find_normalized(doc, original) {
            return Some((span, RecreationMethod::NormalizedExact));
        }
        let flat = doc.flat_text();
        if let Some(span) = find_word_sequence(&flat, original) {
            return Some((span, RecreationMethod::WordSequence));
        }
        self.sliding_window(&flat, original)
            .map(|span| (span, RecreationMethod::SlidingWindow))
    }

    /// Best needle-sized window starting at a word boundary, if similar
    /// enough.
    fn sliding_window(&self, flat: &str, original: &str) -> Option<Span> {
        let needle = NormalizedText::new(original);
        let haystack = NormalizedText::new(flat);
        let len = needle.len();
        if len == 0 || len > haystack.len() {
            return None;
        }
        if len > self.config.max_window_needle {
            log::debug!("original of {len} chars is too long for the sliding window");
            return None;
        }

        let counts = char_counts(needle.as_chars());
        let mut best: Option<(f64, usize)> = None;
        for start in haystack
            .word_starts()
            .filter(|start| start + len <= haystack.len())
            .take(self.config.max_window_candidates)
        {
            let window = &haystack.as_chars()[start..start + len];
            // upper bound on the similarity, linear in the window
            let bound = shared_chars(&counts, window) as f64 / len as f64;
            if bound < self.config.window_similarity || best.is_some_and(|(b, _)| bound <= b) {
                continue;
            }
            let score = similarity_chars(window, needle.as_chars());
            if best.is_none_or(|(b, _)| score > b) {
                best = Some((score, start));
            }
        }

        let (score, start) = best.filter(|(score, _)| *score >= self.config.window_similarity)?;
        log::trace!("sliding window hit at {start} ({score:.2})");
        // drop a trailing partial separator so the span ends on text
        let mut end = start + len;
        while end > start + 1 && haystack.as_chars()[end - 1] == ' ' {
            end -= 1;
        }
        haystack.source_span(start, end)
    }
}

/// Span from the first to the last word of the first run of document words
/// equal to the words of `original`, ignoring punctuation and case.
fn find_word_sequence(flat: &str, original: &str) -> Option<Span> {
    let needle: Vec<String> = words_with_spans(original).into_iter().map(|(w, _)| w).collect();
    if needle.is_empty() {
        return None;
    }
    let words = words_with_spans(flat);
    words
        .windows(needle.len())
        .find(|window| window.iter().zip(&needle).all(|((word, _), n)| word == n))
        .map(|window| Span::new(window[0].1.start, window[window.len() - 1].1.end))
}
