//! The suggestion state machine.
//!
//! A [`SuggestionState`] is an immutable value: every transition returns a
//! new state, so a host can keep old ones around for undo. Live suggestions
//! and their decorations are always rebuilt together.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::config::{DegeneratePolicy, EngineConfig};
use crate::diagnostics::{DiagnosticEvent, Diagnostics, NoopDiagnostics};
use crate::document::{Document, Origin, Patch, Span, Transaction};
use crate::error::EngineError;
use crate::mapping;
use crate::text::normalize;

use super::decoration::DecorationSet;
use super::grouping::group_overlaps;
use super::identity::{generate_fingerprint, generate_id};
use super::proposal::{Anchor, Proposal};
use super::types::{ConflictGroup, LiveEntry, Suggestion, SuggestionId, SuggestionStatus};

/// Configuration and diagnostics sink threaded through every transition.
#[derive(Clone)]
pub struct Context {
    pub config: EngineConfig,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl Context {
    pub fn new(config: EngineConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    pub(crate) fn record(&self, event: DiagnosticEvent) {
        self.diagnostics.record(event);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Arc::new(NoopDiagnostics))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A terminal outcome recorded for a suggestion that left live state.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Resolution {
    pub id: SuggestionId,
    pub status: SuggestionStatus,
    /// Document version the outcome belongs to.
    pub version: u64,
}

/// What `set_suggestions` did with each proposal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetReport {
    /// Ids of the suggestions now live, in proposal order.
    pub applied: Vec<SuggestionId>,
    /// Proposals that never rendered, by input index.
    pub skipped: Vec<(usize, EngineError)>,
    /// Input indices whose offsets were moved onto their literal text.
    pub relocated: Vec<usize>,
}

/// Result of accepting a suggestion, before the edit is applied.
///
/// `state` no longer contains the accepted suggestion or its siblings; the
/// remaining suggestions still carry pre-edit positions until the host
/// applies `transaction` and calls [`SuggestionState::map_through`].
#[derive(Debug, Clone)]
pub struct Acceptance {
    pub state: SuggestionState,
    pub transaction: Transaction,
    pub accepted: Suggestion,
    pub discarded: Vec<SuggestionId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionState {
    entries: Vec<LiveEntry>,
    decorations: DecorationSet,
    resolutions: Vec<Resolution>,
}

impl SuggestionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn rebuild(suggestions: Vec<Suggestion>, resolutions: Vec<Resolution>, cx: &Context) -> Self {
        let entries = group_overlaps(suggestions);
        let decorations = DecorationSet::build(&entries, &cx.config.decorations);
        Self {
            entries,
            decorations,
            resolutions,
        }
    }

    fn cloned_suggestions(&self) -> Vec<Suggestion> {
        self.suggestions().cloned().collect()
    }

    /// Replaces the live set with `proposals` anchored against `doc`.
    ///
    /// The document is the source of truth: each suggestion's `original` is
    /// re-read from the resolved span. Proposals that cannot be anchored are
    /// skipped and reported.
    pub fn set_suggestions<I>(&self, doc: &Document, proposals: I, cx: &Context) -> (Self, SetReport)
    where
        I: IntoIterator<Item = Proposal>,
    {
        let mut report = SetReport::default();
        let mut literal_claims: HashMap<String, usize> = HashMap::new();
        let mut seen_ids: HashSet<SuggestionId> = HashSet::new();
        let mut suggestions = Vec::new();

        for (index, proposal) in proposals.into_iter().enumerate() {
            let resolved = resolve_anchor(doc, &proposal, &mut literal_claims).and_then(|offsets| {
                let (offsets, relocated) = relocate_drifted(doc, &proposal, offsets, cx);
                let positions = mapping::validate_range(doc, offsets.start, offsets.end)
                    .span()
                    .ok_or(EngineError::InvalidRange {
                        start: offsets.start,
                        end: offsets.end,
                    })?;
                if relocated {
                    cx.record(DiagnosticEvent::OffsetsRelocated {
                        index,
                        from: match proposal.anchor {
                            Anchor::Offsets(span) => span,
                            _ => offsets,
                        },
                        to: offsets,
                    });
                    report.relocated.push(index);
                }
                Ok((offsets, positions))
            });

            let (offsets, positions) = match resolved {
                Ok(found) => found,
                Err(error) => {
                    log::warn!("skipping proposal {index}: {error}");
                    cx.record(DiagnosticEvent::ProposalSkipped {
                        index,
                        error: error.clone(),
                    });
                    report.skipped.push((index, error));
                    continue;
                }
            };

            let original = doc.slice(offsets).unwrap_or_default();
            let id = proposal
                .id
                .filter(|id| id.is_well_formed() && !seen_ids.contains(id))
                .unwrap_or_else(|| {
                    generate_id(
                        &original,
                        &proposal.replacement,
                        proposal.edit_type,
                        proposal.confidence,
                    )
                });
            seen_ids.insert(id.clone());
            report.applied.push(id.clone());

            suggestions.push(Suggestion {
                fingerprint: generate_fingerprint(&original, &proposal.replacement),
                id,
                from: positions.start,
                to: positions.end,
                original,
                replacement: proposal.replacement,
                edit_type: proposal.edit_type,
                status: SuggestionStatus::Pending,
                confidence: proposal.confidence,
            });
        }

        let next = Self::rebuild(suggestions, self.resolutions.clone(), cx);
        log::debug!(
            "set {} suggestion(s) in {} entries, skipped {}",
            report.applied.len(),
            next.entries.len(),
            report.skipped.len()
        );
        (next, report)
    }

    /// Prepares the acceptance of `id`.
    ///
    /// Unknown, stale or degenerate ids are a no-op with a warning: the UI
    /// may legitimately click on something that just vanished.
    pub fn accept(&self, doc: &Document, id: &SuggestionId, cx: &Context) -> Option<Acceptance> {
        let stale = |why: &str| {
            log::warn!("ignoring accept of {id}: {why}");
            cx.record(DiagnosticEvent::StaleAccept { id: id.clone() });
        };

        let Some(entry_index) = self.entries.iter().position(|e| e.contains(id)) else {
            stale("not live");
            return None;
        };
        let entry = &self.entries[entry_index];
        let mut accepted = entry.suggestions().iter().find(|s| &s.id == id)?.clone();

        if accepted.is_degenerate() {
            stale("its text was deleted");
            return None;
        }
        if mapping::position_to_offset(doc, accepted.from).is_none()
            || mapping::position_to_offset(doc, accepted.to).is_none()
        {
            stale("its span no longer resolves");
            return None;
        }

        let transaction = if accepted.replacement.is_empty() {
            Transaction::with_origin(Origin::Accept).delete(accepted.from, accepted.to)
        } else {
            Transaction::with_origin(Origin::Accept).replace(
                accepted.from,
                accepted.to,
                accepted.replacement.clone(),
            )
        };

        let discarded: Vec<SuggestionId> = entry
            .suggestions()
            .iter()
            .filter(|s| &s.id != id)
            .map(|s| s.id.clone())
            .collect();

        let mut entries = self.entries.clone();
        entries.remove(entry_index);
        let decorations = DecorationSet::build(&entries, &cx.config.decorations);

        let mut resolutions = self.resolutions.clone();
        accepted.status = SuggestionStatus::Accepted;
        resolutions.push(Resolution {
            id: id.clone(),
            status: SuggestionStatus::Accepted,
            version: doc.version() + 1,
        });

        Some(Acceptance {
            state: Self {
                entries,
                decorations,
                resolutions,
            },
            transaction,
            accepted,
            discarded,
        })
    }

    /// Empties the live set. Resolutions are kept.
    pub fn clear_all(&self) -> Self {
        Self {
            entries: Vec::new(),
            decorations: DecorationSet::default(),
            resolutions: self.resolutions.clone(),
        }
    }

    /// Carries every live suggestion through `patch` onto `doc` (the
    /// post-edit document), refreshes each `original` from the live text and
    /// regroups.
    pub fn map_through(&self, doc: &Document, patch: &Patch, cx: &Context) -> Self {
        if patch.mapping.is_identity() {
            return self.clone();
        }

        let prune = cx.config.state.degenerate_policy == DegeneratePolicy::Prune;
        let mut suggestions = Vec::with_capacity(self.len());

        for mut suggestion in self.cloned_suggestions() {
            let was_degenerate = suggestion.is_degenerate();
            let mapped = patch.mapping.map_span(suggestion.span());
            suggestion.from = mapped.start;
            suggestion.to = mapped.end.max(mapped.start);

            if suggestion.is_degenerate() {
                if !was_degenerate {
                    log::debug!("suggestion {} collapsed at {}", suggestion.id, suggestion.from);
                    cx.record(DiagnosticEvent::Degenerate {
                        id: suggestion.id.clone(),
                        pruned: prune,
                    });
                }
                if prune {
                    continue;
                }
                suggestion.original.clear();
            } else if let Some(live) = mapping::text_between(doc, suggestion.from, suggestion.to) {
                suggestion.original = live;
            }
            suggestion.fingerprint =
                generate_fingerprint(&suggestion.original, &suggestion.replacement);
            suggestions.push(suggestion);
        }

        Self::rebuild(suggestions, self.resolutions.clone(), cx)
    }

    /// Swaps the replacement text of a pending suggestion in place. The
    /// suggestion gets a fresh id for its new content; the old id is
    /// recorded as revised.
    pub fn revise(
        &self,
        doc: &Document,
        id: &SuggestionId,
        replacement: impl Into<String>,
        cx: &Context,
    ) -> Option<(Self, SuggestionId)> {
        let mut suggestions = self.cloned_suggestions();
        let Some(target) = suggestions.iter_mut().find(|s| &s.id == id) else {
            log::warn!("ignoring revise of {id}: not live");
            return None;
        };

        let replacement = replacement.into();
        let new_id = generate_id(&target.original, &replacement, target.edit_type, target.confidence);
        target.fingerprint = generate_fingerprint(&target.original, &replacement);
        target.replacement = replacement;
        target.id = new_id.clone();
        target.status = SuggestionStatus::Pending;

        let mut resolutions = self.resolutions.clone();
        resolutions.push(Resolution {
            id: id.clone(),
            status: SuggestionStatus::Revised,
            version: doc.version(),
        });
        cx.record(DiagnosticEvent::Revised {
            old: id.clone(),
            new: new_id.clone(),
        });

        Some((Self::rebuild(suggestions, resolutions, cx), new_id))
    }

    /// Adds already-anchored suggestions to the live set and regroups.
    pub fn insert(&self, added: Vec<Suggestion>, cx: &Context) -> Self {
        if added.is_empty() {
            return self.clone();
        }
        let mut suggestions = self.cloned_suggestions();
        suggestions.extend(added);
        Self::rebuild(suggestions, self.resolutions.clone(), cx)
    }

    pub fn entries(&self) -> &[LiveEntry] {
        &self.entries
    }

    pub fn suggestions(&self) -> impl Iterator<Item = &Suggestion> {
        self.entries.iter().flat_map(LiveEntry::suggestions)
    }

    pub fn get(&self, id: &SuggestionId) -> Option<&Suggestion> {
        self.suggestions().find(|s| &s.id == id)
    }

    pub fn group_of(&self, id: &SuggestionId) -> Option<&ConflictGroup> {
        self.entries.iter().find_map(|e| match e {
            LiveEntry::Conflict(group) if group.contains(id) => Some(group),
            _ => None,
        })
    }

    /// The entry a decoration routing id (suggestion or group id) points at.
    pub fn entry_by_routing_id(&self, routing_id: &str) -> Option<&LiveEntry> {
        self.entries.iter().find(|e| match e {
            LiveEntry::Single(s) => s.id.as_str() == routing_id,
            LiveEntry::Conflict(g) => g.id == routing_id,
        })
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Number of live suggestions, group members counted individually.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.suggestions().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Character offsets a proposal claims, before drift correction.
fn resolve_anchor(
    doc: &Document,
    proposal: &Proposal,
    literal_claims: &mut HashMap<String, usize>,
) -> Result<Span, EngineError> {
    match proposal.anchor {
        Anchor::Positions(span) => {
            let resolve = |pos: usize| {
                mapping::position_to_offset(doc, pos).ok_or_else(|| EngineError::PositionResolution {
                    what: format!("position {pos}"),
                })
            };
            let (start, end) = (resolve(span.start)?, resolve(span.end)?);
            if start >= end {
                return Err(EngineError::InvalidRange {
                    start: span.start,
                    end: span.end,
                });
            }
            Ok(Span::new(start, end))
        }
        Anchor::Offsets(span) => {
            let validation = mapping::validate_range(doc, span.start, span.end);
            if validation.start_pos.is_none() || validation.end_pos.is_none() {
                return Err(EngineError::PositionResolution {
                    what: format!("offsets {}..{}", span.start, span.end),
                });
            }
            if !validation.is_valid {
                return Err(EngineError::InvalidRange {
                    start: span.start,
                    end: span.end,
                });
            }
            Ok(span)
        }
        Anchor::Text => {
            if proposal.original.is_empty() {
                return Err(EngineError::PositionResolution {
                    what: "an empty original".to_string(),
                });
            }
            let occurrences = mapping::find_all_offsets(doc, &proposal.original);
            if occurrences.is_empty() {
                return mapping::find_normalized(doc, &proposal.original).ok_or_else(|| {
                    EngineError::PositionResolution {
                        what: format!("text {:?}", proposal.original),
                    }
                });
            }
            // repeated literals take successive occurrences, then pile onto
            // the first one and surface as a conflict
            let claimed = literal_claims.entry(proposal.original.clone()).or_insert(0);
            let chosen = occurrences
                .get(*claimed)
                .or(occurrences.first())
                .copied()
                .unwrap_or_default();
            *claimed += 1;
            Ok(chosen)
        }
    }
}

/// Moves offset-anchored proposals whose text has drifted onto the nearest
/// occurrence of their literal. Returns the span to use and whether it moved.
fn relocate_drifted(doc: &Document, proposal: &Proposal, offsets: Span, cx: &Context) -> (Span, bool) {
    if !matches!(proposal.anchor, Anchor::Offsets(_))
        || !cx.config.state.relocate_drifted_offsets
        || proposal.original.is_empty()
    {
        return (offsets, false);
    }
    let live = doc.slice(offsets).unwrap_or_default();
    if normalize(&live) == normalize(&proposal.original) {
        return (offsets, false);
    }
    match mapping::find_all_offsets(doc, &proposal.original)
        .into_iter()
        .min_by_key(|occurrence| occurrence.start.abs_diff(offsets.start))
    {
        Some(nearest) => {
            log::debug!(
                "proposal {:?} drifted from {}..{} to {}..{}",
                proposal.original,
                offsets.start,
                offsets.end,
                nearest.start,
                nearest.end
            );
            (nearest, true)
        }
        None => (offsets, false),
    }
}
