//! The hosting-facing facade: one document, one suggestion state.
//!
//! Hosts own the only `SuggestionEngine` and drive it with the verbs below;
//! every verb runs to completion synchronously, so transactions and
//! suggestion updates apply in call order.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, NoopDiagnostics};
use crate::document::{Document, Patch, Transaction};
use crate::error::EngineError;
use crate::matching::{MatchResult, Matcher, ReconcileReport, Reconciler};
use crate::suggestion::{
    Context, DecorationSet, Proposal, SetReport, Suggestion, SuggestionId, SuggestionState,
};

/// A cheap copy of the document and live suggestions, for undo.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    document: Document,
    state: SuggestionState,
}

impl Snapshot {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }
}

#[derive(Debug)]
pub struct SuggestionEngine {
    doc: Document,
    state: SuggestionState,
    cx: Context,
    matcher: Matcher,
}

impl SuggestionEngine {
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, EngineConfig::default(), Arc::new(NoopDiagnostics))
    }

    pub fn with_config(doc: Document, config: EngineConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            doc,
            state: SuggestionState::new(),
            matcher: Matcher::new(config.matcher.clone()),
            cx: Context::new(config, diagnostics),
        }
    }

    /// Replaces the live suggestions with `proposals`.
    pub fn set_suggestions<I, P>(&mut self, proposals: I) -> SetReport
    where
        I: IntoIterator<Item = P>,
        P: Into<Proposal>,
    {
        let (state, report) = self.state.set_suggestions(
            &self.doc,
            proposals.into_iter().map(Into::into),
            &self.cx,
        );
        self.state = state;
        report
    }

    /// Applies a suggestion's replacement and drops it along with every
    /// conflicting sibling. Returns `None`, leaving everything untouched,
    /// when the id is not live.
    pub fn accept_suggestion(&mut self, id: &SuggestionId) -> Option<Patch> {
        let acceptance = self.state.accept(&self.doc, id, &self.cx)?;
        let patch = match self.doc.apply(&acceptance.transaction) {
            Ok(patch) => patch,
            Err(error) => {
                log::warn!("accept of {id} did not apply: {error}");
                self.cx.record(DiagnosticEvent::StaleAccept { id: id.clone() });
                return None;
            }
        };
        log::debug!(
            "accepted {id}, discarding {} sibling(s)",
            acceptance.discarded.len()
        );
        self.cx.record(DiagnosticEvent::Accepted {
            id: id.clone(),
            discarded: acceptance.discarded,
        });
        self.state = acceptance.state.map_through(&self.doc, &patch, &self.cx);
        Some(patch)
    }

    pub fn clear_all(&mut self) {
        self.state = self.state.clear_all();
    }

    /// Applies a caller-authored edit and carries the live suggestions
    /// through it. Atomic: on error nothing changes.
    pub fn apply_transaction(&mut self, tr: &Transaction) -> Result<Patch, EngineError> {
        let patch = self.doc.apply(tr)?;
        self.state = self.state.map_through(&self.doc, &patch, &self.cx);
        Ok(patch)
    }

    /// Swaps a pending suggestion's replacement text; returns its new id.
    pub fn revise_suggestion(
        &mut self,
        id: &SuggestionId,
        replacement: impl Into<String>,
    ) -> Option<SuggestionId> {
        let (state, new_id) = self.state.revise(&self.doc, id, replacement, &self.cx)?;
        self.state = state;
        Some(new_id)
    }

    pub fn find_match(&self, external: &Proposal) -> Option<MatchResult> {
        self.matcher.find_match(external, self.state.suggestions())
    }

    /// Reconciles `external` against the live set and adds every recreated
    /// suggestion to it. Orphans are reported, not removed.
    pub fn reconcile(&mut self, external: &[Proposal]) -> ReconcileReport {
        let live: Vec<Suggestion> = self.state.suggestions().cloned().collect();
        let report = Reconciler::new(
            &self.matcher,
            &self.cx.config.reconcile,
            self.cx.diagnostics.as_ref(),
        )
        .reconcile(&self.doc, &live, external);

        let recreated = report
            .recreated
            .iter()
            .map(|r| r.suggestion.clone())
            .collect();
        self.state = self.state.insert(recreated, &self.cx);
        report
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.doc.clone(),
            state: self.state.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.document;
        self.state = snapshot.state;
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn decorations(&self) -> &DecorationSet {
        self.state.decorations()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cx.config
    }
}
