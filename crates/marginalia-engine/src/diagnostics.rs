//! Injected diagnostics sink.
//!
//! The engine always logs through the `log` facade. A host that wants to
//! observe engine decisions programmatically (a status line, a debugging
//! panel, a test) passes a [`Diagnostics`] implementation at construction
//! instead of poking at engine internals.

use std::sync::Mutex;

use crate::document::Span;
use crate::error::EngineError;
use crate::suggestion::SuggestionId;

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    /// A proposal could not be anchored and never rendered.
    ProposalSkipped { index: usize, error: EngineError },
    /// A proposal's offsets pointed at other text; its literal was found nearby.
    OffsetsRelocated { index: usize, from: Span, to: Span },
    /// An accept referenced a suggestion that is no longer live.
    StaleAccept { id: SuggestionId },
    Accepted {
        id: SuggestionId,
        discarded: Vec<SuggestionId>,
    },
    Revised { old: SuggestionId, new: SuggestionId },
    /// A suggestion's span collapsed after an edit.
    Degenerate { id: SuggestionId, pruned: bool },
    Matched {
        index: usize,
        id: SuggestionId,
        confidence: f64,
    },
    Recreated {
        index: usize,
        id: SuggestionId,
        method: &'static str,
    },
    RecreationFailed { index: usize, error: EngineError },
    Orphaned { id: SuggestionId },
}

pub trait Diagnostics: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn record(&self, _event: DiagnosticEvent) {}
}

/// Forwards every event to the `log` facade under the `marginalia::diagnostics`
/// target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match &event {
            DiagnosticEvent::ProposalSkipped { .. }
            | DiagnosticEvent::StaleAccept { .. }
            | DiagnosticEvent::RecreationFailed { .. } => {
                log::warn!(target: "marginalia::diagnostics", "{event:?}")
            }
            _ => log::debug!(target: "marginalia::diagnostics", "{event:?}"),
        }
    }
}

/// Keeps every event in memory until taken.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn take(&self) -> Vec<DiagnosticEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
