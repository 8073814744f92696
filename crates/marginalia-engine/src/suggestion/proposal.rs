//! Boundary adapter for upstream proposal payloads.
//!
//! Producers disagree on field names (`suggestion` vs `replacement`,
//! `start/end` vs `from/to`). [`RawProposal`] accepts all of them and is
//! converted exactly once into the canonical [`Proposal`].

use serde::{Deserialize, Serialize};

use crate::document::Span;

use super::types::{EditType, SuggestionId};

/// Wire shape of one upstream proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProposal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub original: String,
    #[serde(default, alias = "replacement")]
    pub suggestion: String,
    #[serde(default, alias = "edit_type", alias = "type", skip_serializing_if = "Option::is_none")]
    pub edit_type: Option<String>,
    /// Character offsets into the flattened text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    /// Already-resolved tree positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Where a proposal claims its target text lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Tree positions.
    Positions(Span),
    /// Character offsets.
    Offsets(Span),
    /// No location; search for the literal `original`.
    Text,
}

/// Canonical proposal record consumed by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub id: Option<SuggestionId>,
    pub original: String,
    pub replacement: String,
    pub edit_type: EditType,
    pub confidence: Option<f64>,
    pub anchor: Anchor,
}

impl Proposal {
    /// A proposal anchored on character offsets.
    pub fn at_offsets(
        start: usize,
        end: usize,
        original: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self::new(Anchor::Offsets(Span::new(start, end)), original, replacement)
    }

    /// A proposal anchored on tree positions.
    pub fn at_positions(
        from: usize,
        to: usize,
        original: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self::new(Anchor::Positions(Span::new(from, to)), original, replacement)
    }

    /// A proposal located by searching for its literal text.
    pub fn literal(original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::new(Anchor::Text, original, replacement)
    }

    fn new(anchor: Anchor, original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            id: None,
            original: original.into(),
            replacement: replacement.into(),
            edit_type: EditType::General,
            confidence: None,
            anchor,
        }
    }

    #[must_use]
    pub fn with_edit_type(mut self, edit_type: EditType) -> Self {
        self.edit_type = edit_type;
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<SuggestionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

impl From<RawProposal> for Proposal {
    fn from(raw: RawProposal) -> Self {
        // resolved positions win over offsets; a half-specified pair is ignored
        let anchor = match (raw.from, raw.to, raw.start, raw.end) {
            (Some(from), Some(to), _, _) => Anchor::Positions(Span::new(from, to)),
            (_, _, Some(start), Some(end)) => Anchor::Offsets(Span::new(start, end)),
            _ => Anchor::Text,
        };
        Self {
            id: raw.id.filter(|id| !id.is_empty()).map(SuggestionId::from),
            original: raw.original,
            replacement: raw.suggestion,
            edit_type: raw
                .edit_type
                .as_deref()
                .map(EditType::from_label)
                .unwrap_or_default(),
            confidence: raw.confidence.filter(|c| c.is_finite()),
            anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Proposal {
        serde_json::from_str::<RawProposal>(json).unwrap().into()
    }

    #[test]
    fn suggestion_and_offsets() {
        let p = parse(r#"{"original":"sad","suggestion":"heartbroken","start":40,"end":43,"editType":"word choice"}"#);
        assert_eq!(p.replacement, "heartbroken");
        assert_eq!(p.anchor, Anchor::Offsets(Span::new(40, 43)));
        assert_eq!(p.edit_type, EditType::WordChoice);
    }

    #[test]
    fn replacement_alias_and_positions() {
        let p = parse(r#"{"original":"a","replacement":"b","from":3,"to":4,"start":1,"end":2,"type":"tone"}"#);
        assert_eq!(p.replacement, "b");
        assert_eq!(p.anchor, Anchor::Positions(Span::new(3, 4)));
        assert_eq!(p.edit_type, EditType::Tone);
    }

    #[test]
    fn missing_location_falls_back_to_text() {
        let p = parse(r#"{"original":"quick fix","suggestion":"rapid fix","start":5}"#);
        assert_eq!(p.anchor, Anchor::Text);
        assert_eq!(p.edit_type, EditType::General);
        assert_eq!(p.id, None);
    }

    #[test]
    fn snake_case_edit_type_and_id() {
        let p = parse(r#"{"id":"s-1","original":"x","suggestion":"y","edit_type":"spelling","confidence":0.4}"#);
        assert_eq!(p.id, Some(SuggestionId::from("s-1")));
        assert_eq!(p.edit_type, EditType::Spelling);
        assert_eq!(p.confidence, Some(0.4));
    }
}
