use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Span;

/// Stable identifier of a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(String);

impl SuggestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Usable as a DOM attribute value and as a lookup key.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SuggestionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SuggestionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Editorial category of a proposal; drives the decoration class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditType {
    Grammar,
    Spelling,
    Punctuation,
    Style,
    Clarity,
    Concision,
    WordChoice,
    Tone,
    Continuity,
    #[default]
    General,
}

impl EditType {
    /// Lenient parse of the free-form labels upstream producers send.
    /// Unknown labels fall back to `General`.
    pub fn from_label(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "grammar" => Self::Grammar,
            "spelling" | "typo" => Self::Spelling,
            "punctuation" => Self::Punctuation,
            "style" | "prose" => Self::Style,
            "clarity" => Self::Clarity,
            "concision" | "conciseness" | "brevity" => Self::Concision,
            "wordchoice" | "diction" => Self::WordChoice,
            "tone" | "voice" => Self::Tone,
            "continuity" | "consistency" => Self::Continuity,
            _ => Self::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::Spelling => "spelling",
            Self::Punctuation => "punctuation",
            Self::Style => "style",
            Self::Clarity => "clarity",
            Self::Concision => "concision",
            Self::WordChoice => "word-choice",
            Self::Tone => "tone",
            Self::Continuity => "continuity",
            Self::General => "general",
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Revised,
}

/// A live, anchored proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    /// Tree position where the target text starts.
    pub from: usize,
    /// Tree position just past the target text.
    pub to: usize,
    /// Live document text at `[from, to)` when the suggestion was anchored.
    pub original: String,
    pub replacement: String,
    pub edit_type: EditType,
    pub status: SuggestionStatus,
    pub confidence: Option<f64>,
    /// Content-only hash of `original` and `replacement`.
    pub fingerprint: String,
}

impl Suggestion {
    pub fn span(&self) -> Span {
        Span::new(self.from, self.to)
    }

    /// A span that collapsed to nothing after an edit.
    pub fn is_degenerate(&self) -> bool {
        self.from >= self.to
    }

    pub fn overlaps(&self, other: &Suggestion) -> bool {
        self.span().overlaps(other.span())
    }
}

/// Two or more overlapping pending suggestions offered as one exclusive
/// choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictGroup {
    pub id: String,
    /// Union of member spans.
    pub from: usize,
    pub to: usize,
    pub members: Vec<Suggestion>,
}

impl ConflictGroup {
    pub fn new(members: Vec<Suggestion>) -> Self {
        let span = members
            .iter()
            .map(Suggestion::span)
            .reduce(Span::union)
            .unwrap_or_default();
        Self {
            id: super::identity::conflict_group_id(&members),
            from: span.start,
            to: span.end,
            members,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.from, self.to)
    }

    pub fn contains(&self, id: &SuggestionId) -> bool {
        self.members.iter().any(|m| &m.id == id)
    }
}

/// One entry of the live list: a standalone suggestion or a conflict group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveEntry {
    Single(Suggestion),
    Conflict(ConflictGroup),
}

impl LiveEntry {
    pub fn span(&self) -> Span {
        match self {
            LiveEntry::Single(s) => s.span(),
            LiveEntry::Conflict(g) => g.span(),
        }
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        match self {
            LiveEntry::Single(s) => std::slice::from_ref(s),
            LiveEntry::Conflict(g) => &g.members,
        }
    }

    pub fn into_suggestions(self) -> Vec<Suggestion> {
        match self {
            LiveEntry::Single(s) => vec![s],
            LiveEntry::Conflict(g) => g.members,
        }
    }

    pub fn contains(&self, id: &SuggestionId) -> bool {
        self.suggestions().iter().any(|s| &s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("grammar", EditType::Grammar)]
    #[case("Word Choice", EditType::WordChoice)]
    #[case("word_choice", EditType::WordChoice)]
    #[case("word-choice", EditType::WordChoice)]
    #[case("CONCISENESS", EditType::Concision)]
    #[case("something new", EditType::General)]
    #[case("", EditType::General)]
    fn edit_type_labels(#[case] label: &str, #[case] expected: EditType) {
        assert_eq!(EditType::from_label(label), expected);
    }

    #[test]
    fn well_formed_ids() {
        assert!(SuggestionId::from("sugg-1").is_well_formed());
        assert!(!SuggestionId::from("").is_well_formed());
        assert!(!SuggestionId::from("has space").is_well_formed());
    }
}
