//! Inline decorations derived from the live suggestion list.
//!
//! The set is rebuilt from scratch whenever the list changes. Hosts route
//! clicks through the `data-suggestion-id` / `data-conflict-group-id`
//! attributes and must not depend on anything else here.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::DecorationConfig;
use crate::document::{Document, Span, rope::preview};

use super::types::LiveEntry;

pub const SUGGESTION_ID_ATTR: &str = "data-suggestion-id";
pub const CONFLICT_GROUP_ID_ATTR: &str = "data-conflict-group-id";
pub const EDIT_TYPE_ATTR: &str = "data-edit-type";
pub const CONFLICT_SIZE_ATTR: &str = "data-conflict-size";
pub const EDIT_TYPES_ATTR: &str = "data-edit-types";

/// One highlighted range in tree positions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub class: String,
    pub attributes: BTreeMap<String, String>,
}

impl Decoration {
    fn for_entry(entry: &LiveEntry, config: &DecorationConfig) -> Self {
        let prefix = &config.class_prefix;
        let mut attributes = BTreeMap::new();
        let class = match entry {
            LiveEntry::Single(s) => {
                attributes.insert(SUGGESTION_ID_ATTR.to_string(), s.id.to_string());
                attributes.insert(EDIT_TYPE_ATTR.to_string(), s.edit_type.to_string());
                format!("{prefix} {prefix}--{}", s.edit_type)
            }
            LiveEntry::Conflict(group) => {
                let mut edit_types: Vec<&str> =
                    group.members.iter().map(|m| m.edit_type.as_str()).collect();
                edit_types.sort_unstable();
                edit_types.dedup();
                attributes.insert(CONFLICT_GROUP_ID_ATTR.to_string(), group.id.clone());
                attributes.insert(CONFLICT_SIZE_ATTR.to_string(), group.members.len().to_string());
                attributes.insert(EDIT_TYPES_ATTR.to_string(), edit_types.join(" "));
                format!("{prefix} {prefix}--conflict")
            }
        };
        let span = entry.span();
        Self {
            from: span.start,
            to: span.end,
            class,
            attributes,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.from, self.to)
    }

    /// The id a click on this decoration should be routed with.
    pub fn routing_id(&self) -> Option<&str> {
        self.attributes
            .get(SUGGESTION_ID_ATTR)
            .or_else(|| self.attributes.get(CONFLICT_GROUP_ID_ATTR))
            .map(String::as_str)
    }

    /// `class="…" data-…="…"`, escaped for a double-quoted attribute context.
    pub fn html_attributes(&self) -> String {
        let mut out = format!(
            "class=\"{}\"",
            html_escape::encode_double_quoted_attribute(&self.class)
        );
        for (name, value) in &self.attributes {
            let _ = write!(
                out,
                " {name}=\"{}\"",
                html_escape::encode_double_quoted_attribute(value)
            );
        }
        out
    }
}

/// Decorations for every renderable live entry, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    decorations: Vec<Decoration>,
}

impl DecorationSet {
    /// Degenerate entries have nothing to highlight and are skipped.
    pub fn build(entries: &[LiveEntry], config: &DecorationConfig) -> Self {
        let mut decorations: Vec<Decoration> = entries
            .iter()
            .filter(|e| !e.span().is_empty())
            .map(|e| Decoration::for_entry(e, config))
            .collect();
        decorations.sort_by_key(|d| (d.from, d.to));
        Self { decorations }
    }

    /// The decoration under a tree position, if any.
    pub fn route(&self, pos: usize) -> Option<&Decoration> {
        self.decorations
            .iter()
            .find(|d| d.from <= pos && pos < d.to)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}

/// Readable one-line-per-decoration dump with the covered text.
pub fn format_decorations(doc: &Document, set: &DecorationSet) -> String {
    let layout = doc.layout();
    let mut out = String::new();
    for d in set.iter() {
        let offsets = Span::new(
            layout.position_to_offset_clamped(d.from),
            layout.position_to_offset_clamped(d.to),
        );
        let text = doc.slice(offsets).unwrap_or_default();
        let _ = writeln!(
            out,
            "{}..{} {:?} [{}] {}",
            d.from,
            d.to,
            preview(&text, 40),
            d.class,
            d.routing_id().unwrap_or("-")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::grouping::{group_overlaps, tests::suggestion};
    use crate::suggestion::types::EditType;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_and_group_attributes() {
        let mut tone = suggestion("t", 2, 6);
        tone.edit_type = EditType::Tone;
        let entries = group_overlaps(vec![
            tone,
            suggestion("a", 10, 20),
            suggestion("b", 15, 25),
        ]);
        let set = DecorationSet::build(&entries, &DecorationConfig::default());
        assert_eq!(set.len(), 2);

        let single = set.route(3).unwrap();
        assert_eq!(single.class, "suggestion suggestion--tone");
        assert_eq!(single.routing_id(), Some("t"));
        assert_eq!(single.attributes[EDIT_TYPE_ATTR], "tone");

        let group = set.route(24).unwrap();
        assert_eq!(group.class, "suggestion suggestion--conflict");
        assert_eq!(group.attributes[CONFLICT_SIZE_ATTR], "2");
        assert_eq!(group.attributes[EDIT_TYPES_ATTR], "general");
        assert!(group.routing_id().unwrap().starts_with("conflict-"));
        assert!(set.route(25).is_none());
    }

    #[test]
    fn degenerate_entries_are_not_rendered() {
        let entries = group_overlaps(vec![suggestion("gone", 4, 4)]);
        assert!(DecorationSet::build(&entries, &DecorationConfig::default()).is_empty());
    }

    #[test]
    fn html_attributes_are_escaped() {
        let entries = group_overlaps(vec![suggestion("a\"b", 1, 3)]);
        let config = DecorationConfig {
            class_prefix: "mark".to_string(),
        };
        let set = DecorationSet::build(&entries, &config);
        let html = set.iter().next().unwrap().html_attributes();
        assert_eq!(
            html,
            "class=\"mark mark--general\" data-edit-type=\"general\" data-suggestion-id=\"a&quot;b\""
        );
    }
}
