//! Interval-merge of overlapping suggestions into conflict groups.

use super::types::{ConflictGroup, LiveEntry, Suggestion};

/// Partitions suggestions into standalone entries and conflict groups.
///
/// Suggestions are sorted by `(from, to)` and swept once; a suggestion joins
/// the running group while its `from` is strictly below the group's
/// maximum `to`. Degenerate spans cover no text, so they never join a group
/// and pass through as standalone entries. Output is ordered by span start.
pub fn group_overlaps(suggestions: Vec<Suggestion>) -> Vec<LiveEntry> {
    if suggestions.len() < 2 {
        return suggestions.into_iter().map(LiveEntry::Single).collect();
    }

    let (mut live, degenerate): (Vec<_>, Vec<_>) =
        suggestions.into_iter().partition(|s| !s.is_degenerate());
    live.sort_by_key(|s| (s.from, s.to));

    let mut entries = Vec::with_capacity(live.len() + degenerate.len());
    let mut current: Vec<Suggestion> = Vec::new();
    let mut max_to = 0;

    for suggestion in live {
        if !current.is_empty() && suggestion.from >= max_to {
            entries.push(close_group(std::mem::take(&mut current)));
        }
        max_to = if current.is_empty() {
            suggestion.to
        } else {
            max_to.max(suggestion.to)
        };
        current.push(suggestion);
    }
    if !current.is_empty() {
        entries.push(close_group(current));
    }

    if !degenerate.is_empty() {
        entries.extend(degenerate.into_iter().map(LiveEntry::Single));
        entries.sort_by_key(|e| (e.span().start, e.span().end));
    }

    log::trace!("grouped into {} live entries", entries.len());
    entries
}

fn close_group(mut members: Vec<Suggestion>) -> LiveEntry {
    if members.len() == 1 {
        if let Some(single) = members.pop() {
            return LiveEntry::Single(single);
        }
    }
    LiveEntry::Conflict(ConflictGroup::new(members))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::suggestion::identity::generate_fingerprint;
    use crate::suggestion::types::{EditType, SuggestionId, SuggestionStatus};
    use pretty_assertions::assert_eq;

    pub(crate) fn suggestion(id: &str, from: usize, to: usize) -> Suggestion {
        Suggestion {
            id: SuggestionId::from(id),
            from,
            to,
            original: format!("text {id}"),
            replacement: format!("new {id}"),
            edit_type: EditType::General,
            status: SuggestionStatus::Pending,
            confidence: None,
            fingerprint: generate_fingerprint(&format!("text {id}"), &format!("new {id}")),
        }
    }

    fn shape(entries: &[LiveEntry]) -> Vec<Vec<&str>> {
        entries
            .iter()
            .map(|e| e.suggestions().iter().map(|s| s.id.as_str()).collect())
            .collect()
    }

    #[test]
    fn empty_and_single_pass_through() {
        assert!(group_overlaps(Vec::new()).is_empty());
        let out = group_overlaps(vec![suggestion("a", 1, 5)]);
        assert!(matches!(out.as_slice(), [LiveEntry::Single(s)] if s.id.as_str() == "a"));
    }

    #[test]
    fn overlapping_pair_becomes_group_with_union_span() {
        let out = group_overlaps(vec![suggestion("b", 15, 25), suggestion("a", 10, 20)]);
        let [LiveEntry::Conflict(group)] = out.as_slice() else {
            panic!("expected one conflict group, got {out:?}");
        };
        assert_eq!((group.from, group.to), (10, 25));
        assert_eq!(group.members.len(), 2);
        assert!(group.id.starts_with("conflict-"));
    }

    #[test]
    fn touching_spans_stay_apart() {
        let out = group_overlaps(vec![suggestion("a", 1, 5), suggestion("b", 5, 9)]);
        assert_eq!(shape(&out), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn chains_merge_transitively() {
        let out = group_overlaps(vec![
            suggestion("a", 0, 10),
            suggestion("b", 8, 14),
            suggestion("c", 12, 20),
            suggestion("d", 30, 32),
        ]);
        assert_eq!(shape(&out), vec![vec!["a", "b", "c"], vec!["d"]]);
    }

    #[test]
    fn contained_span_extends_nothing() {
        let out = group_overlaps(vec![
            suggestion("outer", 0, 20),
            suggestion("inner", 2, 4),
            suggestion("later", 10, 12),
        ]);
        assert_eq!(shape(&out), vec![vec!["outer", "inner", "later"]]);
    }

    #[test]
    fn degenerate_spans_stay_single() {
        let out = group_overlaps(vec![
            suggestion("a", 3, 8),
            suggestion("gone", 5, 5),
            suggestion("b", 6, 9),
        ]);
        assert_eq!(shape(&out), vec![vec!["a", "b"], vec!["gone"]]);
    }
}
