//! Content-derived identity for suggestions.
//!
//! Ids and fingerprints hash the *normalised* text, so two producers that
//! differ only in quote style, whitespace or case agree on the fingerprint.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::text::{normalize, word_count};

use super::types::{EditType, Suggestion, SuggestionId};

/// Hex characters of the content hash kept in ids and fingerprints.
const HASH_LEN: usize = 16;

/// Separates hashed fields so `("ab", "c")` and `("a", "bc")` differ.
const FIELD_SEPARATOR: u8 = 0x1f;

fn hash_fields(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_LEN);
    digest
}

/// Confidence rounded to one decimal, so 0.81 and 0.84 hash alike.
fn confidence_bucket(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) if c.is_finite() => format!("{}", (c.clamp(0.0, 1.0) * 10.0).round() as u8),
        _ => "-".to_string(),
    }
}

/// Deterministic hash over normalised original, normalised replacement,
/// edit type and confidence bucket.
pub fn content_hash(
    original: &str,
    replacement: &str,
    edit_type: EditType,
    confidence: Option<f64>,
) -> String {
    hash_fields(&[
        &normalize(original),
        &normalize(replacement),
        edit_type.as_str(),
        &confidence_bucket(confidence),
    ])
}

/// A globally unique id: the content hash plus a time-ordered suffix.
pub fn generate_id(
    original: &str,
    replacement: &str,
    edit_type: EditType,
    confidence: Option<f64>,
) -> SuggestionId {
    let hash = content_hash(original, replacement, edit_type, confidence);
    SuggestionId::new(format!("sugg-{hash}-{}", Uuid::now_v7().simple()))
}

/// Content-only hash used to tell whether two independently generated
/// suggestions propose the same edit.
pub fn generate_fingerprint(original: &str, replacement: &str) -> String {
    hash_fields(&[&normalize(original), &normalize(replacement)])
}

/// Shape of an edit, used as matcher metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Substitution,
    Expansion,
    Reduction,
}

/// Classifies by word-count delta first, then by a ±20% length change.
pub fn classify_change(original: &str, replacement: &str) -> ChangeKind {
    if replacement.trim().is_empty() {
        return ChangeKind::Reduction;
    }
    let (before, after) = (word_count(original), word_count(replacement));
    if after > before {
        return ChangeKind::Expansion;
    }
    if after < before {
        return ChangeKind::Reduction;
    }

    let (before, after) = (
        original.chars().count() as f64,
        replacement.chars().count() as f64,
    );
    if before == 0.0 {
        ChangeKind::Expansion
    } else if after / before > 1.2 {
        ChangeKind::Expansion
    } else if after / before < 0.8 {
        ChangeKind::Reduction
    } else {
        ChangeKind::Substitution
    }
}

/// Rough complexity score: share of distinct characters times the log of
/// the length. Zero for empty text.
pub fn text_complexity(text: &str) -> f64 {
    let normalized = normalize(text);
    let len = normalized.chars().count();
    if len == 0 {
        return 0.0;
    }
    let mut distinct: Vec<char> = normalized.chars().collect();
    distinct.sort_unstable();
    distinct.dedup();
    (distinct.len() as f64 / len as f64) * (len as f64).ln_1p()
}

/// Stable id for a conflict group, derived from its member ids.
pub fn conflict_group_id(members: &[Suggestion]) -> String {
    let ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
    let digest = hex::encode(Sha256::digest(ids.join(",").as_bytes()));
    format!("conflict-{}", &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn content_hash_ignores_cosmetic_differences() {
        let a = content_hash("It\u{2019}s  DONE", "fine", EditType::Style, Some(0.81));
        let b = content_hash("it's done", "Fine", EditType::Style, Some(0.84));
        assert_eq!(a, b);
        assert_ne!(a, content_hash("it's done", "fine", EditType::Tone, Some(0.8)));
        assert_ne!(a, content_hash("it's done", "fine", EditType::Style, Some(0.5)));
    }

    #[test]
    fn ids_are_unique_but_share_the_hash() {
        let a = generate_id("sad", "heartbroken", EditType::WordChoice, None);
        let b = generate_id("sad", "heartbroken", EditType::WordChoice, None);
        assert_ne!(a, b);
        assert!(a.is_well_formed());
        let prefix = format!("sugg-{}-", content_hash("sad", "heartbroken", EditType::WordChoice, None));
        assert!(a.as_str().starts_with(&prefix));
        assert!(b.as_str().starts_with(&prefix));
    }

    #[test]
    fn fingerprint_is_content_only() {
        assert_eq!(
            generate_fingerprint("Quick  fix", "rapid fix"),
            generate_fingerprint("quick fix", "Rapid Fix")
        );
        assert_ne!(
            generate_fingerprint("ab", "c"),
            generate_fingerprint("a", "bc")
        );
        assert_eq!(generate_fingerprint("x", "y").len(), HASH_LEN);
    }

    #[rstest]
    #[case("sad", "heartbroken", ChangeKind::Expansion)]
    #[case("was blowing very hard", "howled", ChangeKind::Reduction)]
    #[case("the cat", "the dog", ChangeKind::Substitution)]
    #[case("big", "", ChangeKind::Reduction)]
    #[case("in order to", "to help us", ChangeKind::Substitution)]
    fn classifies_changes(#[case] original: &str, #[case] replacement: &str, #[case] kind: ChangeKind) {
        assert_eq!(classify_change(original, replacement), kind);
    }

    #[test]
    fn complexity_grows_with_diverse_text() {
        assert_eq!(text_complexity(""), 0.0);
        assert!(text_complexity("aaaaaaaa") < text_complexity("abcdefgh"));
    }
}
