//! Text normalisation and similarity used by identity, matching and
//! recreation.

use std::collections::{BTreeSet, HashMap};

use crate::document::Span;

/// Folds a glyph to its plain-ASCII family, if it has one.
fn fold_glyph(c: char) -> Option<&'static str> {
    match c {
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' | '\u{2033}' => {
            Some("\"")
        }
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' => Some("'"),
        '\u{2010}'..='\u{2015}' | '\u{2212}' => Some("-"),
        '\u{2026}' => Some("..."),
        _ => None,
    }
}

/// Normalised text that remembers where each of its characters came from.
///
/// Normalisation trims, folds whitespace runs to one space, unifies
/// quote/dash/ellipsis variants and lower-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    chars: Vec<char>,
    /// Source character offset of each normalised character.
    origins: Vec<usize>,
}

impl NormalizedText {
    pub fn new(source: &str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut origins = Vec::with_capacity(source.len());
        let mut pending_space: Option<usize> = None;

        for (offset, c) in source.chars().enumerate() {
            if c.is_whitespace() {
                if !chars.is_empty() && pending_space.is_none() {
                    pending_space = Some(offset);
                }
                continue;
            }
            if let Some(space_at) = pending_space.take() {
                chars.push(' ');
                origins.push(space_at);
            }
            match fold_glyph(c) {
                Some(folded) => {
                    for f in folded.chars() {
                        chars.push(f);
                        origins.push(offset);
                    }
                }
                None => {
                    for lower in c.to_lowercase() {
                        chars.push(lower);
                        origins.push(offset);
                    }
                }
            }
        }

        Self { chars, origins }
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Source span covered by normalised characters `[start, end)`.
    pub fn source_span(&self, start: usize, end: usize) -> Option<Span> {
        if start >= end || end > self.chars.len() {
            return None;
        }
        Some(Span::new(self.origins[start], self.origins[end - 1] + 1))
    }

    /// Position of the first occurrence of `needle` (already normalised),
    /// in normalised characters.
    pub fn find(&self, needle: &[char]) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.chars.len() {
            return None;
        }
        self.chars
            .windows(needle.len())
            .position(|window| window == needle)
    }

    /// Normalised indices where a word starts.
    pub fn word_starts(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.chars.len()).filter(|&i| {
            self.chars[i] != ' ' && (i == 0 || self.chars[i - 1] == ' ')
        })
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// Normalised string form, used for hashing and equality tests.
pub fn normalize(text: &str) -> String {
    NormalizedText::new(text).to_string()
}

/// Edit distance over characters, two-row dynamic programme.
pub fn levenshtein_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein_chars(&a, &b)
}

/// `(maxLen - distance) / maxLen` over character slices; two empty inputs
/// are identical.
pub fn similarity_chars(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein_chars(a, b)) as f64 / max_len as f64
}

/// Character counts of `chars`, for [`shared_chars`].
pub fn char_counts(chars: &[char]) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for c in chars {
        *counts.entry(*c).or_insert(0) += 1;
    }
    counts
}

/// Size of the multiset intersection of `counts` and `chars`.
///
/// The edit distance between two slices is at least `max_len - shared`, so
/// `shared / max_len` bounds [`similarity_chars`] from above in linear time.
pub fn shared_chars(counts: &HashMap<char, usize>, chars: &[char]) -> usize {
    let mut left = counts.clone();
    chars
        .iter()
        .filter(|c| match left.get_mut(c) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count()
}

/// Similarity of two strings after normalisation.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = NormalizedText::new(a);
    let b = NormalizedText::new(b);
    similarity_chars(a.as_chars(), b.as_chars())
}

/// `min / max` of two magnitudes; two zeros are identical.
pub fn ratio(a: usize, b: usize) -> f64 {
    match a.max(b) {
        0 => 1.0,
        max => a.min(b) as f64 / max as f64,
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lower-cased words (alphanumeric runs, apostrophes kept inside) with
/// their character spans in `text`.
pub fn words_with_spans(text: &str) -> Vec<(String, Span)> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;

    let mut flush = |current: &mut String, start: usize, end: usize| {
        let trimmed = current.trim_end_matches('\'');
        if !trimmed.is_empty() {
            let end = end - (current.chars().count() - trimmed.chars().count());
            words.push((trimmed.to_string(), Span::new(start, end)));
        }
        current.clear();
    };

    let mut count = 0usize;
    for (offset, c) in text.chars().enumerate() {
        count = offset + 1;
        let c = match fold_glyph(c) {
            Some("'") => '\'',
            _ => c,
        };
        let is_word = c.is_alphanumeric() || (c == '\'' && !current.is_empty());
        if is_word {
            if current.is_empty() {
                start = offset;
            }
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            flush(&mut current, start, offset);
        }
    }
    if !current.is_empty() {
        flush(&mut current, start, count);
    }

    words
}

/// Distinct lower-cased words longer than `min_len` characters.
pub fn significant_words(text: &str, min_len: usize) -> BTreeSet<String> {
    words_with_spans(text)
        .into_iter()
        .map(|(word, _)| word)
        .filter(|word| word.chars().count() > min_len)
        .collect()
}
