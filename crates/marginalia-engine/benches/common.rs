// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use marginalia_engine::suggestion::generate_fingerprint;
use marginalia_engine::{EditType, Proposal, Suggestion, SuggestionId, SuggestionStatus};

const PARAGRAPH: &str = "The harbour lights flickered as the storm rolled in from the north. \
Nobody on the quay said a word, and the fishermen hauled their nets in silence.";

#[allow(dead_code)]
pub fn generate_manuscript(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| format!("{i}. {PARAGRAPH}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `count` proposals anchored on words of the generated manuscript.
#[allow(dead_code)]
pub fn generate_proposals(count: usize) -> Vec<Proposal> {
    ["storm", "harbour lights", "fishermen", "in silence", "said a word"]
        .iter()
        .cycle()
        .take(count)
        .enumerate()
        .map(|(i, original)| Proposal::literal(*original, format!("edit {i}")))
        .collect()
}

/// Suggestions with pseudo-random overlapping spans.
#[allow(dead_code)]
pub fn generate_suggestions(count: usize) -> Vec<Suggestion> {
    (0..count)
        .map(|i| {
            let from = (i * 7919) % (count * 10) + 1;
            let original = format!("phrase number {i} of the draft");
            let replacement = format!("rewritten phrase {i}");
            Suggestion {
                id: SuggestionId::new(format!("s{i}")),
                from,
                to: from + 5 + i % 25,
                fingerprint: generate_fingerprint(&original, &replacement),
                original,
                replacement,
                edit_type: EditType::General,
                status: SuggestionStatus::Pending,
                confidence: None,
            }
        })
        .collect()
}
