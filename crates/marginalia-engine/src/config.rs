use serde::{Deserialize, Serialize};

/// Tunables for the whole engine. Every section defaults independently, so
/// a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub reconcile: ReconcileConfig,
    pub state: StateConfig,
    pub decorations: DecorationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum confidence for `find_match` to return anything.
    pub threshold: f64,
    /// A strategy scoring at or above this stops the search.
    pub early_exit: f64,
    /// Minimum original-text similarity for the fuzzy strategy.
    pub fuzzy_threshold: f64,
    /// Minimum blended score for the position-context strategy.
    pub context_threshold: f64,
    /// Minimum shared fraction of significant words.
    pub overlap_ratio: f64,
    pub min_significant_words: usize,
    /// Words must be longer than this many characters to be significant.
    pub significant_word_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            early_exit: 0.95,
            fuzzy_threshold: 0.8,
            context_threshold: 0.6,
            overlap_ratio: 0.7,
            min_significant_words: 2,
            significant_word_len: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum similarity for the sliding-window recreation search.
    pub window_similarity: f64,
    /// Upper bound on windows scored per item.
    pub max_window_candidates: usize,
    /// Originals longer than this many normalised characters skip the
    /// sliding-window search.
    pub max_window_needle: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            window_similarity: 0.8,
            max_window_candidates: 2000,
            max_window_needle: 512,
        }
    }
}

/// What happens to a suggestion whose span collapses after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneratePolicy {
    /// Leave it inert: not rendered, not acceptable, still listed.
    #[default]
    Keep,
    /// Drop it on the transaction that collapsed it.
    Prune,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub degenerate_policy: DegeneratePolicy,
    /// Move offset-anchored proposals onto the nearest occurrence of their
    /// literal when the text at the given offsets differs.
    pub relocate_drifted_offsets: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            degenerate_policy: DegeneratePolicy::Keep,
            relocate_drifted_offsets: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    pub class_prefix: String,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            class_prefix: "suggestion".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{ "matcher": { "threshold": 0.6 }, "state": { "degenerate_policy": "prune" } }"#,
        )
        .unwrap();
        assert_eq!(config.matcher.threshold, 0.6);
        assert_eq!(config.matcher.early_exit, 0.95);
        assert_eq!(config.state.degenerate_policy, DegeneratePolicy::Prune);
        assert!(config.state.relocate_drifted_offsets);
        assert_eq!(config.decorations.class_prefix, "suggestion");
    }
}
