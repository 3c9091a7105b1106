//! Text heuristics shared by the normalizer and the diff engine.

use strsim::jaro_winkler;
use vigil_core::{ClassificationPolicy, Severity};

/// Collapse a fragment to lowercase alphanumeric words separated by
/// single spaces. Punctuation, markdown ornament, and currency symbols
/// all disappear, so comparisons ignore formatting noise.
pub fn normalize_fragment(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when `phrase` occurs in `text` on word boundaries. Both sides
/// are normalized before matching.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let needle = normalize_fragment(phrase);
    if needle.is_empty() {
        return false;
    }
    let padded = format!(" {} ", normalize_fragment(text));
    padded.contains(&format!(" {} ", needle))
}

/// Keyword scan of narrative text. Critical signals win over positive
/// ones; no signal at all yields `None`.
pub fn keyword_severity(policy: &ClassificationPolicy, text: &str) -> Option<Severity> {
    if policy
        .critical_keywords
        .iter()
        .any(|k| contains_phrase(text, k))
    {
        return Some(Severity::Critical);
    }
    if policy
        .positive_keywords
        .iter()
        .any(|k| contains_phrase(text, k))
    {
        return Some(Severity::Positive);
    }
    None
}

/// Decide whether two narrative texts differ beyond trivial rewording.
///
/// Normalized-equal texts never count. Texts above the policy's
/// triviality similarity only count when the keyword signal moved.
pub fn meaningfully_different(policy: &ClassificationPolicy, previous: &str, current: &str) -> bool {
    let prev_norm = normalize_fragment(previous);
    let cur_norm = normalize_fragment(current);
    if prev_norm == cur_norm {
        return false;
    }
    if jaro_winkler(&prev_norm, &cur_norm) < policy.trivial_similarity {
        return true;
    }
    keyword_severity(policy, previous) != keyword_severity(policy, current)
}

// =============================================================================
// TESTS
// =============================================================================
