//! Numeric interpretation of metric values.

use once_cell::sync::Lazy;
use regex::Regex;
use vigil_core::MetricValue;

static MAGNITUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([+-]?\d+(?:,\d{3})*(?:\.\d+)?)\s*(trillion|billion|million|thousand|tn|bn|mn|m|k|b|%)?")
        .expect("magnitude regex is valid")
});

/// Parse a metric value into a comparable magnitude.
///
/// Handles currency prefixes, thousands separators, and scale suffixes:
/// `£150bn`, `$4.2 billion`, `1,950,000`, `12.5%`. The first numeric
/// token wins. Returns `None` when no number is present.
pub fn parse_magnitude(value: &MetricValue) -> Option<f64> {
    match value {
        MetricValue::Number(n) => Some(*n),
        MetricValue::Text(s) => parse_text_magnitude(s),
    }
}

fn parse_text_magnitude(text: &str) -> Option<f64> {
    let caps = MAGNITUDE_RE.captures(text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let base: f64 = digits.parse().ok()?;
    let scale = caps
        .get(2)
        .map(|m| suffix_scale(m.as_str()))
        .unwrap_or(1.0);
    Some(base * scale)
}

fn suffix_scale(suffix: &str) -> f64 {
    match suffix.to_ascii_lowercase().as_str() {
        "trillion" | "tn" => 1e12,
        "billion" | "bn" | "b" => 1e9,
        "million" | "mn" | "m" => 1e6,
        "thousand" | "k" => 1e3,
        _ => 1.0, // includes "%": percentages compare as plain numbers
    }
}

// =============================================================================
// TESTS
// =============================================================================
