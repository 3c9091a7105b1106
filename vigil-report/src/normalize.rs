//! Report normalization: untrusted provider text to a canonical record.
//!
//! The provider output is free-form markdown-ish prose with no guaranteed
//! structure. Parsing is defensive throughout: missing or reordered
//! sections yield absent entries, and input that matches nothing produces
//! a record with empty maps and the raw text preserved. This function
//! never fails on malformed input.

use crate::heuristics::{contains_phrase, normalize_fragment};
use once_cell::sync::Lazy;
use regex::Regex;
use vigil_core::{ClassificationPolicy, MetricValue, ReportRecord, Timestamp};

static HASH_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#{1,6}\s+(.+?)\s*$").expect("heading regex is valid"));

// A line that is nothing but bold text, optionally numbered: a heading in
// disguise. "**AUA**: £150bn" does not match because of the trailing value.
static BOLD_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]\s+)?\*\*(.+?)\*\*:?\s*$").expect("bold heading regex is valid")
});

static LABEL_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•]\s*)?(?:\*\*)?([^:|*]{1,80}?)(?:\*\*)?\s*:\s*(.+?)\s*$")
        .expect("label line regex is valid")
});

static TABLE_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|([^|]+)\|([^|]+)\|").expect("table row regex is valid"));

static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(?:,\d{3})*(?:\.\d+)?$|^[+-]?\d+(?:\.\d+)?$")
        .expect("bare number regex is valid")
});

/// Normalize raw provider output into a canonical record.
///
/// Deterministic: the same raw text and timestamp always yield the same
/// record. The timestamp is supplied by the caller, never read from a
/// clock here.
pub fn normalize(
    policy: &ClassificationPolicy,
    raw_text: &str,
    timestamp: Timestamp,
) -> ReportRecord {
    let mut record = ReportRecord::new(timestamp, raw_text);

    let sections = split_sections(raw_text);
    for topic in &policy.topics {
        let matched = sections.iter().find(|section| {
            let title = normalize_fragment(&section.title);
            contains_phrase(&title, &topic.name)
                || topic.aliases.iter().any(|alias| contains_phrase(&title, alias))
        });
        if let Some(section) = matched {
            let body = section.body.trim();
            if !body.is_empty() {
                record
                    .narrative_sections
                    .insert(topic.name.clone(), body.to_string());
            }
        }
    }

    let labeled = labeled_lines(raw_text);
    for metric in &policy.metrics {
        let matched = labeled.iter().find(|(label, _)| {
            contains_phrase(label, &metric.name)
                || metric.aliases.iter().any(|alias| contains_phrase(label, alias))
        });
        if let Some((_, value)) = matched {
            record
                .metrics
                .insert(metric.name.clone(), metric_value(value));
        }
    }

    record
}

struct Section {
    title: String,
    body: String,
}

fn split_sections(raw: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    for line in raw.lines() {
        if let Some(title) = heading_title(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(Section {
                title,
                body: String::new(),
            });
        } else if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        }
    }
    if let Some(section) = current {
        sections.push(section);
    }
    sections
}

fn heading_title(line: &str) -> Option<String> {
    if let Some(caps) = HASH_HEADING_RE.captures(line) {
        return Some(strip_numbering(caps.get(1)?.as_str()));
    }
    if let Some(caps) = BOLD_HEADING_RE.captures(line) {
        return Some(strip_numbering(caps.get(1)?.as_str()));
    }
    None
}

// "## 3. Woodford Litigation" carries its outline number into the title.
fn strip_numbering(title: &str) -> String {
    static NUMBERING_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("numbering regex is valid"));
    NUMBERING_RE.replace(title.trim(), "").to_string()
}

/// Collect (label, value) pairs from label lines and table rows, in
/// document order. The first occurrence of a label wins downstream.
fn labeled_lines(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in raw.lines() {
        if let Some(caps) = TABLE_ROW_RE.captures(line) {
            let label = normalize_fragment(caps.get(1).map_or("", |m| m.as_str()));
            let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            if !label.is_empty() && !value.is_empty() {
                pairs.push((label, value));
            }
            continue;
        }
        if heading_title(line).is_some() {
            continue;
        }
        if let Some(caps) = LABEL_LINE_RE.captures(line) {
            let label = normalize_fragment(caps.get(1).map_or("", |m| m.as_str()));
            let value = caps
                .get(2)
                .map_or("", |m| m.as_str())
                .trim_start_matches('*')
                .trim()
                .to_string();
            if !label.is_empty() && !value.is_empty() {
                pairs.push((label, value));
            }
        }
    }
    pairs
}

fn metric_value(value: &str) -> MetricValue {
    if BARE_NUMBER_RE.is_match(value) {
        if let Ok(number) = value.replace(',', "").parse::<f64>() {
            return MetricValue::Number(number);
        }
    }
    MetricValue::Text(value.to_string())
}

// =============================================================================
// TESTS
// =============================================================================
