//! Canonical report records - the normalized snapshot of one research run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// A single metric value as extracted from provider output.
///
/// Values stay as close to the source text as possible: a bare numeral
/// becomes `Number`, anything else (currency prefixes, magnitude suffixes,
/// free text) stays `Text`. Numeric interpretation happens at diff time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The canonical, normalized snapshot of one research run.
///
/// Exactly one record is "latest" at any time; archived records are
/// immutable and their timestamps strictly increase (enforced by the
/// snapshot store on save).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Creation instant, supplied externally at normalization time.
    pub timestamp: Timestamp,
    /// Named metrics extracted from the report. Keys come from a fixed
    /// configured set but are not guaranteed present every run.
    pub metrics: BTreeMap<String, MetricValue>,
    /// Narrative topic content, keyed by configured topic name.
    pub narrative_sections: BTreeMap<String, String>,
    /// Complete unprocessed provider output, retained for audit/display.
    pub raw_text: String,
    /// SHA-256 hex of `raw_text`, for archive integrity checking.
    pub content_hash: String,
}

impl ReportRecord {
    /// Create an empty record for the given raw provider output.
    /// The normalizer fills in metrics and narrative sections.
    pub fn new(timestamp: Timestamp, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let content_hash = content_hash_hex(raw_text.as_bytes());
        Self {
            timestamp,
            metrics: BTreeMap::new(),
            narrative_sections: BTreeMap::new(),
            raw_text,
            content_hash,
        }
    }

    /// True when normalization recognized nothing in the provider output.
    pub fn is_degraded(&self) -> bool {
        self.metrics.is_empty() && self.narrative_sections.is_empty()
    }

    /// Recompute the hash of `raw_text` and compare against the stored one.
    pub fn verify_content_hash(&self) -> bool {
        content_hash_hex(self.raw_text.as_bytes()) == self.content_hash
    }
}

/// Compute the SHA-256 hash of raw report content, hex-encoded.
pub fn content_hash_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

// =============================================================================
// TESTS
// =============================================================================
