//! Change items - one per detected difference between two snapshots.
//!
//! Change items are ephemeral: computed fresh each run, never persisted.
//! Only the rendered email and the new canonical record survive.

use serde::{Deserialize, Serialize};

/// Severity bucket for a detected change, critical highest.
///
/// Variant order is the report order: a stable ascending sort puts all
/// critical items first, then notable, then positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Notable,
    Positive,
}

impl Severity {
    /// Human-readable section label for rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical changes",
            Severity::Notable => "Notable developments",
            Severity::Positive => "Positive updates",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Notable => write!(f, "notable"),
            Severity::Positive => write!(f, "positive"),
        }
    }
}

/// Whether a change was detected on a metric or a narrative section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Metric,
    Narrative,
}

/// One detected difference between the previous and current records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub category: Severity,
    pub kind: ChangeKind,
    /// Which metric or narrative section changed.
    pub topic: String,
    /// Absent when the field newly appeared.
    pub previous_value: Option<String>,
    /// Absent when the field disappeared (dropped disclosure).
    pub current_value: Option<String>,
    /// Human-readable explanation; dropped disclosures are flagged here.
    pub description: String,
}

// =============================================================================
// TESTS
// =============================================================================
