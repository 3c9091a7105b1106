//! The Diff & Classification Engine.
//!
//! Compares two canonical records and produces an ordered change-set
//! partitioned by severity. Output is deterministic: critical items
//! first, then notable, then positive; within a category, metrics in
//! policy declaration order, then topics in policy declaration order.

use crate::heuristics::{keyword_severity, meaningfully_different};
use crate::value::parse_magnitude;
use std::collections::BTreeMap;
use vigil_core::{
    ChangeItem, ChangeKind, ClassificationPolicy, MetricPolicy, MetricValue, ReportRecord,
    Severity,
};

// Relative moves are computed in floating point; without a small guard an
// exactly-at-threshold move can land an ulp above it and flip category.
const MOVE_EPSILON: f64 = 1e-9;

/// Diff `previous` against `current`.
///
/// An absent `previous` is a baseline run: the result is empty. Identical
/// records also yield an empty result. A degraded current record (empty
/// metrics after a normalizer failure) produces only notable
/// dropped-disclosure items - parse failure is a data-quality signal, not
/// a business-risk signal, so it can never be critical on its own.
pub fn diff(
    policy: &ClassificationPolicy,
    previous: Option<&ReportRecord>,
    current: &ReportRecord,
) -> Vec<ChangeItem> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let mut items = Vec::new();

    let metric_names: Vec<String> = policy.metrics.iter().map(|m| m.name.clone()).collect();
    for name in key_order(&metric_names, &previous.metrics, &current.metrics) {
        if let Some(item) = diff_metric(
            policy,
            &name,
            previous.metrics.get(&name),
            current.metrics.get(&name),
        ) {
            items.push(item);
        }
    }

    let topic_names: Vec<String> = policy.topics.iter().map(|t| t.name.clone()).collect();
    for name in key_order(
        &topic_names,
        &previous.narrative_sections,
        &current.narrative_sections,
    ) {
        if let Some(item) = diff_narrative(
            policy,
            &name,
            previous.narrative_sections.get(&name),
            current.narrative_sections.get(&name),
        ) {
            items.push(item);
        }
    }

    // Stable sort: declaration order survives within each severity bucket.
    items.sort_by_key(|item| item.category);
    items
}

/// Keys in policy declaration order first, then any undeclared keys from
/// either record in lexicographic order. Deterministic for identical
/// inputs.
fn key_order<V>(
    declared: &[String],
    previous: &BTreeMap<String, V>,
    current: &BTreeMap<String, V>,
) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for name in declared {
        if previous.contains_key(name) || current.contains_key(name) {
            order.push(name.clone());
        }
    }
    for name in previous.keys().chain(current.keys()) {
        if !order.iter().any(|existing| existing == name) {
            order.push(name.clone());
        }
    }
    order
}

fn diff_metric(
    policy: &ClassificationPolicy,
    name: &str,
    previous: Option<&MetricValue>,
    current: Option<&MetricValue>,
) -> Option<ChangeItem> {
    match (previous, current) {
        (None, None) => None,
        (None, Some(cur)) => Some(ChangeItem {
            category: Severity::Notable,
            kind: ChangeKind::Metric,
            topic: name.to_string(),
            previous_value: None,
            current_value: Some(cur.to_string()),
            description: format!("{} newly disclosed at {}", name, cur),
        }),
        (Some(prev), None) => Some(ChangeItem {
            category: Severity::Notable,
            kind: ChangeKind::Metric,
            topic: name.to_string(),
            previous_value: Some(prev.to_string()),
            current_value: None,
            description: format!("{} no longer disclosed (was {})", name, prev),
        }),
        (Some(prev), Some(cur)) => diff_metric_values(policy.metric(name), name, prev, cur),
    }
}

fn diff_metric_values(
    metric: Option<&MetricPolicy>,
    name: &str,
    prev: &MetricValue,
    cur: &MetricValue,
) -> Option<ChangeItem> {
    let (category, description) = match (parse_magnitude(prev), parse_magnitude(cur)) {
        (Some(p), Some(c)) => {
            if approx_eq(p, c) {
                return None;
            }
            classify_numeric(metric, name, p, c, prev, cur)
        }
        _ => {
            if prev == cur {
                return None;
            }
            (
                Severity::Notable,
                format!("{} changed from {} to {}", name, prev, cur),
            )
        }
    };
    Some(ChangeItem {
        category,
        kind: ChangeKind::Metric,
        topic: name.to_string(),
        previous_value: Some(prev.to_string()),
        current_value: Some(cur.to_string()),
        description,
    })
}

fn classify_numeric(
    metric: Option<&MetricPolicy>,
    name: &str,
    prev: f64,
    cur: f64,
    prev_value: &MetricValue,
    cur_value: &MetricValue,
) -> (Severity, String) {
    let move_pct = if prev != 0.0 {
        (cur - prev) / prev.abs() * 100.0
    } else {
        f64::NAN
    };

    if let Some(metric) = metric {
        if crossed_danger_bound(metric, prev, cur) {
            return (
                Severity::Critical,
                format!(
                    "{} moved from {} to {}, crossing a configured danger bound",
                    name, prev_value, cur_value
                ),
            );
        }
        // Strictly greater than the threshold: an exactly-at-threshold
        // move stays notable.
        if move_pct.is_finite() && move_pct.abs() > metric.critical_move_pct + MOVE_EPSILON {
            let favorable = match metric.favorable {
                vigil_core::Direction::HigherIsBetter => cur > prev,
                vigil_core::Direction::LowerIsBetter => cur < prev,
            };
            let category = if favorable {
                Severity::Positive
            } else {
                Severity::Critical
            };
            return (
                category,
                format!(
                    "{} moved {:+.1}% from {} to {}",
                    name, move_pct, prev_value, cur_value
                ),
            );
        }
    }

    let description = if move_pct.is_finite() {
        format!(
            "{} moved {:+.1}% from {} to {}",
            name, move_pct, prev_value, cur_value
        )
    } else {
        format!("{} changed from {} to {}", name, prev_value, cur_value)
    };
    (Severity::Notable, description)
}

fn crossed_danger_bound(metric: &MetricPolicy, prev: f64, cur: f64) -> bool {
    if let Some(floor) = metric.danger_below {
        if prev >= floor && cur < floor {
            return true;
        }
    }
    if let Some(ceiling) = metric.danger_above {
        if prev <= ceiling && cur > ceiling {
            return true;
        }
    }
    false
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn diff_narrative(
    policy: &ClassificationPolicy,
    name: &str,
    previous: Option<&String>,
    current: Option<&String>,
) -> Option<ChangeItem> {
    match (previous, current) {
        (None, None) => None,
        (None, Some(cur)) => {
            // A brand-new disclosure is at least notable by definition;
            // critical language can upgrade it, positive language cannot
            // downgrade it.
            let category = match keyword_severity(policy, cur) {
                Some(Severity::Critical) => Severity::Critical,
                _ => Severity::Notable,
            };
            Some(ChangeItem {
                category,
                kind: ChangeKind::Narrative,
                topic: name.to_string(),
                previous_value: None,
                current_value: Some(cur.clone()),
                description: format!("New disclosure under {}", name),
            })
        }
        (Some(prev), None) => Some(ChangeItem {
            category: Severity::Notable,
            kind: ChangeKind::Narrative,
            topic: name.to_string(),
            previous_value: Some(prev.clone()),
            current_value: None,
            description: format!("{} no longer covered by the report (dropped disclosure)", name),
        }),
        (Some(prev), Some(cur)) => {
            if !meaningfully_different(policy, prev, cur) {
                return None;
            }
            let category = keyword_severity(policy, cur).unwrap_or(Severity::Notable);
            let description = match category {
                Severity::Critical => format!("{} changed with critical-risk language", name),
                Severity::Positive => format!("{} changed with positive language", name),
                Severity::Notable => format!("{} narrative changed", name),
            };
            Some(ChangeItem {
                category,
                kind: ChangeKind::Narrative,
                topic: name.to_string(),
                previous_value: Some(prev.clone()),
                current_value: Some(cur.clone()),
                description,
            })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
