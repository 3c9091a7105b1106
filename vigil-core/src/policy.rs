//! Classification policy - the configuration consumed by the diff engine.
//!
//! Declaration order of metrics and topics is load-bearing: it is the
//! fixed ordering used within each severity bucket of the diff output.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};

/// Which direction of movement is good news for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Per-metric classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricPolicy {
    pub name: String,
    /// Lowercased fragments matched against labels in the raw report.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Relative move (percent) separating critical from notable. The
    /// comparison is strictly greater than: with a 10.0 threshold a
    /// 10.00% move stays notable and a 10.01% move is critical.
    pub critical_move_pct: f64,
    pub favorable: Direction,
    /// Absolute floor whose downward crossing is always critical.
    #[serde(default)]
    pub danger_below: Option<f64>,
    /// Absolute ceiling whose upward crossing is always critical.
    #[serde(default)]
    pub danger_above: Option<f64>,
}

/// A narrative topic the diff engine tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicPolicy {
    pub name: String,
    /// Lowercased fragments matched against section headings.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Full policy: tracked metrics and topics plus keyword signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClassificationPolicy {
    pub metrics: Vec<MetricPolicy>,
    pub topics: Vec<TopicPolicy>,
    /// Narrative language signalling elevated risk.
    pub critical_keywords: Vec<String>,
    /// Narrative language signalling improvement or resolution.
    pub positive_keywords: Vec<String>,
    /// Jaro-Winkler similarity at or above which a reworded narrative
    /// with an unchanged keyword signal is treated as no change.
    pub trivial_similarity: f64,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            metrics: vec![
                MetricPolicy {
                    name: "AUA".to_string(),
                    aliases: str_vec(&["aua", "assets under administration"]),
                    critical_move_pct: 10.0,
                    favorable: Direction::HigherIsBetter,
                    danger_below: None,
                    danger_above: None,
                },
                MetricPolicy {
                    name: "client_count".to_string(),
                    aliases: str_vec(&["client count", "client numbers", "active clients"]),
                    critical_move_pct: 10.0,
                    favorable: Direction::HigherIsBetter,
                    danger_below: None,
                    danger_above: None,
                },
                MetricPolicy {
                    name: "net_flows".to_string(),
                    aliases: str_vec(&["net flows", "net new business", "net inflows"]),
                    critical_move_pct: 25.0,
                    favorable: Direction::HigherIsBetter,
                    danger_below: None,
                    danger_above: None,
                },
                MetricPolicy {
                    name: "cash_position".to_string(),
                    aliases: str_vec(&["cash position", "cash balance", "cash and equivalents"]),
                    critical_move_pct: 15.0,
                    favorable: Direction::HigherIsBetter,
                    danger_below: None,
                    danger_above: None,
                },
                MetricPolicy {
                    name: "debt_level".to_string(),
                    aliases: str_vec(&["debt levels", "total debt", "net debt"]),
                    critical_move_pct: 20.0,
                    favorable: Direction::LowerIsBetter,
                    danger_below: None,
                    danger_above: None,
                },
            ],
            topics: vec![
                TopicPolicy {
                    name: "CEO Search".to_string(),
                    aliases: str_vec(&["ceo search", "leadership", "executive team"]),
                },
                TopicPolicy {
                    name: "Ownership".to_string(),
                    aliases: str_vec(&["ownership", "strategic direction", "new owners"]),
                },
                TopicPolicy {
                    name: "Litigation".to_string(),
                    aliases: str_vec(&["litigation", "legal action", "lawsuit", "group claim"]),
                },
                TopicPolicy {
                    name: "Operational Performance".to_string(),
                    aliases: str_vec(&[
                        "operational performance",
                        "platform reliability",
                        "customer service",
                    ]),
                },
                TopicPolicy {
                    name: "Regulatory Standing".to_string(),
                    aliases: str_vec(&["regulatory", "fca", "compliance", "consumer duty"]),
                },
                TopicPolicy {
                    name: "Financial Health".to_string(),
                    aliases: str_vec(&["financial health", "financial metrics", "credit rating"]),
                },
            ],
            critical_keywords: str_vec(&[
                "resigned",
                "resignation",
                "steps down",
                "stepped down",
                "downgrade",
                "downgraded",
                "fined",
                "penalty",
                "sanction",
                "enforcement action",
                "investigation opened",
                "investigation launched",
                "ruled against",
                "adverse ruling",
                "lost the case",
                "settlement ordered",
                "provision increased",
                "breach",
                "outage",
                "insolvency",
                "going concern",
            ]),
            positive_keywords: str_vec(&[
                "appointed",
                "appointment",
                "upgrade",
                "upgraded",
                "resolved",
                "resolution",
                "claim dismissed",
                "dismissed the claim",
                "record inflows",
                "improved",
                "strengthened",
                "recovered",
                "no concerns",
            ]),
            trivial_similarity: 0.96,
        }
    }
}

impl ClassificationPolicy {
    /// Validate names, thresholds, and bounds. Declaration order is
    /// preserved as given; only well-formedness is checked here.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let mut metric_names: Vec<&str> = Vec::new();
        for metric in &self.metrics {
            if metric.name.trim().is_empty() {
                return Err(PolicyError::EmptyMetricName);
            }
            if metric_names.contains(&metric.name.as_str()) {
                return Err(PolicyError::DuplicateName {
                    what: "metric",
                    name: metric.name.clone(),
                });
            }
            metric_names.push(&metric.name);

            if !metric.critical_move_pct.is_finite() || metric.critical_move_pct <= 0.0 {
                return Err(PolicyError::InvalidThreshold {
                    metric: metric.name.clone(),
                    reason: "critical_move_pct must be a finite value > 0".to_string(),
                });
            }
            if let (Some(below), Some(above)) = (metric.danger_below, metric.danger_above) {
                if below >= above {
                    return Err(PolicyError::InvalidDangerBounds {
                        metric: metric.name.clone(),
                        below,
                        above,
                    });
                }
            }
        }

        let mut topic_names: Vec<&str> = Vec::new();
        for topic in &self.topics {
            if topic.name.trim().is_empty() {
                return Err(PolicyError::EmptyTopicName);
            }
            if topic_names.contains(&topic.name.as_str()) {
                return Err(PolicyError::DuplicateName {
                    what: "topic",
                    name: topic.name.clone(),
                });
            }
            topic_names.push(&topic.name);
        }

        if !(0.0..=1.0).contains(&self.trivial_similarity) {
            return Err(PolicyError::InvalidSimilarityBound {
                value: self.trivial_similarity,
            });
        }
        Ok(())
    }

    /// Look up a metric policy by exact name.
    pub fn metric(&self, name: &str) -> Option<&MetricPolicy> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

fn str_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        ClassificationPolicy::default().validate().unwrap();
    }

    #[test]
    fn test_empty_metric_name_rejected() {
        let mut policy = ClassificationPolicy::default();
        policy.metrics[0].name = "  ".to_string();
        assert_eq!(policy.validate(), Err(PolicyError::EmptyMetricName));
    }

    #[test]
    fn test_duplicate_metric_name_rejected() {
        let mut policy = ClassificationPolicy::default();
        let duplicate = policy.metrics[0].clone();
        policy.metrics.push(duplicate);
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::DuplicateName { what: "metric", .. })
        ));
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        let mut policy = ClassificationPolicy::default();
        policy.metrics[0].critical_move_pct = 0.0;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_inverted_danger_bounds_rejected() {
        let mut policy = ClassificationPolicy::default();
        policy.metrics[0].danger_below = Some(10.0);
        policy.metrics[0].danger_above = Some(5.0);
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidDangerBounds { .. })
        ));
    }

    #[test]
    fn test_similarity_bound_rejected_outside_unit_interval() {
        let mut policy = ClassificationPolicy::default();
        policy.trivial_similarity = 1.5;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidSimilarityBound { .. })
        ));
    }

    #[test]
    fn test_metric_lookup_by_name() {
        let policy = ClassificationPolicy::default();
        assert!(policy.metric("AUA").is_some());
        assert!(policy.metric("unknown").is_none());
    }
}
