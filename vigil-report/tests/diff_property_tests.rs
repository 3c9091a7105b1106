//! Property tests for the diff engine's invariants: baseline, identity,
//! determinism, and the severity ordering of the output.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use vigil_core::{ClassificationPolicy, MetricValue, ReportRecord, Severity};
use vigil_report::diff;

fn metric_value_strategy() -> impl Strategy<Value = MetricValue> {
    prop_oneof![
        (-1.0e12..1.0e12f64).prop_map(MetricValue::Number),
        "[a-z0-9 ]{0,16}".prop_map(MetricValue::Text),
    ]
}

fn record_strategy() -> impl Strategy<Value = ReportRecord> {
    (
        proptest::collection::btree_map("[a-z]{1,8}", metric_value_strategy(), 0..6),
        proptest::collection::btree_map("[a-z]{1,8}", "[a-z ]{0,40}", 0..6),
        "[a-z \n]{0,64}",
        0i64..28,
    )
        .prop_map(|(metrics, narratives, raw, day)| {
            let base = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
            let mut record = ReportRecord::new(base + Duration::days(day), raw);
            record.metrics = metrics;
            record.narrative_sections = narratives;
            record
        })
}

proptest! {
    // diff(None, R) is always empty: the first run only establishes a
    // baseline.
    #[test]
    fn prop_baseline_is_empty(record in record_strategy()) {
        let policy = ClassificationPolicy::default();
        prop_assert!(diff(&policy, None, &record).is_empty());
    }

    // diff(R, R) is always empty: no false positives on an unchanged
    // record.
    #[test]
    fn prop_identity_is_empty(record in record_strategy()) {
        let policy = ClassificationPolicy::default();
        prop_assert!(diff(&policy, Some(&record), &record).is_empty());
    }

    // Identical inputs produce identical ordered output.
    #[test]
    fn prop_diff_is_deterministic(previous in record_strategy(), current in record_strategy()) {
        let policy = ClassificationPolicy::default();
        let first = diff(&policy, Some(&previous), &current);
        let second = diff(&policy, Some(&previous), &current);
        prop_assert_eq!(first, second);
    }

    // All critical items precede all notable items, which precede all
    // positive items.
    #[test]
    fn prop_output_is_severity_ordered(previous in record_strategy(), current in record_strategy()) {
        let policy = ClassificationPolicy::default();
        let changes = diff(&policy, Some(&previous), &current);
        let categories: Vec<Severity> = changes.iter().map(|c| c.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        prop_assert_eq!(categories, sorted);
    }

    // A metric present on one side only yields exactly one change item
    // for that metric, never below notable severity.
    #[test]
    fn prop_appearance_yields_one_notable_item(record in record_strategy(), value in metric_value_strategy()) {
        let policy = ClassificationPolicy::default();
        let mut previous = record.clone();
        previous.metrics.remove("zmetric");
        let mut current = record;
        current.metrics.insert("zmetric".to_string(), value);

        let changes = diff(&policy, Some(&previous), &current);
        let items: Vec<_> = changes.iter().filter(|c| c.topic == "zmetric").collect();
        prop_assert_eq!(items.len(), 1);
        prop_assert!(items[0].category <= Severity::Notable);
    }
}
