//! HTML rendering of the run summary.

use once_cell::sync::Lazy;
use regex::Regex;
use vigil_core::{ChangeItem, ClassificationPolicy, ReportRecord, Severity};

/// Everything the renderer needs for one run.
pub struct NotifyInput<'a> {
    pub company: &'a str,
    /// Ordered change items: critical first, then notable, then positive.
    pub changes: &'a [ChangeItem],
    pub current: &'a ReportRecord,
    /// Absent on a baseline run.
    pub previous: Option<&'a ReportRecord>,
    /// Supplies the metric table ordering.
    pub policy: &'a ClassificationPolicy,
}

/// A rendered email, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

const SECTION_COLORS: [(Severity, &str); 3] = [
    (Severity::Critical, "#c0392b"),
    (Severity::Notable, "#b7950b"),
    (Severity::Positive, "#27ae60"),
];

/// Render the change-set plus full report into an email.
pub fn render(input: &NotifyInput<'_>) -> RenderedEmail {
    let is_baseline = input.previous.is_none();
    let date = input.current.timestamp.format("%d %B %Y");

    let subject = if is_baseline {
        format!("First {} due diligence report", input.company)
    } else {
        format!("{} due diligence update", input.company)
    };

    let mut body = String::new();
    body.push_str(&format!(
        "<h1 style=\"color: #1a5276;\">{} due diligence report</h1>\n\
         <p style=\"color: #666;\">Generated: {}</p>\n",
        escape_html(input.company),
        date
    ));

    if is_baseline {
        body.push_str(
            "<p style=\"background: #e8f4f8; padding: 15px; border-radius: 5px;\">\
             This is the first report for this company. Future runs will \
             include a comparison highlighting changes since this baseline.</p>\n",
        );
    } else {
        body.push_str(
            "<p style=\"background: #e8f4f8; padding: 15px; border-radius: 5px;\">\
             See the changes summary below for what moved since the last \
             report.</p>\n",
        );
        body.push_str(&render_changes(input.changes));
    }

    body.push_str(&render_metrics_table(input));
    body.push_str(&render_full_report(&input.current.raw_text));
    body.push_str(
        "<div style=\"margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd; \
         font-size: 12px; color: #666;\">\
         <p>Generated automatically by VIGIL.</p></div>\n",
    );

    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"UTF-8\"></head>\n\
         <body style=\"font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; \
         line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px;\">\n\
         {}</body>\n</html>\n",
        body
    );

    RenderedEmail { subject, html }
}

fn render_changes(changes: &[ChangeItem]) -> String {
    if changes.is_empty() {
        return "<p>No significant changes since the previous report; the \
                situation remains stable.</p>\n"
            .to_string();
    }

    let mut out = String::new();
    for (severity, color) in SECTION_COLORS {
        let items: Vec<&ChangeItem> = changes.iter().filter(|c| c.category == severity).collect();
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "<h2 style=\"color: {}; border-bottom: 2px solid {}; padding-bottom: 5px;\">{}</h2>\n<ul>\n",
            color,
            color,
            severity.label()
        ));
        for item in items {
            out.push_str(&format!(
                "<li><strong>{}</strong>: {}{}</li>\n",
                escape_html(&item.topic),
                escape_html(&item.description),
                render_value_pair(item)
            ));
        }
        out.push_str("</ul>\n");
    }
    out
}

fn render_value_pair(item: &ChangeItem) -> String {
    match (&item.previous_value, &item.current_value) {
        (Some(previous), Some(current)) => format!(
            " <span style=\"color: #666;\">(previous: {}; current: {})</span>",
            escape_html(&truncate(previous, 160)),
            escape_html(&truncate(current, 160))
        ),
        _ => String::new(),
    }
}

fn render_metrics_table(input: &NotifyInput<'_>) -> String {
    let previous_metrics = input.previous.map(|record| &record.metrics);

    // Policy declaration order first, then any undeclared keys.
    let mut names: Vec<String> = Vec::new();
    for metric in &input.policy.metrics {
        if input.current.metrics.contains_key(&metric.name)
            || previous_metrics.is_some_and(|m| m.contains_key(&metric.name))
        {
            names.push(metric.name.clone());
        }
    }
    for name in input
        .current
        .metrics
        .keys()
        .chain(previous_metrics.into_iter().flat_map(|m| m.keys()))
    {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.clone());
        }
    }
    if names.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        "<h2 style=\"color: #2c3e50;\">Metrics comparison</h2>\n\
         <table style=\"border-collapse: collapse; width: 100%;\">\n\
         <tr><th style=\"border: 1px solid #ddd; padding: 8px; background: #3498db; \
         color: white; text-align: left;\">Metric</th>\
         <th style=\"border: 1px solid #ddd; padding: 8px; background: #3498db; \
         color: white; text-align: left;\">Previous</th>\
         <th style=\"border: 1px solid #ddd; padding: 8px; background: #3498db; \
         color: white; text-align: left;\">Current</th></tr>\n",
    );
    for name in names {
        let previous = previous_metrics
            .and_then(|m| m.get(&name))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let current = input
            .current
            .metrics
            .get(&name)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "<tr><td style=\"border: 1px solid #ddd; padding: 8px;\">{}</td>\
             <td style=\"border: 1px solid #ddd; padding: 8px;\">{}</td>\
             <td style=\"border: 1px solid #ddd; padding: 8px;\">{}</td></tr>\n",
            escape_html(&name),
            escape_html(&previous),
            escape_html(&current)
        ));
    }
    out.push_str("</table>\n");
    out
}

fn render_full_report(raw_text: &str) -> String {
    format!(
        "<details style=\"margin: 20px 0;\">\n\
         <summary style=\"cursor: pointer; font-weight: bold; color: #2c3e50; \
         padding: 10px; background: #f8f9fa; border-radius: 5px;\">\
         Full research report (click to expand)</summary>\n\
         <div style=\"border: 1px solid #ddd; border-radius: 5px; padding: 20px;\">\n{}\n</div>\n\
         </details>\n",
        markdown_lite(raw_text)
    )
}

static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.+)$").expect("h2 regex is valid"));
static H3_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.+)$").expect("h3 regex is valid"));
static BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex is valid"));

/// Markdown-lite conversion of provider text: headings and bold only.
/// The text is escaped first, so provider-controlled content can never
/// inject markup.
fn markdown_lite(text: &str) -> String {
    let escaped = escape_html(text);
    let with_h3 = H3_RE.replace_all(&escaped, "<h3 style=\"color: #34495e;\">$1</h3>");
    let with_h2 = H2_RE.replace_all(
        &with_h3,
        "<h2 style=\"color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 5px;\">$1</h2>",
    );
    let with_bold = BOLD_RE.replace_all(&with_h2, "<strong>$1</strong>");
    with_bold
        .split("\n\n")
        .map(|paragraph| format!("<p style=\"margin: 10px 0;\">{}</p>", paragraph.replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}…", truncated)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vigil_core::{ChangeKind, MetricValue, Timestamp};

    fn ts(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, day, 9, 0, 0).unwrap()
    }

    fn record(day: u32, raw: &str) -> ReportRecord {
        ReportRecord::new(ts(day), raw)
    }

    fn change(category: Severity, topic: &str) -> ChangeItem {
        ChangeItem {
            category,
            kind: ChangeKind::Metric,
            topic: topic.to_string(),
            previous_value: Some("£150bn".to_string()),
            current_value: Some("£145bn".to_string()),
            description: format!("{} moved", topic),
        }
    }

    #[test]
    fn test_baseline_email_has_no_changes_section() {
        let policy = ClassificationPolicy::default();
        let current = record(1, "## Report\nAll fine.");
        let email = render(&NotifyInput {
            company: "Hargreaves Lansdown",
            changes: &[],
            current: &current,
            previous: None,
            policy: &policy,
        });
        assert!(email.subject.starts_with("First"));
        assert!(email.html.contains("first report"));
        assert!(!email.html.contains("changes summary"));
    }

    #[test]
    fn test_update_email_groups_changes_by_severity() {
        let policy = ClassificationPolicy::default();
        let previous = record(1, "previous");
        let current = record(2, "current");
        let changes = vec![
            change(Severity::Critical, "AUA"),
            change(Severity::Positive, "client_count"),
        ];
        let email = render(&NotifyInput {
            company: "Hargreaves Lansdown",
            changes: &changes,
            current: &current,
            previous: Some(&previous),
            policy: &policy,
        });
        assert!(email.subject.contains("update"));
        assert!(email.html.contains("Critical changes"));
        assert!(email.html.contains("Positive updates"));
        assert!(!email.html.contains("Notable developments"));

        let critical_at = email.html.find("Critical changes").unwrap();
        let positive_at = email.html.find("Positive updates").unwrap();
        assert!(critical_at < positive_at);
    }

    #[test]
    fn test_stable_update_says_so() {
        let policy = ClassificationPolicy::default();
        let previous = record(1, "previous");
        let current = record(2, "current");
        let email = render(&NotifyInput {
            company: "HL",
            changes: &[],
            current: &current,
            previous: Some(&previous),
            policy: &policy,
        });
        assert!(email.html.contains("remains stable"));
    }

    #[test]
    fn test_metrics_table_shows_previous_and_current() {
        let policy = ClassificationPolicy::default();
        let mut previous = record(1, "previous");
        previous
            .metrics
            .insert("AUA".to_string(), MetricValue::Text("£150bn".to_string()));
        let mut current = record(2, "current");
        current
            .metrics
            .insert("AUA".to_string(), MetricValue::Text("£145bn".to_string()));
        current
            .metrics
            .insert("client_count".to_string(), MetricValue::Number(1_950_000.0));

        let email = render(&NotifyInput {
            company: "HL",
            changes: &[],
            current: &current,
            previous: Some(&previous),
            policy: &policy,
        });
        assert!(email.html.contains("Metrics comparison"));
        assert!(email.html.contains("£150bn"));
        assert!(email.html.contains("£145bn"));
        assert!(email.html.contains("1950000"));
        // Dropped metric column shows a dash for the missing side.
        assert!(email.html.contains("<td style=\"border: 1px solid #ddd; padding: 8px;\">-</td>"));
    }

    #[test]
    fn test_provider_text_is_escaped() {
        let policy = ClassificationPolicy::default();
        let current = record(1, "## Report\n<script>alert('x')</script>");
        let email = render(&NotifyInput {
            company: "HL",
            changes: &[],
            current: &current,
            previous: None,
            policy: &policy,
        });
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_full_report_is_collapsible_with_headings() {
        let policy = ClassificationPolicy::default();
        let current = record(1, "## Section One\nBody with **bold** text.");
        let email = render(&NotifyInput {
            company: "HL",
            changes: &[],
            current: &current,
            previous: None,
            policy: &policy,
        });
        assert!(email.html.contains("<details"));
        assert!(email.html.contains("<h2 style=\"color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 5px;\">Section One</h2>"));
        assert!(email.html.contains("<strong>bold</strong>"));
    }
}
