//! Research briefs and prompt construction.

use chrono::NaiveDate;

/// Everything the provider needs to research one company for one run.
/// Topics and metric names come from the classification policy so the
/// prompt asks for exactly what the normalizer knows how to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchBrief {
    pub company: String,
    /// Who the research is for, e.g. "a Junior ISA customer with £30,000+
    /// invested". Used to calibrate the significance flagging.
    pub investor_context: String,
    pub topics: Vec<String>,
    pub metrics: Vec<String>,
    pub run_date: NaiveDate,
}

/// Render the brief into the research prompt.
///
/// Deterministic given the brief; the run date is part of the brief, not
/// read from a clock here.
pub fn build_research_prompt(brief: &ResearchBrief) -> String {
    let mut prompt = format!(
        "Conduct comprehensive due diligence research on {} with focus on \
         recent developments. Search for and analyze:\n\n",
        brief.company
    );

    for (index, topic) in brief.topics.iter().enumerate() {
        prompt.push_str(&format!("{}. **{}**\n", index + 1, topic));
        prompt.push_str("   - Current status and any developments since last month\n");
        prompt.push_str("   - Specific dates, figures, and sources for each claim\n\n");
    }

    if !brief.metrics.is_empty() {
        prompt.push_str(
            "Report the latest available figure for each of these metrics, one \
             per line in the form `Name: value`:\n",
        );
        for metric in &brief.metrics {
            prompt.push_str(&format!("- {}\n", metric));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Provide a structured report with one clearly headed section per focus \
         area. Include specific dates and sources for all claims. Flag any \
         items that represent significant changes or concerns for {}.\n\n",
        brief.investor_context
    ));
    prompt.push_str(&format!(
        "Today's date: {}",
        brief.run_date.format("%d %B %Y")
    ));
    prompt
}

// =============================================================================
// TESTS
// =============================================================================
