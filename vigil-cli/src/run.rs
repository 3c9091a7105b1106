//! The run-to-completion pipeline.
//!
//! Failure semantics, in order:
//! - provider failure aborts before anything is persisted;
//! - storage failure is fatal and never partially overwrites the latest
//!   snapshot;
//! - the snapshot is persisted before delivery is attempted, so a
//!   delivery failure can never lose the run's research - it is surfaced
//!   as the run's failure after the write.

use crate::config::{Secrets, VigilConfig};
use chrono::Utc;
use vigil_core::VigilResult;
use vigil_llm::{AnthropicResearchProvider, ResearchBrief, ResearchProvider};
use vigil_notify::{render, Notifier, NotifyInput, SmtpNotifier};
use vigil_report::{diff, normalize};
use vigil_storage::SnapshotStore;

pub async fn run(config: &VigilConfig, secrets: &Secrets) -> VigilResult<()> {
    let provider = AnthropicResearchProvider::new(
        secrets.anthropic_api_key.clone(),
        config.research.model.clone(),
        config.research.max_tokens,
        config.research.web_search_uses,
    )?;
    let store = SnapshotStore::open(&config.storage.reports_dir);
    let notifier = SmtpNotifier::new(
        &config.email.smtp_host,
        config.email.smtp_port,
        &config.email.username,
        &secrets.smtp_password,
        &config.email.from,
        &config.email.to,
    )?;
    run_with(config, &provider, &store, &notifier).await
}

/// Pipeline with injectable collaborators, separated for testing.
pub async fn run_with(
    config: &VigilConfig,
    provider: &dyn ResearchProvider,
    store: &SnapshotStore,
    notifier: &dyn Notifier,
) -> VigilResult<()> {
    let now = Utc::now();
    let brief = ResearchBrief {
        company: config.company.name.clone(),
        investor_context: config.company.investor_context.clone(),
        topics: config.policy.topics.iter().map(|t| t.name.clone()).collect(),
        metrics: config.policy.metrics.iter().map(|m| m.name.clone()).collect(),
        run_date: now.date_naive(),
    };

    tracing::info!(company = %config.company.name, "starting research");
    let raw_report = provider.research(&brief).await?;
    tracing::info!(chars = raw_report.len(), "research complete");

    let previous = store.load_latest()?;
    let current = normalize(&config.policy, &raw_report, now);
    if current.is_degraded() {
        tracing::warn!("provider output yielded no recognizable structure; proceeding degraded");
    }

    let changes = diff(&config.policy, previous.as_ref(), &current);
    tracing::info!(
        changes = changes.len(),
        baseline = previous.is_none(),
        "report diffed"
    );

    let saved = store.save(&current)?;
    tracing::info!(latest = %saved.latest.display(), "snapshot persisted");

    let email = render(&NotifyInput {
        company: &config.company.name,
        changes: &changes,
        current: &current,
        previous: previous.as_ref(),
        policy: &config.policy,
    });

    if let Err(err) = notifier.deliver(&email).await {
        // The research is already safe on disk; report the failure
        // without touching the snapshot.
        tracing::error!(
            error = %err,
            latest = %saved.latest.display(),
            "delivery failed after snapshot was persisted"
        );
        return Err(err);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use vigil_core::{NotifyError, ProviderError, VigilError};
    use vigil_notify::RenderedEmail;

    struct FixedProvider {
        report: &'static str,
    }

    #[async_trait]
    impl ResearchProvider for FixedProvider {
        async fn research(&self, _brief: &ResearchBrief) -> VigilResult<String> {
            Ok(self.report.to_string())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ResearchProvider for FailingProvider {
        async fn research(&self, _brief: &ResearchBrief) -> VigilResult<String> {
            Err(ProviderError::RateLimited {
                provider: "anthropic".to_string(),
            }
            .into())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<RenderedEmail>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, email: &RenderedEmail) -> VigilResult<()> {
            self.delivered.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn deliver(&self, _email: &RenderedEmail) -> VigilResult<()> {
            Err(NotifyError::DeliveryFailed {
                recipient: "holder@example.com".to_string(),
                reason: "connection refused".to_string(),
            }
            .into())
        }
    }

    fn config(reports_dir: &Path) -> VigilConfig {
        let toml_text = format!(
            r#"
[company]
name = "Hargreaves Lansdown"
investor_context = "a Junior ISA customer"

[research]
model = "claude-sonnet-4-20250514"
max_tokens = 8192
web_search_uses = 15

[storage]
reports_dir = "{}"

[email]
smtp_host = "smtp.gmail.com"
smtp_port = 465
username = "monitor@example.com"
from = "monitor@example.com"
to = "holder@example.com"
"#,
            reports_dir.display()
        );
        toml::from_str(&toml_text).unwrap()
    }

    const REPORT: &str = "## Operational Performance\n- **AUA**: £150bn\n";

    #[tokio::test]
    async fn test_first_run_persists_baseline_and_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = SnapshotStore::open(dir.path());
        let notifier = RecordingNotifier::default();

        run_with(&config, &FixedProvider { report: REPORT }, &store, &notifier)
            .await
            .unwrap();

        let latest = store.load_latest().unwrap().unwrap();
        assert!(latest.metrics.contains_key("AUA"));

        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].subject.starts_with("First"));
    }

    #[tokio::test]
    async fn test_provider_failure_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = SnapshotStore::open(dir.path());
        let notifier = RecordingNotifier::default();

        let err = run_with(&config, &FailingProvider, &store, &notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Provider(_)));
        assert!(store.load_latest().unwrap().is_none());
        assert!(notifier.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = SnapshotStore::open(dir.path());

        let err = run_with(&config, &FixedProvider { report: REPORT }, &store, &FailingNotifier)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::Notify(_)));
        // The month's research survived the delivery failure.
        assert!(store.load_latest().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_run_diffs_against_previous() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let store = SnapshotStore::open(dir.path());
        let notifier = RecordingNotifier::default();

        run_with(&config, &FixedProvider { report: REPORT }, &store, &notifier)
            .await
            .unwrap();
        run_with(
            &config,
            &FixedProvider {
                report: "## Operational Performance\n- **AUA**: £120bn\n",
            },
            &store,
            &notifier,
        )
        .await
        .unwrap();

        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert!(delivered[1].subject.contains("update"));
        assert!(delivered[1].html.contains("Critical changes"));

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(
            latest.metrics.get("AUA").map(|v| v.to_string()),
            Some("£120bn".to_string())
        );
    }
}
