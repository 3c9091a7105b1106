//! Research execution: one web-search request plus the pause_turn
//! continuation loop.

use super::client::AnthropicClient;
use super::types::{Message, MessageRequest, MessageResponse, Tool};
use crate::{build_research_prompt, ResearchBrief, ResearchProvider};
use async_trait::async_trait;
use std::time::Duration;
use vigil_core::{ProviderError, VigilResult};

// The API pauses long web-search turns; a bounded number of
// continuations keeps a stuck conversation from looping forever.
const MAX_CONTINUATIONS: usize = 8;

const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Anthropic research provider using Claude models with web search.
pub struct AnthropicResearchProvider {
    client: AnthropicClient,
    model: String,
    max_tokens: i32,
    web_search_uses: u32,
}

impl AnthropicResearchProvider {
    /// Create a new Anthropic research provider.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key
    /// * `model` - Model name (e.g. "claude-sonnet-4-20250514")
    /// * `max_tokens` - output budget per request
    /// * `web_search_uses` - web search budget per request
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: i32,
        web_search_uses: u32,
    ) -> VigilResult<Self> {
        Ok(Self {
            client: AnthropicClient::new(api_key, MIN_REQUEST_INTERVAL, REQUEST_TIMEOUT)?,
            model: model.into(),
            max_tokens,
            web_search_uses,
        })
    }

    async fn send(&self, messages: &[Message]) -> VigilResult<MessageResponse> {
        let request = MessageRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.max_tokens,
            system: None,
            temperature: None,
            tools: vec![Tool::web_search(self.web_search_uses)],
        };
        self.client.request("messages", &request).await
    }
}

#[async_trait]
impl ResearchProvider for AnthropicResearchProvider {
    async fn research(&self, brief: &ResearchBrief) -> VigilResult<String> {
        let mut messages = vec![Message::user(build_research_prompt(brief))];
        tracing::info!(model = %self.model, company = %brief.company, "starting research request");

        let mut response = self.send(&messages).await?;
        let mut continuations = 0;
        while response.stop_reason.as_deref() == Some("pause_turn") {
            continuations += 1;
            if continuations > MAX_CONTINUATIONS {
                return Err(ProviderError::InvalidResponse {
                    provider: "anthropic".to_string(),
                    reason: format!("still paused after {} continuations", MAX_CONTINUATIONS),
                }
                .into());
            }
            tracing::info!(round = continuations, "research paused for web search, continuing");
            messages.push(Message::assistant(response.content.clone()));
            messages.push(Message::user("Please continue your research."));
            response = self.send(&messages).await?;
        }

        let report = response.text();
        if report.trim().is_empty() {
            return Err(ProviderError::EmptyReport {
                provider: "anthropic".to_string(),
            }
            .into());
        }
        if let Some(usage) = &response.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                chars = report.len(),
                "research complete"
            );
        }
        Ok(report)
    }
}

impl std::fmt::Debug for AnthropicResearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicResearchProvider")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("web_search_uses", &self.web_search_uses)
            .finish()
    }
}
