//! Anthropic HTTP client with request pacing

use super::types::ApiError;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use vigil_core::{ProviderError, VigilResult};

const PROVIDER: &str = "anthropic";

/// Anthropic API client. Sequential requests are paced by a minimum
/// inter-request interval so the pause_turn continuation loop never
/// bursts the API.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    min_request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl AnthropicClient {
    /// Create a new Anthropic client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key
    /// * `min_request_interval` - minimum delay between consecutive requests
    /// * `timeout` - per-request timeout; research calls can run minutes
    pub fn new(
        api_key: impl Into<String>,
        min_request_interval: Duration,
        timeout: Duration,
    ) -> VigilResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ProviderError::Transport {
                provider: PROVIDER.to_string(),
                message: format!("failed to build HTTP client: {}", e),
            }
        })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            min_request_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Make an API request, pacing it against the previous one.
    pub async fn request<Req: Serialize, Res: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> VigilResult<Res> {
        self.pace().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| {
                    ProviderError::InvalidResponse {
                        provider: PROVIDER.to_string(),
                        reason: format!("failed to parse response: {}", e),
                    }
                    .into()
                })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
                    provider: PROVIDER.to_string(),
                },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::InvalidApiKey {
                    provider: PROVIDER.to_string(),
                },
                _ => ProviderError::RequestFailed {
                    provider: PROVIDER.to_string(),
                    status: status.as_u16(),
                    message,
                },
            }
            .into())
        }
    }

    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                tokio::time::sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
