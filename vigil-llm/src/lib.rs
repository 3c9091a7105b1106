//! VIGIL LLM - Research Provider boundary
//!
//! Provider-agnostic trait for company research plus the Anthropic
//! implementation. The provider is an opaque function from a research
//! brief to raw report text; normalization of that text happens
//! downstream and treats it as untrusted.

mod brief;
pub mod providers;

pub use brief::{build_research_prompt, ResearchBrief};
pub use providers::anthropic::AnthropicResearchProvider;

use async_trait::async_trait;
use vigil_core::VigilResult;

/// Trait for research providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// A transient failure here aborts the whole run before anything is
/// persisted; retries, if any, belong to the external scheduler.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Produce a raw research report for the brief.
    ///
    /// # Returns
    /// * `Ok(String)` - the free-form report text, never empty
    /// * `Err(VigilError::Provider)` - if the research call fails
    async fn research(&self, brief: &ResearchBrief) -> VigilResult<String>;
}
